use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Desktop platforms with a known Chrome user-data directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Identify the platform this process is running on.
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            "windows" => Ok(Platform::Windows),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Resolve the Chrome user-data root for a platform. Performs no
/// filesystem access; existence is validated by the profile cloner.
pub fn user_data_root(platform: Platform) -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        Error::Browser("Could not determine home directory".to_string())
    })?;
    Ok(root_under(platform, &home))
}

/// Resolve the directory of a named profile under the platform's
/// user-data root. Profile names are case-sensitive.
pub fn profile_dir(platform: Platform, profile: &str) -> Result<PathBuf> {
    Ok(user_data_root(platform)?.join(profile))
}

fn root_under(platform: Platform, home: &Path) -> PathBuf {
    match platform {
        Platform::Linux => home.join(".config").join("google-chrome"),
        Platform::MacOs => home
            .join("Library")
            .join("Application Support")
            .join("Google")
            .join("Chrome"),
        Platform::Windows => std::env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("AppData").join("Local"))
            .join("Google")
            .join("Chrome")
            .join("User Data"),
    }
}
