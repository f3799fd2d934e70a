use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Credential-bearing files copied from the real profile. Anything else
/// (caches, site data, extensions) is left behind on purpose.
pub const CREDENTIAL_FILES: &[&str] = &["Cookies", "Login Data", "Web Data"];

/// Minimal Local State document. Chrome refuses to start against a
/// user-data dir without one; an empty encrypted_key also stops it from
/// asking the OS keyring for the profile's encryption key.
const LOCAL_STATE_STUB: &str = r#"{"os_crypt":{"encrypted_key":""}}"#;

/// An ephemeral Chrome user-data directory owned by a single extraction
/// run. Deleted on drop, on every exit path.
pub struct ScratchProfile {
    path: PathBuf,
}

impl ScratchProfile {
    /// Create a fresh scratch directory.
    pub fn create() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("nlm-auth-")
            .tempdir()
            .map_err(Error::Io)?;

        // Ownership of cleanup moves to our Drop impl.
        let path = temp_dir.keep();

        Ok(Self { path })
    }

    /// The scratch directory root (what Chrome gets as --user-data-dir).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchProfile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// Copy credential data from a real Chrome profile into a scratch
/// profile's `Default` subdirectory and synthesize the Local State stub.
///
/// The source profile is only ever read; the running browser may have it
/// open concurrently, so no locks are taken beyond the reads themselves.
/// A missing source file is skipped, any other copy failure is fatal.
pub fn clone_profile(source: &Path, scratch: &ScratchProfile) -> Result<()> {
    if !source.is_dir() {
        return Err(Error::ProfileNotFound(source.to_path_buf()));
    }

    let default_dir = scratch.path().join("Default");
    std::fs::create_dir_all(&default_dir).map_err(|e| Error::ProfileCopyFailed {
        file: "Default".to_string(),
        source: e,
    })?;

    for file in CREDENTIAL_FILES {
        let src = source.join(file);
        let dst = default_dir.join(file);

        match std::fs::copy(&src, &dst) {
            Ok(bytes) => tracing::debug!("Copied {} ({} bytes)", file, bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Skipping missing profile file: {}", file);
            }
            Err(e) => {
                return Err(Error::ProfileCopyFailed {
                    file: file.to_string(),
                    source: e,
                });
            }
        }
    }

    std::fs::write(scratch.path().join("Local State"), LOCAL_STATE_STUB).map_err(|e| {
        Error::ProfileCopyFailed {
            file: "Local State".to_string(),
            source: e,
        }
    })?;

    Ok(())
}
