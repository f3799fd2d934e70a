use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

const TOKEN_KEY: &str = "NLM_AUTH_TOKEN";
const COOKIES_KEY: &str = "NLM_COOKIES";
const PROFILE_KEY: &str = "NLM_BROWSER_PROFILE";

/// An extracted NotebookLM session: the auth token plus the serialized
/// cookie header. Both fields are non-empty whenever this is produced by
/// a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    pub auth_token: String,
    pub cookies: String,
}

impl AuthCredentials {
    /// Serialize as pretty-printed JSON for file or stdout output.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Credentials loaded back from the env file, including which browser
/// profile produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub credentials: AuthCredentials,
    pub profile: Option<String>,
}

/// Persists credentials to an env-style file (`KEY="value"` per line),
/// by default at `~/.nlm/env`.
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Store rooted at the default location, `~/.nlm`.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::NoHomeDir)?;
        Ok(Self::at(home.join(".nlm")))
    }

    /// Store rooted at a custom directory.
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the env file this store reads and writes.
    pub fn env_path(&self) -> PathBuf {
        self.dir.join("env")
    }

    /// Write credentials, replacing any previous contents. The directory
    /// is created if missing; on unix the file is chmod 0600.
    pub fn save(&self, credentials: &AuthCredentials, profile: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        // Preserve unrelated keys an operator may have added by hand.
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(_) => BTreeMap::new(),
        };
        entries.insert(COOKIES_KEY.to_string(), credentials.cookies.clone());
        entries.insert(TOKEN_KEY.to_string(), credentials.auth_token.clone());
        entries.insert(PROFILE_KEY.to_string(), profile.to_string());

        let mut content = String::new();
        for (key, value) in &entries {
            content.push_str(&format!("{}={:?}\n", key, value));
        }

        let path = self.env_path();
        std::fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!("Credentials written to {}", path.display());
        Ok(())
    }

    /// Load previously saved credentials. Returns `None` when the file is
    /// missing or does not hold a complete token/cookie pair.
    pub fn load(&self) -> Result<Option<StoredCredentials>> {
        let path = self.env_path();
        if !path.exists() {
            return Ok(None);
        }

        let entries = self.read_entries()?;
        let auth_token = entries.get(TOKEN_KEY).cloned().unwrap_or_default();
        let cookies = entries.get(COOKIES_KEY).cloned().unwrap_or_default();

        if auth_token.is_empty() || cookies.is_empty() {
            return Ok(None);
        }

        Ok(Some(StoredCredentials {
            credentials: AuthCredentials {
                auth_token,
                cookies,
            },
            profile: entries.get(PROFILE_KEY).cloned(),
        }))
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let mut entries = BTreeMap::new();
        let path = self.env_path();
        if !path.exists() {
            return Ok(entries);
        }

        let content = std::fs::read_to_string(&path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), unquote(value.trim()));
            }
        }
        Ok(entries)
    }
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        // Double-quoted values were written with escaping; undo it.
        if first == b'"' && last == b'"' {
            return unescape(&value[1..value.len() - 1]);
        }
        if first == b'\'' && last == b'\'' {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthCredentials {
        AuthCredentials {
            auth_token: "AHdy_token".to_string(),
            cookies: "SID=abc; HSID=def".to_string(),
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().join("nlm"));

        store.save(&sample(), "Default").unwrap();
        let stored = store.load().unwrap().expect("credentials present");

        assert_eq!(stored.credentials, sample());
        assert_eq!(stored.profile.as_deref(), Some("Default"));
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().join("nlm"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_incomplete_pair_returns_none() {
        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().to_path_buf());

        std::fs::write(store.env_path(), "NLM_AUTH_TOKEN=\"tok\"\n").unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_preserves_unrelated_keys() {
        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().to_path_buf());

        std::fs::write(store.env_path(), "NLM_CUSTOM=\"keep me\"\n").unwrap();
        store.save(&sample(), "Work").unwrap();

        let content = std::fs::read_to_string(store.env_path()).unwrap();
        assert!(content.contains("NLM_CUSTOM=\"keep me\""));
        assert!(content.contains("NLM_BROWSER_PROFILE=\"Work\""));
    }

    #[test]
    fn test_round_trips_values_with_quotes_and_backslashes() {
        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().to_path_buf());

        let credentials = AuthCredentials {
            auth_token: r#"to"k\en"#.to_string(),
            cookies: r#"a="1"; b=back\slash"#.to_string(),
        };
        store.save(&credentials, "Default").unwrap();

        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.credentials, credentials);
    }

    #[test]
    fn test_load_accepts_single_quoted_values() {
        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().to_path_buf());

        std::fs::write(
            store.env_path(),
            "NLM_AUTH_TOKEN='tok'\nNLM_COOKIES='a=1; b=2'\n",
        )
        .unwrap();

        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.credentials.auth_token, "tok");
        assert_eq!(stored.credentials.cookies, "a=1; b=2");
    }

    #[cfg(unix)]
    #[test]
    fn test_env_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(temp.path().join("nlm"));
        store.save(&sample(), "Default").unwrap();

        let mode = std::fs::metadata(store.env_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
