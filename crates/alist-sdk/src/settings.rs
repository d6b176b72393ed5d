//! User settings and credential lookup.
//!
//! Settings are a small camelCase JSON file in the per-user configuration
//! directory. Environment variables override individual fields:
//!
//! | Variable           | Overrides   |
//! |--------------------|-------------|
//! | `ALIST_SERVER_URL` | `serverUrl` |
//! | `ALIST_USERNAME`   | `username`  |
//! | `ALIST_PASSWORD`   | `password`  |
//!
//! The host's settings UI owns the file; this module only reads it (and
//! writes it on explicit request from tooling).

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use alist_models::Credentials;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

const APP_DIR: &str = "alist-preview";
const SETTINGS_FILE: &str = "settings.json";

/// Server address used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5244";

/// Per-user configuration directory for this application.
pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_DIR))
}

/// Source of the credentials used for (re-)login.
///
/// Implementations are asked again on every refresh, so edits made while
/// the host is running take effect on the next login.
pub trait CredentialProvider: Send + Sync {
    /// Current credentials; may be incomplete.
    fn credentials(&self) -> Result<Credentials, SdkError>;
}

impl CredentialProvider for Credentials {
    fn credentials(&self) -> Result<Credentials, SdkError> {
        Ok(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Persisted user settings.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// AList server base URL.
    pub server_url: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Settings {
    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SdkError> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| SdkError::Config(format!("invalid settings file {}: {e}", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SdkError::Config(format!(
                "cannot read settings file {}: {e}",
                path.display()
            ))),
        }
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SdkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(v) = lookup("ALIST_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("ALIST_USERNAME") {
            self.username = v;
        }
        if let Some(v) = lookup("ALIST_PASSWORD") {
            self.password = v;
        }
        self
    }

    /// The login credentials held by these settings.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.server_url, &self.username, &self.password)
    }
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

/// File-backed [`CredentialProvider`] that re-reads the settings file on
/// every request.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    env_overrides: bool,
}

impl SettingsStore {
    /// Read settings from `path`, with environment overrides applied.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_overrides: true,
        }
    }

    /// Settings file in the per-user configuration directory.
    pub fn default_location() -> Result<Self, SdkError> {
        let dir = config_dir()
            .ok_or_else(|| SdkError::Config("could not determine config directory".into()))?;
        Ok(Self::new(dir.join(SETTINGS_FILE)))
    }

    /// Ignore environment variables; only the file counts.
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current settings.
    pub fn load(&self) -> Result<Settings, SdkError> {
        let settings = Settings::load(&self.path)?;
        Ok(if self.env_overrides {
            settings.with_env_overrides()
        } else {
            settings
        })
    }
}

impl CredentialProvider for SettingsStore {
    fn credentials(&self) -> Result<Credentials, SdkError> {
        Ok(self.load()?.credentials())
    }
}
