//! Token persistence.
//!
//! The session token lives apart from general settings so that a single
//! record survives host restarts without touching user configuration.
//! A record is always written as one JSON object holding both token and
//! expiry; there is no way to persist one without the other.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use alist_models::TokenRecord;
use tracing::debug;

use crate::error::SdkError;
use crate::settings::config_dir;

const TOKEN_FILE: &str = "token.json";

/// Storage for the single persisted [`TokenRecord`].
pub trait TokenStore: Send + Sync {
    /// Read the record, `None` if nothing is stored.
    fn load(&self) -> Result<Option<TokenRecord>, SdkError>;

    /// Replace the stored record.
    fn save(&self, record: &TokenRecord) -> Result<(), SdkError>;

    /// Remove the stored record; succeeds if there was none.
    fn clear(&self) -> Result<(), SdkError>;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// [`TokenStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the record at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the record in the per-user configuration directory.
    pub fn default_location() -> Result<Self, SdkError> {
        let dir = config_dir()
            .ok_or_else(|| SdkError::Config("could not determine config directory".into()))?;
        Ok(Self::new(dir.join(TOKEN_FILE)))
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenRecord>, SdkError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    fn save(&self, record: &TokenRecord) -> Result<(), SdkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves half a record behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "token record saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SdkError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "token record removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

/// In-memory [`TokenStore`] for tests and hosts without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<TokenRecord>>,
}

impl MemoryTokenStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `record`.
    pub fn with_record(record: TokenRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenRecord>, SdkError> {
        Ok(self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, record: &TokenRecord) -> Result<(), SdkError> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SdkError> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
