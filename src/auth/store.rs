//! Durable token storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A persisted session.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub username: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        username: Option<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            username,
            issued_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("username", &self.username)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Where the bearer token survives between runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredToken>, StorageError>;
    fn save(&self, token: &StoredToken) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Process-local store. The default when no file is configured.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StorageError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &StoredToken) -> Result<(), StorageError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn save(&self, token: &StoredToken) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json =
            serde_json::to_string_pretty(token).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
