//! Durable key/value storage the session store writes through to.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store mirrors the whole session under `auth-storage`. The legacy
//! `user` and `token` keys are never written here, only cleared on logout
//! and when the request helper sees a 401, because older clients left them
//! behind.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

/// Key holding the serialized session blob.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";
/// Legacy flat user key.
pub const LEGACY_USER_KEY: &str = "user";
/// Legacy flat token key.
pub const LEGACY_TOKEN_KEY: &str = "token";

/// Every key associated with a session, in removal order.
pub const SESSION_KEYS: [&str; 3] = [AUTH_STORAGE_KEY, LEGACY_USER_KEY, LEGACY_TOKEN_KEY];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String key/value port. One writer per instance.
pub trait SessionStorage {
    /// Read a value; `Ok(None)` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key succeeds.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Remove every session key, continuing past failures.
///
/// # Errors
///
/// Returns the last error encountered; earlier keys are still attempted.
pub fn clear_session_keys<S: SessionStorage + ?Sized>(storage: &mut S) -> Result<(), StorageError> {
    let mut result = Ok(());
    for key in SESSION_KEYS {
        if let Err(e) = storage.remove_item(key) {
            tracing::warn!(key, error = %e, "failed to remove session key");
            result = Err(e);
        }
    }
    result
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// In-process storage; contents vanish with the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// One file per key under a directory.
///
/// Writes land in a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
