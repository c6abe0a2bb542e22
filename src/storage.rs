use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::FrontDeskError;

/// Key under which the logged in user is kept in session storage.
pub const SESSION_USER_KEY: &str = "user";
/// Key of the persisted auth snapshot in local storage.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// String key/value storage in the shape of browser web storage.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), FrontDeskError>;
    fn remove_item(&self, key: &str) -> Result<(), FrontDeskError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), FrontDeskError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), FrontDeskError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// One file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FileStorage {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match std::fs::read_to_string(self.path_of(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("cannot read storage key {}: {}", key, e);
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), FrontDeskError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.path_of(key), value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), FrontDeskError> {
        match std::fs::remove_file(self.path_of(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
