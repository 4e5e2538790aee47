use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use thiserror::Error;

use crate::TOKEN_SLOT;

/// Failure of the medium behind a token slot
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Storage port for named string slots.
///
/// Adapters decide where a slot lives (process memory, a JSON file, the OS
/// keyring). Every method takes `&self`: the slot is process-wide shared state
/// and adapters provide their own interior mutability.
pub trait TokenStorage: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, slot: &str) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and by ephemeral CLI runs
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let slots = self
            .slots
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        slots.remove(slot);
        Ok(())
    }
}

/// JSON file holding a map of slot name to value.
/// The whole map is rewritten on every mutation.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match File::open(&self.path) {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents)
                    .map_err(|e| StorageError::Read(e.to_string()))?;
                if contents.trim().is_empty() {
                    return Ok(HashMap::new());
                }
                serde_json::from_str(&contents).map_err(|e| StorageError::Read(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    fn save(&self, slots: &HashMap<String, String>) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(slots)
            .map_err(|e| StorageError::Write(e.to_string()))?;
        File::create(&self.path)
            .and_then(|mut file| file.write_all(data.as_bytes()))
            .map_err(|e| StorageError::Write(e.to_string()))
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(self.load()?.remove(slot))
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut slots = self.load()?;
        slots.insert(slot.to_string(), value.to_string());
        self.save(&slots)
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut slots = self.load()?;
        if slots.remove(slot).is_some() {
            self.save(&slots)?;
        }
        Ok(())
    }
}

/// Holder of the single bearer token.
///
/// Last write wins. A missing token is the only unauthenticated signal: every
/// storage failure is logged and then treated as "absent", so callers never
/// see the difference between an empty slot and a broken medium.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    slot: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self::with_slot(storage, TOKEN_SLOT)
    }

    pub fn with_slot(storage: Arc<dyn TokenStorage>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
        }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn set_token(&self, value: &str) {
        if let Err(e) = self.storage.set(&self.slot, value) {
            warn!("Token write failed, slot={}: {}", self.slot, e);
        }
    }

    pub fn get_token(&self) -> Option<String> {
        match self.storage.get(&self.slot) {
            Ok(token) => token,
            Err(e) => {
                warn!("Token read failed, slot={}: {}", self.slot, e);
                None
            }
        }
    }

    pub fn remove_token(&self) {
        match self.storage.remove(&self.slot) {
            Ok(()) => debug!("Token slot cleared: {}", self.slot),
            Err(e) => warn!("Token removal failed, slot={}: {}", self.slot, e),
        }
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }
}
