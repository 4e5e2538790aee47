use keyring::{Entry, Error as KeyringError};

use crate::modules::auth::store::{StorageError, TokenStorage};

/// Default keyring service name for token slots
pub const KEYRING_SERVICE: &str = "colombo-auth";

/// Token storage backed by the system keyring.
/// Each slot maps to one keyring entry under the configured service name.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, slot: &str) -> Result<Entry, StorageError> {
        // Entry creation fails when no keyring backend is available
        Entry::new(&self.service, slot).map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for KeyringStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match self.entry(slot)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        self.entry(slot)?
            .set_password(value)
            .map_err(|e| StorageError::Write(e.to_string()))
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        match self.entry(slot)?.delete_password() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Write(e.to_string())),
        }
    }
}
