//! Persistent key-value storage for session credentials.
//!
//! This module provides:
//! - `KeyValueStore`: the storage seam used by the session store and the
//!   request pipeline
//! - `FileStore`: a JSON file in the cache directory
//! - `KeychainStore`: OS-level secure storage via keyring
//! - `MemoryStore`: an in-process map for tests and throwaway sessions
//!
//! The core only ever touches one key, [`TOKEN_KEY`].

pub mod file;
pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),
}

/// A process-wide string key-value store that survives restarts.
///
/// Removing a key that is not present is not an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
