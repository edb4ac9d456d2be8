//! Browser-style key/value persistence.
//!
//! Every value is stored as a JSON envelope `{ value, timestamp, expiry }`
//! under the `yapee_` prefix. Envelopes can carry a TTL and can be sealed
//! so the stored text does not expose the value.

pub mod backend;
pub mod cipher;
pub mod envelope;
mod local;

use thiserror::Error;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use cipher::Cipher;
pub use envelope::{Envelope, StorageConfig};
pub use local::{LocalStorage, StorageItemStat, StorageStats};

pub const KEY_PREFIX: &str = "yapee_";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sealed value could not be opened")]
    Decrypt,

    #[error("invalid backup: {0}")]
    InvalidBackup(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
