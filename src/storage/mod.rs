//! Non-volatile data handling.
//!
//! - [`nvdata`] - Boot-time load-or-default and the post-set store hook
//! - [`backend`] - File and in-memory storage collaborators
//!
//! Objects describe their durable image through [`Persistable`]; storage
//! backends move opaque bytes through [`NvStorage`]. The coordinator in
//! [`nvdata`] joins the two and never touches the medium directly.

pub mod backend;
pub mod nvdata;

pub use backend::{FileStorage, MemoryStorage};
pub use nvdata::{NvData, NvStatus};

use thiserror::Error;

/// Errors reported by storage backends and object images.
#[derive(Debug, Error)]
pub enum NvError {
    /// No record exists for the key.
    #[error("no NV record for {key}")]
    NotFound { key: String },

    /// Record exists but cannot be decoded or fails validation.
    #[error("corrupt NV record for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Medium I/O failure.
    #[error("NV I/O failure for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Object image could not be encoded.
    #[error("failed to encode NV record for {key}: {message}")]
    Encode { key: String, message: String },
}

impl NvError {
    /// Create a Corrupt error.
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the record is simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// An object with a durable configuration image.
pub trait Persistable {
    /// Storage key identifying this object's record.
    fn nv_key(&self) -> &str;

    /// Encode the configured values.
    fn encode_nv(&self) -> Result<Vec<u8>, NvError>;

    /// Replace the configured values from a record.
    ///
    /// Must leave the object untouched when it returns an error.
    fn decode_nv(&mut self, bytes: &[u8]) -> Result<(), NvError>;
}

/// Durable medium for object records.
pub trait NvStorage: Send + Sync {
    /// Read the record stored under `key`.
    fn load(&self, key: &str) -> Result<Vec<u8>, NvError>;

    /// Replace the record stored under `key`.
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), NvError>;
}
