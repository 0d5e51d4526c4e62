//! Error types and general status mapping.
//!
//! Two layers of errors live here:
//! - [`GeneralStatus`] is the closed CIP status taxonomy returned to the
//!   requester. Attribute services use it as their `Err` type so every
//!   failure still yields a well-formed response.
//! - [`CipError`] covers failures inside the device: class registration
//!   mistakes and persistence problems. These never reach the wire.

use crate::storage::NvError;
use thiserror::Error;

/// CIP general status codes surfaced in a message router response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u8)]
pub enum GeneralStatus {
    /// Service completed.
    #[error("success")]
    Success = 0x00,

    /// Class or instance addressed by the request path does not exist.
    #[error("path destination unknown")]
    PathDestinationUnknown = 0x05,

    /// The class does not implement the requested service.
    #[error("service not supported")]
    ServiceNotSupported = 0x08,

    /// Value is outside the attribute's accepted range.
    #[error("invalid attribute value")]
    InvalidAttributeValue = 0x09,

    /// Request data is too short, or the attribute has no bound storage.
    #[error("not enough data")]
    NotEnoughData = 0x13,

    /// Attribute is unknown or the service is not permitted on it.
    #[error("attribute not supported")]
    AttributeNotSupported = 0x14,
}

impl GeneralStatus {
    /// Wire value of this status.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Check if this status reports success.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<GeneralStatus> for u8 {
    fn from(status: GeneralStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for GeneralStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Success),
            0x05 => Ok(Self::PathDestinationUnknown),
            0x08 => Ok(Self::ServiceNotSupported),
            0x09 => Ok(Self::InvalidAttributeValue),
            0x13 => Ok(Self::NotEnoughData),
            0x14 => Ok(Self::AttributeNotSupported),
            other => Err(other),
        }
    }
}

/// Internal device errors.
#[derive(Debug, Error)]
pub enum CipError {
    /// Attribute number registered twice in one class.
    #[error("class 0x{class_code:02x}: attribute {attribute} registered twice")]
    DuplicateAttribute { class_code: u16, attribute: u16 },

    /// Attribute number is zero or above the class's declared highest number.
    #[error("class 0x{class_code:02x}: attribute {attribute} outside 1..={highest}")]
    AttributeOutOfRange {
        class_code: u16,
        attribute: u16,
        highest: u16,
    },

    /// Registered attributes do not match the declared instance attribute count.
    #[error("class 0x{class_code:02x}: declared {declared} instance attributes, registered {registered}")]
    AttributeCountMismatch {
        class_code: u16,
        declared: u16,
        registered: u16,
    },

    /// Class code registered twice with the message router.
    #[error("class 0x{class_code:02x} already registered")]
    DuplicateClass { class_code: u16 },

    /// Instance added to a class that was never registered.
    #[error("class 0x{class_code:02x} is not registered")]
    UnknownClass { class_code: u16 },

    /// Instance number registered twice within a class.
    #[error("class 0x{class_code:02x}: instance {instance} already exists")]
    DuplicateInstance { class_code: u16, instance: u16 },

    /// Instance count would exceed the class metadata.
    #[error("class 0x{class_code:02x}: instance limit {limit} reached")]
    InstanceLimit { class_code: u16, limit: u16 },

    /// Persistence collaborator failure.
    #[error("persistence failure: {0}")]
    Persistence(#[from] NvError),
}

/// Result type using CipError.
pub type CipResult<T> = Result<T, CipError>;
