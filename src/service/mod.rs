//! Message router requests, responses and service dispatch.
//!
//! - [`attribute`] - Generic Get/Set_Attribute_Single handlers
//! - [`router`] - Class/instance/service resolution
//!
//! # Response Layout
//!
//! ```text
//! ┌──────────────┬──────────┬────────────────┬──────────────────┬──────────────────┬──────────┐
//! │ reply service│ reserved │ general status │ add. status size │ additional status│   data   │
//! │ svc | 0x80   │   0x00   │      u8        │   u8 (words)     │   u16 LE * n     │  bytes   │
//! └──────────────┴──────────┴────────────────┴──────────────────┴──────────────────┴──────────┘
//! ```

pub mod attribute;
pub mod router;

pub use attribute::{
    get_attribute_single, set_attribute_single, GetAttributeSingleHandler,
    SetAttributeSingleHandler,
};
pub use router::MessageRouter;

use crate::core::error::GeneralStatus;
use crate::object::{CipClass, CipInstance};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Bit set in the reply service code.
pub const REPLY_SERVICE_BIT: u8 = 0x80;

/// CIP common service codes handled by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ServiceCode {
    GetAttributeSingle = 0x0E,
    SetAttributeSingle = 0x10,
}

impl From<ServiceCode> for u8 {
    fn from(code: ServiceCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ServiceCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0E => Ok(Self::GetAttributeSingle),
            0x10 => Ok(Self::SetAttributeSingle),
            other => Err(other),
        }
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetAttributeSingle => write!(f, "Get_Attribute_Single"),
            Self::SetAttributeSingle => write!(f, "Set_Attribute_Single"),
        }
    }
}

/// Logical address of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestPath {
    pub class: u16,
    pub instance: u16,
    pub attribute: u16,
}

impl RequestPath {
    /// Create a new request path.
    pub fn new(class: u16, instance: u16, attribute: u16) -> Self {
        Self {
            class,
            instance,
            attribute,
        }
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class 0x{:02x} / instance {} / attribute {}",
            self.class, self.instance, self.attribute
        )
    }
}

/// A request delivered by the message router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRouterRequest {
    /// Requested service code.
    pub service: u8,
    /// Addressed attribute.
    pub path: RequestPath,
    /// Request data following the path.
    pub data: Bytes,
}

impl MessageRouterRequest {
    /// Create a Get_Attribute_Single request.
    pub fn get_attribute_single(path: RequestPath) -> Self {
        Self {
            service: ServiceCode::GetAttributeSingle.into(),
            path,
            data: Bytes::new(),
        }
    }

    /// Create a Set_Attribute_Single request carrying a 4-byte value.
    pub fn set_attribute_single(path: RequestPath, value: i32) -> Self {
        Self {
            service: ServiceCode::SetAttributeSingle.into(),
            path,
            data: Bytes::copy_from_slice(&value.to_le_bytes()),
        }
    }

    /// Create a Set_Attribute_Single request with raw request data.
    pub fn set_attribute_single_raw(path: RequestPath, data: impl Into<Bytes>) -> Self {
        Self {
            service: ServiceCode::SetAttributeSingle.into(),
            path,
            data: data.into(),
        }
    }
}

/// Response returned to the message router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRouterResponse {
    /// Request service with the reply bit set.
    pub reply_service: u8,
    /// General status.
    pub general_status: GeneralStatus,
    /// Additional status words.
    pub additional_status: Vec<u16>,
    /// Response data.
    pub data: Bytes,
}

impl MessageRouterResponse {
    /// Build the uniform response for a request: no additional status, no data.
    pub fn for_request(request: &MessageRouterRequest, status: GeneralStatus) -> Self {
        Self {
            reply_service: request.service | REPLY_SERVICE_BIT,
            general_status: status,
            additional_status: Vec::new(),
            data: Bytes::new(),
        }
    }

    /// Attach response data.
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// Size of the additional status in 16-bit words.
    pub fn size_of_additional_status(&self) -> u8 {
        self.additional_status.len() as u8
    }

    /// Response data length in bytes.
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    /// Encode to the explicit message reply layout.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            4 + 2 * self.additional_status.len() + self.data.len(),
        );
        buf.put_u8(self.reply_service);
        buf.put_u8(0);
        buf.put_u8(self.general_status.code());
        buf.put_u8(self.size_of_additional_status());
        for word in &self.additional_status {
            buf.put_u16_le(*word);
        }
        buf.put_slice(&self.data);
        buf.freeze()
    }
}

/// Handler for one service code on one class.
pub trait ServiceHandler: Send + Sync {
    /// Service name for diagnostics.
    fn name(&self) -> &'static str;

    /// Execute the service against an instance.
    fn handle(
        &self,
        class: &CipClass,
        instance: &mut dyn CipInstance,
        request: &MessageRouterRequest,
    ) -> MessageRouterResponse;
}

/// Per-class service table, resolved at class registration.
#[derive(Clone, Default)]
pub struct ServiceTable {
    handlers: BTreeMap<u8, Arc<dyn ServiceHandler>>,
}

impl ServiceTable {
    /// Register a handler, replacing any previous one for the code.
    pub fn insert(&mut self, code: ServiceCode, handler: Arc<dyn ServiceHandler>) {
        self.handlers.insert(code.into(), handler);
    }

    /// Handler for a raw service code.
    pub fn get(&self, code: u8) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.get(&code).cloned()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ServiceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(code, h)| (code, h.name())))
            .finish()
    }
}
