//! cipattr - CIP attribute access and configuration commit.
//!
//! Device objects expose their configuration through a per-class attribute
//! table. Network requests read and write *configured* values through the
//! generic Get/Set_Attribute_Single services; the data path keeps reading
//! the *active* generation until the device activates the configuration.
//! Every accepted write to an NV attribute persists the whole object.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Explicit messaging (requests)                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Message Router                           │
//! │        class/instance lookup │ per-class service table          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                Get/Set_Attribute_Single services                │
//! │     permission │ range check │ typed slot write │ post-set      │
//! └─────────────────────────────────────────────────────────────────┘
//!                │                                   │
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │   Objects (configured)       │   │   NV coordinator              │
//! │   QoS 0x48 │ ...             │──▶│   load-or-default │ store     │
//! └──────────────────────────────┘   └──────────────────────────────┘
//!                │ activate
//! ┌──────────────────────────────┐
//! │   Active generation          │◀── data path (DSCP lookup)
//! └──────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::device`] - Device context: boot, dispatch, activation
//! - [`core::error`] - General status codes and internal errors
//! - [`object`] - Attribute descriptors, classes, instance registry
//! - [`service`] - Message router and attribute services
//! - [`qos`] - Quality of Service object and active DSCP handle
//! - [`storage`] - NV records, backends and the persistence coordinator
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod core;
pub mod object;
pub mod qos;
pub mod service;
pub mod storage;

pub use crate::core::config::Config;
pub use crate::core::device::{Device, ResetType};
pub use crate::core::error::{CipError, CipResult, GeneralStatus};
pub use crate::object::{AttributeDescriptor, AttributeFlags, AttributeValue, CipType};
pub use crate::qos::{ActiveDscp, ConnectionPriority, DscpValues};
pub use crate::service::{MessageRouterRequest, MessageRouterResponse, RequestPath, ServiceCode};
pub use crate::storage::{FileStorage, MemoryStorage, NvData, NvStatus, NvStorage};
