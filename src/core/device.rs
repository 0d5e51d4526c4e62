//! Device context.
//!
//! The device owns everything the management context may mutate: the object
//! registry (configured values), the message router and the NV coordinator.
//! The data path only ever receives [`ActiveDscp`] handles.
//!
//! Boot order: register classes → load NV data (or store defaults) →
//! activate, so the active generation starts as a copy of what was loaded.

use crate::core::config::Config;
use crate::object::{AttributeDescriptor, AttributeValue, ObjectRegistry, PostSetHook};
use crate::qos::{self, ActiveDscp};
use crate::service::{MessageRouter, MessageRouterRequest, MessageRouterResponse, RequestPath};
use crate::storage::{FileStorage, MemoryStorage, NvData, NvStatus, NvStorage};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Identity object reset types that affect configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    /// Emulate a power cycle: activate configured values.
    PowerCycle = 0,
    /// Restore defaults, persist them, then activate.
    FactoryDefaults = 1,
}

impl TryFrom<u8> for ResetType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::PowerCycle),
            1 => Ok(Self::FactoryDefaults),
            other => Err(other),
        }
    }
}

/// Registered attribute with its current configured value.
#[derive(Debug, Clone)]
pub struct AttributeEntry {
    pub descriptor: AttributeDescriptor,
    pub value: Option<AttributeValue>,
}

/// A booted device.
pub struct Device {
    name: String,
    router: MessageRouter,
    nv: NvData,
    dscp: ActiveDscp,
    boot_status: NvStatus,
}

impl Device {
    /// Register all objects, load NV data and activate.
    pub fn boot(name: impl Into<String>, storage: Arc<dyn NvStorage>) -> Result<Self> {
        let name = name.into();
        let nv = NvData::new(storage);
        let hook: Arc<dyn PostSetHook> = Arc::new(nv.clone());

        let mut registry = ObjectRegistry::new();
        let dscp = qos::register_qos_class(&mut registry, Some(hook))
            .context("failed to register QoS class")?;

        let boot_status = nv.load_or_default(&mut registry);
        if !boot_status.is_ok() {
            tracing::warn!(device = %name, "one or more objects booted with default configuration");
        }

        let mut device = Self {
            name,
            router: MessageRouter::new(registry),
            nv,
            dscp,
            boot_status,
        };
        device.activate();

        tracing::info!(
            device = %device.name,
            classes = device.registry().class_codes().count(),
            nv = %device.boot_status,
            "device booted"
        );
        Ok(device)
    }

    /// Boot with the storage backend named in the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn NvStorage> = match config.storage.backend.as_str() {
            "memory" => Arc::new(MemoryStorage::new()),
            "file" => Arc::new(FileStorage::new(&config.storage.dir)),
            other => anyhow::bail!("unsupported storage backend: {}", other),
        };
        Self::boot(config.device.name.clone(), storage)
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outcome of boot-time NV loading.
    pub fn boot_status(&self) -> NvStatus {
        self.boot_status
    }

    /// Object registry.
    pub fn registry(&self) -> &ObjectRegistry {
        self.router.registry()
    }

    /// NV coordinator.
    pub fn nv(&self) -> &NvData {
        &self.nv
    }

    /// Data-path handle to the active DSCP values.
    pub fn dscp(&self) -> ActiveDscp {
        self.dscp.clone()
    }

    /// Process one explicit request to completion.
    pub fn dispatch(&mut self, request: &MessageRouterRequest) -> MessageRouterResponse {
        self.router.dispatch(request)
    }

    /// Get_Attribute_Single convenience wrapper.
    pub fn get_attribute_single(&mut self, path: RequestPath) -> MessageRouterResponse {
        self.dispatch(&MessageRouterRequest::get_attribute_single(path))
    }

    /// Set_Attribute_Single convenience wrapper.
    pub fn set_attribute_single(&mut self, path: RequestPath, value: i32) -> MessageRouterResponse {
        self.dispatch(&MessageRouterRequest::set_attribute_single(path, value))
    }

    /// Make every object's configured values active.
    pub fn activate(&mut self) {
        self.router
            .registry_mut()
            .for_each_instance_mut(|_, instance| instance.activate());
    }

    /// Restore every object's configured values to defaults without activating.
    pub fn reset_to_defaults(&mut self) {
        self.router
            .registry_mut()
            .for_each_instance_mut(|_, instance| instance.reset_to_defaults());
    }

    /// Apply an identity reset.
    pub fn identity_reset(&mut self, reset: ResetType) -> NvStatus {
        tracing::info!(device = %self.name, ?reset, "identity reset");
        let status = match reset {
            ResetType::PowerCycle => NvStatus::Ok,
            ResetType::FactoryDefaults => {
                self.reset_to_defaults();
                self.nv.store_all(self.router.registry_mut())
            }
        };
        self.activate();
        status
    }

    /// Configured values of every attribute of an instance, ignoring access flags.
    pub fn attributes(&self, class_code: u16, instance: u16) -> Option<Vec<AttributeEntry>> {
        let (class, instance) = self.registry().instance(class_code, instance)?;
        let entries = class
            .attributes()
            .iter()
            .map(|descriptor| AttributeEntry {
                descriptor: descriptor.clone(),
                value: descriptor.slot.and_then(|slot| instance.read(slot)),
            })
            .collect();
        Some(entries)
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("boot_status", &self.boot_status)
            .field("active_dscp", &self.dscp.snapshot())
            .finish()
    }
}
