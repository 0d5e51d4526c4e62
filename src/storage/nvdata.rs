//! NV data coordinator.
//!
//! At boot every persistable instance is loaded from its record. A failed
//! load leaves the compiled-in defaults in place and immediately stores them
//! so the record matches memory once boot completes. After boot, every
//! accepted write to an NV attribute stores the whole object image again.

use super::{NvError, NvStorage, Persistable};
use crate::core::error::CipResult;
use crate::object::{AttributeDescriptor, CipClass, CipInstance, ObjectRegistry, PostSetHook};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Aggregate outcome of NV operations over several objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NvStatus {
    /// Every object succeeded.
    #[default]
    Ok,
    /// At least one object failed.
    Error,
}

impl NvStatus {
    /// Check if every object succeeded.
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl<T, E> From<&Result<T, E>> for NvStatus {
    fn from(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(_) => Self::Error,
        }
    }
}

impl BitOr for NvStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Ok, Self::Ok) => Self::Ok,
            _ => Self::Error,
        }
    }
}

impl BitOrAssign for NvStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl fmt::Display for NvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Joins persistable objects with a storage backend.
#[derive(Clone)]
pub struct NvData {
    storage: Arc<dyn NvStorage>,
}

impl NvData {
    /// Create a coordinator over a storage backend.
    pub fn new(storage: Arc<dyn NvStorage>) -> Self {
        Self { storage }
    }

    /// Load one object's configured values from its record.
    pub fn load(&self, object: &mut dyn Persistable) -> Result<(), NvError> {
        let bytes = self.storage.load(object.nv_key())?;
        object.decode_nv(&bytes)
    }

    /// Store one object's configured values.
    pub fn store(&self, object: &dyn Persistable) -> Result<(), NvError> {
        let bytes = object.encode_nv()?;
        self.storage.store(object.nv_key(), &bytes)
    }

    /// Load every persistable instance, falling back to defaults on failure.
    ///
    /// Objects are processed independently; one failure never stops the
    /// rest. The result is `Error` if any object fell back or failed to store.
    pub fn load_or_default(&self, registry: &mut ObjectRegistry) -> NvStatus {
        let mut status = NvStatus::Ok;
        registry.for_each_instance_mut(|class, instance| {
            let number = instance.instance_number();
            let Some(object) = instance.persistable_mut() else {
                return;
            };

            let loaded = self.load(object);
            status |= NvStatus::from(&loaded);
            match loaded {
                Ok(()) => {
                    tracing::debug!(
                        class = class.name(),
                        instance = number,
                        key = object.nv_key(),
                        "NV data loaded"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        class = class.name(),
                        instance = number,
                        key = object.nv_key(),
                        error = %e,
                        "NV data load failed; storing defaults"
                    );
                    let stored = self.store(&*object);
                    status |= NvStatus::from(&stored);
                    if let Err(e) = stored {
                        tracing::warn!(
                            key = object.nv_key(),
                            error = %e,
                            "failed to store default NV data"
                        );
                    }
                }
            }
        });
        status
    }

    /// Store every persistable instance.
    pub fn store_all(&self, registry: &mut ObjectRegistry) -> NvStatus {
        let mut status = NvStatus::Ok;
        registry.for_each_instance_mut(|_, instance| {
            if let Some(object) = instance.persistable() {
                let stored = self.store(object);
                status |= NvStatus::from(&stored);
                if let Err(e) = stored {
                    tracing::warn!(key = object.nv_key(), error = %e, "NV store failed");
                }
            }
        });
        status
    }
}

impl fmt::Debug for NvData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NvData").finish_non_exhaustive()
    }
}

impl PostSetHook for NvData {
    fn after_set(
        &self,
        class: &CipClass,
        instance: &dyn CipInstance,
        descriptor: &AttributeDescriptor,
        service: u8,
    ) -> CipResult<()> {
        if !descriptor.is_nv() {
            return Ok(());
        }
        let Some(object) = instance.persistable() else {
            return Ok(());
        };

        tracing::info!(
            class = class.name(),
            instance = instance.instance_number(),
            attribute = descriptor.number,
            service,
            "NV data update"
        );
        self.store(object)?;
        Ok(())
    }
}
