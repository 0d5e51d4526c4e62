//! Object model: attribute registry, classes and instances.
//!
//! - [`attribute`] - Attribute descriptors, flags and typed values
//! - [`class`] - Class metadata and per-class attribute tables
//!
//! Instances implement [`CipInstance`] and are owned by the
//! [`ObjectRegistry`], keyed by class code and instance number.

pub mod attribute;
pub mod class;

pub use attribute::{AttributeDescriptor, AttributeFlags, AttributeValue, CipType, Slot, ValueRange};
pub use class::{AttributeTable, CipClass, ClassBuilder, ClassMetadata};

use crate::core::error::{CipError, CipResult};
use crate::storage::Persistable;
use std::collections::BTreeMap;

/// A single object instance whose attributes are reachable through slots.
pub trait CipInstance: Send {
    /// Instance number within the class.
    fn instance_number(&self) -> u16;

    /// Read the value stored at a slot.
    fn read(&self, slot: Slot) -> Option<AttributeValue>;

    /// Write a value into a slot. Returns false if the slot is not backed.
    fn write(&mut self, slot: Slot, value: AttributeValue) -> bool;

    /// Non-volatile image of this instance, if it has one.
    fn persistable(&self) -> Option<&dyn Persistable> {
        None
    }

    /// Mutable non-volatile image of this instance, if it has one.
    fn persistable_mut(&mut self) -> Option<&mut dyn Persistable> {
        None
    }

    /// Make configured values visible to the data path.
    fn activate(&mut self) {}

    /// Restore configured values to compiled-in defaults.
    fn reset_to_defaults(&mut self) {}
}

/// Callback run after Set_Attribute_Single accepted a write.
pub trait PostSetHook: Send + Sync {
    /// Called synchronously before the response is returned.
    fn after_set(
        &self,
        class: &CipClass,
        instance: &dyn CipInstance,
        descriptor: &AttributeDescriptor,
        service: u8,
    ) -> CipResult<()>;
}

struct ClassEntry {
    class: CipClass,
    instances: BTreeMap<u16, Box<dyn CipInstance>>,
}

/// Registered classes and their instances.
#[derive(Default)]
pub struct ObjectRegistry {
    classes: BTreeMap<u16, ClassEntry>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class.
    pub fn register_class(&mut self, class: CipClass) -> CipResult<()> {
        let class_code = class.class_code();
        if self.classes.contains_key(&class_code) {
            return Err(CipError::DuplicateClass { class_code });
        }
        tracing::debug!(class = class_code, name = class.name(), "class registered");
        self.classes.insert(
            class_code,
            ClassEntry {
                class,
                instances: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Add an instance to a registered class.
    pub fn add_instance(&mut self, class_code: u16, instance: Box<dyn CipInstance>) -> CipResult<()> {
        let entry = self
            .classes
            .get_mut(&class_code)
            .ok_or(CipError::UnknownClass { class_code })?;

        let number = instance.instance_number();
        if entry.instances.contains_key(&number) {
            return Err(CipError::DuplicateInstance {
                class_code,
                instance: number,
            });
        }
        let limit = entry.class.metadata().instance_count;
        if entry.instances.len() >= limit as usize {
            return Err(CipError::InstanceLimit { class_code, limit });
        }
        entry.instances.insert(number, instance);
        Ok(())
    }

    /// Look up a class by code.
    pub fn class(&self, class_code: u16) -> Option<&CipClass> {
        self.classes.get(&class_code).map(|entry| &entry.class)
    }

    /// Look up an instance together with its class.
    pub fn instance(&self, class_code: u16, instance: u16) -> Option<(&CipClass, &dyn CipInstance)> {
        let entry = self.classes.get(&class_code)?;
        let inst: &dyn CipInstance = entry.instances.get(&instance)?.as_ref();
        Some((&entry.class, inst))
    }

    /// Look up an instance mutably together with its class.
    pub fn instance_mut(
        &mut self,
        class_code: u16,
        instance: u16,
    ) -> Option<(&CipClass, &mut dyn CipInstance)> {
        let entry = self.classes.get_mut(&class_code)?;
        let inst: &mut dyn CipInstance = entry.instances.get_mut(&instance)?.as_mut();
        Some((&entry.class, inst))
    }

    /// Visit every instance of every class, in class then instance order.
    pub fn for_each_instance_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&CipClass, &mut dyn CipInstance),
    {
        for entry in self.classes.values_mut() {
            for instance in entry.instances.values_mut() {
                f(&entry.class, instance.as_mut());
            }
        }
    }

    /// Registered class codes.
    pub fn class_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.classes.keys().copied()
    }
}
