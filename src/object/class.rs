//! Class metadata, attribute tables and class registration.

use super::attribute::AttributeDescriptor;
use super::PostSetHook;
use crate::core::error::{CipError, CipResult};
use crate::service::{ServiceCode, ServiceHandler, ServiceTable};
use std::fmt;
use std::sync::Arc;

/// Counts and identity supplied once when a class is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    /// Class code (e.g. 0x48 for QoS).
    pub class_code: u16,
    /// Human-readable class name.
    pub name: String,
    /// Class revision.
    pub revision: u16,
    /// Number of class attributes.
    pub class_attribute_count: u16,
    /// Highest class attribute number.
    pub highest_class_attribute: u16,
    /// Number of class services.
    pub class_service_count: u16,
    /// Number of instance attributes.
    pub instance_attribute_count: u16,
    /// Highest instance attribute number.
    pub highest_instance_attribute: u16,
    /// Number of instance services.
    pub instance_service_count: u16,
    /// Number of instances.
    pub instance_count: u16,
}

/// Instance attribute descriptors indexed directly by attribute number.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    entries: Vec<Option<AttributeDescriptor>>,
    len: u16,
}

impl AttributeTable {
    /// Create an empty table able to hold attributes `1..=highest`.
    pub fn with_highest(highest: u16) -> Self {
        Self {
            entries: vec![None; highest as usize + 1],
            len: 0,
        }
    }

    fn insert(&mut self, class_code: u16, descriptor: AttributeDescriptor) -> CipResult<()> {
        let number = descriptor.number;
        let highest = self.entries.len().saturating_sub(1) as u16;
        if number == 0 || number > highest {
            return Err(CipError::AttributeOutOfRange {
                class_code,
                attribute: number,
                highest,
            });
        }

        let entry = &mut self.entries[number as usize];
        if entry.is_some() {
            return Err(CipError::DuplicateAttribute {
                class_code,
                attribute: number,
            });
        }
        *entry = Some(descriptor);
        self.len += 1;
        Ok(())
    }

    /// Look up an attribute by number.
    pub fn resolve(&self, number: u16) -> Option<&AttributeDescriptor> {
        self.entries.get(number as usize).and_then(Option::as_ref)
    }

    /// Number of registered attributes.
    pub fn len(&self) -> u16 {
        self.len
    }

    /// Check if no attributes are registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate registered descriptors in attribute-number order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.entries.iter().filter_map(Option::as_ref)
    }
}

/// A registered class: metadata, instance attributes, services and hooks.
pub struct CipClass {
    metadata: ClassMetadata,
    attributes: AttributeTable,
    services: ServiceTable,
    post_set: Option<Arc<dyn PostSetHook>>,
}

impl CipClass {
    /// Start building a class from its metadata.
    pub fn builder(metadata: ClassMetadata) -> ClassBuilder {
        ClassBuilder::new(metadata)
    }

    /// Class metadata.
    pub fn metadata(&self) -> &ClassMetadata {
        &self.metadata
    }

    /// Class code.
    pub fn class_code(&self) -> u16 {
        self.metadata.class_code
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Resolve an instance attribute descriptor.
    pub fn resolve(&self, attribute: u16) -> Option<&AttributeDescriptor> {
        self.attributes.resolve(attribute)
    }

    /// Instance attribute table.
    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Handler registered for a service code.
    pub fn service(&self, service: u8) -> Option<Arc<dyn ServiceHandler>> {
        self.services.get(service)
    }

    /// Hook invoked after an accepted write to an NV attribute.
    pub fn post_set_hook(&self) -> Option<&Arc<dyn PostSetHook>> {
        self.post_set.as_ref()
    }
}

impl fmt::Debug for CipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipClass")
            .field("metadata", &self.metadata)
            .field("attributes", &self.attributes)
            .field("services", &self.services)
            .field("post_set", &self.post_set.is_some())
            .finish()
    }
}

/// Builder that validates a class against its metadata.
pub struct ClassBuilder {
    metadata: ClassMetadata,
    attributes: Vec<AttributeDescriptor>,
    services: ServiceTable,
    post_set: Option<Arc<dyn PostSetHook>>,
}

impl ClassBuilder {
    fn new(metadata: ClassMetadata) -> Self {
        Self {
            metadata,
            attributes: Vec::new(),
            services: ServiceTable::default(),
            post_set: None,
        }
    }

    /// Add an instance attribute.
    pub fn attribute(mut self, descriptor: AttributeDescriptor) -> Self {
        self.attributes.push(descriptor);
        self
    }

    /// Register a service handler.
    pub fn service(mut self, code: ServiceCode, handler: Arc<dyn ServiceHandler>) -> Self {
        self.services.insert(code, handler);
        self
    }

    /// Install the post-set hook.
    pub fn post_set_hook(mut self, hook: Arc<dyn PostSetHook>) -> Self {
        self.post_set = Some(hook);
        self
    }

    /// Validate and freeze the class.
    pub fn build(self) -> CipResult<CipClass> {
        let class_code = self.metadata.class_code;
        let mut table = AttributeTable::with_highest(self.metadata.highest_instance_attribute);
        for descriptor in self.attributes {
            if !descriptor.range.fits(descriptor.data_type) {
                tracing::warn!(
                    class = class_code,
                    attribute = descriptor.number,
                    data_type = %descriptor.data_type,
                    "accepted range exceeds storage width; writes will truncate"
                );
            }
            table.insert(class_code, descriptor)?;
        }

        if table.len() != self.metadata.instance_attribute_count {
            return Err(CipError::AttributeCountMismatch {
                class_code,
                declared: self.metadata.instance_attribute_count,
                registered: table.len(),
            });
        }

        if self.services.len() != self.metadata.instance_service_count as usize {
            tracing::warn!(
                class = class_code,
                declared = self.metadata.instance_service_count,
                registered = self.services.len(),
                "instance service count differs from metadata"
            );
        }

        Ok(CipClass {
            metadata: self.metadata,
            attributes: table,
            services: self.services,
            post_set: self.post_set,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::attribute::{AttributeFlags, CipType, Slot};

    fn metadata(count: u16, highest: u16) -> ClassMetadata {
        ClassMetadata {
            class_code: 0x64,
            name: "Test".to_string(),
            revision: 1,
            class_attribute_count: 0,
            highest_class_attribute: 0,
            class_service_count: 0,
            instance_attribute_count: count,
            highest_instance_attribute: highest,
            instance_service_count: 0,
            instance_count: 1,
        }
    }

    #[test]
    fn resolve_by_number() {
        let class = CipClass::builder(metadata(2, 5))
            .attribute(
                AttributeDescriptor::new(2, CipType::Usint)
                    .bound_to(Slot(0))
                    .with_flags(AttributeFlags::GETTABLE),
            )
            .attribute(AttributeDescriptor::new(5, CipType::Uint))
            .build()
            .unwrap();

        assert_eq!(class.resolve(2).map(|d| d.number), Some(2));
        assert_eq!(class.resolve(5).map(|d| d.data_type), Some(CipType::Uint));
        assert!(class.resolve(1).is_none());
        assert!(class.resolve(0).is_none());
        assert!(class.resolve(6).is_none());
        assert!(class.resolve(u16::MAX).is_none());
        assert_eq!(class.attributes().iter().count(), 2);
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let result = CipClass::builder(metadata(2, 3))
            .attribute(AttributeDescriptor::new(1, CipType::Usint))
            .attribute(AttributeDescriptor::new(1, CipType::Usint))
            .build();
        assert!(matches!(
            result,
            Err(CipError::DuplicateAttribute { attribute: 1, .. })
        ));
    }

    #[test]
    fn attribute_above_highest_rejected() {
        let result = CipClass::builder(metadata(1, 3))
            .attribute(AttributeDescriptor::new(4, CipType::Usint))
            .build();
        assert!(matches!(
            result,
            Err(CipError::AttributeOutOfRange {
                attribute: 4,
                highest: 3,
                ..
            })
        ));
    }

    #[test]
    fn attribute_zero_rejected() {
        let result = CipClass::builder(metadata(1, 3))
            .attribute(AttributeDescriptor::new(0, CipType::Usint))
            .build();
        assert!(matches!(
            result,
            Err(CipError::AttributeOutOfRange { attribute: 0, .. })
        ));
    }

    #[test]
    fn attribute_count_must_match_metadata() {
        let result = CipClass::builder(metadata(2, 3))
            .attribute(AttributeDescriptor::new(1, CipType::Usint))
            .build();
        assert!(matches!(
            result,
            Err(CipError::AttributeCountMismatch {
                declared: 2,
                registered: 1,
                ..
            })
        ));
    }
}
