//! Quality of Service object (class 0x48).
//!
//! The QoS object holds the DSCP markings applied to outgoing traffic per
//! connection priority. Network writes change the configured values only;
//! the data path keeps using the active generation until the device
//! activates the configuration (identity reset).
//!
//! | Attr | Field                | Default | Access           |
//! |------|----------------------|---------|------------------|
//! | 1    | 802.1Q tag enable    | false   | NV               |
//! | 2    | DSCP PTP event       | 59      | NV               |
//! | 3    | DSCP PTP general     | 47      | NV               |
//! | 4    | DSCP urgent          | 55      | get, set, NV     |
//! | 5    | DSCP scheduled       | 47      | get, set, NV     |
//! | 6    | DSCP high            | 43      | get, set, NV     |
//! | 7    | DSCP low             | 31      | get, set, NV     |
//! | 8    | DSCP explicit        | 27      | get, set, NV     |

pub mod active;

pub use active::{ActiveDscp, ConnectionPriority};

use crate::core::error::CipResult;
use crate::object::{
    AttributeDescriptor, AttributeFlags, AttributeValue, CipClass, CipInstance, CipType,
    ClassMetadata, ObjectRegistry, PostSetHook, Slot, ValueRange,
};
use crate::service::{GetAttributeSingleHandler, ServiceCode, SetAttributeSingleHandler};
use crate::storage::{NvError, Persistable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// QoS class code.
pub const QOS_CLASS_CODE: u16 = 0x48;

/// The single QoS instance.
pub const QOS_INSTANCE: u16 = 1;

/// NV record key of the QoS object.
pub const QOS_NV_KEY: &str = "qos";

/// DSCP values accepted from the network.
pub const DSCP_SETTABLE_RANGE: ValueRange = ValueRange::new(1, 62);

/// Largest DSCP codepoint (6 bits).
const DSCP_MAX: u8 = 63;

/// One DSCP marking per traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DscpValues {
    pub event: u8,
    pub general: u8,
    pub urgent: u8,
    pub scheduled: u8,
    pub high: u8,
    pub low: u8,
    pub explicit: u8,
}

impl DscpValues {
    /// Compiled-in defaults.
    pub const DEFAULT: Self = Self {
        event: 59,
        general: 47,
        urgent: 55,
        scheduled: 47,
        high: 43,
        low: 31,
        explicit: 27,
    };

    fn iter(&self) -> impl Iterator<Item = (&'static str, u8)> {
        [
            ("event", self.event),
            ("general", self.general),
            ("urgent", self.urgent),
            ("scheduled", self.scheduled),
            ("high", self.high),
            ("low", self.low),
            ("explicit", self.explicit),
        ]
        .into_iter()
    }
}

impl Default for DscpValues {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configured (network-writable) QoS parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QosConfig {
    pub q_frames_enable: bool,
    pub dscp: DscpValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QosField {
    QFramesEnable,
    Event,
    General,
    Urgent,
    Scheduled,
    High,
    Low,
    Explicit,
}

impl QosField {
    const ALL: [QosField; 8] = [
        Self::QFramesEnable,
        Self::Event,
        Self::General,
        Self::Urgent,
        Self::Scheduled,
        Self::High,
        Self::Low,
        Self::Explicit,
    ];

    fn slot(self) -> Slot {
        Slot(self as u16)
    }

    fn from_slot(slot: Slot) -> Option<Self> {
        Self::ALL.get(slot.0 as usize).copied()
    }

    fn attribute_number(self) -> u16 {
        self as u16 + 1
    }
}

/// The QoS object instance: configured values plus the active generation.
#[derive(Debug)]
pub struct QosObject {
    configured: QosConfig,
    active: ActiveDscp,
}

impl QosObject {
    /// Create an object holding defaults in both generations.
    pub fn new() -> Self {
        Self {
            configured: QosConfig::default(),
            active: ActiveDscp::new(DscpValues::DEFAULT),
        }
    }

    /// Configured values.
    pub fn configured(&self) -> &QosConfig {
        &self.configured
    }

    /// Handle to the active generation for the data path.
    pub fn active(&self) -> ActiveDscp {
        self.active.clone()
    }

    /// Copy the configured DSCP values into the active generation.
    pub fn activate(&mut self) {
        self.active.replace(self.configured.dscp);
        tracing::info!(dscp = ?self.configured.dscp, "QoS DSCP values activated");
    }

    /// Restore configured values to defaults. The active generation is unchanged.
    pub fn reset_to_defaults(&mut self) {
        self.configured = QosConfig::default();
    }

    fn field_mut(&mut self, field: QosField) -> Option<&mut u8> {
        let dscp = &mut self.configured.dscp;
        match field {
            QosField::QFramesEnable => None,
            QosField::Event => Some(&mut dscp.event),
            QosField::General => Some(&mut dscp.general),
            QosField::Urgent => Some(&mut dscp.urgent),
            QosField::Scheduled => Some(&mut dscp.scheduled),
            QosField::High => Some(&mut dscp.high),
            QosField::Low => Some(&mut dscp.low),
            QosField::Explicit => Some(&mut dscp.explicit),
        }
    }
}

impl Default for QosObject {
    fn default() -> Self {
        Self::new()
    }
}

impl CipInstance for QosObject {
    fn instance_number(&self) -> u16 {
        QOS_INSTANCE
    }

    fn read(&self, slot: Slot) -> Option<AttributeValue> {
        let dscp = &self.configured.dscp;
        let value = match QosField::from_slot(slot)? {
            QosField::QFramesEnable => {
                return Some(AttributeValue::Bool(self.configured.q_frames_enable));
            }
            QosField::Event => dscp.event,
            QosField::General => dscp.general,
            QosField::Urgent => dscp.urgent,
            QosField::Scheduled => dscp.scheduled,
            QosField::High => dscp.high,
            QosField::Low => dscp.low,
            QosField::Explicit => dscp.explicit,
        };
        Some(AttributeValue::Usint(value))
    }

    fn write(&mut self, slot: Slot, value: AttributeValue) -> bool {
        let Some(field) = QosField::from_slot(slot) else {
            return false;
        };
        match (field, value) {
            (QosField::QFramesEnable, AttributeValue::Bool(enable)) => {
                self.configured.q_frames_enable = enable;
                true
            }
            (field, AttributeValue::Usint(v)) => match self.field_mut(field) {
                Some(target) => {
                    *target = v;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn persistable(&self) -> Option<&dyn Persistable> {
        Some(self)
    }

    fn persistable_mut(&mut self) -> Option<&mut dyn Persistable> {
        Some(self)
    }

    fn activate(&mut self) {
        QosObject::activate(self);
    }

    fn reset_to_defaults(&mut self) {
        QosObject::reset_to_defaults(self);
    }
}

impl Persistable for QosObject {
    fn nv_key(&self) -> &str {
        QOS_NV_KEY
    }

    fn encode_nv(&self) -> Result<Vec<u8>, NvError> {
        bincode::serialize(&self.configured).map_err(|e| NvError::Encode {
            key: QOS_NV_KEY.to_string(),
            message: e.to_string(),
        })
    }

    fn decode_nv(&mut self, bytes: &[u8]) -> Result<(), NvError> {
        let record: QosConfig = bincode::deserialize(bytes)
            .map_err(|e| NvError::corrupt(QOS_NV_KEY, e.to_string()))?;

        if let Some((name, value)) = record.dscp.iter().find(|(_, v)| *v > DSCP_MAX) {
            return Err(NvError::corrupt(
                QOS_NV_KEY,
                format!("DSCP {} value {} exceeds {}", name, value, DSCP_MAX),
            ));
        }

        self.configured = record;
        Ok(())
    }
}

/// Class metadata of the QoS object.
pub fn qos_class_metadata() -> ClassMetadata {
    ClassMetadata {
        class_code: QOS_CLASS_CODE,
        name: "Quality of Service".to_string(),
        revision: 1,
        class_attribute_count: 0,
        highest_class_attribute: 7,
        class_service_count: 0,
        instance_attribute_count: 8,
        highest_instance_attribute: 8,
        instance_service_count: 2,
        instance_count: 1,
    }
}

/// Build the QoS class with its attribute table and services.
pub fn qos_class(post_set: Option<Arc<dyn PostSetHook>>) -> CipResult<CipClass> {
    let settable = AttributeFlags::GETTABLE | AttributeFlags::SETTABLE | AttributeFlags::NV_DATA;

    let mut builder = CipClass::builder(qos_class_metadata())
        .service(ServiceCode::GetAttributeSingle, Arc::new(GetAttributeSingleHandler))
        .service(ServiceCode::SetAttributeSingle, Arc::new(SetAttributeSingleHandler));

    for field in QosField::ALL {
        let descriptor = match field {
            QosField::QFramesEnable => AttributeDescriptor::new(field.attribute_number(), CipType::Bool)
                .with_flags(AttributeFlags::NV_DATA),
            QosField::Event | QosField::General => {
                AttributeDescriptor::new(field.attribute_number(), CipType::Usint)
                    .with_flags(AttributeFlags::NV_DATA)
                    .with_range(DSCP_SETTABLE_RANGE)
            }
            _ => AttributeDescriptor::new(field.attribute_number(), CipType::Usint)
                .with_flags(settable)
                .with_range(DSCP_SETTABLE_RANGE),
        };
        builder = builder.attribute(descriptor.bound_to(field.slot()));
    }

    if let Some(hook) = post_set {
        builder = builder.post_set_hook(hook);
    }
    builder.build()
}

/// Register the QoS class and its instance; returns the data-path handle.
pub fn register_qos_class(
    registry: &mut ObjectRegistry,
    post_set: Option<Arc<dyn PostSetHook>>,
) -> CipResult<ActiveDscp> {
    let object = QosObject::new();
    let active = object.active();
    registry.register_class(qos_class(post_set)?)?;
    registry.add_instance(QOS_CLASS_CODE, Box::new(object))?;
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GeneralStatus;
    use crate::service::{get_attribute_single, set_attribute_single};

    fn set(class: &CipClass, qos: &mut QosObject, attribute: u16, value: i32) -> Result<(), GeneralStatus> {
        set_attribute_single(class, qos, attribute, &value.to_le_bytes()).map(|_| ())
    }

    #[test]
    fn class_matches_metadata() {
        let class = qos_class(None).unwrap();
        assert_eq!(class.class_code(), 0x48);
        assert_eq!(class.name(), "Quality of Service");
        assert_eq!(class.attributes().len(), 8);
        for number in 1..=3 {
            let desc = class.resolve(number).unwrap();
            assert!(!desc.is_gettable() && !desc.is_settable() && desc.is_nv());
        }
        for number in 4..=8 {
            let desc = class.resolve(number).unwrap();
            assert!(desc.is_gettable() && desc.is_settable() && desc.is_nv());
            assert_eq!(desc.range, DSCP_SETTABLE_RANGE);
        }
    }

    #[test]
    fn each_settable_attribute_hits_its_field() {
        let class = qos_class(None).unwrap();
        let mut qos = QosObject::new();
        for (attribute, value) in [(4, 10), (5, 11), (6, 12), (7, 13), (8, 14)] {
            set(&class, &mut qos, attribute, value).unwrap();
        }
        let dscp = qos.configured().dscp;
        assert_eq!(
            (dscp.urgent, dscp.scheduled, dscp.high, dscp.low, dscp.explicit),
            (10, 11, 12, 13, 14)
        );
        assert_eq!((dscp.event, dscp.general), (59, 47));
    }

    #[test]
    fn get_reports_configured_not_active() {
        let class = qos_class(None).unwrap();
        let mut qos = QosObject::new();
        set(&class, &mut qos, 4, 40).unwrap();
        assert_eq!(&get_attribute_single(&class, &qos, 4).unwrap()[..], &[40]);
        assert_eq!(qos.active().lookup(ConnectionPriority::Urgent), 55);
    }

    #[test]
    fn reset_leaves_active_alone() {
        let class = qos_class(None).unwrap();
        let mut qos = QosObject::new();
        set(&class, &mut qos, 7, 20).unwrap();
        qos.activate();
        qos.reset_to_defaults();

        assert_eq!(qos.configured(), &QosConfig::default());
        assert_eq!(qos.active().lookup(ConnectionPriority::Low), 20);

        qos.activate();
        assert_eq!(qos.active().lookup(ConnectionPriority::Low), 31);
    }

    #[test]
    fn nv_record_round_trip() {
        let mut qos = QosObject::new();
        qos.configured.q_frames_enable = true;
        qos.configured.dscp.high = 12;
        let bytes = qos.encode_nv().unwrap();

        let mut restored = QosObject::new();
        restored.decode_nv(&bytes).unwrap();
        assert_eq!(restored.configured(), qos.configured());
    }

    #[test]
    fn nv_record_with_invalid_dscp_rejected() {
        let mut bad = QosConfig::default();
        bad.dscp.event = 64;
        let bytes = bincode::serialize(&bad).unwrap();

        let mut qos = QosObject::new();
        assert!(matches!(qos.decode_nv(&bytes), Err(NvError::Corrupt { .. })));
        assert_eq!(qos.configured(), &QosConfig::default());
    }

    #[test]
    fn truncated_nv_record_rejected() {
        let bytes = QosObject::new().encode_nv().unwrap();
        let mut qos = QosObject::new();
        assert!(qos.decode_nv(&bytes[..3]).is_err());
    }
}
