//! Attribute descriptors and typed values.
//!
//! A descriptor says what an attribute is (number, data type), who may touch
//! it (flags), which values it accepts (range) and where its value lives
//! (slot). The slot is only a key: the owning instance maps it onto one of
//! its own fields, so descriptors never hold pointers into object state.

use bytes::BufMut;
use std::fmt;

/// Elementary CIP data types an attribute may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipType {
    /// Boolean, stored in one byte.
    Bool,
    /// 8-bit signed integer.
    Sint,
    /// 16-bit signed integer.
    Int,
    /// 32-bit signed integer.
    Dint,
    /// 8-bit unsigned integer.
    Usint,
    /// 16-bit unsigned integer.
    Uint,
    /// 32-bit unsigned integer.
    Udint,
}

impl CipType {
    /// CIP type code as used in data type reporting.
    pub fn code(self) -> u8 {
        match self {
            Self::Bool => 0xC1,
            Self::Sint => 0xC2,
            Self::Int => 0xC3,
            Self::Dint => 0xC4,
            Self::Usint => 0xC6,
            Self::Uint => 0xC7,
            Self::Udint => 0xC8,
        }
    }

    /// Encoded size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Bool | Self::Sint | Self::Usint => 1,
            Self::Int | Self::Uint => 2,
            Self::Dint | Self::Udint => 4,
        }
    }

    /// Every value representable by this type.
    pub fn natural_range(self) -> ValueRange {
        match self {
            Self::Bool => ValueRange::new(0, 1),
            Self::Sint => ValueRange::new(i8::MIN as i64, i8::MAX as i64),
            Self::Int => ValueRange::new(i16::MIN as i64, i16::MAX as i64),
            Self::Dint => ValueRange::new(i32::MIN as i64, i32::MAX as i64),
            Self::Usint => ValueRange::new(0, u8::MAX as i64),
            Self::Uint => ValueRange::new(0, u16::MAX as i64),
            Self::Udint => ValueRange::new(0, u32::MAX as i64),
        }
    }

    /// Check if the type is a signed integer.
    pub fn is_signed(self) -> bool {
        matches!(self, Self::Sint | Self::Int | Self::Dint)
    }

    /// Narrow a wide decoded value into this type's storage width.
    ///
    /// Truncates silently. Callers validate the range first.
    pub fn narrow(self, raw: i64) -> AttributeValue {
        match self {
            Self::Bool => AttributeValue::Bool(raw as u8 != 0),
            Self::Sint => AttributeValue::Sint(raw as i8),
            Self::Int => AttributeValue::Int(raw as i16),
            Self::Dint => AttributeValue::Dint(raw as i32),
            Self::Usint => AttributeValue::Usint(raw as u8),
            Self::Uint => AttributeValue::Uint(raw as u16),
            Self::Udint => AttributeValue::Udint(raw as u32),
        }
    }
}

impl fmt::Display for CipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "BOOL",
            Self::Sint => "SINT",
            Self::Int => "INT",
            Self::Dint => "DINT",
            Self::Usint => "USINT",
            Self::Uint => "UINT",
            Self::Udint => "UDINT",
        };
        f.write_str(name)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue {
    Bool(bool),
    Sint(i8),
    Int(i16),
    Dint(i32),
    Usint(u8),
    Uint(u16),
    Udint(u32),
}

impl AttributeValue {
    /// The CIP type of this value.
    pub fn data_type(&self) -> CipType {
        match self {
            Self::Bool(_) => CipType::Bool,
            Self::Sint(_) => CipType::Sint,
            Self::Int(_) => CipType::Int,
            Self::Dint(_) => CipType::Dint,
            Self::Usint(_) => CipType::Usint,
            Self::Uint(_) => CipType::Uint,
            Self::Udint(_) => CipType::Udint,
        }
    }

    /// Widen to a signed integer for comparisons and display.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Self::Bool(b) => b as i64,
            Self::Sint(v) => v as i64,
            Self::Int(v) => v as i64,
            Self::Dint(v) => v as i64,
            Self::Usint(v) => v as i64,
            Self::Uint(v) => v as i64,
            Self::Udint(v) => v as i64,
        }
    }

    /// Append the little-endian wire encoding at the value's native width.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        match *self {
            Self::Bool(b) => buf.put_u8(b as u8),
            Self::Sint(v) => buf.put_i8(v),
            Self::Int(v) => buf.put_i16_le(v),
            Self::Dint(v) => buf.put_i32_le(v),
            Self::Usint(v) => buf.put_u8(v),
            Self::Uint(v) => buf.put_u16_le(v),
            Self::Udint(v) => buf.put_u32_le(v),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            other => write!(f, "{}", other.as_i64()),
        }
    }
}

/// Inclusive range of accepted values for a settable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    /// Create a new inclusive range.
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Check if a value lies within the range.
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if every value in this range fits in `ty` without truncation.
    pub fn fits(&self, ty: CipType) -> bool {
        let natural = ty.natural_range();
        natural.contains(self.min) && natural.contains(self.max)
    }
}

bitflags::bitflags! {
    /// Access and behaviour flags for an attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFlags: u8 {
        /// Readable with Get_Attribute_Single.
        const GETTABLE = 0b0000_0001;
        /// Writable with Set_Attribute_Single.
        const SETTABLE = 0b0000_0010;
        /// Part of the object's non-volatile image; a write triggers a store.
        const NV_DATA = 0b0000_0100;
    }
}

/// Key identifying where an instance keeps an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub u16);

/// Registration record for a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Attribute number, unique within the class.
    pub number: u16,
    /// Stored data type.
    pub data_type: CipType,
    /// Storage location; `None` means the attribute has no backing field.
    pub slot: Option<Slot>,
    /// Access flags.
    pub flags: AttributeFlags,
    /// Values accepted by Set_Attribute_Single.
    pub range: ValueRange,
}

impl AttributeDescriptor {
    /// Create an unbound descriptor with no permissions and the type's full range.
    pub fn new(number: u16, data_type: CipType) -> Self {
        Self {
            number,
            data_type,
            slot: None,
            flags: AttributeFlags::empty(),
            range: data_type.natural_range(),
        }
    }

    /// Bind the descriptor to a storage slot.
    pub fn bound_to(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Set the access flags.
    pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Restrict the accepted value range.
    pub fn with_range(mut self, range: ValueRange) -> Self {
        self.range = range;
        self
    }

    /// Check if Get_Attribute_Single is permitted.
    pub fn is_gettable(&self) -> bool {
        self.flags.contains(AttributeFlags::GETTABLE)
    }

    /// Check if Set_Attribute_Single is permitted.
    pub fn is_settable(&self) -> bool {
        self.flags.contains(AttributeFlags::SETTABLE)
    }

    /// Check if a write to this attribute must be persisted.
    pub fn is_nv(&self) -> bool {
        self.flags.contains(AttributeFlags::NV_DATA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn narrow_truncates_to_storage_width() {
        assert_eq!(CipType::Usint.narrow(0x1_2C), AttributeValue::Usint(0x2C));
        assert_eq!(CipType::Uint.narrow(70_000), AttributeValue::Uint(4_464));
        assert_eq!(CipType::Bool.narrow(2), AttributeValue::Bool(true));
        assert_eq!(CipType::Bool.narrow(256), AttributeValue::Bool(false));
        assert_eq!(
            CipType::Udint.narrow(u32::MAX as i64),
            AttributeValue::Udint(u32::MAX)
        );
        assert_eq!(CipType::Dint.narrow(-5), AttributeValue::Dint(-5));
    }

    #[test]
    fn signedness_by_type() {
        assert!(CipType::Sint.is_signed());
        assert!(CipType::Dint.is_signed());
        assert!(!CipType::Bool.is_signed());
        assert!(!CipType::Udint.is_signed());
    }

    #[test]
    fn encode_is_little_endian_native_width() {
        let mut buf = BytesMut::new();
        AttributeValue::Uint(0x0102).encode(&mut buf);
        AttributeValue::Usint(7).encode(&mut buf);
        AttributeValue::Dint(-2).encode(&mut buf);
        assert_eq!(&buf[..], &[0x02, 0x01, 0x07, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn range_fits_type() {
        assert!(ValueRange::new(1, 62).fits(CipType::Usint));
        assert!(!ValueRange::new(0, 300).fits(CipType::Usint));
        assert!(!ValueRange::new(-1, 10).fits(CipType::Udint));
    }

    #[test]
    fn descriptor_defaults_to_no_access() {
        let desc = AttributeDescriptor::new(3, CipType::Usint);
        assert!(!desc.is_gettable());
        assert!(!desc.is_settable());
        assert!(!desc.is_nv());
        assert_eq!(desc.slot, None);
        assert_eq!(desc.range, CipType::Usint.natural_range());
    }

    #[test]
    fn descriptor_builder() {
        let desc = AttributeDescriptor::new(4, CipType::Usint)
            .bound_to(Slot(2))
            .with_flags(AttributeFlags::GETTABLE | AttributeFlags::SETTABLE)
            .with_range(ValueRange::new(1, 62));
        assert!(desc.is_gettable());
        assert!(desc.is_settable());
        assert!(!desc.is_nv());
        assert_eq!(desc.slot, Some(Slot(2)));
        assert!(desc.range.contains(62));
        assert!(!desc.range.contains(63));
    }
}
