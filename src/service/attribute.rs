//! Generic Get_Attribute_Single and Set_Attribute_Single.
//!
//! Both services are driven entirely by the class's attribute table, so any
//! object gets attribute access by registering descriptors and implementing
//! [`CipInstance`]. Failures map onto [`GeneralStatus`] and always produce a
//! well-formed response.

use super::{MessageRouterRequest, MessageRouterResponse, ServiceHandler};
use crate::core::error::GeneralStatus;
use crate::object::{AttributeDescriptor, CipClass, CipInstance};
use bytes::{Buf, Bytes, BytesMut};

/// Width of the integer decoded from Set_Attribute_Single request data.
///
/// Signed types decode it as `i32`, all others as `u32`.
pub const SET_VALUE_WIDTH: usize = 4;

/// Read one attribute and encode it little-endian at its native width.
///
/// Missing and non-gettable attributes both report `AttributeNotSupported`.
pub fn get_attribute_single(
    class: &CipClass,
    instance: &dyn CipInstance,
    attribute: u16,
) -> Result<Bytes, GeneralStatus> {
    let descriptor = class
        .resolve(attribute)
        .filter(|d| d.is_gettable())
        .ok_or(GeneralStatus::AttributeNotSupported)?;

    let slot = descriptor.slot.ok_or(GeneralStatus::NotEnoughData)?;
    let value = instance.read(slot).ok_or(GeneralStatus::NotEnoughData)?;

    let mut buf = BytesMut::with_capacity(value.data_type().size());
    value.encode(&mut buf);
    Ok(buf.freeze())
}

/// Validate and store one attribute from request data.
///
/// Order: permission, decode, range, storage binding, narrow-and-store.
/// Returns the descriptor that was written so the caller can run hooks.
pub fn set_attribute_single<'c>(
    class: &'c CipClass,
    instance: &mut dyn CipInstance,
    attribute: u16,
    data: &[u8],
) -> Result<&'c AttributeDescriptor, GeneralStatus> {
    let descriptor = class
        .resolve(attribute)
        .filter(|d| d.is_settable())
        .ok_or(GeneralStatus::AttributeNotSupported)?;

    let mut buf = data;
    if buf.remaining() < SET_VALUE_WIDTH {
        return Err(GeneralStatus::NotEnoughData);
    }
    let raw = if descriptor.data_type.is_signed() {
        i64::from(buf.get_i32_le())
    } else {
        i64::from(buf.get_u32_le())
    };

    if !descriptor.range.contains(raw) {
        tracing::debug!(
            class = class.class_code(),
            instance = instance.instance_number(),
            attribute,
            value = raw,
            min = descriptor.range.min,
            max = descriptor.range.max,
            "set rejected: value out of range"
        );
        return Err(GeneralStatus::InvalidAttributeValue);
    }

    let Some(slot) = descriptor.slot else {
        tracing::warn!(
            class = class.class_code(),
            instance = instance.instance_number(),
            attribute,
            "set rejected: attribute has no storage"
        );
        return Err(GeneralStatus::NotEnoughData);
    };

    let value = descriptor.data_type.narrow(raw);
    if !instance.write(slot, value) {
        tracing::warn!(
            class = class.class_code(),
            instance = instance.instance_number(),
            attribute,
            slot = slot.0,
            "set rejected: slot not backed by instance"
        );
        return Err(GeneralStatus::NotEnoughData);
    }

    tracing::debug!(
        class = class.class_code(),
        instance = instance.instance_number(),
        attribute,
        %value,
        "attribute set"
    );
    Ok(descriptor)
}

/// Get_Attribute_Single service handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetAttributeSingleHandler;

impl ServiceHandler for GetAttributeSingleHandler {
    fn name(&self) -> &'static str {
        "GetAttributeSingle"
    }

    fn handle(
        &self,
        class: &CipClass,
        instance: &mut dyn CipInstance,
        request: &MessageRouterRequest,
    ) -> MessageRouterResponse {
        match get_attribute_single(class, instance, request.path.attribute) {
            Ok(data) => {
                MessageRouterResponse::for_request(request, GeneralStatus::Success).with_data(data)
            }
            Err(status) => MessageRouterResponse::for_request(request, status),
        }
    }
}

/// Set_Attribute_Single service handler.
///
/// After an accepted write to an NV attribute the class's post-set hook runs
/// before the response is built. A hook failure is logged; the write stays.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetAttributeSingleHandler;

impl ServiceHandler for SetAttributeSingleHandler {
    fn name(&self) -> &'static str {
        "SetAttributeSingle"
    }

    fn handle(
        &self,
        class: &CipClass,
        instance: &mut dyn CipInstance,
        request: &MessageRouterRequest,
    ) -> MessageRouterResponse {
        let descriptor =
            match set_attribute_single(class, instance, request.path.attribute, &request.data) {
                Ok(descriptor) => descriptor,
                Err(status) => return MessageRouterResponse::for_request(request, status),
            };

        if descriptor.is_nv() {
            if let Some(hook) = class.post_set_hook() {
                if let Err(e) = hook.after_set(class, &*instance, descriptor, request.service) {
                    tracing::warn!(
                        class = class.class_code(),
                        instance = instance.instance_number(),
                        attribute = descriptor.number,
                        error = %e,
                        "post-set hook failed; configuration kept in memory"
                    );
                }
            }
        }

        MessageRouterResponse::for_request(request, GeneralStatus::Success)
    }
}
