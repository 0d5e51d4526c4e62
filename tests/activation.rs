//! Configured vs. active generations and identity resets.

mod common;

use cipattr::core::device::ResetType;
use cipattr::core::error::GeneralStatus;
use cipattr::qos::{ConnectionPriority, DscpValues, QOS_NV_KEY};
use common::{get_value, memory_device, qos_path, SETTABLE_ATTRIBUTES};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

// ============================================================================
// Deferred activation
// ============================================================================

#[test]
fn write_is_deferred_until_activation() {
    let (mut device, _) = memory_device();
    let dscp = device.dscp();

    let response = device.set_attribute_single(qos_path(4), 40);
    assert_eq!(response.general_status, GeneralStatus::Success);
    assert_eq!(get_value(&mut device, 4), 40);
    assert_eq!(dscp.lookup(ConnectionPriority::Urgent), 55);

    device.activate();
    assert_eq!(dscp.lookup(ConnectionPriority::Urgent), 40);
}

#[test]
fn boot_activates_defaults() {
    let (device, _) = memory_device();
    assert_eq!(device.dscp().snapshot(), DscpValues::DEFAULT);
}

#[test]
fn each_priority_reads_its_own_value() {
    let (mut device, _) = memory_device();
    for (attribute, value) in SETTABLE_ATTRIBUTES.into_iter().zip([10, 11, 12, 13, 14]) {
        device.set_attribute_single(qos_path(attribute), value);
    }
    device.activate();

    let dscp = device.dscp();
    assert_eq!(dscp.lookup(ConnectionPriority::Urgent), 10);
    assert_eq!(dscp.lookup(ConnectionPriority::Scheduled), 11);
    assert_eq!(dscp.lookup(ConnectionPriority::High), 12);
    assert_eq!(dscp.lookup(ConnectionPriority::Low), 13);
    assert_eq!(dscp.lookup(ConnectionPriority::Explicit), 14);
}

#[test]
fn unknown_priority_uses_explicit_marking() {
    let (mut device, _) = memory_device();
    let dscp = device.dscp();
    assert_eq!(dscp.lookup_raw(4), 27);
    assert_eq!(dscp.lookup_raw(0xFF), 27);

    device.set_attribute_single(qos_path(8), 9);
    device.activate();
    assert_eq!(dscp.lookup(ConnectionPriority::Explicit), 9);
    assert_eq!(dscp.lookup_raw(7), 9);
    assert_eq!(dscp.lookup_raw(3), 55);
}

// ============================================================================
// Identity resets
// ============================================================================

#[test]
fn reset_to_defaults_leaves_active_until_activation() {
    let (mut device, storage) = memory_device();
    let dscp = device.dscp();
    device.set_attribute_single(qos_path(5), 20);
    device.activate();
    let stores = storage.store_count(QOS_NV_KEY);

    device.reset_to_defaults();
    assert_eq!(get_value(&mut device, 5), 47);
    assert_eq!(dscp.lookup(ConnectionPriority::Scheduled), 20);
    assert_eq!(storage.store_count(QOS_NV_KEY), stores);

    device.activate();
    assert_eq!(dscp.lookup(ConnectionPriority::Scheduled), 47);
}

#[test]
fn factory_reset_persists_and_activates_defaults() {
    let (mut device, storage) = memory_device();
    let dscp = device.dscp();
    device.set_attribute_single(qos_path(4), 40);
    device.activate();
    let stores = storage.store_count(QOS_NV_KEY);

    let status = device.identity_reset(ResetType::FactoryDefaults);
    assert!(status.is_ok());
    assert_eq!(storage.store_count(QOS_NV_KEY), stores + 1);

    let record = common::decode_qos_record(&storage.record(QOS_NV_KEY).unwrap());
    assert_eq!(record.dscp, DscpValues::DEFAULT);
    assert!(!record.q_frames_enable);
    assert_eq!(dscp.snapshot(), DscpValues::DEFAULT);
}

#[test]
fn factory_reset_reports_store_failure_but_still_activates() {
    let (mut device, storage) = memory_device();
    let dscp = device.dscp();
    device.set_attribute_single(qos_path(4), 40);
    device.activate();
    storage.set_read_only(true);

    let status = device.identity_reset(ResetType::FactoryDefaults);
    assert!(!status.is_ok());
    assert_eq!(dscp.lookup(ConnectionPriority::Urgent), 55);
}

#[test]
fn power_cycle_reset_does_not_store() {
    let (mut device, storage) = memory_device();
    device.set_attribute_single(qos_path(7), 3);
    let stores = storage.store_count(QOS_NV_KEY);

    assert!(device.identity_reset(ResetType::PowerCycle).is_ok());
    assert_eq!(storage.store_count(QOS_NV_KEY), stores);
    assert_eq!(device.dscp().lookup(ConnectionPriority::Low), 3);
}

// ============================================================================
// Concurrent readers
// ============================================================================

#[test]
fn readers_never_observe_a_mixed_generation() {
    let (mut device, _) = memory_device();
    let reader = device.dscp();
    let stop = Arc::new(AtomicBool::new(false));

    let alternate = DscpValues {
        urgent: 10,
        scheduled: 11,
        high: 12,
        low: 13,
        explicit: 14,
        ..DscpValues::DEFAULT
    };

    let handle = {
        let stop = stop.clone();
        thread::spawn(move || {
            let mut observed = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let snapshot = reader.snapshot();
                assert!(
                    snapshot == DscpValues::DEFAULT || snapshot == alternate,
                    "torn generation: {:?}",
                    snapshot
                );
                observed += 1;
            }
            observed
        })
    };

    for _ in 0..200 {
        for (attribute, value) in SETTABLE_ATTRIBUTES.into_iter().zip([10, 11, 12, 13, 14]) {
            device.set_attribute_single(qos_path(attribute), value);
        }
        device.activate();
        device.reset_to_defaults();
        device.activate();
    }

    stop.store(true, Ordering::Relaxed);
    let observed = handle.join().expect("reader panicked");
    assert!(observed > 0);
}
