//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use cipattr::core::device::Device;
use cipattr::qos::{QosConfig, QOS_CLASS_CODE, QOS_INSTANCE};
use cipattr::service::RequestPath;
use cipattr::storage::{FileStorage, MemoryStorage, NvError, NvStorage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Settable QoS attributes (urgent, scheduled, high, low, explicit).
pub const SETTABLE_ATTRIBUTES: [u16; 5] = [4, 5, 6, 7, 8];

/// Path to a QoS instance attribute.
pub fn qos_path(attribute: u16) -> RequestPath {
    RequestPath::new(QOS_CLASS_CODE, QOS_INSTANCE, attribute)
}

/// In-memory storage whose stores can be switched to fail.
#[derive(Debug, Default)]
pub struct TestStorage {
    inner: MemoryStorage,
    read_only: AtomicBool,
    rejected: Mutex<HashMap<String, usize>>,
}

impl From<MemoryStorage> for TestStorage {
    fn from(inner: MemoryStorage) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }
}

impl TestStorage {
    /// Start with every store rejected.
    pub fn read_only(self) -> Self {
        self.set_read_only(true);
        self
    }

    /// Reject all stores with a permission error.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn record(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.record(key)
    }

    pub fn load_count(&self, key: &str) -> usize {
        self.inner.load_count(key)
    }

    /// Store attempts for a key, including rejected ones.
    pub fn store_count(&self, key: &str) -> usize {
        self.inner.store_count(key) + self.rejected.lock().get(key).copied().unwrap_or(0)
    }
}

impl NvStorage for TestStorage {
    fn load(&self, key: &str) -> Result<Vec<u8>, NvError> {
        self.inner.load(key)
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), NvError> {
        if self.read_only.load(Ordering::SeqCst) {
            *self.rejected.lock().entry(key.to_string()).or_default() += 1;
            return Err(NvError::Io {
                key: key.to_string(),
                source: std::io::Error::new(ErrorKind::PermissionDenied, "storage is read-only"),
            });
        }
        self.inner.store(key, bytes)
    }
}

/// Boot a device on fresh in-memory storage.
pub fn memory_device() -> (Device, Arc<TestStorage>) {
    boot_with(MemoryStorage::new())
}

/// Boot a device on the given in-memory storage.
pub fn boot_with(storage: impl Into<TestStorage>) -> (Device, Arc<TestStorage>) {
    let storage = Arc::new(storage.into());
    let device = Device::boot("test", storage.clone()).expect("boot failed");
    (device, storage)
}

/// Boot a device storing records under `dir`.
pub fn file_device(dir: &Path) -> Device {
    Device::boot("test", Arc::new(FileStorage::new(dir))).expect("boot failed")
}

/// Encode a QoS NV payload.
pub fn qos_record(config: &QosConfig) -> Vec<u8> {
    bincode::serialize(config).expect("failed to encode QoS record")
}

/// Decode a QoS NV payload.
pub fn decode_qos_record(bytes: &[u8]) -> QosConfig {
    bincode::deserialize(bytes).expect("failed to decode QoS record")
}

/// Single-byte value of a successful Get.
pub fn get_value(device: &mut Device, attribute: u16) -> u8 {
    let response = device.get_attribute_single(qos_path(attribute));
    assert!(
        response.general_status.is_success(),
        "get attribute {} failed: {}",
        attribute,
        response.general_status
    );
    assert_eq!(response.data.len(), 1);
    response.data[0]
}

/// Write a configuration file.
pub fn create_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}
