//! Active DSCP generation read by the data path.

use super::DscpValues;
use parking_lot::RwLock;
use std::sync::Arc;

/// Connection priority selecting a DSCP marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPriority {
    /// Low priority I/O connection.
    Low,
    /// High priority I/O connection.
    High,
    /// Scheduled I/O connection.
    Scheduled,
    /// Urgent I/O connection.
    Urgent,
    /// Explicit messaging.
    Explicit,
}

impl TryFrom<u8> for ConnectionPriority {
    type Error = u8;

    /// Decode the 2-bit priority field of the network connection parameters.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            2 => Ok(Self::Scheduled),
            3 => Ok(Self::Urgent),
            other => Err(other),
        }
    }
}

/// Shared handle to the active DSCP values.
///
/// Cloning yields another handle to the same generation. Readers never see a
/// partially replaced generation: activation swaps the whole value under the
/// write lock.
#[derive(Debug, Clone)]
pub struct ActiveDscp {
    inner: Arc<RwLock<DscpValues>>,
}

impl ActiveDscp {
    /// Create a handle holding an initial generation.
    pub fn new(values: DscpValues) -> Self {
        Self {
            inner: Arc::new(RwLock::new(values)),
        }
    }

    /// DSCP marking for a connection priority.
    pub fn lookup(&self, priority: ConnectionPriority) -> u8 {
        let active = self.inner.read();
        match priority {
            ConnectionPriority::Low => active.low,
            ConnectionPriority::High => active.high,
            ConnectionPriority::Scheduled => active.scheduled,
            ConnectionPriority::Urgent => active.urgent,
            ConnectionPriority::Explicit => active.explicit,
        }
    }

    /// DSCP marking for a raw priority field; unknown values use the explicit marking.
    pub fn lookup_raw(&self, priority: u8) -> u8 {
        match ConnectionPriority::try_from(priority) {
            Ok(priority) => self.lookup(priority),
            Err(_) => self.inner.read().explicit,
        }
    }

    /// Copy of the whole active generation.
    pub fn snapshot(&self) -> DscpValues {
        *self.inner.read()
    }

    pub(crate) fn replace(&self, values: DscpValues) {
        *self.inner.write() = values;
    }
}
