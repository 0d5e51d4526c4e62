//! Core device infrastructure.
//!
//! - [`config`] - Configuration parsing and validation
//! - [`device`] - Device context: boot, dispatch, activation
//! - [`error`] - General status codes and internal error types

pub mod config;
pub mod device;
pub mod error;
