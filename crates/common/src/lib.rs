//! Common utilities for tedium-probe
//!
//! This crate provides the pieces shared by every probe mode: the error
//! type, logging setup, an owned model of USB descriptors, the capability
//! traits through which the host USB stack is reached, and mock
//! implementations of those traits for tests.

pub mod backend;
pub mod error;
pub mod logging;
pub mod test_utils;
pub mod usb_types;

pub use backend::{DeviceSummary, UsbDeviceOps, UsbHost};
pub use error::{Error, Result};
pub use logging::setup_logging;
pub use usb_types::{ConfigurationInfo, Direction, EndpointInfo, InterfaceInfo, TransferKind};
