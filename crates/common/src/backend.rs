//! Capability traits over the host USB stack
//!
//! The probe only talks to hardware through these traits. The binary plugs
//! in a libusb backend; tests plug in [`crate::test_utils::MockHost`].

use crate::error::Result;
use crate::usb_types::{ConfigurationInfo, EndpointInfo};
use protocol::UsbError;
use std::time::Duration;

/// Summary of an attached device, for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub bus_number: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Entry point into the host USB stack
pub trait UsbHost {
    type Device: UsbDeviceOps;

    /// Enumerate attached devices
    fn list_devices(&self) -> Result<Vec<DeviceSummary>>;

    /// Open the first device matching `vendor_id`/`product_id`
    ///
    /// Fails with [`crate::Error::DeviceNotFound`] when nothing matches.
    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Self::Device>;
}

/// Operations on an opened device
///
/// Transfers return [`UsbError`] directly so callers can apply a per-error
/// policy without unwrapping the setup error type.
pub trait UsbDeviceOps {
    /// Currently active configuration
    fn active_configuration(&self) -> Result<ConfigurationInfo>;

    /// Claim `interface` and select `alternate_setting` on the device
    fn activate_alternate_setting(&mut self, interface: u8, alternate_setting: u8) -> Result<()>;

    /// Write `data` to an OUT endpoint, returning the number of bytes sent
    fn write(
        &mut self,
        endpoint: &EndpointInfo,
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<usize, UsbError>;

    /// Read at most `max_len` bytes from an IN endpoint
    fn read(
        &mut self,
        endpoint: &EndpointInfo,
        max_len: usize,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, UsbError>;
}
