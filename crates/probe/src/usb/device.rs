//! libusb-backed host and device
//!
//! This module wraps rusb's context and device handle behind the
//! [`UsbHost`] / [`UsbDeviceOps`] traits, translating descriptors into the
//! owned model from `common::usb_types`.

use crate::usb::transfers::{map_rusb_error, read_endpoint, write_endpoint};
use common::{
    ConfigurationInfo, DeviceSummary, EndpointInfo, Error, InterfaceInfo, Result, TransferKind,
    UsbDeviceOps, UsbHost,
};
use protocol::UsbError;
use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::{debug, warn};

/// Host USB stack reached through libusb
pub struct RusbHost {
    context: Context,
    detach_kernel_driver: bool,
}

impl RusbHost {
    /// Create a new libusb context
    pub fn new(detach_kernel_driver: bool) -> Result<Self> {
        let context = Context::new().map_err(|e| Error::Usb(map_rusb_error(e)))?;
        Ok(Self {
            context,
            detach_kernel_driver,
        })
    }
}

impl UsbHost for RusbHost {
    type Device = RusbDevice;

    fn list_devices(&self) -> Result<Vec<DeviceSummary>> {
        let devices = self
            .context
            .devices()
            .map_err(|e| Error::Usb(map_rusb_error(e)))?;

        let mut summaries = Vec::new();
        for device in devices.iter() {
            match device.device_descriptor() {
                Ok(desc) => summaries.push(DeviceSummary {
                    bus_number: device.bus_number(),
                    address: device.address(),
                    vendor_id: desc.vendor_id(),
                    product_id: desc.product_id(),
                }),
                Err(e) => warn!(
                    "Skipping bus {} device {}: {}",
                    device.bus_number(),
                    device.address(),
                    e
                ),
            }
        }
        Ok(summaries)
    }

    fn open(&self, vendor_id: u16, product_id: u16) -> Result<RusbDevice> {
        let devices = self
            .context
            .devices()
            .map_err(|e| Error::Usb(map_rusb_error(e)))?;

        let device = devices
            .iter()
            .find(|d| {
                d.device_descriptor()
                    .map(|desc| desc.vendor_id() == vendor_id && desc.product_id() == product_id)
                    .unwrap_or(false)
            })
            .ok_or(Error::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        debug!(
            "Found {:04x}:{:04x} at bus {} device {}",
            vendor_id,
            product_id,
            device.bus_number(),
            device.address()
        );

        RusbDevice::open(device, self.detach_kernel_driver)
    }
}

/// Opened libusb device
pub struct RusbDevice {
    device: Device<Context>,
    handle: DeviceHandle<Context>,
    detach_kernel_driver: bool,
    /// Interfaces claimed by us
    claimed_interfaces: Vec<u8>,
}

impl RusbDevice {
    fn open(device: Device<Context>, detach_kernel_driver: bool) -> Result<Self> {
        let handle = device.open().map_err(|e| {
            warn!("Failed to open device: {}", e);
            Error::Usb(map_rusb_error(e))
        })?;

        Ok(Self {
            device,
            handle,
            detach_kernel_driver,
            claimed_interfaces: Vec::new(),
        })
    }

    fn claim(&mut self, interface: u8) -> Result<()> {
        if self.claimed_interfaces.contains(&interface) {
            return Ok(());
        }

        if self.detach_kernel_driver {
            match self.handle.kernel_driver_active(interface) {
                Ok(true) => {
                    debug!("Detaching kernel driver from interface {}", interface);
                    if let Err(e) = self.handle.detach_kernel_driver(interface) {
                        warn!(
                            "Failed to detach kernel driver from interface {}: {}",
                            interface, e
                        );
                    }
                }
                Ok(false) => {
                    debug!("No kernel driver active on interface {}", interface);
                }
                Err(e) => {
                    debug!(
                        "Could not check kernel driver status for interface {}: {}",
                        interface, e
                    );
                }
            }
        }

        self.handle
            .claim_interface(interface)
            .map_err(|e| Error::Usb(map_rusb_error(e)))?;
        debug!("Claimed interface {}", interface);
        self.claimed_interfaces.push(interface);
        Ok(())
    }
}

impl UsbDeviceOps for RusbDevice {
    fn active_configuration(&self) -> Result<ConfigurationInfo> {
        let config = self
            .device
            .active_config_descriptor()
            .map_err(|e| Error::Usb(map_rusb_error(e)))?;

        let mut interfaces = Vec::new();
        for interface in config.interfaces() {
            for desc in interface.descriptors() {
                interfaces.push(InterfaceInfo {
                    number: desc.interface_number(),
                    alternate_setting: desc.setting_number(),
                    class_code: desc.class_code(),
                    sub_class_code: desc.sub_class_code(),
                    protocol_code: desc.protocol_code(),
                    endpoints: desc
                        .endpoint_descriptors()
                        .map(|ep| EndpointInfo {
                            address: ep.address(),
                            kind: map_transfer_type(ep.transfer_type()),
                            max_packet_size: ep.max_packet_size(),
                            interval: ep.interval(),
                        })
                        .collect(),
                });
            }
        }

        Ok(ConfigurationInfo {
            number: config.number(),
            interfaces,
        })
    }

    fn activate_alternate_setting(&mut self, interface: u8, alternate_setting: u8) -> Result<()> {
        self.claim(interface)?;
        self.handle
            .set_alternate_setting(interface, alternate_setting)
            .map_err(|e| Error::Usb(map_rusb_error(e)))
    }

    fn write(
        &mut self,
        endpoint: &EndpointInfo,
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<usize, UsbError> {
        write_endpoint(&self.handle, endpoint, data, timeout)
    }

    fn read(
        &mut self,
        endpoint: &EndpointInfo,
        max_len: usize,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, UsbError> {
        read_endpoint(&self.handle, endpoint, max_len, timeout)
    }
}

impl Drop for RusbDevice {
    fn drop(&mut self) {
        for interface in self.claimed_interfaces.drain(..) {
            if let Err(e) = self.handle.release_interface(interface) {
                debug!("Failed to release interface {}: {}", interface, e);
            }
        }
    }
}

/// Map rusb transfer type to the descriptor model
fn map_transfer_type(transfer_type: rusb::TransferType) -> TransferKind {
    match transfer_type {
        rusb::TransferType::Control => TransferKind::Control,
        rusb::TransferType::Isochronous => TransferKind::Isochronous,
        rusb::TransferType::Bulk => TransferKind::Bulk,
        rusb::TransferType::Interrupt => TransferKind::Interrupt,
    }
}
