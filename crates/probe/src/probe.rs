//! Device probe setup
//!
//! Opens the target device, selects the interface alternate setting, and
//! resolves the endpoints the loops talk to. Every failure here is fatal
//! and propagates to the caller.

use common::{Direction, EndpointInfo, Error, InterfaceInfo, Result, UsbDeviceOps, UsbHost};
use protocol::{
    AlternateSetting, EndpointNumber, INTERRUPT_BYTES_MAX, InterfaceNumber, PRODUCT_ID,
    SOC_OUT_BYTES_MAX, UsbError, VENDOR_ID,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Everything needed to locate and talk to one interface of the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub alternate_setting: u8,
    pub endpoint: u8,
    /// Maximum bytes requested per IN transfer
    pub read_size: usize,
    /// Per-transfer timeout; zero waits indefinitely
    pub timeout: Duration,
}

impl ProbeTarget {
    /// Framer control interface with its bulk command/response pair
    pub fn framer_control() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
            interface: InterfaceNumber::FramerControl.into(),
            alternate_setting: AlternateSetting::Idle.into(),
            endpoint: EndpointNumber::FramerControl.into(),
            read_size: SOC_OUT_BYTES_MAX,
            timeout: Duration::from_millis(1000),
        }
    }

    /// Interrupt report interface
    pub fn interrupt_reports() -> Self {
        Self {
            interface: InterfaceNumber::Interrupt.into(),
            endpoint: EndpointNumber::Interrupt.into(),
            read_size: INTERRUPT_BYTES_MAX,
            ..Self::framer_control()
        }
    }
}

/// OUT and IN endpoints sharing one endpoint number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPair {
    pub out_ep: EndpointInfo,
    pub in_ep: EndpointInfo,
}

/// Find the first endpoint of `interface` with this direction and number
pub fn find_endpoint(
    interface: &InterfaceInfo,
    direction: Direction,
    number: u8,
) -> Result<EndpointInfo> {
    interface
        .find_endpoint(direction, number)
        .cloned()
        .ok_or(Error::EndpointNotFound {
            interface: interface.number,
            endpoint: number,
            direction,
        })
}

/// Resolve the OUT and IN endpoints for `number`
pub fn find_endpoint_pair(interface: &InterfaceInfo, number: u8) -> Result<EndpointPair> {
    Ok(EndpointPair {
        out_ep: find_endpoint(interface, Direction::Out, number)?,
        in_ep: find_endpoint(interface, Direction::In, number)?,
    })
}

/// An opened device with its interface alternate setting active
pub struct DeviceProbe<D> {
    device: D,
    interface: InterfaceInfo,
    target: ProbeTarget,
}

impl<D: UsbDeviceOps> DeviceProbe<D> {
    /// Run the setup sequence against `host`
    ///
    /// Discovery, configuration retrieval, interface selection, then
    /// activation of the alternate setting on the hardware.
    pub fn open<H>(host: &H, target: ProbeTarget) -> Result<Self>
    where
        H: UsbHost<Device = D>,
    {
        let mut device = host.open(target.vendor_id, target.product_id)?;
        info!(
            "Opened device {:04x}:{:04x}",
            target.vendor_id, target.product_id
        );

        let config = device.active_configuration()?;
        debug!("Active configuration {}", config.number);

        let interface = config
            .interface(target.interface, target.alternate_setting)
            .cloned()
            .ok_or(Error::InterfaceNotFound {
                interface: target.interface,
                alternate_setting: target.alternate_setting,
            })?;

        device.activate_alternate_setting(target.interface, target.alternate_setting)?;
        info!(
            "Interface {} alternate setting {} active",
            target.interface, target.alternate_setting
        );

        Ok(Self {
            device,
            interface,
            target,
        })
    }

    pub fn interface(&self) -> &InterfaceInfo {
        &self.interface
    }

    /// Resolve a single endpoint on the selected interface
    pub fn endpoint(&self, direction: Direction) -> Result<EndpointInfo> {
        let ep = find_endpoint(&self.interface, direction, self.target.endpoint)?;
        debug!("{} endpoint {:#04x} ({})", direction, ep.address, ep.kind);
        Ok(ep)
    }

    /// Resolve both endpoints on the selected interface
    pub fn endpoint_pair(&self) -> Result<EndpointPair> {
        let pair = find_endpoint_pair(&self.interface, self.target.endpoint)?;
        debug!(
            "Endpoint pair OUT {:#04x} IN {:#04x}",
            pair.out_ep.address, pair.in_ep.address
        );
        Ok(pair)
    }

    /// Write `data` to `endpoint` with the configured timeout
    pub fn write(
        &mut self,
        endpoint: &EndpointInfo,
        data: &[u8],
    ) -> std::result::Result<(), TransferFailure> {
        self.device
            .write(endpoint, data, self.target.timeout)
            .map(|_| ())
            .map_err(|error| TransferFailure {
                direction: Direction::Out,
                error,
            })
    }

    /// Read up to the configured size from `endpoint`
    pub fn read(
        &mut self,
        endpoint: &EndpointInfo,
    ) -> std::result::Result<Vec<u8>, TransferFailure> {
        self.device
            .read(endpoint, self.target.read_size, self.target.timeout)
            .map_err(|error| TransferFailure {
                direction: Direction::In,
                error,
            })
    }

    /// Write a command then read its response
    pub fn exchange(
        &mut self,
        pair: &EndpointPair,
        command: &[u8],
    ) -> std::result::Result<Vec<u8>, TransferFailure> {
        self.write(&pair.out_ep, command)?;
        self.read(&pair.in_ep)
    }
}

/// A transfer error tagged with the side it happened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub direction: Direction,
    pub error: UsbError,
}

impl fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.direction, self.error)
    }
}

impl std::error::Error for TransferFailure {}

impl From<TransferFailure> for Error {
    fn from(failure: TransferFailure) -> Self {
        Error::Usb(failure.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::test_utils::{create_bulk_pair, create_interface};

    #[test]
    fn test_framer_control_target() {
        let target = ProbeTarget::framer_control();
        assert_eq!(target.vendor_id, 0x16d0);
        assert_eq!(target.product_id, 0x0f3b);
        assert_eq!(target.interface, 2);
        assert_eq!(target.alternate_setting, 0);
        assert_eq!(target.endpoint, 3);
        assert_eq!(target.read_size, SOC_OUT_BYTES_MAX);
    }

    #[test]
    fn test_interrupt_target_inherits_ids() {
        let target = ProbeTarget::interrupt_reports();
        assert_eq!(target.vendor_id, VENDOR_ID);
        assert_eq!(target.interface, 1);
        assert_eq!(target.endpoint, 2);
        assert_eq!(target.read_size, INTERRUPT_BYTES_MAX);
    }

    #[test]
    fn test_missing_in_endpoint() {
        let mut endpoints = create_bulk_pair(3, 64);
        endpoints.pop();
        let intf = create_interface(2, 0, endpoints);
        match find_endpoint_pair(&intf, 3) {
            Err(Error::EndpointNotFound {
                direction,
                endpoint,
                interface,
            }) => {
                assert_eq!(direction, Direction::In);
                assert_eq!(endpoint, 3);
                assert_eq!(interface, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_transfer_failure_display() {
        let failure = TransferFailure {
            direction: Direction::In,
            error: UsbError::Timeout,
        };
        assert_eq!(failure.to_string(), "IN: Operation timed out");
    }
}
