//! Common error types

use crate::usb_types::Direction;
use protocol::{ProtocolError, UsbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("USB device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Interface {interface} alternate setting {alternate_setting} not found")]
    InterfaceNotFound { interface: u8, alternate_setting: u8 },

    #[error("{direction} endpoint {endpoint} not found on interface {interface}")]
    EndpointNotFound {
        interface: u8,
        endpoint: u8,
        direction: Direction,
    },

    #[error("USB error: {0}")]
    Usb(#[from] UsbError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_messages() {
        let err = Error::DeviceNotFound {
            vendor_id: 0x16d0,
            product_id: 0x0f3b,
        };
        assert_eq!(err.to_string(), "USB device 16d0:0f3b not found");

        let err = Error::EndpointNotFound {
            interface: 2,
            endpoint: 3,
            direction: Direction::In,
        };
        assert_eq!(err.to_string(), "IN endpoint 3 not found on interface 2");
    }

    #[test]
    fn test_usb_error_converts() {
        let err: Error = UsbError::NoDevice.into();
        assert!(matches!(err, Error::Usb(UsbError::NoDevice)));
    }
}
