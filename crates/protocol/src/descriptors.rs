//! Device descriptor table
//!
//! Identifiers and limits the gateware publishes in its USB descriptors.
//! Host tools read these instead of hardcoding numbers at call sites.

/// USB vendor ID (pid.codes)
pub const VENDOR_ID: u16 = 0x16d0;

/// USB product ID (Tedium X8)
pub const PRODUCT_ID: u16 = 0x0f3b;

/// Largest isochronous frame packet
pub const FRAME_BYTES_MAX: usize = 512;

/// Largest interrupt report
pub const INTERRUPT_BYTES_MAX: usize = 256;

/// Largest response the SoC sends on the framer control IN endpoint
pub const SOC_OUT_BYTES_MAX: usize = 64;

/// Alternate settings exposed by the frame stream interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlternateSetting {
    /// No bandwidth reserved
    Idle = 0,
    /// Isochronous endpoints active
    Active = 1,
}

/// Interface numbers in the single configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InterfaceNumber {
    FrameStream = 0,
    Interrupt = 1,
    FramerControl = 2,
}

/// Endpoint numbers (without direction bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EndpointNumber {
    FrameStream = 1,
    Interrupt = 2,
    FramerControl = 3,
}

impl From<AlternateSetting> for u8 {
    fn from(value: AlternateSetting) -> Self {
        value as u8
    }
}

impl From<InterfaceNumber> for u8 {
    fn from(value: InterfaceNumber) -> Self {
        value as u8
    }
}

impl From<EndpointNumber> for u8 {
    fn from(value: EndpointNumber) -> Self {
        value as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_convert_to_raw() {
        assert_eq!(u8::from(AlternateSetting::Idle), 0);
        assert_eq!(u8::from(InterfaceNumber::FramerControl), 2);
        assert_eq!(u8::from(EndpointNumber::FramerControl), 3);
        assert_eq!(u8::from(EndpointNumber::Interrupt), 2);
    }

    #[test]
    fn test_endpoint_numbers_fit_address_field() {
        for ep in [
            EndpointNumber::FrameStream,
            EndpointNumber::Interrupt,
            EndpointNumber::FramerControl,
        ] {
            assert!(u8::from(ep) <= 0x0f);
        }
    }
}
