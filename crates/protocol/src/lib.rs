//! Wire-level vocabulary for the Tedium X8 probe
//!
//! This crate defines everything that crosses the USB cable: the device
//! descriptor table (identifiers, interface and endpoint numbers, transfer
//! size limits), the host command encoding spoken on the framer control
//! endpoint, the interrupt report layout, and the transfer error vocabulary.
//!
//! # Example
//!
//! ```
//! use protocol::{HostCommand, POLL_COMMAND};
//!
//! let bytes = HostCommand::RegisterRead { address: 0x01fe }.encode();
//! assert_eq!(bytes, vec![0x00, 0xfe, 0x01]);
//! assert_eq!(POLL_COMMAND, [0x00, 0xfe, 0x01]);
//! ```
//!
//! # Interrupt reports
//!
//! ```
//! use protocol::Report;
//!
//! // Channel 3, BISR = SLIP, SBISR = 0x11
//! let report = Report::decode(&[0x03, 0x04, 0x11]).unwrap();
//! assert_eq!(report.lines(), vec!["3 SBISR=11".to_string()]);
//! ```

pub mod command;
pub mod descriptors;
pub mod error;
pub mod report;
pub mod types;

pub use command::{HostCommand, POLL_COMMAND, POLL_REGISTER};
pub use descriptors::{
    AlternateSetting, EndpointNumber, FRAME_BYTES_MAX, INTERRUPT_BYTES_MAX, InterfaceNumber,
    PRODUCT_ID, SOC_OUT_BYTES_MAX, VENDOR_ID,
};
pub use error::{ProtocolError, Result};
pub use report::{HdlcStatus, Report, T1Frame};
pub use types::UsbError;
