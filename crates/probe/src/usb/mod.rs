//! USB subsystem
//!
//! libusb implementation of the host capability traits and the transfer
//! helpers it uses.

pub mod device;
pub mod transfers;

pub use device::{RusbDevice, RusbHost};
pub use transfers::map_rusb_error;
