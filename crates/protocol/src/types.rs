//! Transfer-level types shared by the USB backends

use thiserror::Error;

/// USB transfer error
///
/// Maps to libusb error codes. See rusb::Error for details.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsbError {
    /// Transfer timed out
    #[error("Operation timed out")]
    Timeout,
    /// Endpoint stalled (protocol error)
    #[error("Pipe error")]
    Pipe,
    /// Device was disconnected
    #[error("No such device (it may have been disconnected)")]
    NoDevice,
    /// Device or endpoint not found
    #[error("Entity not found")]
    NotFound,
    /// Device is busy
    #[error("Resource busy")]
    Busy,
    /// Buffer overflow
    #[error("Overflow")]
    Overflow,
    /// I/O error
    #[error("Input/Output Error")]
    Io,
    /// Invalid parameter
    #[error("Invalid parameter")]
    InvalidParam,
    /// Access denied (permissions)
    #[error("Access denied (insufficient permissions)")]
    Access,
    /// Other error with message
    #[error("{message}")]
    Other { message: String },
}

impl UsbError {
    /// Device is gone; further transfers cannot succeed
    pub fn is_disconnect(&self) -> bool {
        matches!(self, UsbError::NoDevice)
    }
}
