//! USB transfer execution
//!
//! Synchronous bulk and interrupt transfers on a libusb handle, with rusb
//! errors mapped to protocol errors. Every error is returned to the caller
//! unchanged; the poll policy decides what happens next.

use common::{Direction, EndpointInfo, TransferKind};
use protocol::UsbError;
use rusb::{Context, DeviceHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Write `data` to an OUT endpoint
///
/// Bulk and interrupt endpoints are supported; anything else is rejected
/// with `InvalidParam`.
pub fn write_endpoint(
    handle: &DeviceHandle<Context>,
    endpoint: &EndpointInfo,
    data: &[u8],
    timeout: Duration,
) -> Result<usize, UsbError> {
    if endpoint.direction() != Direction::Out {
        return Err(UsbError::InvalidParam);
    }

    trace!(
        "{} OUT transfer: endpoint={:#x}, data_len={}, timeout={}ms",
        endpoint.kind,
        endpoint.address,
        data.len(),
        timeout.as_millis()
    );

    let result = match endpoint.kind {
        TransferKind::Bulk => handle.write_bulk(endpoint.address, data, timeout),
        TransferKind::Interrupt => handle.write_interrupt(endpoint.address, data, timeout),
        TransferKind::Control | TransferKind::Isochronous => return Err(UsbError::InvalidParam),
    };

    match result {
        Ok(len) => {
            if len != data.len() {
                debug!(
                    "Short write on {:#x}: {} of {} bytes",
                    endpoint.address,
                    len,
                    data.len()
                );
            }
            Ok(len)
        }
        Err(e) => Err(map_rusb_error(e)),
    }
}

/// Read at most `max_len` bytes from an IN endpoint
pub fn read_endpoint(
    handle: &DeviceHandle<Context>,
    endpoint: &EndpointInfo,
    max_len: usize,
    timeout: Duration,
) -> Result<Vec<u8>, UsbError> {
    if endpoint.direction() != Direction::In {
        return Err(UsbError::InvalidParam);
    }

    trace!(
        "{} IN transfer: endpoint={:#x}, max_len={}, timeout={}ms",
        endpoint.kind,
        endpoint.address,
        max_len,
        timeout.as_millis()
    );

    let mut buffer = vec![0u8; max_len];
    let result = match endpoint.kind {
        TransferKind::Bulk => handle.read_bulk(endpoint.address, &mut buffer, timeout),
        TransferKind::Interrupt => handle.read_interrupt(endpoint.address, &mut buffer, timeout),
        TransferKind::Control | TransferKind::Isochronous => return Err(UsbError::InvalidParam),
    };

    match result {
        Ok(len) => {
            buffer.truncate(len);
            Ok(buffer)
        }
        Err(e) => Err(map_rusb_error(e)),
    }
}

/// Map rusb::Error to protocol::UsbError
pub fn map_rusb_error(err: rusb::Error) -> UsbError {
    match err {
        rusb::Error::Timeout => UsbError::Timeout,
        rusb::Error::Pipe => UsbError::Pipe,
        rusb::Error::NoDevice => UsbError::NoDevice,
        rusb::Error::NotFound => UsbError::NotFound,
        rusb::Error::Busy => UsbError::Busy,
        rusb::Error::Overflow => UsbError::Overflow,
        rusb::Error::Io => UsbError::Io,
        rusb::Error::InvalidParam => UsbError::InvalidParam,
        rusb::Error::Access => UsbError::Access,
        _ => UsbError::Other {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rusb_error() {
        assert_eq!(map_rusb_error(rusb::Error::Timeout), UsbError::Timeout);
        assert_eq!(map_rusb_error(rusb::Error::Pipe), UsbError::Pipe);
        assert_eq!(map_rusb_error(rusb::Error::NoDevice), UsbError::NoDevice);
        assert_eq!(map_rusb_error(rusb::Error::NotFound), UsbError::NotFound);
    }

    #[test]
    fn test_unmapped_error_keeps_message() {
        match map_rusb_error(rusb::Error::NotSupported) {
            UsbError::Other { message } => assert!(!message.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
