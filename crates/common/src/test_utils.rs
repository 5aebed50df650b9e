//! Test utilities for tedium-probe
//!
//! Provides a scripted in-memory USB host and helpers that fabricate
//! descriptors, so probe logic can be exercised without hardware.
//!
//! # Example
//!
//! ```
//! use common::test_utils::{MockDevice, MockHost, create_tedium_configuration};
//! use common::UsbHost;
//!
//! let device = MockDevice::new(create_tedium_configuration());
//! let host = MockHost::new().with_device(0x16d0, 0x0f3b, device);
//! assert!(host.open(0x16d0, 0x0f3b).is_ok());
//! assert!(host.open(0x1234, 0x5678).is_err());
//! ```

use crate::backend::{DeviceSummary, UsbDeviceOps, UsbHost};
use crate::error::{Error, Result};
use crate::usb_types::{ConfigurationInfo, Direction, EndpointInfo, InterfaceInfo, TransferKind};
use protocol::{EndpointNumber, INTERRUPT_BYTES_MAX, InterfaceNumber, UsbError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// One operation observed by a [`MockDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    SetAlternate {
        interface: u8,
        alternate_setting: u8,
    },
    Write {
        endpoint: u8,
        data: Vec<u8>,
    },
    Read {
        endpoint: u8,
        max_len: usize,
    },
}

/// Scripted behaviour and the recorded event log
#[derive(Debug, Default)]
pub struct MockState {
    reads: VecDeque<std::result::Result<Vec<u8>, UsbError>>,
    write_failures: VecDeque<Option<UsbError>>,
    events: Vec<(Instant, MockEvent)>,
    fail_activation: Option<UsbError>,
}

/// In-memory device; clones share state
#[derive(Debug, Clone)]
pub struct MockDevice {
    configuration: ConfigurationInfo,
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub fn new(configuration: ConfigurationInfo) -> Self {
        Self {
            configuration,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a successful read
    pub fn push_read(&self, data: impl Into<Vec<u8>>) -> &Self {
        self.state().reads.push_back(Ok(data.into()));
        self
    }

    /// Queue a failing read
    pub fn push_read_error(&self, error: UsbError) -> &Self {
        self.state().reads.push_back(Err(error));
        self
    }

    /// Queue the outcome of the next write (`None` = succeed)
    pub fn push_write_result(&self, failure: Option<UsbError>) -> &Self {
        self.state().write_failures.push_back(failure);
        self
    }

    /// Make alternate-setting activation fail
    pub fn fail_activation(&self, error: UsbError) -> &Self {
        self.state().fail_activation = Some(error);
        self
    }

    /// Everything observed so far, in order
    pub fn events(&self) -> Vec<MockEvent> {
        self.state().events.iter().map(|(_, e)| e.clone()).collect()
    }

    /// Events with the instant they happened
    pub fn timed_events(&self) -> Vec<(Instant, MockEvent)> {
        self.state().events.clone()
    }

    /// Payloads of every write
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Write { data, .. } => Some(data),
                _ => None,
            })
            .collect()
    }

    /// Requested length of every read
    pub fn read_sizes(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Read { max_len, .. } => Some(max_len),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: MockEvent) {
        self.state().events.push((Instant::now(), event));
    }
}

impl UsbDeviceOps for MockDevice {
    fn active_configuration(&self) -> Result<ConfigurationInfo> {
        Ok(self.configuration.clone())
    }

    fn activate_alternate_setting(&mut self, interface: u8, alternate_setting: u8) -> Result<()> {
        if let Some(error) = self.state().fail_activation.clone() {
            return Err(Error::Usb(error));
        }
        self.record(MockEvent::SetAlternate {
            interface,
            alternate_setting,
        });
        Ok(())
    }

    fn write(
        &mut self,
        endpoint: &EndpointInfo,
        data: &[u8],
        _timeout: Duration,
    ) -> std::result::Result<usize, UsbError> {
        self.record(MockEvent::Write {
            endpoint: endpoint.address,
            data: data.to_vec(),
        });
        match self.state().write_failures.pop_front().flatten() {
            Some(error) => Err(error),
            None => Ok(data.len()),
        }
    }

    /// Replays queued reads; an empty queue behaves like a silent device
    fn read(
        &mut self,
        endpoint: &EndpointInfo,
        max_len: usize,
        _timeout: Duration,
    ) -> std::result::Result<Vec<u8>, UsbError> {
        self.record(MockEvent::Read {
            endpoint: endpoint.address,
            max_len,
        });
        match self.state().reads.pop_front() {
            Some(Ok(data)) if data.len() > max_len => Err(UsbError::Overflow),
            Some(Ok(data)) => Ok(data),
            Some(Err(error)) => Err(error),
            None => Err(UsbError::Timeout),
        }
    }
}

/// In-memory host with a fixed set of attached devices
#[derive(Debug, Default)]
pub struct MockHost {
    devices: Vec<(DeviceSummary, MockDevice)>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device under the given IDs
    pub fn with_device(mut self, vendor_id: u16, product_id: u16, device: MockDevice) -> Self {
        let address = self.devices.len() as u8 + 1;
        self.devices.push((
            DeviceSummary {
                bus_number: 1,
                address,
                vendor_id,
                product_id,
            },
            device,
        ));
        self
    }
}

impl UsbHost for MockHost {
    type Device = MockDevice;

    fn list_devices(&self) -> Result<Vec<DeviceSummary>> {
        Ok(self.devices.iter().map(|(s, _)| s.clone()).collect())
    }

    fn open(&self, vendor_id: u16, product_id: u16) -> Result<MockDevice> {
        self.devices
            .iter()
            .find(|(s, _)| s.vendor_id == vendor_id && s.product_id == product_id)
            .map(|(_, d)| d.clone())
            .ok_or(Error::DeviceNotFound {
                vendor_id,
                product_id,
            })
    }
}

/// Create a vendor-specific interface with the given endpoints
pub fn create_interface(
    number: u8,
    alternate_setting: u8,
    endpoints: Vec<EndpointInfo>,
) -> InterfaceInfo {
    InterfaceInfo {
        number,
        alternate_setting,
        class_code: 0xff,
        sub_class_code: 0x00,
        protocol_code: 0x00,
        endpoints,
    }
}

/// Create a bulk OUT + bulk IN pair on endpoint `number`
pub fn create_bulk_pair(number: u8, max_packet_size: u16) -> Vec<EndpointInfo> {
    vec![
        EndpointInfo::new(Direction::Out, number, TransferKind::Bulk, max_packet_size),
        EndpointInfo::new(Direction::In, number, TransferKind::Bulk, max_packet_size),
    ]
}

/// Create the configuration the Tedium X8 gateware enumerates with
///
/// Frame stream interface (idle and active settings), the interrupt report
/// interface, and the framer control interface with a bulk pair.
pub fn create_tedium_configuration() -> ConfigurationInfo {
    let frame_stream = u8::from(InterfaceNumber::FrameStream);
    let frame_ep = u8::from(EndpointNumber::FrameStream);
    let iso = |direction| EndpointInfo {
        address: Direction::to_endpoint_address(direction, frame_ep),
        kind: TransferKind::Isochronous,
        max_packet_size: 512,
        interval: 1,
    };
    let interrupt_in = EndpointInfo {
        address: Direction::In.to_endpoint_address(u8::from(EndpointNumber::Interrupt)),
        kind: TransferKind::Interrupt,
        max_packet_size: INTERRUPT_BYTES_MAX as u16,
        interval: 4,
    };

    ConfigurationInfo {
        number: 1,
        interfaces: vec![
            create_interface(frame_stream, 0, Vec::new()),
            create_interface(frame_stream, 1, vec![iso(Direction::In), iso(Direction::Out)]),
            create_interface(u8::from(InterfaceNumber::Interrupt), 0, vec![interrupt_in]),
            create_interface(
                u8::from(InterfaceNumber::FramerControl),
                0,
                create_bulk_pair(u8::from(EndpointNumber::FramerControl), 512),
            ),
        ],
    }
}
