//! Tedium X8 USB probe
//!
//! Opens the device by vendor/product ID, activates an interface alternate
//! setting, resolves its endpoints, and runs one of the probe loops:
//!
//! - command poll: write the register-read command, read the response,
//!   print the bytes, sleep, repeat
//! - write-only soak on the OUT endpoint
//! - interrupt report monitor
//!
//! Hardware access goes through the `common::UsbHost` traits, so every
//! loop runs unchanged against `common::test_utils::MockHost`.

pub mod config;
pub mod policy;
pub mod poll;
pub mod probe;
pub mod runner;
pub mod usb;

pub use config::ProbeConfig;
pub use policy::{AlwaysContinue, Bounded, PolicyKind, PollPolicy, StopOnDisconnect, build_policy};
pub use poll::{DEFAULT_POLL_INTERVAL, PollSummary, Poller};
pub use probe::{DeviceProbe, EndpointPair, ProbeTarget, TransferFailure, find_endpoint_pair};
pub use runner::{execute_command, run_poll, run_reports, run_write_only};
