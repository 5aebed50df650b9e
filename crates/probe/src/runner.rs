//! Probe modes
//!
//! Each mode runs the full setup sequence against a host, prints the
//! selected interface, then hands over to its loop. Setup errors are
//! returned before any loop starts.

use crate::policy::PollPolicy;
use crate::poll::{PollSummary, Poller, monitor_reports, poll_command, write_only};
use crate::probe::{DeviceProbe, ProbeTarget};
use common::{Direction, Result, UsbHost};
use protocol::{HostCommand, POLL_COMMAND};
use std::io::Write;
use tracing::info;

fn open_and_describe<H, W>(
    host: &H,
    target: ProbeTarget,
    out: &mut W,
) -> Result<DeviceProbe<H::Device>>
where
    H: UsbHost,
    W: Write,
{
    let probe = DeviceProbe::open(host, target)?;
    write!(out, "{}", probe.interface())?;
    out.flush()?;
    Ok(probe)
}

/// Poll the framer control endpoints with the fixed register-read command
pub fn run_poll<H, P, W>(
    host: &H,
    target: ProbeTarget,
    poller: &mut Poller<P>,
    out: &mut W,
) -> Result<PollSummary>
where
    H: UsbHost,
    P: PollPolicy,
    W: Write,
{
    let mut probe = open_and_describe(host, target, out)?;
    let pair = probe.endpoint_pair()?;
    info!("Polling with command {:02x?}", POLL_COMMAND);
    poll_command(&mut probe, &pair, &POLL_COMMAND, poller, out)
}

/// Write the poll command repeatedly without reading responses
pub fn run_write_only<H, P, W>(
    host: &H,
    target: ProbeTarget,
    poller: &mut Poller<P>,
    out: &mut W,
) -> Result<PollSummary>
where
    H: UsbHost,
    P: PollPolicy,
    W: Write,
{
    let mut probe = open_and_describe(host, target, out)?;
    let endpoint = probe.endpoint(Direction::Out)?;
    write_only(&mut probe, &endpoint, &POLL_COMMAND, poller, out)
}

/// Print decoded interrupt reports as they arrive
pub fn run_reports<H, P, W>(
    host: &H,
    target: ProbeTarget,
    poller: &mut Poller<P>,
    out: &mut W,
) -> Result<PollSummary>
where
    H: UsbHost,
    P: PollPolicy,
    W: Write,
{
    let mut probe = open_and_describe(host, target, out)?;
    let endpoint = probe.endpoint(Direction::In)?;
    monitor_reports(&mut probe, &endpoint, poller, out)
}

/// Send one host command; returns the register value for reads
pub fn execute_command<H>(
    host: &H,
    target: ProbeTarget,
    command: HostCommand,
) -> Result<Option<u8>>
where
    H: UsbHost,
{
    let mut probe = DeviceProbe::open(host, target)?;
    let pair = probe.endpoint_pair()?;
    let bytes = command.encode();
    info!("Executing {:?} ({:02x?})", command, bytes);

    let response = probe.exchange(&pair, &bytes)?;
    if command.expects_response() {
        Ok(Some(HostCommand::register_value(&response)?))
    } else {
        Ok(None)
    }
}
