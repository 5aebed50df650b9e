//! Probe loops
//!
//! Each loop repeats one step, prints what it got, and sleeps. Transfer
//! errors are printed and handed to the [`PollPolicy`]; only a policy
//! `Break` or a failing output sink ends a loop early.

use crate::policy::PollPolicy;
use crate::probe::{DeviceProbe, EndpointPair, TransferFailure};
use common::{EndpointInfo, Error, Result, UsbDeviceOps};
use protocol::Report;
use std::io::Write;
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Pause between iterations
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Counters reported when a loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub iterations: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Drives a step function under a policy
pub struct Poller<P> {
    policy: P,
    interval: Duration,
}

impl<P: PollPolicy> Poller<P> {
    pub fn new(policy: P, interval: Duration) -> Self {
        Self { policy, interval }
    }

    /// Run `step` until the policy stops the loop
    ///
    /// `step` prints its own successful output; failures are printed here.
    pub fn run<W, F>(&mut self, out: &mut W, mut step: F) -> Result<PollSummary>
    where
        W: Write,
        F: FnMut(&mut W) -> std::result::Result<std::io::Result<()>, TransferFailure>,
    {
        let mut summary = PollSummary::default();

        while self.policy.should_continue(summary.iterations) {
            summary.iterations += 1;
            trace!("Iteration {}", summary.iterations);

            match step(out) {
                Ok(printed) => {
                    printed?;
                    summary.successes += 1;
                }
                Err(failure) => {
                    summary.failures += 1;
                    warn!("Transfer failed: {}", failure);
                    writeln!(out, "{}", failure)?;
                    if let ControlFlow::Break(()) = self.policy.on_error(&failure) {
                        out.flush()?;
                        return Err(Error::Usb(failure.error));
                    }
                }
            }
            out.flush()?;

            thread::sleep(self.interval);
        }

        debug!(
            "Loop finished after {} iterations ({} failed)",
            summary.iterations, summary.failures
        );
        Ok(summary)
    }
}

/// Write `command`, read the response, print the raw bytes
pub fn poll_command<D, P, W>(
    probe: &mut DeviceProbe<D>,
    pair: &EndpointPair,
    command: &[u8],
    poller: &mut Poller<P>,
    out: &mut W,
) -> Result<PollSummary>
where
    D: UsbDeviceOps,
    P: PollPolicy,
    W: Write,
{
    poller.run(out, |out| {
        let response = probe.exchange(pair, command)?;
        Ok(writeln!(out, "{:?}", response))
    })
}

/// Write `command` only, printing nothing on success
pub fn write_only<D, P, W>(
    probe: &mut DeviceProbe<D>,
    endpoint: &EndpointInfo,
    command: &[u8],
    poller: &mut Poller<P>,
    out: &mut W,
) -> Result<PollSummary>
where
    D: UsbDeviceOps,
    P: PollPolicy,
    W: Write,
{
    poller.run(out, |_| {
        probe.write(endpoint, command)?;
        Ok(Ok(()))
    })
}

/// Read interrupt reports and print the decoded events
///
/// Empty reads are skipped. Reports that fail to decode are printed and do
/// not count as transfer failures.
pub fn monitor_reports<D, P, W>(
    probe: &mut DeviceProbe<D>,
    endpoint: &EndpointInfo,
    poller: &mut Poller<P>,
    out: &mut W,
) -> Result<PollSummary>
where
    D: UsbDeviceOps,
    P: PollPolicy,
    W: Write,
{
    poller.run(out, |out| {
        let data = probe.read(endpoint)?;
        if data.is_empty() {
            return Ok(Ok(()));
        }
        Ok(print_report(&data, out))
    })
}

fn print_report<W: Write>(data: &[u8], out: &mut W) -> std::io::Result<()> {
    match Report::decode(data) {
        Ok(report) => {
            for line in report.lines() {
                writeln!(out, "{}", line)?;
            }
            Ok(())
        }
        Err(e) => {
            warn!("Undecodable report {:02x?}: {}", data, e);
            writeln!(out, "read(): {:?} ({})", data, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AlwaysContinue, Bounded};
    use common::Direction;
    use protocol::UsbError;

    fn bounded(n: u64) -> Poller<Bounded<AlwaysContinue>> {
        Poller::new(Bounded::new(n, AlwaysContinue), Duration::ZERO)
    }

    #[test]
    fn test_counts_successes_and_failures() {
        let mut out = Vec::new();
        let mut calls = 0;
        let summary = bounded(4)
            .run(&mut out, |out| {
                calls += 1;
                if calls % 2 == 0 {
                    Err(TransferFailure {
                        direction: Direction::In,
                        error: UsbError::Timeout,
                    })
                } else {
                    Ok(writeln!(out, "ok"))
                }
            })
            .unwrap();

        assert_eq!(
            summary,
            PollSummary {
                iterations: 4,
                successes: 2,
                failures: 2
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "ok\nIN: Operation timed out\nok\nIN: Operation timed out\n");
    }

    #[test]
    fn test_zero_iterations() {
        let mut out = Vec::new();
        let summary = bounded(0).run(&mut out, |_| Ok(Ok(()))).unwrap();
        assert_eq!(summary.iterations, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_undecodable_report_is_printed() {
        let mut out = Vec::new();
        print_report(&[0x01, 0x02], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("read(): [1, 2]"));
    }
}
