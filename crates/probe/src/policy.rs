//! Poll loop policies
//!
//! A policy decides whether the loop starts another iteration and what
//! happens after a transfer error. Production runs use [`AlwaysContinue`];
//! bounded policies exist so tests and `--count` runs terminate.

use crate::probe::TransferFailure;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::warn;

/// Decides loop continuation
pub trait PollPolicy {
    /// Called before iteration `iteration` (zero-based)
    fn should_continue(&mut self, _iteration: u64) -> bool {
        true
    }

    /// Called after a failed transfer; `Break` ends the loop with that error
    fn on_error(&mut self, failure: &TransferFailure) -> ControlFlow<()>;
}

/// Keep polling forever, whatever fails
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysContinue;

impl PollPolicy for AlwaysContinue {
    fn on_error(&mut self, _failure: &TransferFailure) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Stop once the device is gone; continue on every other error
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOnDisconnect;

impl PollPolicy for StopOnDisconnect {
    fn on_error(&mut self, failure: &TransferFailure) -> ControlFlow<()> {
        if failure.error.is_disconnect() {
            warn!("{}: disconnected", failure.direction);
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Limit another policy to a fixed number of iterations
#[derive(Debug, Clone, Copy)]
pub struct Bounded<P> {
    max_iterations: u64,
    inner: P,
}

impl<P: PollPolicy> Bounded<P> {
    pub fn new(max_iterations: u64, inner: P) -> Self {
        Self {
            max_iterations,
            inner,
        }
    }
}

impl<P: PollPolicy> PollPolicy for Bounded<P> {
    fn should_continue(&mut self, iteration: u64) -> bool {
        iteration < self.max_iterations && self.inner.should_continue(iteration)
    }

    fn on_error(&mut self, failure: &TransferFailure) -> ControlFlow<()> {
        self.inner.on_error(failure)
    }
}

impl<P: PollPolicy + ?Sized> PollPolicy for Box<P> {
    fn should_continue(&mut self, iteration: u64) -> bool {
        (**self).should_continue(iteration)
    }

    fn on_error(&mut self, failure: &TransferFailure) -> ControlFlow<()> {
        (**self).on_error(failure)
    }
}

/// Policy selector used in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    AlwaysContinue,
    StopOnDisconnect,
}

/// Build the policy for a run, optionally bounded
pub fn build_policy(kind: PolicyKind, max_iterations: Option<u64>) -> Box<dyn PollPolicy> {
    match (kind, max_iterations) {
        (PolicyKind::AlwaysContinue, None) => Box::new(AlwaysContinue),
        (PolicyKind::AlwaysContinue, Some(n)) => Box::new(Bounded::new(n, AlwaysContinue)),
        (PolicyKind::StopOnDisconnect, None) => Box::new(StopOnDisconnect),
        (PolicyKind::StopOnDisconnect, Some(n)) => Box::new(Bounded::new(n, StopOnDisconnect)),
    }
}
