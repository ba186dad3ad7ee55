//! Busy-wait watchdog for detecting stalled transactions
//!
//! The bridge has no deadlines: a sub-engine waiting on a flow-control flag
//! that never clears holds the whole transaction forever. The watchdog only
//! observes. It counts consecutive ticks the orchestrator spends in one
//! busy-wait phase and reports once per stall when a limit is passed. With
//! [`StallPolicy::Abort`] the stall is also returned as an error, which
//! changes the bridge's observable behavior and is therefore opt-in.
//!
//! Waiting for the first header byte is the bridge's idle state and is never
//! reported.

use crate::engine::Phase;
use crate::{BridgeError, Result};
use tracing::{info, warn};

/// What to do once a busy-wait exceeds the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StallPolicy {
    /// Log once and keep waiting
    #[default]
    Warn,
    /// Log and fail the tick with [`BridgeError::Stalled`]
    Abort,
}

pub struct StallWatchdog {
    limit: Option<u64>,
    policy: StallPolicy,
    phase: Phase,
    ticks_in_phase: u64,
    /// Track if we've already warned about the current stall
    has_warned: bool,
}

impl StallWatchdog {
    /// `limit` of `None` disables reporting entirely
    pub fn new(limit: Option<u64>, policy: StallPolicy) -> Self {
        Self {
            limit,
            policy,
            phase: Phase::FetchHeader0,
            ticks_in_phase: 0,
            has_warned: false,
        }
    }

    /// Consecutive ticks spent in the current phase
    pub fn ticks_in_phase(&self) -> u64 {
        self.ticks_in_phase
    }

    pub fn is_stalled(&self) -> bool {
        self.has_warned
    }

    /// Observe the orchestrator phase after a tick
    pub fn observe(&mut self, phase: Phase) -> Result<()> {
        if phase != self.phase {
            if self.has_warned {
                info!(
                    "✅ UNBLOCKED: orchestrator left {} after {} ticks",
                    self.phase, self.ticks_in_phase
                );
            }
            self.phase = phase;
            self.ticks_in_phase = 0;
            self.has_warned = false;
            return Ok(());
        }

        self.ticks_in_phase += 1;

        let Some(limit) = self.limit else {
            return Ok(());
        };
        if !phase.is_busy_wait() || phase == Phase::AwaitHeader0 || self.ticks_in_phase <= limit {
            return Ok(());
        }

        // Only warn once per stall
        if !self.has_warned {
            warn!(
                "⚠️  BLOCKED: orchestrator in {} for {} ticks",
                phase, self.ticks_in_phase
            );
            self.has_warned = true;
        }

        match self.policy {
            StallPolicy::Warn => Ok(()),
            StallPolicy::Abort => Err(BridgeError::Stalled {
                phase,
                ticks: self.ticks_in_phase,
            }),
        }
    }
}

impl Default for StallWatchdog {
    fn default() -> Self {
        Self::new(None, StallPolicy::Warn)
    }
}
