//! Bridge configuration

use crate::runtime::StallPolicy;
use crate::{BridgeError, Result};

/// Settings for the simulated bridge and its endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Base clock period in nanoseconds, used for trace timestamps
    pub clock_period_ns: u64,
    /// Output endpoint packet size in bytes
    pub packet_size: usize,
    /// Committed packets the output endpoint buffers before raising `full`
    pub output_buffers: usize,
    /// Input endpoint capacity in bytes
    pub input_capacity: usize,
    /// Ticks a busy-wait may last before the watchdog reports it
    pub stall_limit: Option<u64>,
    pub stall_policy: StallPolicy,
    /// Record the serial bus
    pub trace: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: 20,
            packet_size: 512,
            output_buffers: 4,
            input_capacity: 4096,
            stall_limit: None,
            stall_policy: StallPolicy::Warn,
            trace: true,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock_period_ns(mut self, period: u64) -> Self {
        self.clock_period_ns = period;
        self
    }

    pub fn with_packet_size(mut self, size: usize) -> Self {
        self.packet_size = size;
        self
    }

    pub fn with_output_buffers(mut self, buffers: usize) -> Self {
        self.output_buffers = buffers;
        self
    }

    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    /// Enable the stall watchdog
    pub fn with_stall_limit(mut self, ticks: u64, policy: StallPolicy) -> Self {
        self.stall_limit = Some(ticks);
        self.stall_policy = policy;
        self
    }

    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.clock_period_ns < 2 {
            return Err(BridgeError::InvalidConfig(format!(
                "clock period {}ns is too short to split into two edges",
                self.clock_period_ns
            )));
        }
        if self.packet_size == 0 {
            return Err(BridgeError::InvalidConfig("packet size must be non-zero".into()));
        }
        if self.output_buffers == 0 {
            return Err(BridgeError::InvalidConfig(
                "output endpoint needs at least one packet buffer".into(),
            ));
        }
        if self.input_capacity < 2 {
            return Err(BridgeError::InvalidConfig(format!(
                "input capacity {} cannot hold a header",
                self.input_capacity
            )));
        }
        if self.stall_limit == Some(0) {
            return Err(BridgeError::InvalidConfig("stall limit must be non-zero".into()));
        }
        Ok(())
    }
}
