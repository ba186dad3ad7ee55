//! Core data types for recorded signals

use std::fmt;

/// Sample representing a signal level from a specific time onwards
///
/// Run-length encoded: a sample is only recorded when a signal changes. The
/// level holds until the next sample's `start_time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Signal level from this timestamp on
    pub value: bool,
    /// Timestamp in nanoseconds when this value started
    pub start_time: u64,
}

impl Sample {
    /// Create a new sample
    pub fn new(value: bool, start_time: u64) -> Self {
        Self { value, start_time }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Sample[v={}, t={}]", self.value, self.start_time)
    }
}
