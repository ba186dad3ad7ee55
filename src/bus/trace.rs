//! Serial bus recorder
//!
//! Keeps a run-length [`Sample`] stream per signal, the way a logic analyzer
//! capture is stored: a new sample only when the level changes. The
//! [`QspiDecoder`](crate::decoders::QspiDecoder) turns a trace back into
//! bytes.

use crate::engine::pins::SerialPins;
use crate::runtime::Sample;

/// Recorded serial bus signals
#[derive(Debug, Clone, Default)]
pub struct BusTrace {
    sck: Vec<Sample>,
    cs_n: Vec<Sample>,
    io: [Vec<Sample>; 4],
}

impl BusTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pin state at `time_ns`
    pub fn record(&mut self, time_ns: u64, pins: &SerialPins) {
        Self::push(&mut self.sck, pins.sck, time_ns);
        Self::push(&mut self.cs_n, pins.cs_n, time_ns);
        for (line, channel) in self.io.iter_mut().enumerate() {
            Self::push(channel, (pins.io >> line) & 1 == 1, time_ns);
        }
    }

    fn push(channel: &mut Vec<Sample>, value: bool, time_ns: u64) {
        if channel.last().map(|s| s.value) != Some(value) {
            channel.push(Sample::new(value, time_ns));
        }
    }

    pub fn sck(&self) -> &[Sample] {
        &self.sck
    }

    pub fn cs_n(&self) -> &[Sample] {
        &self.cs_n
    }

    /// Data line IO0..IO3, `None` for any other line
    pub fn io(&self, line: usize) -> Option<&[Sample]> {
        self.io.get(line).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.sck.is_empty()
    }

    pub fn clear(&mut self) {
        self.sck.clear();
        self.cs_n.clear();
        for channel in &mut self.io {
            channel.clear();
        }
    }

    /// Level of a channel at `timestamp`: the latest sample starting at or
    /// before it. `None` before the first sample.
    pub fn value_at(channel: &[Sample], timestamp: u64) -> Option<bool> {
        let idx = channel.partition_point(|s| s.start_time <= timestamp);
        idx.checked_sub(1).map(|i| channel[i].value)
    }

    /// Timestamps of low-to-high transitions
    pub fn rising_edges(channel: &[Sample]) -> impl Iterator<Item = u64> + '_ {
        channel
            .windows(2)
            .filter(|w| !w[0].value && w[1].value)
            .map(|w| w[1].start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(sck: bool, cs_n: bool, io: u8) -> SerialPins {
        SerialPins {
            sck,
            cs_n,
            io,
            drive_mask: 0,
        }
    }

    #[test]
    fn test_run_length_recording() {
        let mut trace = BusTrace::new();
        trace.record(0, &pins(true, true, 0xF));
        trace.record(10, &pins(true, true, 0xF));
        trace.record(20, &pins(false, false, 0xE));
        trace.record(30, &pins(true, false, 0xE));

        assert_eq!(trace.sck().len(), 3);
        assert_eq!(trace.cs_n().len(), 2);
        assert_eq!(trace.io(0).map(<[Sample]>::len), Some(2));
        assert_eq!(trace.io(3).map(<[Sample]>::len), Some(1));
        assert!(trace.io(4).is_none());
    }

    #[test]
    fn test_value_at_and_edges() {
        let mut trace = BusTrace::new();
        trace.record(0, &pins(true, true, 0));
        trace.record(10, &pins(false, false, 1));
        trace.record(20, &pins(true, false, 1));
        trace.record(30, &pins(false, false, 0));
        trace.record(40, &pins(true, false, 0));

        let io0 = trace.io(0).unwrap();
        assert_eq!(BusTrace::value_at(io0, 5), Some(false));
        assert_eq!(BusTrace::value_at(io0, 19), Some(true));
        assert_eq!(BusTrace::value_at(io0, 30), Some(false));
        assert_eq!(BusTrace::value_at(&[], 30), None);

        let rising: Vec<u64> = BusTrace::rising_edges(trace.sck()).collect();
        assert_eq!(rising, vec![20, 40]);
    }
}
