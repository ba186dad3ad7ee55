//! QSPI decoder: turns a recorded [`BusTrace`] back into frames
//!
//! Flow per frame:
//!   1. Find the chip-select active window
//!   2. Take every sampling clock edge inside the window
//!   3. Read the data lines just before each edge
//!   4. Assemble groups MSB first into bytes

use super::types::{CsPolarity, SerialFrame, SpiMode, TimingInfo};
use crate::bus::BusTrace;
use crate::engine::Mode;
use crate::runtime::Sample;
use tracing::{debug, trace};

pub struct QspiDecoder {
    name: String,
    mode: Mode,
    clock_mode: SpiMode,
    cs_polarity: CsPolarity,
}

/// Shift register for one direction
#[derive(Default)]
struct Assembler {
    word: u8,
    groups: u8,
    bytes: Vec<u8>,
}

impl Assembler {
    fn push(&mut self, group: u8, width: u8, groups_per_byte: u8) {
        self.word = (self.word << width) | group;
        self.groups += 1;
        if self.groups == groups_per_byte {
            self.bytes.push(self.word);
            self.word = 0;
            self.groups = 0;
        }
    }
}

impl QspiDecoder {
    /// Decoder for the given lane width, sampling on rising edges with
    /// active-low chip select
    pub fn new(mode: Mode) -> Self {
        Self {
            name: "qspi_decoder".to_string(),
            mode,
            clock_mode: SpiMode::default(),
            cs_polarity: CsPolarity::default(),
        }
    }

    /// With custom name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_clock_mode(mut self, clock_mode: SpiMode) -> Self {
        self.clock_mode = clock_mode;
        self
    }

    pub fn with_cs_polarity(mut self, cs_polarity: CsPolarity) -> Self {
        self.cs_polarity = cs_polarity;
        self
    }

    /// Chip-select active windows as `(start, end)`
    fn windows(&self, cs: &[Sample]) -> Vec<(u64, Option<u64>)> {
        let mut windows = Vec::new();
        let mut start = None;
        for sample in cs {
            let active = self.cs_polarity.is_active(sample.value);
            match (active, start) {
                (true, None) => start = Some(sample.start_time),
                (false, Some(begin)) => {
                    windows.push((begin, Some(sample.start_time)));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(begin) = start {
            windows.push((begin, None));
        }
        windows
    }

    fn sampling_edges<'a>(&self, clk: &'a [Sample]) -> impl Iterator<Item = u64> + 'a {
        let rising = self.clock_mode.samples_on_rising();
        clk.windows(2)
            .filter(move |w| w[0].value != w[1].value && w[1].value == rising)
            .map(|w| w[1].start_time)
    }

    /// Data-line group just before `edge`
    fn lines_at(trace: &BusTrace, edge: u64, lines: std::ops::Range<usize>) -> u8 {
        let sample_time = edge.saturating_sub(1);
        lines.rev().fold(0, |acc, line| {
            let bit = trace
                .io(line)
                .and_then(|channel| BusTrace::value_at(channel, sample_time))
                .unwrap_or(true);
            (acc << 1) | u8::from(bit)
        })
    }

    pub fn decode(&self, trace: &BusTrace) -> Vec<SerialFrame> {
        let width = self.mode.lines_per_edge();
        let groups_per_byte = self.mode.edges_per_byte();
        let mut frames = Vec::new();

        for (start, end) in self.windows(trace.cs_n()) {
            debug!(
                "[{}] CS window: {}ns to {}",
                self.name,
                start,
                end.map_or_else(|| "open".to_string(), |e| format!("{}ns", e))
            );

            let mut data = Assembler::default();
            let mut miso = Assembler::default();
            let mut edges = 0;

            let inside = self
                .sampling_edges(trace.sck())
                .filter(|&t| t > start && end.is_none_or(|e| t < e));
            for edge in inside {
                edges += 1;
                match self.mode {
                    Mode::Single => {
                        data.push(Self::lines_at(trace, edge, 0..1), 1, groups_per_byte);
                        miso.push(Self::lines_at(trace, edge, 1..2), 1, groups_per_byte);
                    }
                    Mode::Dual | Mode::Quad => {
                        let group = Self::lines_at(trace, edge, 0..width as usize);
                        data.push(group, width, groups_per_byte);
                    }
                }
                trace!("[{}] edge {} at {}ns", self.name, edges, edge);
            }

            if data.groups != 0 {
                debug!(
                    "[{}] Incomplete byte: {}/{} groups",
                    self.name, data.groups, groups_per_byte
                );
            }

            frames.push(SerialFrame {
                data: data.bytes,
                miso: miso.bytes,
                edges,
                timing: TimingInfo::from_ns(start),
                end,
            });
        }

        debug!("[{}] {} frames decoded", self.name, frames.len());
        frames
    }
}
