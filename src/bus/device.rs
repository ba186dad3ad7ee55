//! Serial peripherals attached to the bridge's bus
//!
//! Devices follow the same mode-3 discipline as the bridge: they present data
//! after each falling serial edge and sample on each rising one.

use crate::engine::header::Mode;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Lines a device drives, IO3..IO0 as bits 3..0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceDrive {
    pub mask: u8,
    pub value: u8,
}

/// A peripheral on the serial bus
pub trait SerialDevice: Send {
    /// Debug name for logging
    fn name(&self) -> &str;

    /// Chip-select changed; `asserted` is the logical (active) state
    fn select(&mut self, asserted: bool);

    /// Serial clock fell while selected
    fn clock_falling(&mut self);

    /// Serial clock rose while selected; `io` is the resolved line state
    fn clock_rising(&mut self, io: u8);

    /// Current drivers
    fn drive(&self) -> DeviceDrive;
}

/// Nothing attached: every line floats to its pull-up
pub struct NullDevice;

impl SerialDevice for NullDevice {
    fn name(&self) -> &str {
        "null"
    }

    fn select(&mut self, _asserted: bool) {}

    fn clock_falling(&mut self) {}

    fn clock_rising(&mut self, _io: u8) {}

    fn drive(&self) -> DeviceDrive {
        DeviceDrive::default()
    }
}

/// Scripted peripheral
///
/// Shifts queued response bytes out in its configured mode and records
/// every byte it clocks in. In single-line mode it always drives IO1 while
/// selected (0xFF once the script runs dry), like a full-duplex SPI slave.
/// In dual and quad mode it only turns its lines around while it has response
/// bytes to send, and only listens otherwise.
pub struct ShiftDevice {
    name: String,
    mode: Mode,
    responses: VecDeque<u8>,
    selected: bool,

    out: u8,
    out_groups: u8,
    driving: bool,
    level: u8,

    rx: u8,
    rx_groups: u8,
    received: Vec<u8>,
    selections: u64,
}

impl ShiftDevice {
    pub fn new(mode: Mode) -> Self {
        Self {
            name: "shift_device".to_string(),
            mode,
            responses: VecDeque::new(),
            selected: false,
            out: 0,
            out_groups: 0,
            driving: false,
            level: 0,
            rx: 0,
            rx_groups: 0,
            received: Vec::new(),
            selections: 0,
        }
    }

    /// With custom name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With bytes queued for the next reads
    pub fn with_response(mut self, bytes: &[u8]) -> Self {
        self.queue_response(bytes);
        self
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn queue_response(&mut self, bytes: &[u8]) {
        self.responses.extend(bytes.iter().copied());
    }

    /// Bytes clocked in so far, across all selections
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Number of chip-select assertions seen
    pub fn selections(&self) -> u64 {
        self.selections
    }

    fn load_next(&mut self) {
        match self.responses.pop_front() {
            Some(byte) => {
                self.out = byte;
                self.driving = true;
            }
            None => {
                self.out = 0xFF;
                self.driving = self.mode == Mode::Single;
            }
        }
        self.out_groups = self.mode.edges_per_byte();
    }
}

impl SerialDevice for ShiftDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn select(&mut self, asserted: bool) {
        if self.rx_groups != 0 {
            debug!("[{}] partial byte dropped ({} groups)", self.name, self.rx_groups);
        }
        if asserted {
            self.selections += 1;
        }
        self.selected = asserted;
        self.out_groups = 0;
        self.rx_groups = 0;
        self.driving = self.mode == Mode::Single && asserted;
        self.level = 0;
    }

    fn clock_falling(&mut self) {
        if self.out_groups == 0 {
            self.load_next();
        }
        let width = self.mode.lines_per_edge();
        let group = (self.out >> (8 - width)) & self.mode.group_mask();
        self.out <<= width;
        self.out_groups -= 1;
        self.level = match self.mode {
            Mode::Single => group << 1,
            Mode::Dual | Mode::Quad => group,
        };
        trace!("[{}] drive group 0x{:X}", self.name, group);
    }

    fn clock_rising(&mut self, io: u8) {
        // Wide modes are half duplex: no listening while answering
        if self.driving && self.mode != Mode::Single {
            return;
        }
        let group = match self.mode {
            Mode::Single => io & 1,
            Mode::Dual | Mode::Quad => io & self.mode.group_mask(),
        };
        self.rx = (self.rx << self.mode.lines_per_edge()) | group;
        self.rx_groups += 1;
        if self.rx_groups == self.mode.edges_per_byte() {
            trace!("[{}] received 0x{:02X}", self.name, self.rx);
            self.received.push(self.rx);
            self.rx_groups = 0;
        }
    }

    fn drive(&self) -> DeviceDrive {
        if !self.selected || !self.driving {
            return DeviceDrive::default();
        }
        let mask = match self.mode {
            Mode::Single => 0b0010,
            Mode::Dual => 0b0011,
            Mode::Quad => 0b1111,
        };
        DeviceDrive {
            mask,
            value: self.level,
        }
    }
}
