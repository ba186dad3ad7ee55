//! Combinational pin mapping
//!
//! Everything here is a pure function of engine state: FIFO strobes, the
//! endpoint address line, serial line directions per mode and the status
//! indicators.

use super::header::{Direction, Mode};

/// Input-queue handshake lines, active high in this model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadStrobes {
    pub output_enable: bool,
    pub read_strobe: bool,
}

/// Output-queue handshake lines, active high in this model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteStrobes {
    pub write_enable: bool,
    pub write_strobe: bool,
    pub packet_end: bool,
}

/// Endpoint exposed on the shared FIFO data bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoAddress {
    /// Host-to-bridge endpoint (address line low)
    Input,
    /// Bridge-to-host endpoint
    Output,
}

/// Complete FIFO-side pin state for one clock period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoPins {
    pub read: ReadStrobes,
    pub write: WriteStrobes,
    pub address: FifoAddress,
    /// Byte driven onto the bus while `write.write_enable` is set
    pub data_out: u8,
}

impl FifoPins {
    pub fn new(read: ReadStrobes, write: WriteStrobes, data_out: u8) -> Self {
        Self {
            read,
            write,
            address: fifo_address(read),
            data_out,
        }
    }
}

/// The address line is driven low for the input endpoint whenever the
/// reader enables the queue's outputs.
pub fn fifo_address(read: ReadStrobes) -> FifoAddress {
    if read.output_enable {
        FifoAddress::Input
    } else {
        FifoAddress::Output
    }
}

/// Lines (IO3..IO0 as bits 3..0) the bridge drives for a mode and direction.
///
/// Single line always drives IO0 and listens on IO1; IO2/IO3 float to their
/// pull-ups. Dual and quad turn their lines around with the direction.
pub fn drive_mask(mode: Mode, direction: Direction) -> u8 {
    match (mode, direction) {
        (Mode::Single, _) => 0b0001,
        (Mode::Dual, Direction::Write) => 0b0011,
        (Mode::Quad, Direction::Write) => 0b1111,
        (Mode::Dual | Mode::Quad, Direction::Read) => 0b0000,
    }
}

/// Serial bus pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialPins {
    pub sck: bool,
    /// Chip select, active low
    pub cs_n: bool,
    /// Resolved level on IO3..IO0
    pub io: u8,
    /// Lines the bridge is driving
    pub drive_mask: u8,
}

/// Diagnostic busy indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusLines {
    pub reader_busy: bool,
    pub shift_busy: bool,
    pub writer_busy: bool,
}

/// Combine bridge and device drivers on the four data lines. Undriven lines
/// read high. Where both sides drive, the bridge's level is taken and the
/// contended lines are returned for reporting.
pub fn resolve_io(bridge_mask: u8, bridge_value: u8, device_mask: u8, device_value: u8) -> (u8, u8) {
    let bridge_mask = bridge_mask & 0x0F;
    let device_mask = device_mask & 0x0F;
    let pulled = !(bridge_mask | device_mask) & 0x0F;
    let io = (bridge_value & bridge_mask) | (device_value & device_mask & !bridge_mask) | pulled;
    (io, bridge_mask & device_mask)
}
