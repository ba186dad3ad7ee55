//! Transaction header: the two control bytes that open every transaction
//!
//! ```text
//! byte 0:  7     6:5    4     3:0
//!         [CS] [MODE] [DIR] [LEN 11:8]
//! byte 1:  LEN 7:0
//! ```
//!
//! MODE is `10` for quad, `01` for dual and `00` for single line. DIR is 0 for
//! host-to-serial writes and 1 for serial-to-host reads.

use crate::{BridgeError, Result};
use std::fmt;

/// Largest payload a single header can describe (12-bit length field)
pub const MAX_LENGTH: u16 = 0x0FFF;

const CS_BIT: u8 = 0x80;
const MODE_SHIFT: u8 = 5;
const MODE_MASK: u8 = 0x03;
const DIR_BIT: u8 = 0x10;
const LEN_HIGH_MASK: u8 = 0x0F;

/// Serial signaling mode: how many data lines carry bits on each clock edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One line out (IO0), one line in (IO1)
    #[default]
    Single,
    /// Two bidirectional lines (IO0, IO1)
    Dual,
    /// Four bidirectional lines (IO0..IO3)
    Quad,
}

impl Mode {
    /// Decode the two mode bits. The quad bit wins when both are set.
    pub fn from_bits(bits: u8) -> Self {
        if bits & 0b10 != 0 {
            Mode::Quad
        } else if bits & 0b01 != 0 {
            Mode::Dual
        } else {
            Mode::Single
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Mode::Single => 0b00,
            Mode::Dual => 0b01,
            Mode::Quad => 0b10,
        }
    }

    /// Number of data lines driven or sampled per clock edge
    pub fn lines_per_edge(self) -> u8 {
        match self {
            Mode::Single => 1,
            Mode::Dual => 2,
            Mode::Quad => 4,
        }
    }

    /// Clock edges needed to move one byte
    pub fn edges_per_byte(self) -> u8 {
        8 / self.lines_per_edge()
    }

    /// Mask covering one group of `lines_per_edge` bits
    pub fn group_mask(self) -> u8 {
        (1u8 << self.lines_per_edge()) - 1
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Single => write!(f, "single"),
            Mode::Dual => write!(f, "dual"),
            Mode::Quad => write!(f, "quad"),
        }
    }
}

/// Transfer direction, seen from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Host bytes are shifted out onto the serial bus
    #[default]
    Write,
    /// Serial bytes are captured and pushed to the host
    Read,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Write => write!(f, "write"),
            Direction::Read => write!(f, "read"),
        }
    }
}

/// Configuration latched from the header, stable for one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionConfig {
    pub chip_select: bool,
    pub direction: Direction,
    pub mode: Mode,
    /// Payload length in bytes (12 bits)
    pub length: u16,
}

impl TransactionConfig {
    /// Build a chip-select-asserting transaction, validating the length
    pub fn new(direction: Direction, mode: Mode, length: usize) -> Result<Self> {
        if length > MAX_LENGTH as usize {
            return Err(BridgeError::LengthOutOfRange(length));
        }
        Ok(Self {
            chip_select: true,
            direction,
            mode,
            length: length as u16,
        })
    }

    /// First latch stage: everything in header byte 0. The low length bits
    /// are cleared until the second stage.
    pub fn from_first_byte(byte: u8) -> Self {
        Self {
            chip_select: byte & CS_BIT != 0,
            direction: if byte & DIR_BIT != 0 {
                Direction::Read
            } else {
                Direction::Write
            },
            mode: Mode::from_bits((byte >> MODE_SHIFT) & MODE_MASK),
            length: u16::from(byte & LEN_HIGH_MASK) << 8,
        }
    }

    /// Second latch stage: low eight bits of the length
    pub fn latch_length_low(&mut self, byte: u8) {
        self.length = (self.length & 0x0F00) | u16::from(byte);
    }

    /// Encode as the two header bytes
    pub fn encode(&self) -> [u8; 2] {
        let mut first = (self.mode.bits() << MODE_SHIFT) | ((self.length >> 8) as u8 & LEN_HIGH_MASK);
        if self.chip_select {
            first |= CS_BIT;
        }
        if self.direction == Direction::Read {
            first |= DIR_BIT;
        }
        [first, (self.length & 0xFF) as u8]
    }
}

impl fmt::Display for TransactionConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} x{} (cs={})",
            self.direction, self.mode, self.length, self.chip_select
        )
    }
}

/// Host-side byte stream builders for the input endpoint
pub struct HostCommand;

impl HostCommand {
    /// Header followed by the payload to shift out
    pub fn write(mode: Mode, payload: &[u8]) -> Result<Vec<u8>> {
        let config = TransactionConfig::new(Direction::Write, mode, payload.len())?;
        let mut bytes = Vec::with_capacity(2 + payload.len());
        bytes.extend_from_slice(&config.encode());
        bytes.extend_from_slice(payload);
        Ok(bytes)
    }

    /// Header requesting `length` bytes from the serial bus
    pub fn read(mode: Mode, length: usize) -> Result<Vec<u8>> {
        let config = TransactionConfig::new(Direction::Read, mode, length)?;
        Ok(config.encode().to_vec())
    }

    /// A single header byte with chip-select cleared. The bridge drops it
    /// after the first latch without reading a length byte.
    pub fn deselect() -> Vec<u8> {
        vec![0x00]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_byte_fields() {
        let cfg = TransactionConfig::from_first_byte(0xDA);
        assert!(cfg.chip_select);
        assert_eq!(cfg.mode, Mode::Quad);
        assert_eq!(cfg.direction, Direction::Read);
        assert_eq!(cfg.length, 0x0A00);

        let cfg = TransactionConfig::from_first_byte(0x23);
        assert!(!cfg.chip_select);
        assert_eq!(cfg.mode, Mode::Dual);
        assert_eq!(cfg.direction, Direction::Write);
        assert_eq!(cfg.length, 0x0300);
    }

    #[test]
    fn test_two_stage_length() {
        let mut cfg = TransactionConfig::from_first_byte(0x8F);
        cfg.latch_length_low(0xFF);
        assert_eq!(cfg.length, MAX_LENGTH);
        assert_eq!(cfg.mode, Mode::Single);
    }

    #[test]
    fn test_mode_bits_quad_wins() {
        assert_eq!(Mode::from_bits(0b11), Mode::Quad);
        assert_eq!(Mode::from_bits(0b10), Mode::Quad);
        assert_eq!(Mode::from_bits(0b01), Mode::Dual);
        assert_eq!(Mode::from_bits(0b00), Mode::Single);
    }

    #[test]
    fn test_lines_per_edge() {
        assert_eq!(Mode::Single.edges_per_byte(), 8);
        assert_eq!(Mode::Dual.edges_per_byte(), 4);
        assert_eq!(Mode::Quad.edges_per_byte(), 2);
        assert_eq!(Mode::Dual.group_mask(), 0b11);
        assert_eq!(Mode::Quad.group_mask(), 0b1111);
    }

    #[test]
    fn test_encode_scenario_header() {
        let cfg = TransactionConfig::new(Direction::Write, Mode::Single, 3).unwrap();
        assert_eq!(cfg.encode(), [0x80, 0x03]);

        let cfg = TransactionConfig::new(Direction::Read, Mode::Quad, 1).unwrap();
        assert_eq!(cfg.encode(), [0xD0, 0x01]);

        let mut decoded = TransactionConfig::from_first_byte(0xD0);
        decoded.latch_length_low(0x01);
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn test_length_out_of_range() {
        let result = HostCommand::write(Mode::Single, &[0u8; 4096]);
        assert!(matches!(result, Err(BridgeError::LengthOutOfRange(4096))));
        assert!(HostCommand::read(Mode::Quad, 4095).is_ok());
    }

    #[test]
    fn test_host_command_layout() {
        let bytes = HostCommand::write(Mode::Dual, &[0xA5, 0x5A]).unwrap();
        assert_eq!(bytes, vec![0xA0, 0x02, 0xA5, 0x5A]);
        assert_eq!(HostCommand::deselect(), vec![0x00]);
    }
}
