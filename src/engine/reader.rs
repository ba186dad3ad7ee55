//! Input-FIFO reader
//!
//! Pops one byte from the host-facing input queue per trigger using a
//! two-phase enable-then-strobe handshake:
//!
//! | state   | OE | RD | leaves when        |
//! |---------|----|----|--------------------|
//! | Idle    | 0  | 0  | trigger            |
//! | Start   | 0  | 0  | queue not empty    |
//! | Capture | 1  | 0  | always (data latched) |
//! | Advance | 1  | 1  | always (element popped) |

use super::pins::ReadStrobes;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Start,
    Capture,
    Advance,
}

pub struct FifoReader {
    state: ReaderState,
    data: u8,
    trigger: bool,
}

impl FifoReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::Idle,
            data: 0,
            trigger: false,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Last byte latched from the queue
    pub fn data(&self) -> u8 {
        self.data
    }

    pub fn is_busy(&self) -> bool {
        self.state != ReaderState::Idle
    }

    /// Apply the registered trigger level; a rising level forces `Start`.
    pub fn trigger(&mut self, level: bool) {
        if level && !self.trigger {
            trace!(from = ?self.state, "reader: trigger");
            self.state = ReaderState::Start;
        }
        self.trigger = level;
    }

    /// Pure next-state function
    pub fn next_state(&self, empty: bool) -> ReaderState {
        match self.state {
            ReaderState::Idle => ReaderState::Idle,
            ReaderState::Start if empty => ReaderState::Start,
            ReaderState::Start => ReaderState::Capture,
            ReaderState::Capture => ReaderState::Advance,
            ReaderState::Advance => ReaderState::Idle,
        }
    }

    pub fn strobes(&self) -> ReadStrobes {
        match self.state {
            ReaderState::Idle | ReaderState::Start => ReadStrobes::default(),
            ReaderState::Capture => ReadStrobes {
                output_enable: true,
                read_strobe: false,
            },
            ReaderState::Advance => ReadStrobes {
                output_enable: true,
                read_strobe: true,
            },
        }
    }

    /// Rising base-clock edge. `empty` and `bus` are the queue's pre-edge
    /// flag and presented byte.
    pub fn clock(&mut self, empty: bool, bus: u8) {
        let next = self.next_state(empty);
        if self.state == ReaderState::Capture {
            self.data = bus;
            debug!("reader: latched 0x{:02X}", bus);
        }
        if next != self.state {
            trace!("reader: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}

impl Default for FifoReader {
    fn default() -> Self {
        Self::new()
    }
}
