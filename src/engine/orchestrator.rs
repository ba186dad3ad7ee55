//! Transaction orchestrator
//!
//! Fifteen phases walked in order once per rising base-clock edge. The only
//! departures from `n -> n + 1` are the busy-wait self loops and the
//! documented branches:
//!
//! ```text
//!  0 FetchHeader0   trigger reader
//!  1 AwaitHeader0   wait reader
//!  2 LatchHeader0   latch cs/mode/dir/len[11:8]; cs clear -> 0
//!  3 FetchHeader1   trigger reader
//!  4 AwaitHeader1   wait reader
//!  5 LatchLength    latch len[7:0]
//!  6 CheckLength    len == 0 -> 0
//!  7 Prime          trigger source (reader on write, shift on read)
//!  8 AwaitPrime     wait reader, shift
//!  9 StorePrime     relay <- source, remaining -= 1; remaining == 0 -> 13
//! 10 Exchange       trigger sink with relay, trigger next source, shift always
//! 11 AwaitExchange  wait reader, shift, writer
//! 12 StoreExchange  relay <- source, remaining -= 1; remaining > 0 -> 10
//! 13 Drain          trigger final sink (shift on write, writer + terminate on read)
//! 14 AwaitDrain     wait writer, shift -> 0
//! ```
//!
//! The first byte has no predecessor to overlap with, so it is primed alone
//! (7-9); the last has no successor, so it is drained alone (13-14). In
//! between, each byte's sink operation overlaps the next byte's source
//! operation.

use super::header::{Direction, TransactionConfig};
use super::stage::Triggers;
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FetchHeader0,
    AwaitHeader0,
    LatchHeader0,
    FetchHeader1,
    AwaitHeader1,
    LatchLength,
    CheckLength,
    Prime,
    AwaitPrime,
    StorePrime,
    Exchange,
    AwaitExchange,
    StoreExchange,
    Drain,
    AwaitDrain,
}

impl Phase {
    /// Position in the fixed sequence, 0..=14
    pub fn index(self) -> u8 {
        match self {
            Phase::FetchHeader0 => 0,
            Phase::AwaitHeader0 => 1,
            Phase::LatchHeader0 => 2,
            Phase::FetchHeader1 => 3,
            Phase::AwaitHeader1 => 4,
            Phase::LatchLength => 5,
            Phase::CheckLength => 6,
            Phase::Prime => 7,
            Phase::AwaitPrime => 8,
            Phase::StorePrime => 9,
            Phase::Exchange => 10,
            Phase::AwaitExchange => 11,
            Phase::StoreExchange => 12,
            Phase::Drain => 13,
            Phase::AwaitDrain => 14,
        }
    }

    /// Phases that spin on a sub-engine's busy flag
    pub fn is_busy_wait(self) -> bool {
        matches!(
            self,
            Phase::AwaitHeader0
                | Phase::AwaitHeader1
                | Phase::AwaitPrime
                | Phase::AwaitExchange
                | Phase::AwaitDrain
        )
    }

    /// Between the header latch and the return to phase 0
    pub fn in_transaction(self) -> bool {
        self.index() >= Phase::FetchHeader1.index()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self, self.index())
    }
}

/// Pre-edge view of the sub-engines
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStatus {
    pub reader_busy: bool,
    pub shift_busy: bool,
    pub writer_busy: bool,
    /// Reader's latched byte
    pub reader_data: u8,
    /// Shift engine's captured byte
    pub shift_data: u8,
}

/// 12-bit down counter of payload bytes still to be sourced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemainingCount(u16);

impl RemainingCount {
    pub fn new(length: u16) -> Self {
        Self(length & 0x0FFF)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Count one committed byte. Callers only decrement a non-zero count.
    fn decrement(&mut self) {
        debug_assert!(self.0 > 0, "remaining count underflow");
        self.0 = self.0.saturating_sub(1);
    }
}

pub struct Orchestrator {
    phase: Phase,
    config: TransactionConfig,
    remaining: RemainingCount,
    relay: u8,
    stores: u64,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            phase: Phase::FetchHeader0,
            config: TransactionConfig::default(),
            remaining: RemainingCount::default(),
            relay: 0,
            stores: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> TransactionConfig {
        self.config
    }

    pub fn remaining(&self) -> RemainingCount {
        self.remaining
    }

    /// Byte in transit between the FIFO side and the serial side
    pub fn relay(&self) -> u8 {
        self.relay
    }

    /// Data-store steps performed since reset
    pub fn stores(&self) -> u64 {
        self.stores
    }

    /// Combinational control outputs of the current phase
    pub fn outputs(&self) -> Triggers {
        let write = self.config.direction == Direction::Write;
        let mut out = Triggers {
            chip_select: self.phase.in_transaction(),
            ..Triggers::default()
        };
        match self.phase {
            Phase::FetchHeader0 | Phase::FetchHeader1 => out.reader = true,
            Phase::Prime => {
                out.reader = write;
                out.shift = !write;
            }
            Phase::Exchange => {
                out.reader = write;
                out.writer = !write;
                out.shift = true;
            }
            Phase::Drain => {
                out.shift = write;
                out.writer = !write;
                out.terminate = !write;
            }
            _ => {}
        }
        out
    }

    /// Pure next-phase function
    pub fn next_phase(&self, status: &EngineStatus) -> Phase {
        match self.phase {
            Phase::FetchHeader0 => Phase::AwaitHeader0,
            Phase::AwaitHeader0 if status.reader_busy => Phase::AwaitHeader0,
            Phase::AwaitHeader0 => Phase::LatchHeader0,
            Phase::LatchHeader0 => {
                if TransactionConfig::from_first_byte(status.reader_data).chip_select {
                    Phase::FetchHeader1
                } else {
                    Phase::FetchHeader0
                }
            }
            Phase::FetchHeader1 => Phase::AwaitHeader1,
            Phase::AwaitHeader1 if status.reader_busy => Phase::AwaitHeader1,
            Phase::AwaitHeader1 => Phase::LatchLength,
            Phase::LatchLength => Phase::CheckLength,
            Phase::CheckLength if self.config.length == 0 => Phase::FetchHeader0,
            Phase::CheckLength => Phase::Prime,
            Phase::Prime => Phase::AwaitPrime,
            Phase::AwaitPrime if status.reader_busy || status.shift_busy => Phase::AwaitPrime,
            Phase::AwaitPrime => Phase::StorePrime,
            Phase::StorePrime | Phase::StoreExchange => {
                if self.remaining.get() > 1 {
                    Phase::Exchange
                } else {
                    Phase::Drain
                }
            }
            Phase::Exchange => Phase::AwaitExchange,
            Phase::AwaitExchange
                if status.reader_busy || status.shift_busy || status.writer_busy =>
            {
                Phase::AwaitExchange
            }
            Phase::AwaitExchange => Phase::StoreExchange,
            Phase::Drain => Phase::AwaitDrain,
            Phase::AwaitDrain if status.writer_busy || status.shift_busy => Phase::AwaitDrain,
            Phase::AwaitDrain => Phase::FetchHeader0,
        }
    }

    /// Rising base-clock edge: perform the phase's register writes and move on
    pub fn clock(&mut self, status: &EngineStatus) {
        let next = self.next_phase(status);
        match self.phase {
            Phase::LatchHeader0 => {
                self.config = TransactionConfig::from_first_byte(status.reader_data);
                if self.config.chip_select {
                    debug!("orchestrator: header 0x{:02X} latched", status.reader_data);
                } else {
                    debug!("orchestrator: header 0x{:02X} without chip select, dropped", status.reader_data);
                }
            }
            Phase::LatchLength => {
                self.config.latch_length_low(status.reader_data);
                self.remaining = RemainingCount::new(self.config.length);
                debug!("orchestrator: transaction {}", self.config);
            }
            Phase::StorePrime | Phase::StoreExchange => self.store(status),
            _ => {}
        }
        if next != self.phase {
            trace!("orchestrator: {} -> {}", self.phase, next);
        }
        self.phase = next;
    }

    /// Data-store step: take the freshly sourced byte into the relay
    fn store(&mut self, status: &EngineStatus) {
        self.relay = match self.config.direction {
            Direction::Write => status.reader_data,
            Direction::Read => status.shift_data,
        };
        self.remaining.decrement();
        self.stores += 1;
        debug!(
            "orchestrator: relay <- 0x{:02X}, {} remaining",
            self.relay,
            self.remaining.get()
        );
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
