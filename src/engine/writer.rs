//! Output-FIFO writer
//!
//! Pushes one byte into the host-bound queue per trigger. When the
//! orchestrator asks for it, the writer follows the byte with a
//! packet-terminate strobe and one settle period so the endpoint can commit a
//! short or zero-length packet.
//!
//! ```text
//! Idle ─trigger─▶ Start ─ready─▶ Commit ─▶ Idle
//!                                   └─terminate─▶ Terminate ─▶ Settle ─▶ Idle
//! ```

use super::pins::WriteStrobes;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    Start,
    Commit,
    Terminate,
    Settle,
}

pub struct FifoWriter {
    state: WriterState,
    data: u8,
    terminate: bool,
    trigger: bool,
}

impl FifoWriter {
    pub fn new() -> Self {
        Self {
            state: WriterState::Idle,
            data: 0,
            terminate: false,
            trigger: false,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Byte driven onto the FIFO bus
    pub fn data(&self) -> u8 {
        self.data
    }

    pub fn is_busy(&self) -> bool {
        self.state != WriterState::Idle
    }

    /// Apply the registered trigger level. A rising level latches the byte
    /// and the terminate request and forces `Start`.
    pub fn trigger(&mut self, level: bool, terminate: bool, byte: u8) {
        if level && !self.trigger {
            trace!(from = ?self.state, terminate, "writer: trigger, data=0x{:02X}", byte);
            self.data = byte;
            self.terminate = terminate;
            self.state = WriterState::Start;
        }
        self.trigger = level;
    }

    /// Pure next-state function. `full` means the endpoint has no room.
    pub fn next_state(&self, full: bool) -> WriterState {
        match self.state {
            WriterState::Idle => WriterState::Idle,
            WriterState::Start if full => WriterState::Start,
            WriterState::Start => WriterState::Commit,
            WriterState::Commit if self.terminate => WriterState::Terminate,
            WriterState::Commit => WriterState::Idle,
            WriterState::Terminate => WriterState::Settle,
            WriterState::Settle => WriterState::Idle,
        }
    }

    pub fn strobes(&self) -> WriteStrobes {
        match self.state {
            WriterState::Commit => WriteStrobes {
                write_enable: true,
                write_strobe: true,
                packet_end: false,
            },
            WriterState::Terminate => WriteStrobes {
                write_enable: false,
                write_strobe: false,
                packet_end: true,
            },
            WriterState::Idle | WriterState::Start | WriterState::Settle => WriteStrobes::default(),
        }
    }

    /// Rising base-clock edge with the endpoint's pre-edge `full` flag
    pub fn clock(&mut self, full: bool) {
        let next = self.next_state(full);
        if next != self.state {
            trace!("writer: {:?} -> {:?}", self.state, next);
            if next == WriterState::Terminate {
                debug!("writer: packet terminate");
            }
        }
        self.state = next;
    }
}

impl Default for FifoWriter {
    fn default() -> Self {
        Self::new()
    }
}
