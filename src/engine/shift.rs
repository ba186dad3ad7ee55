//! Serial shift engine
//!
//! Moves one byte across the serial bus, 1, 2 or 4 bits per clock edge. The
//! state advances on falling base-clock edges, the data groups change with
//! the falling serial edge, and incoming lines are captured on every rising
//! serial edge.
//!
//! ```text
//! Idle ─trigger─▶ Begin ─▶ Bit(0) ─▶ … ─▶ Bit(8/L - 1) ─▶ Idle
//! ```
//!
//! Single line walks Bit(0)..Bit(7), dual Bit(0)..Bit(3), quad Bit(0)..Bit(1).

use super::header::Mode;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftState {
    Idle,
    Begin,
    /// Driving bit group `n`, MSB group first
    Bit(u8),
}

pub struct ShiftEngine {
    state: ShiftState,
    mode: Mode,
    /// Byte being shifted onto the bus
    out: u8,
    /// Bits captured on rising edges
    input: u8,
    trigger: bool,
}

impl ShiftEngine {
    pub fn new() -> Self {
        Self {
            state: ShiftState::Idle,
            mode: Mode::Single,
            out: 0,
            input: 0,
            trigger: false,
        }
    }

    pub fn state(&self) -> ShiftState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Byte assembled from the sampled lines
    pub fn input(&self) -> u8 {
        self.input
    }

    /// Apply the registered trigger level. A rising level loads the out
    /// register and forces `Begin`, whatever the current state.
    pub fn trigger(&mut self, level: bool, mode: Mode, byte: u8) {
        if level && !self.trigger {
            trace!(from = ?self.state, "shift: trigger, out=0x{:02X} {}", byte, mode);
            self.mode = mode;
            self.out = byte;
            self.state = ShiftState::Begin;
        }
        self.trigger = level;
    }

    /// Pure next-state function for one falling base-clock edge
    pub fn next_state(&self) -> ShiftState {
        let last = self.mode.edges_per_byte() - 1;
        match self.state {
            ShiftState::Idle => ShiftState::Idle,
            ShiftState::Begin => ShiftState::Bit(0),
            ShiftState::Bit(n) if n >= last => ShiftState::Idle,
            ShiftState::Bit(n) => ShiftState::Bit(n + 1),
        }
    }

    /// Advance on a falling base-clock edge
    pub fn fall(&mut self) {
        let next = self.next_state();
        if next != self.state {
            trace!("shift: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Capture on a rising serial-clock edge. In single mode the incoming bit
    /// is on IO1; wider modes use the low `lines_per_edge` lines.
    pub fn sample(&mut self, io: u8) {
        let group = match self.mode {
            Mode::Single => (io >> 1) & 1,
            Mode::Dual | Mode::Quad => io & self.mode.group_mask(),
        };
        self.input = (self.input << self.mode.lines_per_edge()) | group;
    }

    /// Value on the engine's data outputs (IO3..IO0 as bits 3..0)
    pub fn drive(&self) -> u8 {
        match self.state {
            ShiftState::Bit(n) => {
                let width = self.mode.lines_per_edge();
                let shift = 8 - width * (n + 1);
                (self.out >> shift) & self.mode.group_mask()
            }
            ShiftState::Idle | ShiftState::Begin => 0,
        }
    }

    /// Asserted while the serial clock must sit at its idle level: outside
    /// the shifting window and during the final bit group.
    pub fn suppress_clock(&self) -> bool {
        match self.state {
            ShiftState::Idle | ShiftState::Begin => true,
            ShiftState::Bit(n) => n + 1 >= self.mode.edges_per_byte(),
        }
    }

    /// Busy while shifting or while the gated clock is still running
    pub fn is_busy(&self, clock_active: bool) -> bool {
        self.state != ShiftState::Idle || clock_active
    }
}

impl Default for ShiftEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(engine: &mut ShiftEngine) -> Vec<ShiftState> {
        let mut states = vec![engine.state()];
        while engine.state() != ShiftState::Idle {
            engine.fall();
            states.push(engine.state());
        }
        states
    }

    #[test]
    fn test_idle_without_trigger() {
        let mut engine = ShiftEngine::new();
        for _ in 0..100 {
            engine.fall();
            engine.trigger(false, Mode::Quad, 0xFF);
            assert_eq!(engine.state(), ShiftState::Idle);
            assert!(!engine.is_busy(false));
        }
    }

    #[test]
    fn test_state_walk_per_mode() {
        for (mode, bits) in [(Mode::Single, 8), (Mode::Dual, 4), (Mode::Quad, 2)] {
            let mut engine = ShiftEngine::new();
            engine.trigger(true, mode, 0x00);
            let states = walk(&mut engine);
            // Begin, Bit(0..bits), Idle
            assert_eq!(states.len(), bits + 2, "mode {}", mode);
            assert_eq!(states[0], ShiftState::Begin);
            assert_eq!(states[bits], ShiftState::Bit(bits as u8 - 1));
        }
    }

    #[test]
    fn test_trigger_is_edge_sensitive() {
        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Single, 0x12);
        engine.fall();
        assert_eq!(engine.state(), ShiftState::Bit(0));
        // Held level does not restart the shift
        engine.trigger(true, Mode::Single, 0x34);
        assert_eq!(engine.state(), ShiftState::Bit(0));
        engine.trigger(false, Mode::Single, 0x34);
        engine.trigger(true, Mode::Single, 0x34);
        assert_eq!(engine.state(), ShiftState::Begin);
    }

    #[test]
    fn test_drive_groups_msb_first() {
        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Quad, 0xA5);
        engine.fall();
        assert_eq!(engine.drive(), 0xA);
        engine.fall();
        assert_eq!(engine.drive(), 0x5);

        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Dual, 0b10_01_11_00);
        let mut groups = Vec::new();
        engine.fall();
        while engine.state() != ShiftState::Idle {
            groups.push(engine.drive());
            engine.fall();
        }
        assert_eq!(groups, vec![0b10, 0b01, 0b11, 0b00]);

        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Single, 0xA5);
        let mut bits = Vec::new();
        engine.fall();
        while engine.state() != ShiftState::Idle {
            bits.push(engine.drive());
            engine.fall();
        }
        assert_eq!(bits, vec![1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_suppress_on_final_group() {
        let mut engine = ShiftEngine::new();
        assert!(engine.suppress_clock());
        engine.trigger(true, Mode::Dual, 0);
        assert!(engine.suppress_clock());
        engine.fall();
        assert!(!engine.suppress_clock()); // Bit(0)
        engine.fall();
        engine.fall();
        assert!(!engine.suppress_clock()); // Bit(2)
        engine.fall();
        assert!(engine.suppress_clock()); // Bit(3)
    }

    #[test]
    fn test_sample_assembles_byte() {
        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Single, 0);
        for bit in [1u8, 1, 0, 0, 1, 0, 1, 0] {
            engine.sample(bit << 1);
        }
        assert_eq!(engine.input(), 0xCA);

        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Quad, 0);
        engine.sample(0x3);
        engine.sample(0xC);
        assert_eq!(engine.input(), 0x3C);

        let mut engine = ShiftEngine::new();
        engine.trigger(true, Mode::Dual, 0);
        for group in [0b01u8, 0b10, 0b11, 0b00] {
            engine.sample(group | 0b1100);
        }
        assert_eq!(engine.input(), 0b01_10_11_00);
    }

    #[test]
    fn test_busy_includes_clock() {
        let engine = ShiftEngine::new();
        assert!(!engine.is_busy(false));
        assert!(engine.is_busy(true));
    }
}
