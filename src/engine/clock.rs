//! Serial clock gate
//!
//! `sck = base | gate`. While `gate` is set the serial clock parks high. The
//! gate opens the instant the shift engine drops clock-suppress, which lands
//! on a falling base edge, so the first serial edge is a clean fall. It only
//! closes on a rising base edge, when `sck` is already high, so the last
//! pulse is never truncated.

#[derive(Debug, Clone, Copy)]
pub struct ClockGate {
    base: bool,
    gate: bool,
}

impl ClockGate {
    pub fn new() -> Self {
        Self {
            base: true,
            gate: true,
        }
    }

    /// Externally visible serial clock level
    pub fn sck(&self) -> bool {
        self.base || self.gate
    }

    /// True while the gate lets the base clock through
    pub fn is_active(&self) -> bool {
        !self.gate
    }

    /// Rising base edge. Returns true if the serial clock rose.
    pub fn rise(&mut self, suppress: bool) -> bool {
        let before = self.sck();
        self.base = true;
        if suppress {
            self.gate = true;
        }
        !before && self.sck()
    }

    /// Falling base edge, with `suppress` evaluated after the shift engine
    /// has advanced. Returns true if the serial clock fell.
    pub fn fall(&mut self, suppress: bool) -> bool {
        let before = self.sck();
        self.base = false;
        if !suppress {
            self.gate = false;
        }
        before && !self.sck()
    }
}

impl Default for ClockGate {
    fn default() -> Self {
        Self::new()
    }
}
