//! Registered output stage
//!
//! The orchestrator's control outputs are decoded from its state. They pass
//! through this register before reaching a sub-engine or a pin, so each
//! trigger is a single clean level change aligned to the base clock and acts
//! exactly one period after the state that requested it.

/// Control outputs decoded from the orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triggers {
    pub reader: bool,
    pub shift: bool,
    pub writer: bool,
    /// Qualifies `writer`: close the packet after this byte
    pub terminate: bool,
    pub chip_select: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerStage {
    registered: Triggers,
}

impl TriggerStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rising base-clock edge: capture the decoded outputs of the state the
    /// orchestrator is leaving. Returns the new registered value.
    pub fn clock(&mut self, decoded: Triggers) -> Triggers {
        self.registered = decoded;
        self.registered
    }

    pub fn outputs(&self) -> Triggers {
        self.registered
    }
}
