//! Common decoder types and enums

/// Timing information for decoded events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingInfo {
    /// Timestamp in microseconds
    pub timestamp_us: f64,
    /// Position in capture (nanoseconds)
    pub position: u64,
}

impl TimingInfo {
    pub fn new(timestamp_us: f64, position: u64) -> Self {
        Self {
            timestamp_us,
            position,
        }
    }

    pub fn from_ns(position: u64) -> Self {
        Self::new(position as f64 / 1_000.0, position)
    }
}

/// SPI clock polarity and phase modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0: Clock idle low, sample on rising edge
    Mode0,
    /// CPOL=0, CPHA=1: Clock idle low, sample on falling edge
    Mode1,
    /// CPOL=1, CPHA=0: Clock idle high, sample on falling edge
    Mode2,
    /// CPOL=1, CPHA=1: Clock idle high, sample on rising edge
    #[default]
    Mode3,
}

impl SpiMode {
    pub fn samples_on_rising(self) -> bool {
        matches!(self, SpiMode::Mode0 | SpiMode::Mode3)
    }
}

/// Chip select polarity for decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsPolarity {
    /// LOW = active, HIGH = inactive
    #[default]
    ActiveLow,
    /// HIGH = active, LOW = inactive
    ActiveHigh,
}

impl CsPolarity {
    pub fn is_active(self, level: bool) -> bool {
        match self {
            CsPolarity::ActiveLow => !level,
            CsPolarity::ActiveHigh => level,
        }
    }
}

/// Bytes seen during one chip-select window
#[derive(Debug, Clone, PartialEq)]
pub struct SerialFrame {
    /// Bytes on the data lines: IO0 in single mode, the low lines otherwise
    pub data: Vec<u8>,
    /// Bytes on IO1 in single mode; empty in dual and quad modes
    pub miso: Vec<u8>,
    /// Sampling edges inside the window
    pub edges: usize,
    /// Chip-select assertion
    pub timing: TimingInfo,
    /// Chip-select release, `None` if the capture ends first
    pub end: Option<u64>,
}
