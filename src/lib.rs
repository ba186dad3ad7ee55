//! Cycle-accurate model of a FIFO to QSPI bridge controller
//!
//! A host streams command bytes into an input endpoint. The bridge reads a
//! two-byte header per transaction (chip select, direction, lane width and a
//! 12-bit length), then moves that many bytes between the host endpoints and
//! a serial peripheral over single, dual or quad lanes.
//!
//! # Architecture
//!
//! - **Engines**: FIFO reader, FIFO writer and serial shift engine, each an
//!   explicit state machine with a start/busy handshake
//! - **Orchestrator**: 15-phase controller that overlaps the FIFO side and the
//!   serial side of consecutive bytes
//! - **Clock gate / stage**: glitch-free serial clock and one registered tick
//!   on every control output
//! - **Bridge**: steps everything per base-clock period and records the bus
//! - **Decoders**: turn a recorded trace back into frames
//! - **Service**: runs a bridge on its own thread behind crossbeam channels
//!
//! # Example
//!
//! ```no_run
//! use qspi_bridge::{Bridge, BridgeConfig, HostCommand, Mode, ShiftDevice};
//!
//! let device = ShiftDevice::new(Mode::Quad).with_response(&[0x9F]);
//! let mut bridge = Bridge::with_device(BridgeConfig::default(), device)?;
//! bridge.submit(&HostCommand::read(Mode::Quad, 1)?)?;
//! bridge.run_until_idle(10_000)?;
//! assert_eq!(bridge.drain_packets(), vec![vec![0x9F]]);
//! # Ok::<(), qspi_bridge::BridgeError>(())
//! ```

use thiserror::Error;

pub mod bridge;
pub mod bus;
pub mod config;
pub mod decoders;
pub mod engine;
pub mod runtime;

pub use bridge::Bridge;
pub use bus::{BusTrace, InputQueue, NullDevice, OutputQueue, SerialDevice, ShiftDevice};
pub use config::BridgeConfig;
pub use decoders::{CsPolarity, QspiDecoder, SerialFrame, SpiMode, TimingInfo};
pub use engine::{Direction, HostCommand, MAX_LENGTH, Mode, Phase, TransactionConfig};
pub use runtime::{BridgeService, HostMessage, Sample, ServiceReport, StallPolicy, StallWatchdog};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transaction length out of range: {0} (max 4095)")]
    LengthOutOfRange(usize),

    #[error("Input endpoint overflow: {requested} bytes requested, {available} available")]
    InputOverflow { requested: usize, available: usize },

    #[error("Orchestrator stalled in {phase} for {ticks} ticks")]
    Stalled { phase: Phase, ticks: u64 },

    #[error("Tick budget of {0} exhausted")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Host link disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
