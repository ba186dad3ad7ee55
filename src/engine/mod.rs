//! Bridge engine state machines
//!
//! Each engine is an explicit state enum with a pure next-state function and
//! a `clock` that commits it. The [`Bridge`](crate::Bridge) steps them in a
//! fixed order every base-clock period:
//!
//! - **Reader** / **Writer** / **Orchestrator**: main clock domain, rising edge
//! - **Shift engine**: advances on falling edges, samples on rising serial edges
//! - **Clock gate**: derives the serial clock from the base clock
//! - **Stage**: registers every orchestrator output for one period

pub mod clock;
pub mod header;
pub mod orchestrator;
pub mod pins;
pub mod reader;
pub mod shift;
pub mod stage;
pub mod writer;

pub use clock::ClockGate;
pub use header::{Direction, HostCommand, MAX_LENGTH, Mode, TransactionConfig};
pub use orchestrator::{EngineStatus, Orchestrator, Phase, RemainingCount};
pub use pins::{FifoAddress, FifoPins, ReadStrobes, SerialPins, StatusLines, WriteStrobes};
pub use reader::{FifoReader, ReaderState};
pub use shift::{ShiftEngine, ShiftState};
pub use stage::{TriggerStage, Triggers};
pub use writer::{FifoWriter, WriterState};
