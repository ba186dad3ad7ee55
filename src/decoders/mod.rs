//! Protocol decoders for recorded bus traces

pub mod qspi_decoder;
pub mod types;

pub use qspi_decoder::QspiDecoder;
pub use types::{CsPolarity, SerialFrame, SpiMode, TimingInfo};
