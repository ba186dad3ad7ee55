//! Run one transaction through the bridge against a scripted peripheral
//!
//! Usage:
//!   qspi-bridge --mode quad --write 0xA5,0x00,0xFF
//!   qspi-bridge --mode dual --read 4 --response 12,34,56,78
//!
//! Set `RUST_LOG=debug` to follow the orchestrator phase by phase.

use clap::{Parser, ValueEnum};
use qspi_bridge::{
    Bridge, BridgeConfig, HostCommand, Mode, QspiDecoder, ShiftDevice, StallPolicy,
};
use tracing::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Single,
    Dual,
    Quad,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Single => Mode::Single,
            ModeArg::Dual => Mode::Dual,
            ModeArg::Quad => Mode::Quad,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Lane width
    #[arg(short, long, value_enum, default_value = "single")]
    mode: ModeArg,

    /// Bytes to write to the peripheral (hex, comma separated)
    #[arg(short, long, value_delimiter = ',', value_parser = parse_hex, conflicts_with = "read")]
    write: Vec<u8>,

    /// Number of bytes to read from the peripheral
    #[arg(short, long)]
    read: Option<usize>,

    /// Bytes the peripheral answers with (hex, comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_hex)]
    response: Vec<u8>,

    /// Output endpoint packet size
    #[arg(long, default_value_t = 512)]
    packet_size: usize,

    /// Base clock period in nanoseconds
    #[arg(long, default_value_t = 20)]
    period_ns: u64,

    /// Abort when a busy-wait lasts longer than this many ticks
    #[arg(long)]
    stall_limit: Option<u64>,

    /// Tick budget for the whole run
    #[arg(long, default_value_t = 1_000_000)]
    max_ticks: u64,
}

fn parse_hex(s: &str) -> Result<u8, std::num::ParseIntError> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(s, 16)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mode = Mode::from(args.mode);

    let mut config = BridgeConfig::default()
        .with_packet_size(args.packet_size)
        .with_clock_period_ns(args.period_ns);
    if let Some(limit) = args.stall_limit {
        config = config.with_stall_limit(limit, StallPolicy::Abort);
    }

    let command = match args.read {
        Some(length) => HostCommand::read(mode, length)?,
        None => HostCommand::write(mode, &args.write)?,
    };

    info!("=== QSPI Bridge ===");
    info!("Mode: {}", mode);
    info!("Command: {:02X?}", command);

    let device = ShiftDevice::new(mode)
        .with_name("scripted")
        .with_response(&args.response);
    let mut bridge = Bridge::with_device(config, device)?;
    bridge.submit(&command)?;
    let (ticks, packets) = bridge.run_draining(args.max_ticks)?;

    if let Some(trace) = bridge.trace() {
        for (i, frame) in QspiDecoder::new(mode).decode(trace).iter().enumerate() {
            info!(
                "Frame #{}: {} edges at t={:.3}µs, IO={:02X?} MISO={:02X?}",
                i + 1,
                frame.edges,
                frame.timing.timestamp_us,
                frame.data,
                frame.miso
            );
        }
    }

    for (i, packet) in packets.iter().enumerate() {
        info!("Packet #{}: {} bytes {:02X?}", i + 1, packet.len(), packet);
    }
    info!("Peripheral received: {:02X?}", bridge.device().received());

    info!(
        "Done in {} ticks ({:.3}µs): {} transactions, {} stores, {} input pops, {} output writes, {} packet ends",
        ticks,
        bridge.time_ns() as f64 / 1_000.0,
        bridge.transactions(),
        bridge.orchestrator().stores(),
        bridge.input().pops(),
        bridge.output().writes(),
        bridge.output().packet_ends(),
    );

    Ok(())
}
