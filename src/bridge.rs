//! Cycle-accurate bridge: every engine, the host endpoints and the serial
//! peripheral stepped together, one base-clock period per [`Bridge::tick`].
//!
//! ## Tick order
//!
//! Rising half of the period:
//! 1. Snapshot the pre-edge view (busy flags, data registers, FIFO pins,
//!    decoded orchestrator outputs).
//! 2. Clock reader, writer, both queues and the orchestrator against it.
//! 3. If the serial clock rises, the shift engine and the device sample.
//! 4. The output stage registers the decoded outputs; triggers and
//!    chip-select act on the registered copy.
//!
//! Falling half:
//! 1. The shift engine advances and the clock gate follows its suppress line.
//! 2. If the serial clock falls, the device presents its next bits.

use crate::bus::{BusTrace, InputQueue, NullDevice, OutputQueue, SerialDevice};
use crate::config::BridgeConfig;
use crate::engine::pins::{self, FifoPins, SerialPins, StatusLines};
use crate::engine::{
    ClockGate, EngineStatus, FifoReader, FifoWriter, Orchestrator, Phase, ReaderState,
    ShiftEngine, TriggerStage,
};
use crate::runtime::StallWatchdog;
use crate::{BridgeError, Result};
use tracing::{debug, info, warn};

pub struct Bridge<D = NullDevice> {
    config: BridgeConfig,
    reader: FifoReader,
    writer: FifoWriter,
    shift: ShiftEngine,
    clock: ClockGate,
    orchestrator: Orchestrator,
    stage: TriggerStage,
    input: InputQueue,
    output: OutputQueue,
    device: D,
    trace: Option<BusTrace>,
    watchdog: StallWatchdog,
    /// Registered chip-select, logical (true = asserted, pin low)
    chip_select: bool,
    ticks: u64,
    transactions: u64,
}

impl Bridge<NullDevice> {
    /// Bridge with nothing attached to the serial bus
    pub fn new(config: BridgeConfig) -> Result<Self> {
        Self::with_device(config, NullDevice)
    }
}

impl<D: SerialDevice> Bridge<D> {
    pub fn with_device(config: BridgeConfig, device: D) -> Result<Self> {
        config.validate()?;
        info!(
            "Bridge ready: {}-byte packets x{}, {}-byte input, device '{}'",
            config.packet_size,
            config.output_buffers,
            config.input_capacity,
            device.name()
        );
        Ok(Self {
            reader: FifoReader::new(),
            writer: FifoWriter::new(),
            shift: ShiftEngine::new(),
            clock: ClockGate::new(),
            orchestrator: Orchestrator::new(),
            stage: TriggerStage::new(),
            input: InputQueue::new(config.input_capacity),
            output: OutputQueue::new(config.packet_size, config.output_buffers),
            device,
            trace: config.trace.then(BusTrace::new),
            watchdog: StallWatchdog::new(config.stall_limit, config.stall_policy),
            chip_select: false,
            ticks: 0,
            transactions: 0,
            config,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Host side: queue bytes (headers and payload) on the input endpoint
    pub fn submit(&mut self, bytes: &[u8]) -> Result<()> {
        self.input.push(bytes)
    }

    /// Host side: take every committed output packet
    pub fn drain_packets(&mut self) -> Vec<Vec<u8>> {
        self.output.drain()
    }

    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    pub fn output(&self) -> &OutputQueue {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputQueue {
        &mut self.output
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Recorded serial bus, if tracing is enabled
    pub fn trace(&self) -> Option<&BusTrace> {
        self.trace.as_ref()
    }

    /// Drop everything recorded so far, keeping tracing enabled
    pub fn clear_trace(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.clear();
        }
    }

    pub fn take_trace(&mut self) -> Option<BusTrace> {
        let enabled = self.trace.is_some();
        let trace = self.trace.take();
        if enabled {
            self.trace = Some(BusTrace::new());
        }
        trace
    }

    pub fn reader(&self) -> &FifoReader {
        &self.reader
    }

    pub fn writer(&self) -> &FifoWriter {
        &self.writer
    }

    pub fn shift(&self) -> &ShiftEngine {
        &self.shift
    }

    pub fn clock_gate(&self) -> &ClockGate {
        &self.clock
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn watchdog(&self) -> &StallWatchdog {
        &self.watchdog
    }

    /// Base-clock periods simulated since reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Transactions that passed the header latch and returned to phase 0
    pub fn transactions(&self) -> u64 {
        self.transactions
    }

    /// Simulated time at the start of the next tick
    pub fn time_ns(&self) -> u64 {
        self.ticks * self.config.clock_period_ns
    }

    pub fn chip_select(&self) -> bool {
        self.chip_select
    }

    /// Pre-edge view handed to the orchestrator
    pub fn engine_status(&self) -> EngineStatus {
        EngineStatus {
            reader_busy: self.reader.is_busy(),
            shift_busy: self.shift.is_busy(self.clock.is_active()),
            writer_busy: self.writer.is_busy(),
            reader_data: self.reader.data(),
            shift_data: self.shift.input(),
        }
    }

    /// Diagnostic busy indicators
    pub fn status(&self) -> StatusLines {
        let status = self.engine_status();
        StatusLines {
            reader_busy: status.reader_busy,
            shift_busy: status.shift_busy,
            writer_busy: status.writer_busy,
        }
    }

    pub fn fifo_pins(&self) -> FifoPins {
        FifoPins::new(self.reader.strobes(), self.writer.strobes(), self.writer.data())
    }

    pub fn serial_pins(&self) -> SerialPins {
        let (io, _) = self.resolve_io();
        let config = self.orchestrator.config();
        SerialPins {
            sck: self.clock.sck(),
            cs_n: !self.chip_select,
            io,
            drive_mask: pins::drive_mask(config.mode, config.direction),
        }
    }

    fn resolve_io(&self) -> (u8, u8) {
        let config = self.orchestrator.config();
        let mask = pins::drive_mask(config.mode, config.direction);
        let device = self.device.drive();
        pins::resolve_io(mask, self.shift.drive(), device.mask, device.value)
    }

    /// Idle: waiting for a header with nothing queued and nothing in flight
    pub fn is_idle(&self) -> bool {
        self.input.is_empty()
            && self.orchestrator.phase() == Phase::AwaitHeader0
            && self.reader.state() == ReaderState::Start
            && !self.writer.is_busy()
            && !self.shift.is_busy(self.clock.is_active())
            && !self.chip_select
    }

    /// Advance one base-clock period
    pub fn tick(&mut self) -> Result<()> {
        self.rising_edge();
        self.falling_edge();
        self.ticks += 1;
        self.watchdog.observe(self.orchestrator.phase())
    }

    /// Advance a fixed number of periods
    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// Tick until `done` holds, at most `budget` times. Returns the ticks used.
    pub fn run_until(&mut self, budget: u64, mut done: impl FnMut(&Self) -> bool) -> Result<u64> {
        for used in 0..budget {
            if done(self) {
                return Ok(used);
            }
            self.tick()?;
        }
        if done(self) {
            Ok(budget)
        } else {
            Err(BridgeError::Timeout(budget))
        }
    }

    /// Tick until every queued command has completed
    pub fn run_until_idle(&mut self, budget: u64) -> Result<u64> {
        self.run_until(budget, Self::is_idle)
    }

    /// Tick until idle while acting as a polling host: committed packets
    /// are taken as soon as they appear, so reads longer than the buffered
    /// packets complete. Returns the ticks used and the packets taken.
    pub fn run_draining(&mut self, budget: u64) -> Result<(u64, Vec<Vec<u8>>)> {
        let mut packets = Vec::new();
        for used in 0..budget {
            packets.extend(self.drain_packets());
            if self.is_idle() {
                return Ok((used, packets));
            }
            self.tick()?;
        }
        packets.extend(self.drain_packets());
        if self.is_idle() {
            Ok((budget, packets))
        } else {
            Err(BridgeError::Timeout(budget))
        }
    }

    fn rising_edge(&mut self) {
        let time = self.time_ns();
        let status = self.engine_status();
        let fifo = self.fifo_pins();
        let decoded = self.orchestrator.outputs();
        let empty = self.input.is_empty();
        let presented = self.input.presented();
        let full = self.output.is_full();
        let leaving = self.orchestrator.phase();

        // Main clock domain, all against pre-edge values
        self.reader.clock(empty, presented);
        self.writer.clock(full);
        self.input.clock(fifo.read);
        self.output.clock(fifo.write, fifo.data_out);
        self.orchestrator.clock(&status);

        if leaving.in_transaction() && self.orchestrator.phase() == Phase::FetchHeader0 {
            self.transactions += 1;
            info!(
                "Transaction #{} complete: {} at {:.3}µs",
                self.transactions,
                self.orchestrator.config(),
                time as f64 / 1_000.0
            );
        }

        // Serial clock domain
        if self.clock.rise(self.shift.suppress_clock()) {
            let (io, contention) = self.resolve_io();
            if contention != 0 && self.chip_select {
                warn!("Bus contention on IO mask 0b{:04b} at {}ns", contention, time);
            }
            self.shift.sample(io);
            if self.chip_select {
                self.device.clock_rising(io);
            }
        }

        // Registered outputs take effect
        let staged = self.stage.clock(decoded);
        let config = self.orchestrator.config();
        let relay = self.orchestrator.relay();
        self.reader.trigger(staged.reader);
        self.writer.trigger(staged.writer, staged.terminate, relay);
        self.shift.trigger(staged.shift, config.mode, relay);
        if staged.chip_select != self.chip_select {
            self.chip_select = staged.chip_select;
            debug!(
                "Chip select {} at {}ns",
                if self.chip_select { "asserted" } else { "released" },
                time
            );
            self.device.select(self.chip_select);
        }

        self.record(time);
    }

    fn falling_edge(&mut self) {
        let time = self.time_ns() + self.config.clock_period_ns / 2;

        self.shift.fall();
        if self.clock.fall(self.shift.suppress_clock()) && self.chip_select {
            self.device.clock_falling();
        }

        self.record(time);
    }

    fn record(&mut self, time: u64) {
        if self.trace.is_none() {
            return;
        }
        let pins = self.serial_pins();
        if let Some(trace) = self.trace.as_mut() {
            trace.record(time, &pins);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ShiftDevice;
    use crate::decoders::QspiDecoder;
    use crate::engine::{HostCommand, MAX_LENGTH, Mode, ShiftState, WriterState};
    use crate::runtime::StallPolicy;

    const BUDGET: u64 = 100_000;

    fn bridge(device: ShiftDevice) -> Bridge<ShiftDevice> {
        Bridge::with_device(BridgeConfig::default().with_output_buffers(64), device).unwrap()
    }

    fn read_back(bridge: &mut Bridge<ShiftDevice>) -> Vec<u8> {
        bridge.drain_packets().concat()
    }

    #[test]
    fn test_idle_without_commands() {
        let mut bridge = Bridge::new(BridgeConfig::default()).unwrap();
        bridge.run(1000).unwrap();
        assert!(bridge.is_idle());
        assert_eq!(bridge.orchestrator().phase(), Phase::AwaitHeader0);
        assert_eq!(bridge.shift().state(), ShiftState::Idle);
        assert_eq!(bridge.writer().state(), WriterState::Idle);
        assert_eq!(bridge.status(), StatusLines {
            reader_busy: true,
            shift_busy: false,
            writer_busy: false,
        });
        let trace = bridge.trace().unwrap();
        assert_eq!(trace.sck().len(), 1);
        assert_eq!(trace.cs_n().len(), 1);
    }

    #[test]
    fn test_single_write_scenario() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.submit(&[0x80, 0x03, 0xA5, 0x00, 0xFF]).unwrap();
        bridge.run_until_idle(BUDGET).unwrap();

        let trace = bridge.trace().unwrap();
        let edges: Vec<u64> = BusTrace::rising_edges(trace.sck()).collect();
        assert_eq!(edges.len(), 24);

        let bits: Vec<bool> = edges
            .iter()
            .map(|&t| BusTrace::value_at(trace.io(0).unwrap(), t - 1).unwrap())
            .collect();
        let expected: Vec<bool> = [0xA5u8, 0x00, 0xFF]
            .iter()
            .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
            .collect();
        assert_eq!(bits, expected);

        // Chip select released after the last clock edge
        let released = trace.cs_n().last().unwrap();
        assert!(released.value);
        assert!(released.start_time > *edges.last().unwrap());

        assert_eq!(bridge.device().received(), &[0xA5, 0x00, 0xFF]);
        assert_eq!(bridge.transactions(), 1);
        assert_eq!(bridge.output().writes(), 0);
        assert_eq!(bridge.output().packet_ends(), 0);
    }

    #[test]
    fn test_write_round_trip_wide_modes() {
        let payload = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        for mode in [Mode::Single, Mode::Dual, Mode::Quad] {
            let mut bridge = bridge(ShiftDevice::new(mode));
            bridge.submit(&HostCommand::write(mode, &payload).unwrap()).unwrap();
            bridge.run_until_idle(BUDGET).unwrap();

            assert_eq!(bridge.device().received(), &payload, "mode {}", mode);

            let frames = QspiDecoder::new(mode).decode(bridge.trace().unwrap());
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].data, payload, "mode {}", mode);
            assert_eq!(frames[0].edges, payload.len() * mode.edges_per_byte() as usize);
        }
    }

    #[test]
    fn test_read_round_trip_all_modes() {
        let response = [0x12, 0x34, 0xAB, 0xCD, 0xEF];
        for mode in [Mode::Single, Mode::Dual, Mode::Quad] {
            let mut bridge = bridge(ShiftDevice::new(mode).with_response(&response));
            bridge.submit(&HostCommand::read(mode, response.len()).unwrap()).unwrap();
            bridge.run_until_idle(BUDGET).unwrap();

            assert_eq!(read_back(&mut bridge), response, "mode {}", mode);
            assert_eq!(bridge.output().packet_ends(), 1);
            assert_eq!(bridge.orchestrator().stores(), response.len() as u64);
        }
    }

    #[test]
    fn test_zero_length_header() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.submit(&[0x80, 0x00]).unwrap();
        bridge.run_until_idle(BUDGET).unwrap();

        assert_eq!(bridge.input().pops(), 2);
        assert_eq!(bridge.orchestrator().stores(), 0);
        assert_eq!(bridge.output().writes(), 0);
        assert_eq!(bridge.output().pending(), 0);
        assert_eq!(bridge.device().selections(), 1);
        assert_eq!(bridge.transactions(), 1);

        let trace = bridge.trace().unwrap();
        let cs: Vec<bool> = trace.cs_n().iter().map(|s| s.value).collect();
        assert_eq!(cs, vec![true, false, true]);
        assert_eq!(trace.sck().len(), 1);
    }

    #[test]
    fn test_deselect_header_is_dropped() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.submit(&HostCommand::deselect()).unwrap();
        bridge.submit(&HostCommand::write(Mode::Single, &[0x42]).unwrap()).unwrap();
        bridge.run_until_idle(BUDGET).unwrap();

        assert_eq!(bridge.transactions(), 1);
        assert_eq!(bridge.device().selections(), 1);
        assert_eq!(bridge.device().received(), &[0x42]);
    }

    #[test]
    fn test_quad_read_with_full_destination() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Quad).with_response(&[0x5A]));
        bridge.output_mut().set_host_stalled(true);
        bridge.submit(&[0xD0, 0x01]).unwrap();

        bridge.run(5_000).unwrap();
        assert_eq!(bridge.writer().state(), WriterState::Start);
        assert_eq!(bridge.orchestrator().phase(), Phase::AwaitDrain);
        assert_eq!(bridge.output().writes(), 0);
        assert_eq!(bridge.output().packet_ends(), 0);
        assert!(bridge.chip_select());

        // Stable busy-wait
        bridge.run(5_000).unwrap();
        assert_eq!(bridge.writer().state(), WriterState::Start);

        bridge.output_mut().set_host_stalled(false);
        let used = bridge.run_until_idle(BUDGET).unwrap();
        assert!(used < 50, "busy-wait took {} ticks to exit", used);
        assert_eq!(bridge.drain_packets(), vec![vec![0x5A]]);
        assert_eq!(bridge.output().packet_ends(), 1);
    }

    #[test]
    fn test_remaining_count_steps_by_one() {
        let payload = [9u8, 8, 7, 6, 5, 4];
        let mut bridge = bridge(ShiftDevice::new(Mode::Dual));
        bridge.submit(&HostCommand::write(Mode::Dual, &payload).unwrap()).unwrap();

        let mut history = Vec::new();
        let mut last = None;
        while !(bridge.is_idle() && bridge.transactions() == 1) {
            bridge.tick().unwrap();
            let phase = bridge.orchestrator().phase();
            if phase.index() > Phase::LatchLength.index() {
                let remaining = bridge.orchestrator().remaining().get();
                if last != Some(remaining) {
                    history.push(remaining);
                    last = Some(remaining);
                }
            }
            assert!(bridge.ticks() < BUDGET);
        }

        assert_eq!(history, vec![6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(bridge.orchestrator().stores(), payload.len() as u64);
    }

    #[test]
    fn test_busy_flags_track_states() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single).with_response(&[1, 2, 3]));
        bridge.submit(&HostCommand::read(Mode::Single, 3).unwrap()).unwrap();
        bridge.submit(&HostCommand::write(Mode::Single, &[4, 5]).unwrap()).unwrap();
        while !(bridge.is_idle() && bridge.transactions() == 2) {
            bridge.tick().unwrap();
            let status = bridge.status();
            assert_eq!(status.reader_busy, bridge.reader().state() != ReaderState::Idle);
            assert_eq!(status.writer_busy, bridge.writer().state() != WriterState::Idle);
            assert_eq!(
                status.shift_busy,
                bridge.shift().state() != ShiftState::Idle || bridge.clock_gate().is_active()
            );
            assert!(bridge.ticks() < BUDGET);
        }
    }

    #[test]
    fn test_terminate_only_on_final_read_byte() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Quad));
        bridge.submit(&HostCommand::write(Mode::Quad, &[1, 2, 3]).unwrap()).unwrap();
        bridge.run_until_idle(BUDGET).unwrap();
        assert_eq!(bridge.output().packet_ends(), 0);
        assert_eq!(bridge.device().received(), &[1, 2, 3]);

        bridge.device_mut().queue_response(&[7, 8, 9]);
        bridge.submit(&HostCommand::read(Mode::Quad, 3).unwrap()).unwrap();
        let mut seen = 0;
        while !(bridge.is_idle() && bridge.transactions() == 2) {
            if bridge.fifo_pins().write.packet_end {
                seen += 1;
                assert_eq!(bridge.output().writes(), 3, "terminate before the last byte");
            }
            bridge.tick().unwrap();
            assert!(bridge.ticks() < BUDGET);
        }
        assert_eq!(seen, 1);
        assert_eq!(bridge.output().packet_ends(), 1);
        assert_eq!(read_back(&mut bridge), vec![7, 8, 9]);
    }

    #[test]
    fn test_zero_length_packet_on_boundary() {
        let data: Vec<u8> = (0..8).collect();
        let config = BridgeConfig::default().with_packet_size(4).with_output_buffers(8);
        let device = ShiftDevice::new(Mode::Quad).with_response(&data);
        let mut bridge = Bridge::with_device(config, device).unwrap();
        bridge.submit(&HostCommand::read(Mode::Quad, 8).unwrap()).unwrap();
        bridge.run_until_idle(BUDGET).unwrap();

        assert_eq!(
            bridge.drain_packets(),
            vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![]]
        );
        assert_eq!(bridge.output().zero_length_packets(), 1);
    }

    #[test]
    fn test_input_stall_mid_header() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.submit(&[0x80]).unwrap();
        bridge.run(1_000).unwrap();
        assert_eq!(bridge.orchestrator().phase(), Phase::AwaitHeader1);
        assert_eq!(bridge.reader().state(), ReaderState::Start);
        assert!(matches!(
            bridge.run_until_idle(100),
            Err(BridgeError::Timeout(100))
        ));

        bridge.submit(&[0x01, 0x42]).unwrap();
        bridge.run_until_idle(BUDGET).unwrap();
        assert_eq!(bridge.device().received(), &[0x42]);
    }

    #[test]
    fn test_watchdog_abort_on_stall() {
        let config = BridgeConfig::default().with_stall_limit(100, StallPolicy::Abort);
        let device = ShiftDevice::new(Mode::Quad).with_response(&[1]);
        let mut bridge = Bridge::with_device(config, device).unwrap();
        bridge.output_mut().set_host_stalled(true);
        bridge.submit(&HostCommand::read(Mode::Quad, 1).unwrap()).unwrap();

        let err = bridge.run_until_idle(BUDGET).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Stalled {
                phase: Phase::AwaitDrain,
                ticks: 101
            }
        ));
    }

    #[test]
    fn test_watchdog_warn_keeps_waiting() {
        let config = BridgeConfig::default().with_stall_limit(10, StallPolicy::Warn);
        let device = ShiftDevice::new(Mode::Single).with_response(&[0xEE]);
        let mut bridge = Bridge::with_device(config, device).unwrap();
        bridge.output_mut().set_host_stalled(true);
        bridge.submit(&HostCommand::read(Mode::Single, 1).unwrap()).unwrap();
        bridge.run(500).unwrap();
        assert!(bridge.watchdog().is_stalled());

        bridge.output_mut().set_host_stalled(false);
        bridge.run_until_idle(BUDGET).unwrap();
        assert!(!bridge.watchdog().is_stalled());
        assert_eq!(bridge.drain_packets(), vec![vec![0xEE]]);
    }

    #[test]
    fn test_input_address_follows_reader() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.submit(&HostCommand::write(Mode::Single, &[1]).unwrap()).unwrap();
        while !(bridge.is_idle() && bridge.transactions() == 1) {
            let pins = bridge.fifo_pins();
            if pins.read.output_enable {
                assert_eq!(pins.address, crate::engine::FifoAddress::Input);
            }
            bridge.tick().unwrap();
            assert!(bridge.ticks() < BUDGET);
        }
        assert_eq!(bridge.input().pops(), 3);
    }

    #[test]
    fn test_longest_read_completes_with_polling_host() {
        let response: Vec<u8> = (0..MAX_LENGTH as usize).map(|i| (i * 7) as u8).collect();
        let device = ShiftDevice::new(Mode::Quad).with_response(&response);
        let mut bridge = Bridge::with_device(BridgeConfig::default(), device).unwrap();
        bridge
            .submit(&HostCommand::read(Mode::Quad, MAX_LENGTH as usize).unwrap())
            .unwrap();

        let (_, packets) = bridge.run_draining(1_000_000).unwrap();
        assert_eq!(packets.len(), 8);
        assert!(packets[..7].iter().all(|p| p.len() == 512));
        assert_eq!(packets[7].len(), 511);
        assert_eq!(packets.concat(), response);
        assert_eq!(bridge.output().packet_ends(), 1);
        assert_eq!(bridge.transactions(), 1);
    }

    #[test]
    fn test_longest_read_stalls_without_polling_host() {
        let device = ShiftDevice::new(Mode::Quad).with_response(&[0; 4095]);
        let mut bridge = Bridge::with_device(BridgeConfig::default(), device).unwrap();
        bridge.submit(&HostCommand::read(Mode::Quad, 4095).unwrap()).unwrap();

        assert!(matches!(
            bridge.run_until_idle(200_000),
            Err(BridgeError::Timeout(200_000))
        ));
        assert_eq!(bridge.output().pending(), 4);
        assert_eq!(bridge.writer().state(), WriterState::Start);
    }

    #[test]
    fn test_clear_trace_keeps_recording() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.submit(&HostCommand::write(Mode::Single, &[0x55; 4]).unwrap()).unwrap();
        bridge.run(50).unwrap();
        bridge.clear_trace();
        assert!(bridge.trace().unwrap().is_empty());

        bridge.run_until_idle(BUDGET).unwrap();
        assert!(!bridge.trace().unwrap().is_empty());
        assert_eq!(bridge.device().received(), &[0x55; 4]);
    }

    #[test]
    fn test_take_trace_resets_recording() {
        let mut bridge = bridge(ShiftDevice::new(Mode::Single));
        bridge.run(10).unwrap();
        let trace = bridge.take_trace().unwrap();
        assert!(!trace.is_empty());
        assert!(bridge.trace().unwrap().is_empty());

        let mut quiet = Bridge::new(BridgeConfig::default().with_trace(false)).unwrap();
        quiet.run(10).unwrap();
        assert!(quiet.trace().is_none());
    }
}
