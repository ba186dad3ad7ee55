//! Threaded host link for a [`Bridge`]
//!
//! The service owns the bridge on a dedicated thread. The host side talks to
//! it over crossbeam channels: command bytes go in as [`HostMessage::Data`],
//! committed output packets come back one `Vec<u8>` per packet.
//!
//! Host bytes are pushed into the input endpoint only as far as it has room;
//! the rest waits in the service until the bridge has consumed enough. The
//! service finishes after [`HostMessage::EndOfStream`] once every queued
//! command has completed and all packets have been handed back.
//!
//! Nobody reads the bus trace of a long-running service, so only the latest
//! batch of samples is kept.

use crate::bridge::Bridge;
use crate::bus::SerialDevice;
use crate::{BridgeError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Ticks simulated between polls of the host channel
const TICK_BATCH: u64 = 256;

/// How long an idle service blocks on the host channel before rechecking
/// the stop signal
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Message from the host to the service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostMessage {
    /// Command bytes: headers and payload
    Data(Vec<u8>),
    /// No more commands will be sent
    EndOfStream,
}

/// Counters returned when the service thread ends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServiceReport {
    pub ticks: u64,
    pub transactions: u64,
    pub packets: u64,
}

pub struct BridgeService {
    name: String,
    handle: JoinHandle<Result<ServiceReport>>,
    stop_signal: Arc<AtomicBool>,
}

impl BridgeService {
    /// Move `bridge` onto its own thread
    pub fn spawn<D>(
        name: impl Into<String>,
        bridge: Bridge<D>,
        commands: Receiver<HostMessage>,
        packets: Sender<Vec<u8>>,
    ) -> Self
    where
        D: SerialDevice + 'static,
    {
        let name = name.into();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.clone();

        debug!("Starting bridge service: {}", name);

        let handle = thread::spawn(move || {
            let mut bridge = bridge;
            let result = serve(&thread_name, &mut bridge, &commands, &packets, &thread_stop);
            match &result {
                Ok(report) => info!(
                    "[{}] Shutdown. {} transactions, {} packets in {} ticks.",
                    thread_name, report.transactions, report.packets, report.ticks
                ),
                Err(e) => error!("[{}] Service error: {}", thread_name, e),
            }
            result
        });

        Self {
            name,
            handle,
            stop_signal,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the service thread to stop at its next poll
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the service thread ends
    pub fn wait(self) -> Result<ServiceReport> {
        match self.handle.join() {
            Ok(result) => result,
            Err(e) => {
                error!("[{}] Thread panicked: {:?}", self.name, e);
                Err(BridgeError::Disconnected)
            }
        }
    }
}

fn serve<D: SerialDevice>(
    name: &str,
    bridge: &mut Bridge<D>,
    commands: &Receiver<HostMessage>,
    packets: &Sender<Vec<u8>>,
    stop_signal: &AtomicBool,
) -> Result<ServiceReport> {
    let mut pending: VecDeque<u8> = VecDeque::new();
    let mut end_of_stream = false;
    let mut sent = 0u64;

    loop {
        if stop_signal.load(Ordering::Relaxed) {
            info!("[{}] Stop signal received", name);
            break;
        }

        // Nothing to do: block briefly on the host instead of spinning
        if pending.is_empty() && !end_of_stream && bridge.is_idle() {
            match commands.recv_timeout(IDLE_POLL) {
                Ok(message) => accept(message, &mut pending, &mut end_of_stream),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(BridgeError::Disconnected),
            }
        }
        while !end_of_stream {
            match commands.try_recv() {
                Ok(message) => accept(message, &mut pending, &mut end_of_stream),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(BridgeError::Disconnected),
            }
        }

        let room = bridge.input().available().min(pending.len());
        if room > 0 {
            let chunk: Vec<u8> = pending.drain(..room).collect();
            bridge.submit(&chunk)?;
        }

        bridge.clear_trace();
        bridge.run(TICK_BATCH)?;

        for packet in bridge.drain_packets() {
            packets
                .send(packet)
                .map_err(|_| BridgeError::Disconnected)?;
            sent += 1;
        }

        if end_of_stream && pending.is_empty() && bridge.is_idle() {
            debug!("[{}] End of stream, all commands complete", name);
            break;
        }
    }

    Ok(ServiceReport {
        ticks: bridge.ticks(),
        transactions: bridge.transactions(),
        packets: sent,
    })
}

fn accept(message: HostMessage, pending: &mut VecDeque<u8>, end_of_stream: &mut bool) {
    match message {
        HostMessage::Data(bytes) => pending.extend(bytes),
        HostMessage::EndOfStream => *end_of_stream = true,
    }
}
