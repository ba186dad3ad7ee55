//! Host-facing FIFO endpoint models
//!
//! [`InputQueue`] is the host-to-bridge endpoint: bytes the host has sent,
//! exposed through an `empty` flag and a presented byte, popped by the
//! reader's strobe. [`OutputQueue`] is the bridge-to-host endpoint: bytes are
//! collected into packets of `packet_size`, committed automatically when a
//! packet fills or explicitly by the packet-terminate strobe (which yields a
//! zero-length packet when nothing is pending). `full` is raised while all
//! packet buffers are waiting for the host.

use crate::engine::pins::{ReadStrobes, WriteStrobes};
use crate::{BridgeError, Result};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Value seen on an undriven FIFO data bus
pub const FLOATING_BUS: u8 = 0xFF;

pub struct InputQueue {
    bytes: VecDeque<u8>,
    capacity: usize,
    pops: u64,
}

impl InputQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: VecDeque::with_capacity(capacity),
            capacity,
            pops: 0,
        }
    }

    /// Host side: append bytes. Rejected as a whole if they do not fit.
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        let available = self.available();
        if data.len() > available {
            return Err(BridgeError::InputOverflow {
                requested: data.len(),
                available,
            });
        }
        self.bytes.extend(data.iter().copied());
        Ok(())
    }

    /// Free space in bytes
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.bytes.len())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// The `empty` flag
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte presented on the data bus
    pub fn presented(&self) -> u8 {
        self.bytes.front().copied().unwrap_or(FLOATING_BUS)
    }

    /// Number of elements popped by the read strobe
    pub fn pops(&self) -> u64 {
        self.pops
    }

    /// Rising base-clock edge with the reader's pre-edge strobes
    pub fn clock(&mut self, strobes: ReadStrobes) {
        if strobes.output_enable && strobes.read_strobe {
            if self.bytes.pop_front().is_some() {
                self.pops += 1;
            } else {
                warn!("input queue: read strobe while empty");
            }
        }
    }
}

pub struct OutputQueue {
    packet_size: usize,
    buffers: usize,
    current: Vec<u8>,
    packets: VecDeque<Vec<u8>>,
    host_stalled: bool,
    /// Terminate seen with every buffer committed, waiting for room
    held_end: bool,
    writes: u64,
    packet_ends: u64,
    zero_length_packets: u64,
}

impl OutputQueue {
    pub fn new(packet_size: usize, buffers: usize) -> Self {
        Self {
            packet_size,
            buffers,
            current: Vec::with_capacity(packet_size),
            packets: VecDeque::new(),
            host_stalled: false,
            held_end: false,
            writes: 0,
            packet_ends: 0,
            zero_length_packets: 0,
        }
    }

    /// The `full` flag: no room for another byte
    pub fn is_full(&self) -> bool {
        self.host_stalled || self.buffers_full()
    }

    fn buffers_full(&self) -> bool {
        self.packets.len() >= self.buffers
    }

    /// Host side: keep `full` raised regardless of buffer state, as a host
    /// that stops polling the endpoint would.
    pub fn set_host_stalled(&mut self, stalled: bool) {
        self.host_stalled = stalled;
    }

    /// Host side: take the oldest committed packet
    pub fn take_packet(&mut self) -> Option<Vec<u8>> {
        let packet = self.packets.pop_front();
        self.release_held_end();
        packet
    }

    /// Host side: take every committed packet
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut packets: Vec<Vec<u8>> = self.packets.drain(..).collect();
        self.release_held_end();
        packets.extend(self.packets.drain(..));
        packets
    }

    /// A terminate is waiting for a free packet buffer
    pub fn has_held_end(&self) -> bool {
        self.held_end
    }

    /// Committed packets waiting for the host
    pub fn pending(&self) -> usize {
        self.packets.len()
    }

    /// Bytes written but not yet committed
    pub fn uncommitted(&self) -> &[u8] {
        &self.current
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn packet_ends(&self) -> u64 {
        self.packet_ends
    }

    pub fn zero_length_packets(&self) -> u64 {
        self.zero_length_packets
    }

    /// Rising base-clock edge with the writer's pre-edge strobes and bus byte
    pub fn clock(&mut self, strobes: WriteStrobes, data: u8) {
        if strobes.write_enable && strobes.write_strobe {
            if self.is_full() {
                warn!("output queue: write strobe while full, 0x{:02X} dropped", data);
            } else {
                self.current.push(data);
                self.writes += 1;
                if self.current.len() >= self.packet_size {
                    self.commit();
                }
            }
        }
        if strobes.packet_end {
            self.packet_ends += 1;
            if self.current.is_empty() {
                self.zero_length_packets += 1;
            }
            if self.buffers_full() {
                warn!("output queue: packet end while all {} buffers committed, held", self.buffers);
                self.held_end = true;
            } else {
                self.commit();
            }
        }
    }

    fn release_held_end(&mut self) {
        if self.held_end && !self.buffers_full() {
            self.held_end = false;
            self.commit();
        }
    }

    fn commit(&mut self) {
        let packet = std::mem::replace(&mut self.current, Vec::with_capacity(self.packet_size));
        debug!("output queue: packet of {} bytes committed", packet.len());
        self.packets.push_back(packet);
    }
}
