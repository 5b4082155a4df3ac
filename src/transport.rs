//! MPEG Transport Stream carriage of DOCSIS frames.
//!
//! DOCSIS downstream frames are packed back to back into the payload of
//! 188-byte transport packets on a single PID. A frame may start anywhere in a
//! packet and may span any number of following packets. Packets in which a
//! frame begins carry the Payload Unit Start Indicator (PUSI) and a pointer
//! field giving the number of bytes that still belong to the frame carried
//! over from earlier packets. Unused space after the last frame is filled with
//! `0xFF` stuffing.
//!
//! [`TsReassembler`] turns that packet sequence back into whole frames. It is
//! strictly sequential and keeps the bytes of at most one in-flight frame.
//! Framing anomalies (bad sync byte, pointer overflow, stale fragments) are
//! expected on noisy links; they are dropped and counted, never raised.

use bytes::{Bytes, BytesMut};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAC_FRAME_MAX_LENGTH_BYTES, MAC_HEADER_MIN_LENGTH_BYTES, MAC_LEN_FIELD_OFFSET,
    TS_HEADER_LENGTH_BYTES, TS_PACKET_SIZE, TS_POINTER_FIELD_OFFSET, TS_PUSI_MASK,
    TS_STUFFING_BYTE, TS_SYNC_BYTE,
};
use crate::types::Pid;

/// Parsed 4-byte transport packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsHeader {
    /// Transport error indicator.
    pub transport_error: bool,
    /// Payload unit start indicator.
    pub payload_unit_start: bool,
    /// Transport priority.
    pub transport_priority: bool,
    /// Packet identifier.
    pub pid: Pid,
    /// Transport scrambling control (2 bits).
    pub scrambling_control: u8,
    /// Adaptation field control (2 bits).
    pub adaptation_field_control: u8,
    /// Continuity counter (4 bits).
    pub continuity_counter: u8,
}

/// A borrowed view over one well-formed transport packet.
#[derive(Debug, Clone, Copy)]
pub struct TsPacket<'a> {
    /// Decoded header fields.
    pub header: TsHeader,
    data: &'a [u8],
}

impl<'a> TsPacket<'a> {
    /// Validates length and sync byte and decodes the header.
    ///
    /// Returns `None` for anything that is not exactly one packet starting
    /// with the sync byte; such input is line noise, not an error.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        if data.len() != TS_PACKET_SIZE || data[0] != TS_SYNC_BYTE {
            return None;
        }
        let header = TsHeader {
            transport_error: data[1] & 0x80 != 0,
            payload_unit_start: data[1] & TS_PUSI_MASK != 0,
            transport_priority: data[1] & 0x20 != 0,
            pid: Pid::new((u16::from(data[1] & 0x1F) << 8) | u16::from(data[2])),
            scrambling_control: (data[3] >> 6) & 0x03,
            adaptation_field_control: (data[3] >> 4) & 0x03,
            continuity_counter: data[3] & 0x0F,
        };
        Some(TsPacket { header, data })
    }

    /// Pointer field value; zero when PUSI is clear.
    #[inline]
    pub fn pointer_field(&self) -> u8 {
        if self.header.payload_unit_start {
            self.data[TS_POINTER_FIELD_OFFSET]
        } else {
            0
        }
    }

    /// All bytes following the 4-byte header, pointer field included.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[TS_HEADER_LENGTH_BYTES..]
    }

    /// The complete 188 packet bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// Counters describing what the reassembler has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassemblyStats {
    /// Packets handed to [`TsReassembler::process`].
    pub packets: u64,
    /// Packets dropped for wrong length or sync byte.
    pub packets_dropped: u64,
    /// Packets skipped by the PID filter.
    pub packets_filtered: u64,
    /// PUSI packets whose pointer field ran past the packet end.
    pub pointer_overflows: u64,
    /// Partial frames thrown away because a new frame started first or
    /// they outgrew the largest possible frame.
    pub stale_fragments: u64,
    /// Complete frames emitted.
    pub frames_emitted: u64,
}

/// Rebuilds DOCSIS frames from a sequence of transport packets.
///
/// The reassembler owns a single growable arena. Emitted frames are split off
/// the arena as owned [`Bytes`], so callers can keep them as long as they like
/// while the arena is recycled for the next frame.
#[derive(Debug)]
pub struct TsReassembler {
    buffer: BytesMut,
    pid_filter: Option<Pid>,
    stats: ReassemblyStats,
}

impl Default for TsReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TsReassembler {
    /// Creates a reassembler that accepts packets on every PID.
    pub fn new() -> Self {
        Self::with_capacity(4 * TS_PACKET_SIZE)
    }

    /// Creates a reassembler whose arena is pre-sized to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        TsReassembler {
            buffer: BytesMut::with_capacity(capacity),
            pid_filter: None,
            stats: ReassemblyStats::default(),
        }
    }

    /// Restricts reassembly to packets carrying `pid`.
    ///
    /// Captures taken through a hardware demux filter are already restricted
    /// to the DOCSIS PID and do not need this.
    pub fn with_pid_filter(mut self, pid: Pid) -> Self {
        self.pid_filter = Some(pid);
        self
    }

    /// Bytes of the frame currently in flight.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> ReassemblyStats {
        self.stats
    }

    /// Abandons any partially assembled frame, e.g. at end of stream.
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            debug!(
                "Abandoning partial DOCSIS frame of {} bytes",
                self.buffer.len()
            );
        }
        self.buffer.clear();
    }

    /// Feeds one transport packet and returns the frames it completed.
    ///
    /// # Parameters
    /// - `packet`: Raw packet bytes; anything but exactly 188 bytes starting
    ///   with `0x47` is dropped without touching the in-flight frame.
    ///
    /// # Returns
    /// Zero or more complete frames, in stream order.
    pub fn process(&mut self, packet: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        self.process_into(packet, &mut frames);
        frames
    }

    /// Like [`process`](Self::process) but appends into a caller-owned vector.
    pub fn process_into(&mut self, packet: &[u8], frames: &mut Vec<Bytes>) {
        self.stats.packets += 1;

        let Some(ts) = TsPacket::parse(packet) else {
            self.stats.packets_dropped += 1;
            trace!("Dropping {} byte input without valid sync", packet.len());
            return;
        };

        if let Some(pid) = self.pid_filter {
            if ts.header.pid != pid {
                self.stats.packets_filtered += 1;
                return;
            }
        }

        if !ts.header.payload_unit_start {
            // Pure continuation of the frame in flight.
            let payload = ts.payload();
            if self.buffer.len() + payload.len() > MAC_FRAME_MAX_LENGTH_BYTES {
                self.stats.stale_fragments += 1;
                debug!(
                    "Discarding {} byte fragment longer than any DOCSIS frame",
                    self.buffer.len()
                );
                self.buffer.clear();
                return;
            }
            self.buffer.extend_from_slice(payload);
            return;
        }

        self.assemble(ts.as_bytes(), frames);
    }

    fn assemble(&mut self, data: &[u8], frames: &mut Vec<Bytes>) {
        let pointer = data[TS_POINTER_FIELD_OFFSET] as usize;
        let mut cursor = TS_POINTER_FIELD_OFFSET + 1;

        if pointer > 0 {
            if cursor + pointer > TS_PACKET_SIZE {
                self.stats.pointer_overflows += 1;
                debug!("Pointer field {} overruns transport packet, resetting", pointer);
                self.buffer.clear();
                return;
            }
            self.buffer.extend_from_slice(&data[cursor..cursor + pointer]);
            self.emit(frames);
            cursor += pointer;
        } else {
            self.flush_pending(frames);
        }

        loop {
            while cursor < TS_PACKET_SIZE && data[cursor] == TS_STUFFING_BYTE {
                cursor += 1;
            }
            if cursor == TS_PACKET_SIZE {
                return;
            }

            if cursor + MAC_LEN_FIELD_OFFSET + 2 <= TS_PACKET_SIZE {
                let length = u16::from_be_bytes([
                    data[cursor + MAC_LEN_FIELD_OFFSET],
                    data[cursor + MAC_LEN_FIELD_OFFSET + 1],
                ]) as usize;
                let frame_end = cursor + length + MAC_HEADER_MIN_LENGTH_BYTES;

                if frame_end < TS_PACKET_SIZE {
                    self.buffer.extend_from_slice(&data[cursor..frame_end]);
                    self.emit(frames);
                    cursor = frame_end;
                    continue;
                }
            }

            // Frame continues in the following packets.
            self.buffer.extend_from_slice(&data[cursor..]);
            return;
        }
    }

    /// Deals with bytes left over when a PUSI packet has a zero pointer field.
    ///
    /// A frame that ended exactly on a packet boundary is still complete and
    /// is emitted; anything else is an orphaned fragment and is discarded.
    fn flush_pending(&mut self, frames: &mut Vec<Bytes>) {
        if self.buffer.is_empty() {
            return;
        }
        if declared_frame_len(&self.buffer) == Some(self.buffer.len()) {
            self.emit(frames);
        } else {
            self.stats.stale_fragments += 1;
            debug!(
                "Discarding stale fragment of {} bytes before new frame",
                self.buffer.len()
            );
            self.buffer.clear();
        }
    }

    fn emit(&mut self, frames: &mut Vec<Bytes>) {
        let frame = self.buffer.split().freeze();
        trace!("Reassembled DOCSIS frame of {} bytes", frame.len());
        self.stats.frames_emitted += 1;
        frames.push(frame);
    }
}

/// Total frame length advertised by a MAC header prefix, if readable.
fn declared_frame_len(frame: &[u8]) -> Option<usize> {
    let len_bytes = frame.get(MAC_LEN_FIELD_OFFSET..MAC_LEN_FIELD_OFFSET + 2)?;
    Some(u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize + MAC_HEADER_MIN_LENGTH_BYTES)
}
