//! Layer dispatch from reassembled frames to decoded records.
//!
//! Each frame walks a closed set of layers:
//!
//! ```text
//! Mac ─┬─ Ethernet
//!      ├─ EncryptedEthernet
//!      ├─ Management ─┬─ RegistrationResponse
//!      │              ├─ MultipartRegistrationResponse
//!      │              ├─ BpkmResponse
//!      │              └─ Opaque
//!      └─ Opaque
//! ```
//!
//! The first failure stops the walk for that frame only; the record keeps the
//! layers reached so far together with the error.

use bytes::Bytes;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::bpkm::BpkmResponse;
use crate::constants::ETHERNET_HEADER_LENGTH_BYTES;
use crate::crc::HcsCalculator;
use crate::error::DecodeError;
use crate::ethernet::EncryptedEthernetHeader;
use crate::mac::{MacFrame, MacHeader, NextLayer};
use crate::management::{ManagementHeader, ManagementMessage, ManagementMessageType};
use crate::registration::{MultipartRegistrationResponse, RegistrationResponse};
use crate::tlv::RegistrationSettings;
use crate::transport::{ReassemblyStats, TsReassembler};
use crate::types::Pid;

/// Decoder settings fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Reject frames whose HCS does not match. When unset such frames are
    /// kept with `hcs_valid = false` and treated as opaque.
    pub verify_hcs: bool,
    /// Decode the clear-text header of encrypted Ethernet frames.
    pub decode_ethernet_headers: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            verify_hcs: true,
            decode_ethernet_headers: true,
        }
    }
}

/// Layers a frame can pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerType {
    /// DOCSIS MAC header.
    Mac,
    /// Clear-text packet PDU.
    Ethernet,
    /// Packet PDU under baseline privacy.
    EncryptedEthernet,
    /// Management message header.
    Management,
    /// REG-RSP (type 7).
    RegistrationResponse,
    /// REG-RSP-MP (type 45).
    MultipartRegistrationResponse,
    /// BPKM-RSP (type 13).
    BpkmResponse,
    /// Payload left uninterpreted.
    Opaque,
}

/// The innermost message decoded from a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Plain Ethernet frame, left to an external consumer.
    Ethernet {
        #[serde(skip)]
        payload: Bytes,
    },
    /// Encrypted Ethernet frame. `payload` follows the header when one was
    /// decoded and is the whole MAC payload otherwise.
    EncryptedEthernet {
        header: Option<EncryptedEthernetHeader>,
        #[serde(skip)]
        payload: Bytes,
    },
    /// Decoded REG-RSP.
    RegistrationResponse(RegistrationResponse),
    /// Decoded REG-RSP-MP fragment.
    MultipartRegistrationResponse(MultipartRegistrationResponse),
    /// Decoded BPKM-RSP header.
    BpkmResponse(BpkmResponse),
    /// Payload this crate does not interpret.
    Opaque {
        #[serde(skip)]
        payload: Bytes,
    },
}

/// Everything decoded from one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Layers successfully decoded, outermost first.
    pub layers: Vec<LayerType>,
    /// MAC header, absent when the MAC layer itself failed.
    pub mac: Option<MacHeader>,
    /// Management header for MAC-specific frames.
    pub management: Option<ManagementHeader>,
    /// Innermost decoded message.
    pub message: Option<Message>,
    /// Error that stopped decoding, if any.
    pub error: Option<DecodeError>,
    /// The complete frame as reassembled.
    #[serde(skip)]
    pub frame: Bytes,
}

impl FrameRecord {
    fn new(frame: Bytes) -> Self {
        FrameRecord {
            layers: Vec::new(),
            mac: None,
            management: None,
            message: None,
            error: None,
            frame,
        }
    }

    /// Returns `true` if every layer decoded without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The innermost layer reached.
    pub fn last_layer(&self) -> Option<LayerType> {
        self.layers.last().copied()
    }

    /// Settings carried by a (multipart) registration response.
    pub fn registration_settings(&self) -> Option<RegistrationSettings> {
        match &self.message {
            Some(Message::RegistrationResponse(rsp)) => Some(rsp.settings),
            Some(Message::MultipartRegistrationResponse(rsp)) => Some(rsp.settings),
            _ => None,
        }
    }
}

/// Per-layer counters over every decoded frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Frames decoded.
    pub frames: u64,
    /// Frames whose decode stopped on an error.
    pub errors: u64,
    /// Errors that were HCS mismatches.
    pub checksum_errors: u64,
    /// Clear-text Ethernet frames.
    pub ethernet: u64,
    /// Encrypted Ethernet frames.
    pub encrypted_ethernet: u64,
    /// Frames with a decoded management header.
    pub management: u64,
    /// Registration responses.
    pub registration_responses: u64,
    /// Multipart registration responses.
    pub multipart_registration_responses: u64,
    /// BPKM responses.
    pub bpkm_responses: u64,
    /// Frames ending in an opaque payload.
    pub opaque: u64,
}

impl DecodeStats {
    /// Folds one record into the counters.
    pub fn record(&mut self, record: &FrameRecord) {
        self.frames += 1;
        if let Some(err) = &record.error {
            self.errors += 1;
            if err.is_checksum_mismatch() {
                self.checksum_errors += 1;
            }
        }
        for layer in &record.layers {
            match layer {
                LayerType::Mac => {}
                LayerType::Ethernet => self.ethernet += 1,
                LayerType::EncryptedEthernet => self.encrypted_ethernet += 1,
                LayerType::Management => self.management += 1,
                LayerType::RegistrationResponse => self.registration_responses += 1,
                LayerType::MultipartRegistrationResponse => {
                    self.multipart_registration_responses += 1
                }
                LayerType::BpkmResponse => self.bpkm_responses += 1,
                LayerType::Opaque => self.opaque += 1,
            }
        }
    }
}

/// Stateless frame decoder.
///
/// Decoding depends on nothing but the frame bytes and the configuration, so
/// one decoder can be shared freely.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    config: DecoderConfig,
    hcs_calculator: HcsCalculator,
}

impl FrameDecoder {
    /// Creates a decoder with the given settings.
    pub fn new(config: DecoderConfig) -> Self {
        FrameDecoder {
            config,
            hcs_calculator: HcsCalculator::new(),
        }
    }

    /// Decodes one complete frame as emitted by [`TsReassembler`].
    pub fn decode(&self, frame: Bytes) -> FrameRecord {
        let mut record = FrameRecord::new(frame.clone());
        if let Err(err) = self.decode_mac(&frame, &mut record) {
            debug!(
                "Frame of {} bytes failed after {:?}: {}",
                frame.len(),
                record.layers,
                err
            );
            record.error = Some(err);
        }
        record
    }

    fn decode_mac(&self, frame: &Bytes, record: &mut FrameRecord) -> Result<(), DecodeError> {
        let mac = MacFrame::decode_with(frame, &self.hcs_calculator, self.config.verify_hcs)?;
        record.layers.push(LayerType::Mac);
        let next = mac.next_layer();
        let payload = frame.slice_ref(mac.payload);
        record.mac = Some(mac.header);
        trace!("MAC frame with {} byte payload -> {:?}", payload.len(), next);

        match next {
            NextLayer::Ethernet => {
                record.layers.push(LayerType::Ethernet);
                record.message = Some(Message::Ethernet { payload });
                Ok(())
            }
            NextLayer::EncryptedEthernet => self.decode_encrypted_ethernet(payload, record),
            NextLayer::Management => self.decode_management(payload, record),
            NextLayer::Opaque => {
                record.layers.push(LayerType::Opaque);
                record.message = Some(Message::Opaque { payload });
                Ok(())
            }
        }
    }

    fn decode_encrypted_ethernet(
        &self,
        payload: Bytes,
        record: &mut FrameRecord,
    ) -> Result<(), DecodeError> {
        let message = if self.config.decode_ethernet_headers {
            let header = EncryptedEthernetHeader::decode(&payload)?;
            Message::EncryptedEthernet {
                header: Some(header),
                payload: payload.slice(ETHERNET_HEADER_LENGTH_BYTES..),
            }
        } else {
            Message::EncryptedEthernet {
                header: None,
                payload,
            }
        };
        record.layers.push(LayerType::EncryptedEthernet);
        record.message = Some(message);
        Ok(())
    }

    fn decode_management(
        &self,
        payload: Bytes,
        record: &mut FrameRecord,
    ) -> Result<(), DecodeError> {
        let msg = ManagementMessage::decode(&payload)?;
        record.layers.push(LayerType::Management);
        record.management = Some(msg.header);

        let (layer, message) = match msg.header.message_type {
            ManagementMessageType::RegistrationResponse => (
                LayerType::RegistrationResponse,
                Message::RegistrationResponse(RegistrationResponse::decode(msg.payload)?),
            ),
            ManagementMessageType::MultipartRegistrationResponse => (
                LayerType::MultipartRegistrationResponse,
                Message::MultipartRegistrationResponse(MultipartRegistrationResponse::decode(
                    msg.payload,
                )?),
            ),
            ManagementMessageType::BpkmResponse => (
                LayerType::BpkmResponse,
                Message::BpkmResponse(BpkmResponse::decode(msg.payload)?),
            ),
            ManagementMessageType::Other(_) => (
                LayerType::Opaque,
                Message::Opaque {
                    payload: payload.slice_ref(msg.payload),
                },
            ),
        };
        record.layers.push(layer);
        record.message = Some(message);
        Ok(())
    }
}

/// Transport reassembly and frame decoding behind one packet-at-a-time call.
#[derive(Debug, Default)]
pub struct DocsisSniffer {
    reassembler: TsReassembler,
    decoder: FrameDecoder,
    stats: DecodeStats,
    frames: Vec<Bytes>,
}

impl DocsisSniffer {
    /// Creates a sniffer that accepts packets on every PID.
    pub fn new(config: DecoderConfig) -> Self {
        Self::with_reassembler(TsReassembler::new(), config)
    }

    /// Builds a sniffer around a preconfigured reassembler, e.g. one with a
    /// PID filter.
    pub fn with_reassembler(reassembler: TsReassembler, config: DecoderConfig) -> Self {
        DocsisSniffer {
            reassembler,
            decoder: FrameDecoder::new(config),
            stats: DecodeStats::default(),
            frames: Vec::new(),
        }
    }

    /// Only reassemble packets carrying `pid`.
    pub fn with_pid_filter(mut self, pid: Pid) -> Self {
        self.reassembler = self.reassembler.with_pid_filter(pid);
        self
    }

    /// Feeds one transport packet and returns a record per completed frame.
    pub fn process_packet(&mut self, packet: &[u8]) -> Vec<FrameRecord> {
        let mut records = Vec::new();
        self.process_packet_with(packet, |record| records.push(record));
        records
    }

    /// Like [`process_packet`](Self::process_packet) but hands each record
    /// to `on_record` as soon as it is decoded.
    pub fn process_packet_with<F>(&mut self, packet: &[u8], mut on_record: F)
    where
        F: FnMut(FrameRecord),
    {
        self.reassembler.process_into(packet, &mut self.frames);
        for frame in self.frames.drain(..) {
            let record = self.decoder.decode(frame);
            self.stats.record(&record);
            on_record(record);
        }
    }

    /// Abandons any partial frame.
    pub fn reset(&mut self) {
        self.reassembler.reset();
    }

    /// Per-layer decode counters.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Counters from the underlying reassembler.
    pub fn reassembly_stats(&self) -> ReassemblyStats {
        self.reassembler.stats()
    }
}
