//! `docsis_sniffer`: passive decoding of DOCSIS downstream traffic carried in
//! MPEG transport streams.
//!
//! A cable downstream carries DOCSIS MAC frames inside 188-byte MPEG-TS
//! packets on PID `0x1FFE`. This crate rebuilds those frames from a packet
//! sequence and walks each one through a fixed chain of decoders, ending in
//! the registration and key-management messages a modem receives from the
//! CMTS.
//!
//! ## Core Concepts
//!
//! - **[`TsReassembler`]**: Stitches frames back together across packets,
//!   honouring the pointer field and stuffing bytes.
//! - **[`FrameDecoder`]**: Decodes one frame into a [`FrameRecord`], layer by
//!   layer, verifying the MAC header check sequence on the way.
//! - **[`DocsisSniffer`]**: Couples the two behind a single
//!   packet-at-a-time call and keeps running counters.
//! - **[`read_stream`]**: Drives a sniffer from any [`std::io::Read`] source
//!   until end of stream or cancellation.
//!
//! ## Quick Start
//!
//! ```rust
//! use docsis_sniffer::crc::calculate_hcs;
//! use docsis_sniffer::{DecoderConfig, DocsisSniffer, LayerType};
//!
//! // A packet PDU MAC frame with a four byte payload.
//! let mut frame = vec![0x00, 0x00, 0x00, 0x04];
//! let hcs = calculate_hcs(&frame);
//! frame.extend_from_slice(&hcs.to_be_bytes());
//! frame.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
//!
//! // Carried at the start of a transport packet, pointer field zero.
//! let mut packet = vec![0x47, 0x5F, 0xFE, 0x10, 0x00];
//! packet.extend_from_slice(&frame);
//! packet.resize(188, 0xFF);
//!
//! let mut sniffer = DocsisSniffer::new(DecoderConfig::default());
//! let records = sniffer.process_packet(&packet);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].layers, vec![LayerType::Mac, LayerType::Ethernet]);
//! ```

pub mod bpkm;
pub mod constants;
pub mod crc;
pub mod decoder;
pub mod error;
pub mod ethernet;
pub mod mac;
pub mod management;
pub mod registration;
pub mod stream;
pub mod tlv;
pub mod transport;
pub mod types;

pub use decoder::{
    DecodeStats, DecoderConfig, DocsisSniffer, FrameDecoder, FrameRecord, LayerType, Message,
};
pub use error::{CorruptHeader, DecodeError, ParseContext, StreamError, TlvFault, TlvLevel};
pub use mac::{MacFrame, MacHeader};
pub use stream::{TsPacketReader, read_stream};
pub use tlv::RegistrationSettings;
pub use transport::{ReassemblyStats, TsReassembler};
pub use types::{MacAddress, Pid, ServiceId};
