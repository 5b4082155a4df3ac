//! DOCSIS decode error types.
//!
//! This module defines the error types used throughout the sniffer. Decode
//! errors are local to a single frame: the chain for that frame stops and the
//! error is returned to the caller, while processing continues with the next
//! frame. Transport-level framing faults are never surfaced as errors; the
//! reassembler drops them silently. The `thiserror` crate is used for
//! ergonomic error definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies the structure that was being parsed when data ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseContext {
    /// Fixed 20-byte management message header.
    ManagementHeader,
    /// Management message body as advertised by its LEN field.
    ManagementPayload,
    /// Registration response fixed prefix.
    RegistrationResponse,
    /// Multipart registration response fixed prefix.
    MultipartRegistrationResponse,
    /// BPKM response fixed header.
    BpkmResponse,
    /// Ethernet (or encrypted Ethernet) header.
    EthernetHeader,
}

impl fmt::Display for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseContext::ManagementHeader => "management header",
            ParseContext::ManagementPayload => "management payload",
            ParseContext::RegistrationResponse => "registration response",
            ParseContext::MultipartRegistrationResponse => "multipart registration response",
            ParseContext::BpkmResponse => "BPKM response",
            ParseContext::EthernetHeader => "Ethernet header",
        };
        f.write_str(name)
    }
}

/// Nesting level of a TLV inside a registration response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TlvLevel {
    /// Top-level encoding in the registration TLV blob.
    Outer,
    /// Sub-encoding inside an outer TLV value.
    Inner,
}

impl fmt::Display for TlvLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlvLevel::Outer => f.write_str("outer"),
            TlvLevel::Inner => f.write_str("inner"),
        }
    }
}

/// The specific way a TLV violated its framing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TlvFault {
    /// Fewer than two bytes left for the type and length octets.
    #[error("header truncated with {remaining} byte(s) left")]
    TruncatedHeader { remaining: usize },

    /// Declared value length runs past the enclosing buffer.
    #[error("value of {declared} byte(s) declared, {remaining} remaining")]
    TruncatedValue { declared: usize, remaining: usize },

    /// A recognized encoding carried a value of the wrong size.
    #[error("type {tlv_type} must be {expected} byte(s) long, got {got}")]
    InvalidLength {
        tlv_type: u8,
        expected: usize,
        got: usize,
    },
}

/// Ways a DOCSIS MAC header can be internally inconsistent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorruptHeader {
    /// LEN advertises more bytes than the frame holds.
    #[error("frame advertises {declared_end} bytes but only {available} are present")]
    LengthOverrun {
        declared_end: usize,
        available: usize,
    },

    /// The extended header (plus HCS) does not fit inside the advertised frame.
    #[error("extended header of {ehdr_len} bytes pushes the payload start past {payload_end}")]
    ExtendedHeaderOverrun { ehdr_len: usize, payload_end: usize },

    /// An extended header element runs past the end of the extended header.
    #[error("extended header element at offset {offset} needs {needed} bytes, {available} left")]
    ExtendedHeaderTruncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The header check sequence does not match the header contents.
    #[error("header check sequence mismatch: expected 0x{expected:04X}, calculated 0x{calculated:04X}")]
    ChecksumMismatch { expected: u16, calculated: u16 },
}

/// Errors that can occur while decoding a single DOCSIS frame.
///
/// Each variant aborts the decode chain for the frame it was raised on and
/// nothing else.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeError {
    /// The frame is shorter than the fixed MAC header.
    #[error("DOCSIS frame too small: needed {needed} bytes, got {got}")]
    FrameTooSmall { needed: usize, got: usize },

    /// The MAC header is malformed or failed its checksum.
    #[error("Corrupt DOCSIS MAC header: {0}")]
    CorruptHeader(#[from] CorruptHeader),

    /// A management-layer structure is shorter than its fixed layout.
    #[error("Incomplete {context}: needed {needed} bytes, got {got}")]
    TooSmall {
        needed: usize,
        got: usize,
        context: ParseContext,
    },

    /// The registration TLV blob violates its type-length framing.
    #[error("Malformed {level} TLV at offset {offset}: {fault}")]
    MalformedTlv {
        level: TlvLevel,
        offset: usize,
        fault: TlvFault,
    },
}

impl DecodeError {
    /// Returns `true` if this error is a header checksum mismatch.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(
            self,
            DecodeError::CorruptHeader(CorruptHeader::ChecksumMismatch { .. })
        )
    }
}

/// Errors raised by the capture stream loop.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Reading from the capture source failed.
    #[error("I/O error while reading transport stream: {0}")]
    Io(#[from] std::io::Error),

    /// The cancellation flag was raised while reading.
    #[error("Stream processing cancelled")]
    Cancelled,
}
