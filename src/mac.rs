//! DOCSIS MAC header decoding.
//!
//! Every DOCSIS frame starts with a MAC header:
//!
//! ```text
//! +------+----------+---------+-----------------+---------+----------
//! |  FC  | MAC_PARM | LEN (2) | EHDR (MAC_PARM) | HCS (2) | payload
//! +------+----------+---------+-----------------+---------+----------
//! ```
//!
//! `FC` packs the frame type (bits 7-6), a type-specific parameter (bits 5-1)
//! and the EHDR_ON flag (bit 0). When EHDR_ON is set `MAC_PARM` gives the
//! extended header length. `LEN` counts everything after the fixed 4-byte
//! prefix and the HCS: extended header plus payload. The HCS is a CRC-16 over
//! all header bytes before it.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::constants::{
    EH_BP_ENABLE_BYTE_INDEX, EH_BP_ENABLE_MASK, EH_BP_MIN_LENGTH_BYTES, EH_TYPE_BP_DOWN,
    FC_EHDR_ON_MASK, FC_PARM_MASK, FC_TYPE_ATM_PDU, FC_TYPE_MAC_SPECIFIC, FC_TYPE_MASK,
    FC_TYPE_PACKET_PDU, FC_TYPE_RESERVED, MAC_HCS_LENGTH_BYTES, MAC_HEADER_MIN_LENGTH_BYTES,
    MAC_LEN_FIELD_OFFSET,
};
use crate::crc::HcsCalculator;
use crate::error::{CorruptHeader, DecodeError};

/// The FC_TYPE field of the frame control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    /// Packet PDU carrying an Ethernet frame.
    PacketPdu,
    /// ATM cell PDU.
    AtmPdu,
    /// Reserved / isolation PDU.
    Reserved,
    /// MAC-specific header (timing, management, request, fragmentation, ...).
    MacSpecific,
}

impl From<u8> for FrameType {
    /// Maps the two FC_TYPE bits (already shifted down) to a `FrameType`.
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            FC_TYPE_PACKET_PDU => FrameType::PacketPdu,
            FC_TYPE_ATM_PDU => FrameType::AtmPdu,
            FC_TYPE_MAC_SPECIFIC => FrameType::MacSpecific,
            _ => FrameType::Reserved,
        }
    }
}

impl From<FrameType> for u8 {
    fn from(frame_type: FrameType) -> Self {
        match frame_type {
            FrameType::PacketPdu => FC_TYPE_PACKET_PDU,
            FrameType::AtmPdu => FC_TYPE_ATM_PDU,
            FrameType::Reserved => FC_TYPE_RESERVED,
            FrameType::MacSpecific => FC_TYPE_MAC_SPECIFIC,
        }
    }
}

/// One element of the extended header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedHeaderElement {
    /// EH_TYPE (high nibble of the element's first byte).
    pub eh_type: u8,
    /// Element length in bytes, including the type/length byte itself.
    pub length: u8,
    /// Offset of the element within the frame.
    pub offset: u16,
}

/// The decoder a frame's payload should be handed to next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NextLayer {
    /// Unencrypted Ethernet frame.
    Ethernet,
    /// Ethernet frame encrypted under Baseline Privacy.
    EncryptedEthernet,
    /// MAC management message.
    Management,
    /// Anything not decoded further.
    Opaque,
}

/// Scalar fields of a decoded MAC header.
///
/// Owns everything it holds, so it can outlive the frame buffer it was
/// decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacHeader {
    /// FC_TYPE.
    pub fc_type: FrameType,
    /// FC_PARM.
    pub fc_parm: u8,
    /// EHDR_ON flag.
    pub ext_header_present: bool,
    /// Raw MAC_PARM byte (extended header length when EHDR_ON is set).
    pub mac_parm: u8,
    /// LEN field: extended header plus payload length.
    pub length: u16,
    /// Extended header elements in wire order.
    pub ext_headers: Vec<ExtendedHeaderElement>,
    /// Set when a privacy element marks the payload as encrypted.
    pub encrypted: bool,
    /// HCS as stored in the frame.
    pub hcs: u16,
    /// Whether the stored HCS matched the computed one.
    pub hcs_valid: bool,
}

impl MacHeader {
    /// Total header length, HCS included.
    pub fn header_len(&self) -> usize {
        MAC_HEADER_MIN_LENGTH_BYTES + self.ext_header_len()
    }

    /// Extended header length in bytes.
    pub fn ext_header_len(&self) -> usize {
        if self.ext_header_present {
            self.mac_parm as usize
        } else {
            0
        }
    }

    /// Byte range of the payload within the frame.
    pub fn payload_range(&self) -> Range<usize> {
        self.header_len()..MAC_HEADER_MIN_LENGTH_BYTES + self.length as usize
    }

    /// Selects the decoder for this frame's payload.
    ///
    /// A header whose HCS did not verify is never interpreted further.
    pub fn next_layer(&self) -> NextLayer {
        if !self.hcs_valid {
            return NextLayer::Opaque;
        }
        match self.fc_type {
            FrameType::PacketPdu if self.encrypted => NextLayer::EncryptedEthernet,
            FrameType::PacketPdu => NextLayer::Ethernet,
            FrameType::MacSpecific => NextLayer::Management,
            FrameType::AtmPdu | FrameType::Reserved => NextLayer::Opaque,
        }
    }
}

/// A decoded DOCSIS MAC frame borrowing the bytes it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacFrame<'a> {
    /// Decoded header fields.
    pub header: MacHeader,
    /// Raw header bytes, HCS included.
    pub contents: &'a [u8],
    /// Payload bytes covered by LEN after the header.
    pub payload: &'a [u8],
}

impl<'a> MacFrame<'a> {
    /// Decodes a frame and rejects it if the HCS does not match.
    ///
    /// # Errors
    /// - [`DecodeError::FrameTooSmall`] - fewer than 6 bytes
    /// - [`DecodeError::CorruptHeader`] - length overrun, extended header
    ///   overrun or truncation, or HCS mismatch
    pub fn decode(frame: &'a [u8]) -> Result<Self, DecodeError> {
        Self::decode_with(frame, &HcsCalculator::new(), true)
    }

    /// Decodes a frame using a caller-supplied HCS calculator.
    ///
    /// With `verify_hcs` unset a mismatching HCS is recorded in
    /// [`MacHeader::hcs_valid`] instead of failing the decode.
    pub fn decode_with(
        frame: &'a [u8],
        hcs_calculator: &HcsCalculator,
        verify_hcs: bool,
    ) -> Result<Self, DecodeError> {
        if frame.len() < MAC_HEADER_MIN_LENGTH_BYTES {
            return Err(DecodeError::FrameTooSmall {
                needed: MAC_HEADER_MIN_LENGTH_BYTES,
                got: frame.len(),
            });
        }

        let fc = frame[0];
        let fc_type = FrameType::from((fc & FC_TYPE_MASK) >> 6);
        let fc_parm = (fc & FC_PARM_MASK) >> 1;
        let ext_header_present = fc & FC_EHDR_ON_MASK != 0;
        let mac_parm = frame[1];
        let length =
            u16::from_be_bytes([frame[MAC_LEN_FIELD_OFFSET], frame[MAC_LEN_FIELD_OFFSET + 1]]);

        let mut payload_start = MAC_HEADER_MIN_LENGTH_BYTES;
        let payload_end = payload_start + length as usize;
        if payload_end > frame.len() {
            return Err(CorruptHeader::LengthOverrun {
                declared_end: payload_end,
                available: frame.len(),
            }
            .into());
        }

        let mut ext_headers = Vec::new();
        let mut encrypted = false;
        if ext_header_present {
            let ehdr_len = mac_parm as usize;
            if payload_start + ehdr_len > payload_end {
                return Err(CorruptHeader::ExtendedHeaderOverrun {
                    ehdr_len,
                    payload_end,
                }
                .into());
            }
            let ehdr_start = payload_start - MAC_HCS_LENGTH_BYTES;
            encrypted = walk_extended_header(
                &frame[..ehdr_start + ehdr_len],
                ehdr_start,
                &mut ext_headers,
            )?;
            payload_start += ehdr_len;
        }

        let hcs_offset = payload_start - MAC_HCS_LENGTH_BYTES;
        let hcs = u16::from_be_bytes([frame[hcs_offset], frame[hcs_offset + 1]]);
        let calculated = hcs_calculator.hcs(&frame[..hcs_offset]);
        let hcs_valid = hcs == calculated;
        if verify_hcs && !hcs_valid {
            return Err(CorruptHeader::ChecksumMismatch {
                expected: hcs,
                calculated,
            }
            .into());
        }

        Ok(MacFrame {
            header: MacHeader {
                fc_type,
                fc_parm,
                ext_header_present,
                mac_parm,
                length,
                ext_headers,
                encrypted,
                hcs,
                hcs_valid,
            },
            contents: &frame[..payload_start],
            payload: &frame[payload_start..payload_end],
        })
    }

    /// Selects the decoder for this frame's payload.
    pub fn next_layer(&self) -> NextLayer {
        self.header.next_layer()
    }
}

/// Walks the extended header elements in `data[start..]`.
///
/// Returns whether any element flags the payload as encrypted.
fn walk_extended_header(
    data: &[u8],
    start: usize,
    elements: &mut Vec<ExtendedHeaderElement>,
) -> Result<bool, DecodeError> {
    let mut encrypted = false;
    let mut offset = start;
    while offset < data.len() {
        let eh_type = data[offset] >> 4;
        let element_len = (data[offset] & 0x0F) as usize + 1;
        if offset + element_len > data.len() {
            return Err(CorruptHeader::ExtendedHeaderTruncated {
                offset,
                needed: element_len,
                available: data.len() - offset,
            }
            .into());
        }

        if eh_type == EH_TYPE_BP_DOWN
            && element_len >= EH_BP_MIN_LENGTH_BYTES
            && data[offset + EH_BP_ENABLE_BYTE_INDEX] & EH_BP_ENABLE_MASK != 0
        {
            encrypted = true;
        }

        elements.push(ExtendedHeaderElement {
            eh_type,
            length: element_len as u8,
            offset: offset as u16,
        });
        offset += element_len;
    }
    Ok(encrypted)
}
