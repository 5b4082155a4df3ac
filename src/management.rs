//! DOCSIS MAC management message header.
//!
//! Management messages follow the MAC header of a MAC-specific frame and
//! start with an 802.3/LLC-style header:
//!
//! ```text
//! DA (6) | SA (6) | LEN (2) | DSAP | SSAP | control | version | type | reserved
//! ```
//!
//! `LEN` counts everything after itself, the six LLC/management bytes
//! included. The message body follows the 20-byte header.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::constants::{
    MGMT_HEADER_LENGTH_BYTES, MGMT_LENGTH_PREFIX_BYTES, MGMT_TYPE_BPKM_RSP, MGMT_TYPE_REG_RSP,
    MGMT_TYPE_REG_RSP_MP,
};
use crate::error::{DecodeError, ParseContext};
use crate::types::MacAddress;

/// Management message type codes this crate decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagementMessageType {
    /// Registration Response (REG-RSP).
    RegistrationResponse,
    /// Baseline Privacy Key Management Response (BPKM-RSP).
    BpkmResponse,
    /// Multipart Registration Response (REG-RSP-MP).
    MultipartRegistrationResponse,
    /// Any other message type, left undecoded.
    Other(u8),
}

impl From<u8> for ManagementMessageType {
    fn from(code: u8) -> Self {
        match code {
            MGMT_TYPE_REG_RSP => ManagementMessageType::RegistrationResponse,
            MGMT_TYPE_BPKM_RSP => ManagementMessageType::BpkmResponse,
            MGMT_TYPE_REG_RSP_MP => ManagementMessageType::MultipartRegistrationResponse,
            other => ManagementMessageType::Other(other),
        }
    }
}

impl From<ManagementMessageType> for u8 {
    fn from(message_type: ManagementMessageType) -> Self {
        match message_type {
            ManagementMessageType::RegistrationResponse => MGMT_TYPE_REG_RSP,
            ManagementMessageType::BpkmResponse => MGMT_TYPE_BPKM_RSP,
            ManagementMessageType::MultipartRegistrationResponse => MGMT_TYPE_REG_RSP_MP,
            ManagementMessageType::Other(code) => code,
        }
    }
}

/// The fixed 20-byte management message header.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementHeader {
    /// Destination MAC address.
    #[serde_as(as = "DisplayFromStr")]
    pub dst: MacAddress,
    /// Source MAC address.
    #[serde_as(as = "DisplayFromStr")]
    pub src: MacAddress,
    /// Message length following the LEN field.
    pub length: u16,
    /// LLC destination SAP.
    pub dsap: u8,
    /// LLC source SAP.
    pub ssap: u8,
    /// LLC control.
    pub control: u8,
    /// Management message version.
    pub version: u8,
    /// Management message type.
    pub message_type: ManagementMessageType,
    /// Reserved byte.
    pub reserved: u8,
}

/// A management header plus the message body it delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagementMessage<'a> {
    /// Decoded header.
    pub header: ManagementHeader,
    /// Message body between the header and the end given by LEN.
    pub payload: &'a [u8],
}

impl<'a> ManagementMessage<'a> {
    /// Decodes the management header at the start of a MAC payload.
    ///
    /// # Errors
    /// - [`DecodeError::TooSmall`] - fewer than 20 bytes, or LEN advertises
    ///   more bytes than present or fewer than the fixed header needs
    pub fn decode(data: &'a [u8]) -> Result<Self, DecodeError> {
        let too_small = || DecodeError::TooSmall {
            needed: MGMT_HEADER_LENGTH_BYTES,
            got: data.len(),
            context: ParseContext::ManagementHeader,
        };
        if data.len() < MGMT_HEADER_LENGTH_BYTES {
            return Err(too_small());
        }

        let header = ManagementHeader {
            dst: MacAddress::from_slice(data).ok_or_else(too_small)?,
            src: MacAddress::from_slice(&data[6..]).ok_or_else(too_small)?,
            length: u16::from_be_bytes([data[12], data[13]]),
            dsap: data[14],
            ssap: data[15],
            control: data[16],
            version: data[17],
            message_type: ManagementMessageType::from(data[18]),
            reserved: data[19],
        };

        let payload_end = MGMT_LENGTH_PREFIX_BYTES + header.length as usize;
        if payload_end > data.len() || payload_end < MGMT_HEADER_LENGTH_BYTES {
            return Err(DecodeError::TooSmall {
                needed: payload_end.max(MGMT_HEADER_LENGTH_BYTES),
                got: data.len().min(payload_end),
                context: ParseContext::ManagementPayload,
            });
        }

        Ok(ManagementMessage {
            header,
            payload: &data[MGMT_HEADER_LENGTH_BYTES..payload_end],
        })
    }
}
