//! Baseline Privacy Key Management response header.

use serde::{Deserialize, Serialize};

use crate::constants::BPKM_HEADER_LENGTH_BYTES;
use crate::error::{DecodeError, ParseContext};

/// BPKM message codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BpkmCode {
    /// Auth Request (4).
    AuthRequest,
    /// Auth Reply (5).
    AuthReply,
    /// Auth Reject (6).
    AuthReject,
    /// Key Request (7).
    KeyRequest,
    /// Key Reply (8).
    KeyReply,
    /// Key Reject (9).
    KeyReject,
    /// Auth Invalid (10).
    AuthInvalid,
    /// TEK Invalid (11).
    TekInvalid,
    /// Authentication Information (12).
    AuthInfo,
    /// Any code not listed above.
    Other(u8),
}

impl From<u8> for BpkmCode {
    fn from(code: u8) -> Self {
        match code {
            4 => BpkmCode::AuthRequest,
            5 => BpkmCode::AuthReply,
            6 => BpkmCode::AuthReject,
            7 => BpkmCode::KeyRequest,
            8 => BpkmCode::KeyReply,
            9 => BpkmCode::KeyReject,
            10 => BpkmCode::AuthInvalid,
            11 => BpkmCode::TekInvalid,
            12 => BpkmCode::AuthInfo,
            other => BpkmCode::Other(other),
        }
    }
}

impl From<BpkmCode> for u8 {
    fn from(code: BpkmCode) -> Self {
        match code {
            BpkmCode::AuthRequest => 4,
            BpkmCode::AuthReply => 5,
            BpkmCode::AuthReject => 6,
            BpkmCode::KeyRequest => 7,
            BpkmCode::KeyReply => 8,
            BpkmCode::KeyReject => 9,
            BpkmCode::AuthInvalid => 10,
            BpkmCode::TekInvalid => 11,
            BpkmCode::AuthInfo => 12,
            BpkmCode::Other(code) => code,
        }
    }
}

/// The fixed header of a BPKM-RSP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpkmResponse {
    /// Message code.
    pub code: BpkmCode,
    /// Matches a response to its request.
    pub identifier: u8,
    /// Length of the attribute list that follows.
    pub length: u16,
}

impl BpkmResponse {
    /// Decodes the 4-byte BPKM header. Attributes are not decoded.
    ///
    /// # Errors
    /// - [`DecodeError::TooSmall`] - fewer than 4 bytes
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < BPKM_HEADER_LENGTH_BYTES {
            return Err(DecodeError::TooSmall {
                needed: BPKM_HEADER_LENGTH_BYTES,
                got: data.len(),
                context: ParseContext::BpkmResponse,
            });
        }
        Ok(BpkmResponse {
            code: BpkmCode::from(data[0]),
            identifier: data[1],
            length: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_key_reply() {
        let rsp = BpkmResponse::decode(&[8, 0x2A, 0x00, 0x40, 0xAA]).unwrap();
        assert_eq!(rsp.code, BpkmCode::KeyReply);
        assert_eq!(rsp.identifier, 0x2A);
        assert_eq!(rsp.length, 64);
    }

    #[test]
    fn codes_round_trip_through_u8() {
        for code in 0..=u8::MAX {
            assert_eq!(u8::from(BpkmCode::from(code)), code);
        }
        assert_eq!(BpkmCode::from(3), BpkmCode::Other(3));
        assert_eq!(BpkmCode::from(12), BpkmCode::AuthInfo);
    }

    #[test]
    fn decode_too_small() {
        assert_eq!(
            BpkmResponse::decode(&[5, 1, 0]).unwrap_err(),
            DecodeError::TooSmall {
                needed: 4,
                got: 3,
                context: ParseContext::BpkmResponse,
            }
        );
    }
}
