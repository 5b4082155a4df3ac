//! Registration response decoders (REG-RSP and REG-RSP-MP).
//!
//! Both messages share a short fixed prefix followed by a TLV blob that is
//! handed to [`tlv::walk`](crate::tlv::walk).

use serde::{Deserialize, Serialize};

use crate::constants::{REG_RSP_MIN_LENGTH_BYTES, REG_RSP_MP_TLV_OFFSET, REG_RSP_TLV_OFFSET};
use crate::error::{DecodeError, ParseContext};
use crate::tlv::{self, RegistrationSettings};
use crate::types::ServiceId;

fn ensure_min_length(data: &[u8], context: ParseContext) -> Result<(), DecodeError> {
    if data.len() < REG_RSP_MIN_LENGTH_BYTES {
        return Err(DecodeError::TooSmall {
            needed: REG_RSP_MIN_LENGTH_BYTES,
            got: data.len(),
            context,
        });
    }
    Ok(())
}

/// A decoded Registration Response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// Service identifier assigned to the modem.
    pub sid: ServiceId,
    /// Response code, zero on success.
    pub response: u8,
    /// Settings extracted from the TLV encodings.
    pub settings: RegistrationSettings,
}

impl RegistrationResponse {
    /// Decodes a REG-RSP body.
    ///
    /// # Errors
    /// - [`DecodeError::TooSmall`] - fewer than 5 bytes
    /// - [`DecodeError::MalformedTlv`] - invalid TLV framing
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        ensure_min_length(data, ParseContext::RegistrationResponse)?;
        let settings = tlv::walk(&data[REG_RSP_TLV_OFFSET..])?;
        Ok(RegistrationResponse {
            sid: ServiceId::new(u16::from_be_bytes([data[0], data[1]])),
            response: data[2],
            settings,
        })
    }
}

/// A decoded Multipart Registration Response fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartRegistrationResponse {
    /// Service identifier assigned to the modem.
    pub sid: ServiceId,
    /// Response code, zero on success.
    pub response: u8,
    /// Number of fragments making up the full response.
    pub fragments_total: u8,
    /// Position of this fragment.
    pub fragment_number: u8,
    /// Settings extracted from this fragment's TLV encodings.
    pub settings: RegistrationSettings,
}

impl MultipartRegistrationResponse {
    /// Decodes a REG-RSP-MP body.
    ///
    /// Fragments are decoded independently; encodings split across fragments
    /// are not stitched together.
    ///
    /// # Errors
    /// - [`DecodeError::TooSmall`] - fewer than 5 bytes
    /// - [`DecodeError::MalformedTlv`] - invalid TLV framing
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        ensure_min_length(data, ParseContext::MultipartRegistrationResponse)?;
        let settings = tlv::walk(&data[REG_RSP_MP_TLV_OFFSET..])?;
        Ok(MultipartRegistrationResponse {
            sid: ServiceId::new(u16::from_be_bytes([data[0], data[1]])),
            response: data[2],
            fragments_total: data[3],
            fragment_number: data[4],
            settings,
        })
    }
}
