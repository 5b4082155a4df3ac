//! Header of Ethernet frames carried in encrypted DOCSIS packet PDUs.
//!
//! Baseline Privacy leaves the destination and source addresses in the clear,
//! so only the fixed 14-byte header is decoded; the remainder stays opaque.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::constants::ETHERNET_HEADER_LENGTH_BYTES;
use crate::error::{DecodeError, ParseContext};
use crate::types::MacAddress;

/// The 14-byte Ethernet header of an encrypted packet PDU.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEthernetHeader {
    /// Destination MAC address.
    #[serde_as(as = "DisplayFromStr")]
    pub dst: MacAddress,
    /// Source MAC address.
    #[serde_as(as = "DisplayFromStr")]
    pub src: MacAddress,
    /// Ethertype as it appears on the wire.
    pub ether_type: u16,
}

impl EncryptedEthernetHeader {
    /// Decodes the header from the start of `data`.
    ///
    /// # Errors
    /// - [`DecodeError::TooSmall`] - fewer than 14 bytes
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let too_small = || DecodeError::TooSmall {
            needed: ETHERNET_HEADER_LENGTH_BYTES,
            got: data.len(),
            context: ParseContext::EthernetHeader,
        };
        if data.len() < ETHERNET_HEADER_LENGTH_BYTES {
            return Err(too_small());
        }
        Ok(EncryptedEthernetHeader {
            dst: MacAddress::from_slice(data).ok_or_else(too_small)?,
            src: MacAddress::from_slice(&data[6..]).ok_or_else(too_small)?,
            ether_type: u16::from_be_bytes([data[12], data[13]]),
        })
    }
}
