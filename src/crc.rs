//! DOCSIS header check sequence (HCS) calculation.
//!
//! The HCS protecting every DOCSIS MAC header is the 16-bit CCITT CRC in its
//! X.25 form (polynomial `0x1021`, reflected, init `0xFFFF`, final XOR
//! `0xFFFF`). This module wraps the `crc` crate's `CRC_16_IBM_SDLC` algorithm
//! and applies the byte order DOCSIS uses on the wire: the CRC register is
//! transmitted low byte first, so the computed value is byte-swapped before it
//! is compared against the big-endian HCS field.

use crc::{CRC_16_IBM_SDLC, Crc};
use std::fmt;

/// A reusable HCS calculator holding a pre-initialized CRC-16 instance.
pub struct HcsCalculator {
    crc16_calculator: Crc<u16>,
}

impl fmt::Debug for HcsCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HcsCalculator")
            .field("crc16_calculator", &format_args!("Crc<u16>(X25_Algo)"))
            .finish()
    }
}

impl HcsCalculator {
    /// Creates a new `HcsCalculator`.
    pub const fn new() -> Self {
        Self {
            crc16_calculator: Crc::<u16>::new(&CRC_16_IBM_SDLC),
        }
    }

    /// Raw CRC-16/CCITT (X.25) over `input`, in register order.
    #[inline]
    pub fn crc16(&self, input: &[u8]) -> u16 {
        self.crc16_calculator.checksum(input)
    }

    /// HCS value as it reads from the header when interpreted big-endian.
    ///
    /// # Parameters
    /// - `header`: All header bytes preceding the HCS field.
    ///
    /// # Returns
    /// The byte-swapped CRC, directly comparable with the stored HCS.
    #[inline]
    pub fn hcs(&self, header: &[u8]) -> u16 {
        self.crc16(header).swap_bytes()
    }
}

impl Default for HcsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates the DOCSIS HCS for `header` without a cached calculator.
pub fn calculate_hcs(header: &[u8]) -> u16 {
    HcsCalculator::new().hcs(header)
}
