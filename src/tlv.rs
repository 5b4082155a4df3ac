//! Two-level TLV walk over registration response encodings.
//!
//! Registration responses carry their parameters as a flat sequence of
//! type/length/value encodings, each with a one-byte type and a one-byte
//! length. A few outer encodings nest a second sequence with the same framing
//! inside their value:
//!
//! - `5` modem capabilities: DOCSIS version (`2`), transmit channels (`24`),
//!   receive channels (`29`), each exactly one byte.
//! - `24` / `25` upstream / downstream service flows: flow reference (`1`, two
//!   bytes) and maximum sustained traffic rate (`8`, four bytes).
//!
//! Every other outer encoding is stepped over without looking inside.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CAP_DOCSIS_VERSION, CAP_DOWNSTREAM_CHANNELS, CAP_UPSTREAM_CHANNELS,
    PRIMARY_DOWNSTREAM_FLOW_REFERENCE, PRIMARY_UPSTREAM_FLOW_REFERENCE, SF_MAX_SUSTAINED_RATE,
    SF_MAX_SUSTAINED_RATE_LENGTH_BYTES, SF_REFERENCE, SF_REFERENCE_LENGTH_BYTES,
    TLV_DOWNSTREAM_SERVICE_FLOW, TLV_HEADER_LENGTH_BYTES, TLV_MODEM_CAPABILITIES,
    TLV_UPSTREAM_SERVICE_FLOW,
};
use crate::error::{DecodeError, TlvFault, TlvLevel};

/// Modem parameters recovered from a registration response.
///
/// Fields stay zero when the encoding that carries them is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSettings {
    /// DOCSIS version from the modem capabilities.
    pub docsis_version: u8,
    /// Number of upstream channels the modem can transmit on.
    pub upstream_channels: u8,
    /// Number of downstream channels the modem can receive.
    pub downstream_channels: u8,
    /// Maximum sustained rate of the primary upstream flow, in bits/s.
    pub upstream_max_rate: u32,
    /// Maximum sustained rate of the primary downstream flow, in bits/s.
    pub downstream_max_rate: u32,
}

/// One encoding, borrowed from the buffer being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tlv<'a> {
    tlv_type: u8,
    value: &'a [u8],
}

/// Iterator over one level of encodings.
///
/// Stops after yielding the first framing error.
struct TlvIter<'a> {
    data: &'a [u8],
    offset: usize,
    level: TlvLevel,
    failed: bool,
}

impl<'a> TlvIter<'a> {
    fn new(data: &'a [u8], level: TlvLevel) -> Self {
        TlvIter {
            data,
            offset: 0,
            level,
            failed: false,
        }
    }

    fn fail(&mut self, fault: TlvFault) -> Option<Result<Tlv<'a>, DecodeError>> {
        self.failed = true;
        Some(Err(DecodeError::MalformedTlv {
            level: self.level,
            offset: self.offset,
            fault,
        }))
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<Tlv<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let remaining = self.data.len() - self.offset;
        if remaining < TLV_HEADER_LENGTH_BYTES {
            return self.fail(TlvFault::TruncatedHeader { remaining });
        }

        let tlv_type = self.data[self.offset];
        let declared = self.data[self.offset + 1] as usize;
        let value_start = self.offset + TLV_HEADER_LENGTH_BYTES;
        if declared > self.data.len() - value_start {
            return self.fail(TlvFault::TruncatedValue {
                declared,
                remaining: self.data.len() - value_start,
            });
        }

        let value = &self.data[value_start..value_start + declared];
        self.offset = value_start + declared;
        Some(Ok(Tlv { tlv_type, value }))
    }
}

/// Walks a registration TLV blob and extracts the modem settings.
///
/// For service flows, the rate of an upstream flow with reference 1 or a
/// downstream flow with reference 2 is taken when it is nonzero. A later
/// qualifying flow overrides an earlier one; a zero rate or another reference
/// never clears a value already found.
///
/// # Errors
/// - [`DecodeError::MalformedTlv`] - truncated framing at either level, or a
///   recognized encoding with the wrong value length
pub fn walk(blob: &[u8]) -> Result<RegistrationSettings, DecodeError> {
    let mut settings = RegistrationSettings::default();

    let mut outer = TlvIter::new(blob, TlvLevel::Outer);
    while let Some(tlv) = outer.next() {
        let tlv = tlv?;
        // Inner offsets are reported relative to the blob.
        let base = outer.offset - tlv.value.len();
        match tlv.tlv_type {
            TLV_MODEM_CAPABILITIES => {
                read_capabilities(tlv.value, &mut settings).map_err(|e| rebase(e, base))?;
            }
            TLV_UPSTREAM_SERVICE_FLOW | TLV_DOWNSTREAM_SERVICE_FLOW => {
                let (reference, rate) =
                    read_service_flow(tlv.value).map_err(|e| rebase(e, base))?;
                if rate == 0 {
                    continue;
                }
                if tlv.tlv_type == TLV_UPSTREAM_SERVICE_FLOW
                    && reference == PRIMARY_UPSTREAM_FLOW_REFERENCE
                {
                    settings.upstream_max_rate = rate;
                } else if tlv.tlv_type == TLV_DOWNSTREAM_SERVICE_FLOW
                    && reference == PRIMARY_DOWNSTREAM_FLOW_REFERENCE
                {
                    settings.downstream_max_rate = rate;
                }
            }
            _ => {}
        }
    }

    Ok(settings)
}

fn read_capabilities(value: &[u8], settings: &mut RegistrationSettings) -> Result<(), DecodeError> {
    let mut inner = TlvIter::new(value, TlvLevel::Inner);
    while let Some(tlv) = inner.next() {
        let tlv = tlv?;
        let target = match tlv.tlv_type {
            CAP_DOCSIS_VERSION => &mut settings.docsis_version,
            CAP_UPSTREAM_CHANNELS => &mut settings.upstream_channels,
            CAP_DOWNSTREAM_CHANNELS => &mut settings.downstream_channels,
            _ => continue,
        };
        let [byte] = fixed_value::<1>(&inner, tlv)?;
        *target = byte;
    }
    Ok(())
}

fn read_service_flow(value: &[u8]) -> Result<(u16, u32), DecodeError> {
    let mut reference = 0;
    let mut rate = 0;
    let mut inner = TlvIter::new(value, TlvLevel::Inner);
    while let Some(tlv) = inner.next() {
        let tlv = tlv?;
        match tlv.tlv_type {
            SF_REFERENCE => {
                reference =
                    u16::from_be_bytes(fixed_value::<SF_REFERENCE_LENGTH_BYTES>(&inner, tlv)?);
            }
            SF_MAX_SUSTAINED_RATE => {
                rate = u32::from_be_bytes(fixed_value::<SF_MAX_SUSTAINED_RATE_LENGTH_BYTES>(
                    &inner, tlv,
                )?);
            }
            _ => {}
        }
    }
    Ok((reference, rate))
}

/// Copies out a value that must be exactly `N` bytes long.
fn fixed_value<const N: usize>(iter: &TlvIter<'_>, tlv: Tlv<'_>) -> Result<[u8; N], DecodeError> {
    tlv.value.try_into().map_err(|_| DecodeError::MalformedTlv {
        level: iter.level,
        offset: iter.offset - tlv.value.len() - TLV_HEADER_LENGTH_BYTES,
        fault: TlvFault::InvalidLength {
            tlv_type: tlv.tlv_type,
            expected: N,
            got: tlv.value.len(),
        },
    })
}

fn rebase(err: DecodeError, base: usize) -> DecodeError {
    match err {
        DecodeError::MalformedTlv {
            level,
            offset,
            fault,
        } => DecodeError::MalformedTlv {
            level,
            offset: offset + base,
            fault,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlv(tlv_type: u8, value: &[u8]) -> Vec<u8> {
        let mut out = vec![tlv_type, value.len() as u8];
        out.extend_from_slice(value);
        out
    }

    fn service_flow(outer: u8, reference: u16, rate: u32) -> Vec<u8> {
        let mut inner = tlv(SF_REFERENCE, &reference.to_be_bytes());
        inner.extend(tlv(SF_MAX_SUSTAINED_RATE, &rate.to_be_bytes()));
        tlv(outer, &inner)
    }

    #[test]
    fn empty_blob_yields_defaults() {
        assert_eq!(walk(&[]).unwrap(), RegistrationSettings::default());
    }

    #[test]
    fn upstream_rate_for_primary_flow() {
        let blob = service_flow(24, 1, 5_000_000);
        let settings = walk(&blob).unwrap();
        assert_eq!(settings.upstream_max_rate, 5_000_000);
        assert_eq!(settings.downstream_max_rate, 0);
    }

    #[test]
    fn zero_upstream_rate_is_absent_not_error() {
        let blob = service_flow(24, 1, 0);
        let settings = walk(&blob).unwrap();
        assert_eq!(settings.upstream_max_rate, 0);
    }

    #[test]
    fn downstream_rate_requires_reference_two() {
        let mut blob = service_flow(25, 1, 7_000_000);
        assert_eq!(walk(&blob).unwrap().downstream_max_rate, 0);
        blob.extend(service_flow(25, 2, 50_000_000));
        assert_eq!(walk(&blob).unwrap().downstream_max_rate, 50_000_000);
    }

    #[test]
    fn later_zero_rate_does_not_clear_earlier_value() {
        let mut blob = service_flow(24, 1, 1_000_000);
        blob.extend(service_flow(24, 1, 0));
        blob.extend(service_flow(24, 3, 9_000_000));
        assert_eq!(walk(&blob).unwrap().upstream_max_rate, 1_000_000);
    }

    #[test]
    fn last_qualifying_flow_wins() {
        let mut blob = service_flow(24, 1, 1_000_000);
        blob.extend(service_flow(24, 1, 2_000_000));
        assert_eq!(walk(&blob).unwrap().upstream_max_rate, 2_000_000);
    }

    #[test]
    fn modem_capabilities_are_read() {
        let mut caps = tlv(CAP_DOCSIS_VERSION, &[3]);
        caps.extend(tlv(CAP_UPSTREAM_CHANNELS, &[4]));
        caps.extend(tlv(CAP_DOWNSTREAM_CHANNELS, &[16]));
        caps.extend(tlv(9, &[0xAA, 0xBB, 0xCC]));
        let blob = tlv(TLV_MODEM_CAPABILITIES, &caps);
        let settings = walk(&blob).unwrap();
        assert_eq!(settings.docsis_version, 3);
        assert_eq!(settings.upstream_channels, 4);
        assert_eq!(settings.downstream_channels, 16);
    }

    #[test]
    fn capability_with_wrong_length_is_malformed() {
        let mut blob = tlv(1, &[0x00]);
        blob.extend(tlv(TLV_MODEM_CAPABILITIES, &tlv(CAP_DOCSIS_VERSION, &[3, 0])));
        assert_eq!(
            walk(&blob).unwrap_err(),
            DecodeError::MalformedTlv {
                level: TlvLevel::Inner,
                offset: 5,
                fault: TlvFault::InvalidLength {
                    tlv_type: CAP_DOCSIS_VERSION,
                    expected: 1,
                    got: 2,
                },
            }
        );
    }

    #[test]
    fn service_flow_reference_with_wrong_length_is_malformed() {
        let blob = tlv(24, &tlv(SF_REFERENCE, &[1]));
        assert!(matches!(
            walk(&blob),
            Err(DecodeError::MalformedTlv {
                fault: TlvFault::InvalidLength { tlv_type: 1, .. },
                ..
            })
        ));
    }

    #[test]
    fn unknown_service_flow_sub_types_are_skipped() {
        let mut inner = tlv(6, &[0; 7]);
        inner.extend(tlv(SF_REFERENCE, &1u16.to_be_bytes()));
        inner.extend(tlv(SF_MAX_SUSTAINED_RATE, &300u32.to_be_bytes()));
        let blob = tlv(24, &inner);
        assert_eq!(walk(&blob).unwrap().upstream_max_rate, 300);
    }

    #[test]
    fn uninteresting_outer_types_are_not_inspected() {
        // Value would be malformed as nested TLVs but type 3 is never walked.
        let blob = tlv(3, &[0x02, 0x09]);
        assert_eq!(walk(&blob).unwrap(), RegistrationSettings::default());
    }

    #[test]
    fn truncated_outer_header() {
        let mut blob = service_flow(24, 1, 10);
        blob.push(24);
        assert_eq!(
            walk(&blob).unwrap_err(),
            DecodeError::MalformedTlv {
                level: TlvLevel::Outer,
                offset: 12,
                fault: TlvFault::TruncatedHeader { remaining: 1 },
            }
        );
    }

    #[test]
    fn truncated_outer_value() {
        let blob = [24, 10, 1, 2];
        assert_eq!(
            walk(&blob).unwrap_err(),
            DecodeError::MalformedTlv {
                level: TlvLevel::Outer,
                offset: 0,
                fault: TlvFault::TruncatedValue {
                    declared: 10,
                    remaining: 2,
                },
            }
        );
    }

    #[test]
    fn truncated_inner_value_is_checked_against_inner_bounds() {
        // The inner encoding claims 8 bytes; the outer blob has them, the outer value does not.
        let mut blob = tlv(25, &[8, 8, 0, 0]);
        blob.extend_from_slice(&[0; 8]);
        assert!(matches!(
            walk(&blob),
            Err(DecodeError::MalformedTlv {
                level: TlvLevel::Inner,
                offset: 2,
                fault: TlvFault::TruncatedValue {
                    declared: 8,
                    remaining: 2,
                },
            })
        ));
    }
}
