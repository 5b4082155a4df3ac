//! Binary layout constants for MPEG-TS carriage and the DOCSIS MAC layer.
//!
//! Every offset and code in this module is part of the wire format and must
//! be reproduced exactly for interoperability with captured streams.

// --- MPEG Transport Stream (ISO/IEC 13818-1) ---

/// Size of one transport stream packet in bytes.
pub const TS_PACKET_SIZE: usize = 188;
/// Sync byte that starts every transport stream packet.
pub const TS_SYNC_BYTE: u8 = 0x47;
/// Length of the fixed transport stream packet header.
pub const TS_HEADER_LENGTH_BYTES: usize = 4;
/// Offset of the pointer field, present only when PUSI is set.
pub const TS_POINTER_FIELD_OFFSET: usize = 4;
/// Mask for the Payload Unit Start Indicator in header byte 1.
pub const TS_PUSI_MASK: u8 = 0x40;
/// Stuffing byte value filling unused space after the last frame of a packet.
pub const TS_STUFFING_BYTE: u8 = 0xFF;
/// Well-known PID carrying DOCSIS downstream data (DOCSIS PID 0x1FFE).
pub const DOCSIS_PID: u16 = 0x1FFE;

// --- DOCSIS MAC header ---

/// Fixed part of the MAC header: FC, MAC_PARM, LEN (2) and HCS (2).
pub const MAC_HEADER_MIN_LENGTH_BYTES: usize = 6;
/// Length of the trailing header check sequence.
pub const MAC_HCS_LENGTH_BYTES: usize = 2;
/// Offset of the LEN field within the MAC header.
pub const MAC_LEN_FIELD_OFFSET: usize = 2;
/// Largest frame a 16-bit LEN field can describe.
pub const MAC_FRAME_MAX_LENGTH_BYTES: usize = MAC_HEADER_MIN_LENGTH_BYTES + u16::MAX as usize;

/// Mask for the FC_TYPE bits of the frame control byte.
pub const FC_TYPE_MASK: u8 = 0b1100_0000;
/// Mask for the FC_PARM bits of the frame control byte.
pub const FC_PARM_MASK: u8 = 0b0011_1110;
/// Mask for the EHDR_ON bit of the frame control byte.
pub const FC_EHDR_ON_MASK: u8 = 0b0000_0001;

/// FC_TYPE for packet PDU (Ethernet) frames.
pub const FC_TYPE_PACKET_PDU: u8 = 0;
/// FC_TYPE for ATM cell frames.
pub const FC_TYPE_ATM_PDU: u8 = 1;
/// FC_TYPE reserved by DOCSIS (isolation PDU in later revisions).
pub const FC_TYPE_RESERVED: u8 = 2;
/// FC_TYPE for MAC-specific headers, including management messages.
pub const FC_TYPE_MAC_SPECIFIC: u8 = 3;

/// Extended header element type carrying downstream privacy parameters.
pub const EH_TYPE_BP_DOWN: u8 = 4;
/// Minimum element length (type byte included) that carries the enable bit.
pub const EH_BP_MIN_LENGTH_BYTES: usize = 3;
/// Index within a privacy element of the byte holding the enable bit.
pub const EH_BP_ENABLE_BYTE_INDEX: usize = 2;
/// Encryption enable bit within that byte.
pub const EH_BP_ENABLE_MASK: u8 = 0x80;

// --- DOCSIS management messages ---

/// Fixed management header: DA, SA, LEN, DSAP, SSAP, control, version, type, reserved.
pub const MGMT_HEADER_LENGTH_BYTES: usize = 20;
/// Bytes preceding the region covered by the management LEN field (DA + SA + LEN).
pub const MGMT_LENGTH_PREFIX_BYTES: usize = 14;

/// Management message type: Registration Response.
pub const MGMT_TYPE_REG_RSP: u8 = 7;
/// Management message type: Baseline Privacy Key Management Response.
pub const MGMT_TYPE_BPKM_RSP: u8 = 13;
/// Management message type: Multipart Registration Response.
pub const MGMT_TYPE_REG_RSP_MP: u8 = 45;

/// Minimum size of a registration response body (both variants).
pub const REG_RSP_MIN_LENGTH_BYTES: usize = 5;
/// Offset of the TLV blob in a single-part registration response.
pub const REG_RSP_TLV_OFFSET: usize = 3;
/// Offset of the TLV blob in a multipart registration response.
pub const REG_RSP_MP_TLV_OFFSET: usize = 5;

/// Fixed BPKM header: code, identifier, length (2).
pub const BPKM_HEADER_LENGTH_BYTES: usize = 4;

/// Length of an Ethernet header: DA, SA and ethertype.
pub const ETHERNET_HEADER_LENGTH_BYTES: usize = 14;

// --- Registration TLV encodings ---

/// Type + length framing of one TLV at any nesting level.
pub const TLV_HEADER_LENGTH_BYTES: usize = 2;

/// Outer TLV: modem capabilities.
pub const TLV_MODEM_CAPABILITIES: u8 = 5;
/// Outer TLV: upstream service flow encodings.
pub const TLV_UPSTREAM_SERVICE_FLOW: u8 = 24;
/// Outer TLV: downstream service flow encodings.
pub const TLV_DOWNSTREAM_SERVICE_FLOW: u8 = 25;

/// Modem capability sub-TLV: DOCSIS version.
pub const CAP_DOCSIS_VERSION: u8 = 2;
/// Modem capability sub-TLV: multiple transmit channel support.
pub const CAP_UPSTREAM_CHANNELS: u8 = 24;
/// Modem capability sub-TLV: multiple receive channel support.
pub const CAP_DOWNSTREAM_CHANNELS: u8 = 29;

/// Service flow sub-TLV: service flow reference.
pub const SF_REFERENCE: u8 = 1;
/// Service flow sub-TLV: maximum sustained traffic rate.
pub const SF_MAX_SUSTAINED_RATE: u8 = 8;
/// Length of the service flow reference value.
pub const SF_REFERENCE_LENGTH_BYTES: usize = 2;
/// Length of the maximum sustained traffic rate value.
pub const SF_MAX_SUSTAINED_RATE_LENGTH_BYTES: usize = 4;

/// Service flow reference of the primary upstream flow.
pub const PRIMARY_UPSTREAM_FLOW_REFERENCE: u16 = 1;
/// Service flow reference of the primary downstream flow.
pub const PRIMARY_DOWNSTREAM_FLOW_REFERENCE: u16 = 2;

// --- Stream source ---

/// Packets read per buffered read from the capture source.
pub const STREAM_READ_AHEAD_PACKETS: usize = 25;
/// Packets processed between checks of the cancellation flag.
pub const STREAM_CANCEL_CHECK_INTERVAL: usize = 10;
