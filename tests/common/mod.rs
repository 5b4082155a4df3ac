//! Common builders for DOCSIS integration tests.
//!
//! Frames are built with a correct HCS unless a test corrupts them afterwards,
//! and are packed into transport packets the way a CMTS would: a packet that
//! finishes a frame or starts one has PUSI set and its pointer field marks the
//! first frame start.
#![allow(dead_code)]

use std::collections::VecDeque;

use docsis_sniffer::constants::{
    DOCSIS_PID, TS_PACKET_SIZE, TS_PUSI_MASK, TS_STUFFING_BYTE, TS_SYNC_BYTE,
};
use docsis_sniffer::crc::calculate_hcs;

/// Payload bytes available after the 4-byte transport header.
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - 4;

/// Installs a test logger so `RUST_LOG=debug` shows decoder output.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a MAC frame with a valid HCS.
///
/// EHDR_ON is taken from `fc`; MAC_PARM is the extended header length when it
/// is set and zero otherwise.
pub fn mac_frame(fc: u8, ehdr: &[u8], payload: &[u8]) -> Vec<u8> {
    let ehdr_on = fc & 0x01 != 0;
    let mac_parm = if ehdr_on { ehdr.len() as u8 } else { 0 };
    let len = (ehdr.len() + payload.len()) as u16;

    let mut frame = vec![fc, mac_parm];
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(ehdr);
    let hcs = calculate_hcs(&frame);
    frame.extend_from_slice(&hcs.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Packet PDU carrying `payload` as an unencrypted Ethernet frame.
pub fn ethernet_frame(payload: &[u8]) -> Vec<u8> {
    mac_frame(0x00, &[], payload)
}

/// Packet PDU whose privacy extended header marks it encrypted.
pub fn encrypted_ethernet_frame(payload: &[u8]) -> Vec<u8> {
    mac_frame(0x01, &[0x43, 0x7F, 0x80, 0x01], payload)
}

/// MAC-specific frame carrying a management message.
pub fn management_frame(message_type: u8, body: &[u8]) -> Vec<u8> {
    mac_frame(0xC2, &[], &management_message(message_type, body))
}

/// Management header plus `body`, with LEN covering exactly the body.
pub fn management_message(message_type: u8, body: &[u8]) -> Vec<u8> {
    let mut message = vec![0x00, 0x10, 0x95, 0x01, 0x02, 0x03];
    message.extend_from_slice(&[0x00, 0x01, 0x5C, 0xAA, 0xBB, 0xCC]);
    message.extend_from_slice(&((6 + body.len()) as u16).to_be_bytes());
    message.extend_from_slice(&[0x00, 0x00, 0x03, 0x01, message_type, 0x00]);
    message.extend_from_slice(body);
    message
}

/// REG-RSP body.
pub fn reg_rsp(sid: u16, response: u8, tlvs: &[u8]) -> Vec<u8> {
    let mut body = sid.to_be_bytes().to_vec();
    body.push(response);
    body.extend_from_slice(tlvs);
    body
}

/// REG-RSP-MP body.
pub fn reg_rsp_mp(sid: u16, response: u8, total: u8, number: u8, tlvs: &[u8]) -> Vec<u8> {
    let mut body = sid.to_be_bytes().to_vec();
    body.extend_from_slice(&[response, total, number]);
    body.extend_from_slice(tlvs);
    body
}

/// Outer encoding wrapping `value`.
pub fn tlv(tlv_type: u8, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tlv_type, value.len() as u8];
    out.extend_from_slice(value);
    out
}

/// Modem capabilities encoding (outer type 5).
pub fn capabilities(version: u8, upstream: u8, downstream: u8) -> Vec<u8> {
    let mut inner = tlv(2, &[version]);
    inner.extend(tlv(24, &[upstream]));
    inner.extend(tlv(29, &[downstream]));
    tlv(5, &inner)
}

/// Service flow encoding (outer type 24 or 25) with a reference and rate.
pub fn service_flow(outer_type: u8, reference: u16, rate: u32) -> Vec<u8> {
    let mut inner = tlv(1, &reference.to_be_bytes());
    inner.extend(tlv(8, &rate.to_be_bytes()));
    tlv(outer_type, &inner)
}

/// A single transport packet on the DOCSIS PID, padded with stuffing.
pub fn ts_packet(pusi: bool, continuity: u8, body: &[u8]) -> [u8; TS_PACKET_SIZE] {
    assert!(body.len() <= TS_PAYLOAD_SIZE, "packet body too large");
    let [pid_hi, pid_lo] = DOCSIS_PID.to_be_bytes();
    let mut packet = [TS_STUFFING_BYTE; TS_PACKET_SIZE];
    packet[0] = TS_SYNC_BYTE;
    packet[1] = if pusi { TS_PUSI_MASK | pid_hi } else { pid_hi };
    packet[2] = pid_lo;
    packet[3] = 0x10 | (continuity & 0x0F);
    packet[4..4 + body.len()].copy_from_slice(body);
    packet
}

/// Packs frames back to back into transport packets.
pub fn encapsulate(frames: &[Vec<u8>]) -> Vec<[u8; TS_PACKET_SIZE]> {
    let mut queue: VecDeque<&[u8]> = frames.iter().map(Vec::as_slice).collect();
    let mut tail: &[u8] = &[];
    let mut packets = Vec::new();
    let mut continuity = 0u8;

    while !tail.is_empty() || !queue.is_empty() {
        let mut body = Vec::with_capacity(TS_PAYLOAD_SIZE);
        let pusi = tail.len() < TS_PAYLOAD_SIZE;

        if pusi {
            body.push(tail.len() as u8);
            body.extend_from_slice(tail);
            tail = &[];
            while body.len() < TS_PAYLOAD_SIZE {
                let Some(frame) = queue.pop_front() else {
                    break;
                };
                let room = TS_PAYLOAD_SIZE - body.len();
                if frame.len() <= room {
                    body.extend_from_slice(frame);
                } else {
                    body.extend_from_slice(&frame[..room]);
                    tail = &frame[room..];
                }
            }
        } else {
            body.extend_from_slice(&tail[..TS_PAYLOAD_SIZE]);
            tail = &tail[TS_PAYLOAD_SIZE..];
        }

        let full = body.len() == TS_PAYLOAD_SIZE;
        packets.push(ts_packet(pusi, continuity, &body));
        continuity = continuity.wrapping_add(1);

        // A frame ending flush with the packet is only released by the next
        // frame start.
        if full && tail.is_empty() && queue.is_empty() {
            packets.push(idle_packet(continuity));
        }
    }
    packets
}

/// PUSI packet holding nothing but stuffing.
pub fn idle_packet(continuity: u8) -> [u8; TS_PACKET_SIZE] {
    ts_packet(true, continuity, &[0x00])
}
