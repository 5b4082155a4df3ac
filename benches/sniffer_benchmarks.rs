use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use docsis_sniffer::{
    DecoderConfig, DocsisSniffer, FrameDecoder, TsReassembler,
    constants::{DOCSIS_PID, TS_PACKET_SIZE},
    crc::{HcsCalculator, calculate_hcs},
    tlv,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - 4;

// Helper function to build a MAC frame with a valid HCS
fn mac_frame(fc: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![fc, 0x00];
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    let hcs = calculate_hcs(&frame);
    frame.extend_from_slice(&hcs.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

// REG-RSP with capabilities and both primary service flows
fn registration_frame() -> Vec<u8> {
    let mut body = vec![0x20, 0x01, 0x00];
    body.extend_from_slice(&[5, 9, 2, 1, 3, 24, 1, 4, 29, 1, 8]);
    body.extend_from_slice(&[24, 10, 1, 2, 0x00, 0x01, 8, 4, 0x00, 0x4C, 0x4B, 0x40]);
    body.extend_from_slice(&[25, 10, 1, 2, 0x00, 0x02, 8, 4, 0x02, 0xFA, 0xF0, 0x80]);

    let mut message = vec![0x00, 0x10, 0x95, 0x01, 0x02, 0x03];
    message.extend_from_slice(&[0x00, 0x01, 0x5C, 0xAA, 0xBB, 0xCC]);
    message.extend_from_slice(&((6 + body.len()) as u16).to_be_bytes());
    message.extend_from_slice(&[0x00, 0x00, 0x03, 0x01, 7, 0x00]);
    message.extend_from_slice(&body);
    mac_frame(0xC2, &message)
}

// Packs frames into transport packets, pointer field marking each frame start
fn encapsulate(frames: &[Vec<u8>]) -> Vec<[u8; TS_PACKET_SIZE]> {
    let stream: Vec<u8> = frames.concat();
    let mut starts: Vec<usize> = Vec::with_capacity(frames.len());
    let mut offset = 0;
    for frame in frames {
        starts.push(offset);
        offset += frame.len();
    }

    let mut packets = Vec::new();
    let mut pos = 0;
    while pos < stream.len() {
        let mut packet = [0xFF; TS_PACKET_SIZE];
        let [pid_hi, pid_lo] = DOCSIS_PID.to_be_bytes();
        packet[..4].copy_from_slice(&[0x47, pid_hi, pid_lo, 0x10]);
        let next_start = starts.iter().copied().find(|&s| s >= pos);

        match next_start {
            Some(start) if start - pos < TS_PAYLOAD_SIZE - 1 => {
                packet[1] |= 0x40;
                packet[4] = (start - pos) as u8;
                let n = (TS_PAYLOAD_SIZE - 1).min(stream.len() - pos);
                packet[5..5 + n].copy_from_slice(&stream[pos..pos + n]);
                pos += n;
            }
            _ => {
                let n = TS_PAYLOAD_SIZE.min(stream.len() - pos);
                packet[4..4 + n].copy_from_slice(&stream[pos..pos + n]);
                pos += n;
            }
        }
        packets.push(packet);
    }
    packets
}

fn random_ethernet_frames(count: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(60..1500);
            let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            mac_frame(0x00, &payload)
        })
        .collect()
}

fn bench_hcs(c: &mut Criterion) {
    let mut group = c.benchmark_group("hcs");
    let calculator = HcsCalculator::new();

    for size in [4usize, 16, 244] {
        let data = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("crc16_x25", size), &data, |b, data| {
            b.iter(|| calculator.hcs(black_box(data)))
        });
    }
    group.finish();
}

fn bench_frame_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decoding");
    let decoder = FrameDecoder::new(DecoderConfig::default());

    let registration = Bytes::from(registration_frame());
    group.throughput(Throughput::Bytes(registration.len() as u64));
    group.bench_function("registration_response", |b| {
        b.iter(|| decoder.decode(black_box(registration.clone())))
    });

    let ethernet = Bytes::from(mac_frame(0x00, &[0x42; 1500]));
    group.throughput(Throughput::Bytes(ethernet.len() as u64));
    group.bench_function("ethernet_1500", |b| {
        b.iter(|| decoder.decode(black_box(ethernet.clone())))
    });

    let frame = registration_frame();
    let tlvs = &frame[29..];
    group.bench_function("tlv_walk", |b| b.iter(|| tlv::walk(black_box(tlvs))));

    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");

    for count in [16usize, 256] {
        let packets = encapsulate(&random_ethernet_frames(count, count as u64));
        group.throughput(Throughput::Bytes((packets.len() * TS_PACKET_SIZE) as u64));

        group.bench_with_input(
            BenchmarkId::new("reassemble_only", count),
            &packets,
            |b, packets| {
                b.iter(|| {
                    let mut reassembler = TsReassembler::new();
                    let mut frames = Vec::new();
                    for packet in packets {
                        reassembler.process_into(black_box(packet), &mut frames);
                    }
                    frames
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("reassemble_and_decode", count),
            &packets,
            |b, packets| {
                b.iter(|| {
                    let mut sniffer = DocsisSniffer::new(DecoderConfig::default());
                    let mut decoded = 0usize;
                    for packet in packets {
                        sniffer.process_packet_with(black_box(packet), |_| decoded += 1);
                    }
                    decoded
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_hcs, bench_frame_decoding, bench_reassembly);
criterion_main!(benches);
