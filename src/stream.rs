//! Reading transport packets from a byte stream.
//!
//! Capture sources (a DVB demux device, a recorded `.ts` file, a pipe) are
//! plain [`Read`] implementations. The reader pulls them in 188-byte units
//! and drives a [`DocsisSniffer`] until end of stream or cancellation.

use std::io::{self, BufReader, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::constants::{STREAM_CANCEL_CHECK_INTERVAL, STREAM_READ_AHEAD_PACKETS, TS_PACKET_SIZE};
use crate::decoder::{DocsisSniffer, FrameRecord};
use crate::error::StreamError;

/// Iterator over fixed-size transport packets read from `R`.
///
/// A trailing partial packet ends the stream and is discarded.
#[derive(Debug)]
pub struct TsPacketReader<R: Read> {
    inner: BufReader<R>,
    done: bool,
}

impl<R: Read> TsPacketReader<R> {
    /// Wraps `reader` with a read-ahead buffer of whole packets.
    pub fn new(reader: R) -> Self {
        TsPacketReader {
            inner: BufReader::with_capacity(STREAM_READ_AHEAD_PACKETS * TS_PACKET_SIZE, reader),
            done: false,
        }
    }

    /// Reads the next packet, `Ok(None)` at end of stream.
    pub fn read_packet(&mut self) -> io::Result<Option<[u8; TS_PACKET_SIZE]>> {
        if self.done {
            return Ok(None);
        }

        let mut packet = [0u8; TS_PACKET_SIZE];
        let mut filled = 0;
        while filled < TS_PACKET_SIZE {
            match self.inner.read(&mut packet[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }

        if filled < TS_PACKET_SIZE {
            if filled > 0 {
                debug!("Discarding {} trailing bytes at end of stream", filled);
            }
            self.done = true;
            return Ok(None);
        }
        Ok(Some(packet))
    }
}

impl<R: Read> Iterator for TsPacketReader<R> {
    type Item = io::Result<[u8; TS_PACKET_SIZE]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_packet().transpose()
    }
}

/// Feeds every packet from `reader` through `sniffer`.
///
/// `cancel` is polled every few packets; once it is set the loop stops with
/// [`StreamError::Cancelled`]. At end of stream any partial frame is
/// abandoned and the number of packets read is returned.
///
/// # Errors
/// - [`StreamError::Io`] - the reader failed
/// - [`StreamError::Cancelled`] - `cancel` was raised
pub fn read_stream<R, F>(
    reader: R,
    sniffer: &mut DocsisSniffer,
    cancel: &AtomicBool,
    mut on_record: F,
) -> Result<u64, StreamError>
where
    R: Read,
    F: FnMut(FrameRecord),
{
    let mut packets = TsPacketReader::new(reader);
    let mut count: u64 = 0;

    loop {
        if count % STREAM_CANCEL_CHECK_INTERVAL as u64 == 0 && cancel.load(Ordering::Relaxed) {
            info!("Stream cancelled after {} packets", count);
            return Err(StreamError::Cancelled);
        }

        let Some(packet) = packets.read_packet()? else {
            break;
        };
        count += 1;
        sniffer.process_packet_with(&packet, &mut on_record);
    }

    sniffer.reset();
    info!("End of stream after {} packets", count);
    Ok(count)
}
