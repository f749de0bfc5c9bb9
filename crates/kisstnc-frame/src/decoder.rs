use bytes::{BufMut, BytesMut};

use crate::codec::{KissFrame, DEFAULT_MAX_FRAME_SIZE};
use crate::command::FEND;

/// Something the decoder noticed while consuming the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A delimited frame, still escaped, delimiters included.
    Frame(KissFrame),
    /// A partial frame reached `limit` bytes without a closing delimiter and was dropped.
    Overflow { limit: usize },
}

/// Running counters for one decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Bytes consumed.
    pub bytes: u64,
    /// Frames emitted.
    pub frames: u64,
    /// Partial frames dropped for exceeding capacity.
    pub overflows: u64,
    /// Emitted frames later rejected by the AX.25 parser.
    pub parse_failures: u64,
}

/// Reassembles KISS frames from an arbitrarily fragmented byte stream.
///
/// Bytes are accumulated raw (still escaped); a `FESC`-escaped `FEND` never
/// appears as `0xC0` on the wire, so every `0xC0` is a delimiter. Frames come out
/// in the order their closing delimiter was seen.
#[derive(Debug)]
pub struct StreamDecoder {
    buf: BytesMut,
    max_frame_size: usize,
    discarding: bool,
    stats: DecodeStats,
}

impl StreamDecoder {
    /// Create a decoder with the default accumulator capacity.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a decoder whose accumulator holds at most `max_frame_size` bytes.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        let max_frame_size = max_frame_size.max(2);
        Self {
            buf: BytesMut::with_capacity(max_frame_size),
            max_frame_size,
            discarding: false,
            stats: DecodeStats::default(),
        }
    }

    /// Consume one byte.
    pub fn feed(&mut self, byte: u8) -> Option<DecodeEvent> {
        self.stats.bytes += 1;

        if self.discarding {
            // Drop the rest of an oversized frame; its closing FEND opens the next one.
            if byte == FEND {
                self.discarding = false;
                self.start_frame();
            }
            return None;
        }

        if self.buf.len() >= self.max_frame_size {
            self.stats.overflows += 1;
            if byte == FEND {
                self.start_frame();
            } else {
                self.buf.clear();
                self.discarding = true;
            }
            return Some(DecodeEvent::Overflow {
                limit: self.max_frame_size,
            });
        }

        if byte != FEND {
            self.buf.put_u8(byte);
            return None;
        }

        if self.buf.iter().all(|&b| b == FEND) {
            // Idle fill or frame start: nothing between delimiters yet.
            self.start_frame();
            return None;
        }

        self.buf.put_u8(byte);
        self.stats.frames += 1;
        let frame = KissFrame::from_wire(self.buf.split().freeze());
        Some(DecodeEvent::Frame(frame))
    }

    /// Consume a chunk, preserving its byte order.
    pub fn feed_batch(&mut self, chunk: &[u8]) -> Vec<DecodeEvent> {
        chunk.iter().filter_map(|&byte| self.feed(byte)).collect()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    /// Bytes currently held for the in-flight frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    fn start_frame(&mut self) {
        self.buf.clear();
        self.buf.put_u8(FEND);
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn frames(events: Vec<DecodeEvent>) -> Vec<Vec<u8>> {
        events
            .into_iter()
            .filter_map(|event| match event {
                DecodeEvent::Frame(frame) => Some(frame.as_bytes().to_vec()),
                DecodeEvent::Overflow { .. } => None,
            })
            .collect()
    }

    #[test]
    fn whole_chunk_yields_one_frame() {
        let mut decoder = StreamDecoder::new();
        let out = frames(decoder.feed_batch(&[0xC0, 0x00, 0x01, 0xC0]));
        assert_eq!(out, vec![vec![0xC0, 0x00, 0x01, 0xC0]]);
    }

    #[test]
    fn fragmentation_does_not_change_output() {
        let wire = [0xC0, 0x00, 0x01, 0xC0];

        let mut whole = StreamDecoder::new();
        let batch = whole.feed_batch(&wire);

        let mut bytewise = StreamDecoder::new();
        let single: Vec<DecodeEvent> = wire.iter().filter_map(|&b| bytewise.feed(b)).collect();

        assert_eq!(batch, single);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn idle_fends_are_not_frames() {
        let mut decoder = StreamDecoder::new();
        let out = decoder.feed_batch(&[0xC0, 0xC0, 0x00, 0x02, 0xC0]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            DecodeEvent::Frame(frame) => assert_eq!(frame.content(), &[0x00, 0x02]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn long_idle_run_is_silent() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed_batch(&[0xC0; 32]).is_empty());
        assert_eq!(decoder.buffered(), 1);
    }

    #[test]
    fn back_to_back_frames_keep_order() {
        let mut wire = Vec::new();
        wire.extend_from_slice(encode(b"one").as_bytes());
        wire.extend_from_slice(encode(b"two").as_bytes());
        wire.extend_from_slice(encode(b"three").as_bytes());

        let mut decoder = StreamDecoder::new();
        let out = frames(decoder.feed_batch(&wire));
        assert_eq!(out.len(), 3);
        assert_eq!(&out[0][2..5], b"one");
        assert_eq!(&out[1][2..5], b"two");
        assert_eq!(&out[2][2..7], b"three");
        assert_eq!(decoder.stats().frames, 3);
    }

    #[test]
    fn shared_delimiter_between_frames() {
        let mut decoder = StreamDecoder::new();
        let out = decoder.feed_batch(&[0xC0, 0x00, 0x01, 0xC0, 0x00, 0x02, 0xC0]);
        assert_eq!(out.len(), 2);
        match &out[1] {
            DecodeEvent::Frame(frame) => assert_eq!(frame.content(), &[0x00, 0x02]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn escaped_fend_is_not_a_delimiter() {
        let wire = encode(&[0xC0, 0xDB, 0xC0]);
        let mut decoder = StreamDecoder::new();
        let out = frames(decoder.feed_batch(wire.as_bytes()));
        assert_eq!(out, vec![wire.as_bytes().to_vec()]);
    }

    #[test]
    fn partial_frame_waits_for_delimiter() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed_batch(&[0xC0, 0x00, 0x01, 0x02]).is_empty());
        assert_eq!(decoder.buffered(), 4);
        let out = frames(decoder.feed_batch(&[0x03, 0xC0]));
        assert_eq!(out, vec![vec![0xC0, 0x00, 0x01, 0x02, 0x03, 0xC0]]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn overflow_reported_once_then_recovers() {
        let mut decoder = StreamDecoder::with_max_frame_size(16);
        let mut noise = vec![0xC0];
        noise.extend(std::iter::repeat(0x55).take(40));

        let events = decoder.feed_batch(&noise);
        assert_eq!(events, vec![DecodeEvent::Overflow { limit: 16 }]);
        assert_eq!(decoder.stats().overflows, 1);

        let wire = encode(&[0x01, 0x02]);
        let out = decoder.feed_batch(wire.as_bytes());
        assert_eq!(out.len(), 1);
        match &out[0] {
            DecodeEvent::Frame(frame) => assert_eq!(frame.content(), &[0x00, 0x01, 0x02]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn overflow_on_delimiter_starts_next_frame() {
        let mut decoder = StreamDecoder::with_max_frame_size(4);
        let events = decoder.feed_batch(&[0xC0, 0x01, 0x02, 0x03, 0xC0, 0x00, 0x09, 0xC0]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], DecodeEvent::Overflow { limit: 4 });
        match &events[1] {
            DecodeEvent::Frame(frame) => assert_eq!(frame.content(), &[0x00, 0x09]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn stream_may_start_without_a_delimiter() {
        let mut decoder = StreamDecoder::new();
        let out = frames(decoder.feed_batch(&[0x00, 0x02, 0xC0]));
        assert_eq!(out, vec![vec![0x00, 0x02, 0xC0]]);
    }

    #[test]
    fn frame_filling_capacity_exactly_is_kept() {
        let mut decoder = StreamDecoder::with_max_frame_size(16);
        let mut wire = vec![0xC0];
        wire.extend(std::iter::repeat(0x55).take(14));
        assert!(decoder.feed_batch(&wire).is_empty());
        assert_eq!(decoder.buffered(), 15);

        match decoder.feed(0xC0) {
            Some(DecodeEvent::Frame(frame)) => assert_eq!(frame.len(), 16),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(decoder.stats().overflows, 0);
    }

    #[test]
    fn one_byte_past_capacity_overflows() {
        let mut decoder = StreamDecoder::with_max_frame_size(16);
        let mut wire = vec![0xC0];
        wire.extend(std::iter::repeat(0x55).take(15));
        assert!(decoder.feed_batch(&wire).is_empty());
        assert_eq!(decoder.buffered(), 16);

        assert_eq!(decoder.feed(0xC0), Some(DecodeEvent::Overflow { limit: 16 }));
        assert_eq!(decoder.stats().frames, 0);
    }

    #[test]
    fn accumulator_never_exceeds_capacity() {
        let mut decoder = StreamDecoder::with_max_frame_size(8);
        for byte in 0..200u8 {
            let _ = decoder.feed(byte % 0xC0);
            assert!(decoder.buffered() <= 8);
        }
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut decoder = StreamDecoder::new();
        decoder.feed_batch(&[0xC0, 0x00, 0x01]);
        decoder.reset();
        assert_eq!(decoder.buffered(), 0);
        let out = frames(decoder.feed_batch(&[0xC0, 0x00, 0x02, 0xC0]));
        assert_eq!(out, vec![vec![0xC0, 0x00, 0x02, 0xC0]]);
    }
}
