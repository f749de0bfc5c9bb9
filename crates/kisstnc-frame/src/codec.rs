use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{CMD_DATA, FEND, FESC, TFEND, TFESC};

/// Default accumulator capacity for one in-flight frame, delimiters included.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512;

/// Bytes added around the payload: two delimiters and the command byte.
pub const FRAMING_OVERHEAD: usize = 3;

/// One delimited KISS frame exactly as it appeared on the wire (still escaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KissFrame(Bytes);

impl KissFrame {
    /// Wrap raw wire bytes.
    pub fn from_wire(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The wire bytes, delimiters included when they were present.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// The bytes between the delimiters: command byte plus escaped payload.
    pub fn content(&self) -> &[u8] {
        strip_delimiters(&self.0)
    }
}

impl AsRef<[u8]> for KissFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Remove one leading and one trailing `FEND`, whichever are present.
pub(crate) fn strip_delimiters(wire: &[u8]) -> &[u8] {
    let mut content = wire;
    if let [FEND, rest @ ..] = content {
        content = rest;
    }
    if let [rest @ .., FEND] = content {
        content = rest;
    }
    content
}

/// Byte-stuff `src` into `dst`.
pub fn escape_into(src: &[u8], dst: &mut BytesMut) {
    dst.reserve(src.len() * 2);
    for &byte in src {
        match byte {
            FEND => dst.put_slice(&[FESC, TFEND]),
            FESC => dst.put_slice(&[FESC, TFESC]),
            other => dst.put_u8(other),
        }
    }
}

/// Byte-stuff `src` into a new buffer.
pub fn escape(src: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(src.len() * 2);
    escape_into(src, &mut dst);
    dst.freeze()
}

/// Undo byte-stuffing.
///
/// Lenient: `FESC` followed by anything other than `TFEND`/`TFESC` drops the
/// `FESC` and keeps the following byte as-is. A trailing lone `FESC` is dropped.
pub fn unescape(src: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(src.len());
    let mut bytes = src.iter().copied();
    while let Some(byte) = bytes.next() {
        if byte != FESC {
            dst.put_u8(byte);
            continue;
        }
        match bytes.next() {
            Some(TFEND) => dst.put_u8(FEND),
            Some(TFESC) => dst.put_u8(FESC),
            Some(other) => dst.put_u8(other),
            None => break,
        }
    }
    dst.freeze()
}

/// Encode `payload` as a KISS data frame on port 0.
///
/// Wire format:
/// ```text
/// ┌──────┬─────────┬──────────────────────┬──────┐
/// │ FEND │ Command │ Escaped payload      │ FEND │
/// │ 0xC0 │ 0x00    │ (0..2N bytes)        │ 0xC0 │
/// └──────┴─────────┴──────────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() * 2 + FRAMING_OVERHEAD);
    dst.put_u8(FEND);
    dst.put_u8(CMD_DATA);
    escape_into(payload, dst);
    dst.put_u8(FEND);
}

/// Encode `payload` into a standalone [`KissFrame`].
pub fn encode(payload: &[u8]) -> KissFrame {
    let mut dst = BytesMut::with_capacity(payload.len() * 2 + FRAMING_OVERHEAD);
    encode_frame(payload, &mut dst);
    KissFrame(dst.freeze())
}

/// Configuration for the frame reader and writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Capacity of the decode accumulator in bytes. Default: 512.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_fend() {
        assert_eq!(escape(&[0xC0]).as_ref(), &[0xDB, 0xDC]);
    }

    #[test]
    fn escape_fesc() {
        assert_eq!(escape(&[0xDB]).as_ref(), &[0xDB, 0xDD]);
    }

    #[test]
    fn escape_mixed() {
        assert_eq!(
            escape(&[0x01, 0xC0, 0xDB, 0x02]).as_ref(),
            &[0x01, 0xDB, 0xDC, 0xDB, 0xDD, 0x02]
        );
    }

    #[test]
    fn escape_leaves_plain_bytes() {
        assert_eq!(escape(b"hello").as_ref(), b"hello");
        assert!(escape(&[]).is_empty());
    }

    #[test]
    fn unescape_reverses_escape() {
        let payload = [0x00, 0xC0, 0xDB, 0xFF, 0xC0, 0xDB, 0x01, 0xDC, 0xDD];
        assert_eq!(unescape(&escape(&payload)).as_ref(), &payload);
    }

    fn through_the_wire(payload: &[u8]) -> crate::Ax25Frame {
        let mut decoder = crate::StreamDecoder::new();
        let events = decoder.feed_batch(encode(payload).as_bytes());
        assert_eq!(events.len(), 1, "one frame per payload");
        match &events[0] {
            crate::DecodeEvent::Frame(frame) => crate::parse(frame).expect("frame should parse"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    fn header() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(crate::Address::new("ON4ULG", 0, false).as_bytes());
        out.extend_from_slice(crate::Address::new("OUFTI1", 0, true).as_bytes());
        out.extend_from_slice(&[0x03, 0xF0]);
        out
    }

    #[test]
    fn every_byte_value_survives_the_wire() {
        for byte in 0..=u8::MAX {
            assert_eq!(unescape(&escape(&[byte])).as_ref(), &[byte]);

            let mut payload = header();
            payload.push(byte);
            let frame = through_the_wire(&payload);
            assert_eq!(frame.info.as_ref(), &[byte], "info byte 0x{byte:02X}");
            assert_eq!(frame.to_bytes().as_ref(), payload.as_slice());
        }
    }

    #[test]
    fn all_values_and_delimiter_runs_survive_the_wire() {
        let mut info: Vec<u8> = (0..=u8::MAX).collect();
        info.extend_from_slice(&[0xC0, 0xC0, 0xC0, 0xDB, 0xDB, 0xDB, 0xC0, 0xDB, 0xDC, 0xDD]);
        let mut payload = header();
        payload.extend_from_slice(&info);

        assert_eq!(unescape(&escape(&payload)).as_ref(), payload.as_slice());
        let frame = through_the_wire(&payload);
        assert_eq!(frame.info.as_ref(), info.as_slice());
        assert_eq!(frame.to_bytes().as_ref(), payload.as_slice());
    }

    #[test]
    fn unescape_malformed_escape_passes_byte_through() {
        assert_eq!(unescape(&[0x01, 0xDB, 0x41, 0x02]).as_ref(), &[0x01, 0x41, 0x02]);
    }

    #[test]
    fn unescape_trailing_fesc_dropped() {
        assert_eq!(unescape(&[0x01, 0xDB]).as_ref(), &[0x01]);
    }

    #[test]
    fn encode_wraps_and_stuffs() {
        let frame = encode(&[0x01, 0xC0, 0x02]);
        assert_eq!(
            frame.as_bytes(),
            &[0xC0, 0x00, 0x01, 0xDB, 0xDC, 0x02, 0xC0]
        );
        assert_eq!(frame.content(), &[0x00, 0x01, 0xDB, 0xDC, 0x02]);
    }

    #[test]
    fn encode_empty_payload() {
        let frame = encode(&[]);
        assert_eq!(frame.as_bytes(), &[0xC0, 0x00, 0xC0]);
        assert_eq!(frame.len(), FRAMING_OVERHEAD);
    }

    #[test]
    fn encode_frame_appends() {
        let mut buf = BytesMut::new();
        encode_frame(b"a", &mut buf);
        encode_frame(b"b", &mut buf);
        assert_eq!(buf.as_ref(), &[0xC0, 0x00, b'a', 0xC0, 0xC0, 0x00, b'b', 0xC0]);
    }

    #[test]
    fn content_without_delimiters() {
        let frame = KissFrame::from_wire(vec![0x00, 0x02, 0xC0]);
        assert_eq!(frame.content(), &[0x00, 0x02]);
        let bare = KissFrame::from_wire(vec![0x00, 0x02]);
        assert_eq!(bare.content(), &[0x00, 0x02]);
    }
}
