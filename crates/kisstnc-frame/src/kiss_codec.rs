//! `tokio-util` codec adapter so KISS links can be driven with `FramedRead`/`FramedWrite`.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::ax25::Ax25Frame;
use crate::codec::{encode_frame, KissFrame};
use crate::decoder::{DecodeEvent, StreamDecoder};
use crate::error::FrameError;

/// Streaming KISS codec backed by [`StreamDecoder`].
///
/// Decoding yields raw [`KissFrame`]s; overflowed partial frames are logged and skipped.
#[derive(Debug, Default)]
pub struct KissCodec {
    decoder: StreamDecoder,
}

impl KissCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            decoder: StreamDecoder::with_max_frame_size(max_frame_size),
        }
    }

    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }
}

impl Decoder for KissCodec {
    type Item = KissFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut consumed = 0usize;
        let mut found = None;
        for &byte in src.iter() {
            consumed += 1;
            match self.decoder.feed(byte) {
                Some(DecodeEvent::Frame(frame)) => {
                    found = Some(frame);
                    break;
                }
                Some(DecodeEvent::Overflow { limit }) => {
                    warn!(limit, "dropping oversized KISS frame");
                }
                None => {}
            }
        }
        src.advance(consumed);
        Ok(found)
    }
}

impl Encoder<Bytes> for KissCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&payload, dst);
        Ok(())
    }
}

impl Encoder<&Ax25Frame> for KissCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: &Ax25Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&frame.to_bytes(), dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::ax25::{parse, Address};

    fn beacon() -> Ax25Frame {
        Ax25Frame::ui(
            Address::new("N0CALL", 0, false),
            Address::new("N0CALL", 9, true),
            b"hello",
        )
    }

    #[test]
    fn decode_waits_for_closing_delimiter() {
        let mut codec = KissCodec::new();
        let mut buf = BytesMut::from(&[0xC0, 0x00, 0x41][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(&[0x42, 0xC0]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), &[0xC0, 0x00, 0x41, 0x42, 0xC0]);
    }

    #[test]
    fn decode_leaves_following_bytes_buffered() {
        let mut codec = KissCodec::new();
        let mut buf = BytesMut::from(&[0xC0, 0x00, 0x01, 0xC0, 0xC0, 0x00, 0x02, 0xC0][..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.content(), &[0x00, 0x01]);
        assert_eq!(buf.len(), 4);

        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.content(), &[0x00, 0x02]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decode_skips_overflowed_frame() {
        let mut codec = KissCodec::with_max_frame_size(8);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0xC0]);
        buf.extend_from_slice(&[0x41; 20]);
        buf.extend_from_slice(&[0xC0, 0x00, 0x07, 0xC0]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.content(), &[0x00, 0x07]);
        assert_eq!(codec.decoder().stats().overflows, 1);
    }

    #[test]
    fn encode_payload_and_frame() {
        let mut codec = KissCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(Bytes::from_static(&[0xC0]), &mut dst).unwrap();
        assert_eq!(&dst[..], &[0xC0, 0x00, 0xDB, 0xDC, 0xC0]);

        dst.clear();
        let frame = beacon();
        codec.encode(&frame, &mut dst).unwrap();
        assert_eq!(dst[0], 0xC0);
        assert_eq!(dst[dst.len() - 1], 0xC0);
    }

    #[tokio::test]
    async fn framed_round_trip() {
        let frame = beacon();
        let mut sink = FramedWrite::new(Vec::new(), KissCodec::new());
        sink.send(&frame).await.unwrap();
        sink.send(Bytes::from_static(b"\x01")).await.unwrap();
        let wire = sink.into_inner();

        let mut stream = FramedRead::new(&wire[..], KissCodec::new());
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(parse(&first).unwrap(), frame);
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.content(), &[0x00, 0x01]);
        assert!(stream.next().await.is_none());
    }
}
