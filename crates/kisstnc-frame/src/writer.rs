use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use kisstnc_transport::{is_timeout, Link};
use tracing::trace;

use crate::ax25::Ax25Frame;
use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes KISS frames and raw TNC bytes to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write an AX.25 frame as a KISS data frame (blocking).
    pub fn write_frame(&mut self, frame: &Ax25Frame) -> Result<usize> {
        self.send(&frame.to_bytes())
    }

    /// Encode and send a raw payload as a KISS data frame.
    ///
    /// Returns the number of bytes put on the wire.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        encode_frame(payload, &mut buf);
        let wire_len = buf.len();
        let result = self.write_all(&buf);
        self.buf = buf;
        result?;
        self.flush()?;
        trace!(payload_len = payload.len(), wire_len, "sent KISS frame");
        Ok(wire_len)
    }

    /// Write bytes verbatim, without KISS framing (command strings, exit sequence).
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(err.kind()) => return Err(FrameError::WriteTimeout),
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(err.kind()) => return Err(FrameError::WriteTimeout),
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}

impl<L: Link> FrameWriter<L> {
    /// Create a frame writer for a TNC link and apply write timeout from config.
    pub fn with_config_link(mut inner: L, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::ax25::{parse_wire, Address};
    use crate::command::EXIT_KISS;

    #[test]
    fn send_wraps_payload() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let written = writer.send(&[0x01, 0xC0, 0xDB]).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0xC0, 0x00, 0x01, 0xDB, 0xDC, 0xDB, 0xDD, 0xC0]);
        assert_eq!(written, wire.len());
    }

    #[test]
    fn write_frame_parses_back() {
        let frame = Ax25Frame::ui(
            Address::new("ON4ULG", 0, false),
            Address::new("OUFTI1", 0, true),
            b"telemetry",
        );
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(&frame).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(parse_wire(&wire).unwrap(), frame);
    }

    #[test]
    fn write_multiple_frames_back_to_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(b"one").unwrap();
        writer.send(b"two").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(
            wire,
            vec![0xC0, 0x00, b'o', b'n', b'e', 0xC0, 0xC0, 0x00, b't', b'w', b'o', 0xC0]
        );
    }

    #[test]
    fn write_raw_is_verbatim() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_raw(&EXIT_KISS).unwrap();
        writer.write_raw(b"\x1b%R\r").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0xC0, 0xFF, 0xC0, 0x1B, b'%', b'R', 0x0D]);
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, vec![0xC0, 0x00, b'r', b'e', b't', b'r', b'y', 0xC0]);
    }

    #[test]
    fn write_timeout_surfaces() {
        let mut writer = FrameWriter::new(TimedOutWriter);
        let err = writer.send(b"late").unwrap_err();
        assert!(matches!(err, FrameError::WriteTimeout));
        let err = writer.write_raw(b"@K").unwrap_err();
        assert!(matches!(err, FrameError::WriteTimeout));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    #[cfg(unix)]
    fn applies_write_timeout_for_link() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let writer = FrameWriter::with_config_link(left, cfg);
        assert!(writer.is_ok());
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        assert!(writer.config().write_timeout.is_none());
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct TimedOutWriter;

    impl Write for TimedOutWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
