use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use kisstnc_transport::Link;
use tracing::{debug, warn};

use crate::ax25::{parse, Ax25Frame};
use crate::codec::{FrameConfig, KissFrame};
use crate::decoder::{DecodeEvent, DecodeStats, StreamDecoder};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 256;

/// Reads complete KISS frames from any `Read` stream.
///
/// Handles partial reads internally. Bytes already consumed from the stream stay
/// in the decoder across errors, so a timed-out read can simply be retried.
pub struct FrameReader<T> {
    inner: T,
    decoder: StreamDecoder,
    pending: VecDeque<DecodeEvent>,
    parse_failures: u64,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: StreamDecoder::with_max_frame_size(config.max_frame_size),
            pending: VecDeque::new(),
            parse_failures: 0,
            config,
        }
    }

    /// Read the next delimited frame (blocking), still escaped.
    ///
    /// Returns `Err(FrameError::AccumulatorOverflow)` once per discarded oversized
    /// frame; the reader stays usable. Returns `Err(FrameError::ConnectionClosed)`
    /// when EOF is reached.
    pub fn read_kiss_frame(&mut self) -> Result<KissFrame> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return match event {
                    DecodeEvent::Frame(frame) => Ok(frame),
                    DecodeEvent::Overflow { limit } => {
                        warn!(limit, "frame accumulator overflow, partial frame discarded");
                        Err(FrameError::AccumulatorOverflow { limit })
                    }
                };
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            for &byte in &chunk[..read] {
                if let Some(event) = self.decoder.feed(byte) {
                    self.pending.push_back(event);
                }
            }
        }
    }

    /// Read the next frame and split it into AX.25 fields (blocking).
    ///
    /// A frame that fails to parse is consumed and reported as
    /// `Err(FrameError::Parse)`; the following frames are unaffected.
    pub fn read_frame(&mut self) -> Result<Ax25Frame> {
        let frame = self.read_kiss_frame()?;
        parse(&frame).map_err(|err| {
            self.parse_failures += 1;
            debug!(error = %err, len = frame.len(), "dropping frame");
            FrameError::Parse(err)
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Counters for everything decoded so far.
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            parse_failures: self.parse_failures,
            ..self.decoder.stats()
        }
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<L: Link> FrameReader<L> {
    /// Create a frame reader for a TNC link and apply read timeout from config.
    pub fn with_config_link(mut inner: L, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: kisstnc_transport::TransportError) -> FrameError {
    match err {
        kisstnc_transport::TransportError::Io(io) => FrameError::Io(io),
        kisstnc_transport::TransportError::Open { source, .. }
        | kisstnc_transport::TransportError::Configure { source, .. } => FrameError::Io(source),
        kisstnc_transport::TransportError::Closed => FrameError::ConnectionClosed,
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
