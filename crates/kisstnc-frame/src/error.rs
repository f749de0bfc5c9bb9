use kisstnc_transport::is_timeout;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// A write did not complete within the link's write timeout.
    #[error("write timed out")]
    WriteTimeout,

    /// A partial frame grew past the accumulator capacity and was discarded.
    #[error("frame accumulator overflow (limit {limit} bytes), partial frame discarded")]
    AccumulatorOverflow { limit: usize },

    /// A complete frame could not be interpreted as AX.25.
    #[error("frame rejected: {0}")]
    Parse(#[from] ParseError),
}

impl FrameError {
    /// True for per-frame conditions after which the stream keeps decoding.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AccumulatorOverflow { .. } | Self::Parse(_))
    }

    /// True if a read gave up because no bytes arrived within the read timeout.
    pub fn is_read_timeout(&self) -> bool {
        matches!(self, Self::Io(err) if is_timeout(err.kind()))
    }
}

/// Reasons a decoded KISS frame is not delivered as an AX.25 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing but a command byte (or nothing at all) between the delimiters.
    #[error("empty frame")]
    EmptyFrame,

    /// The command byte is not "data on port 0".
    #[error("unsupported KISS command byte 0x{0:02X}")]
    UnsupportedCommand(u8),

    /// Fewer bytes than the fixed AX.25 header after the command byte.
    #[error("frame too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
