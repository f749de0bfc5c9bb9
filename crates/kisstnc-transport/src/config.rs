use std::path::{Path, PathBuf};
use std::time::Duration;

/// Line speed the TNC expects on its host port.
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// Default blocking read/write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    Seven,
    #[default]
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// Flow control (handshake) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    #[default]
    None,
    Software,
    Hardware,
}

/// Settings used to open a link.
///
/// Serial line parameters only apply to tty devices; socket links use the path alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device or socket path.
    pub path: PathBuf,
    /// Line speed. Default: 38400.
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Bound on a single blocking read. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Bound on a single blocking write. `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
}

impl SerialConfig {
    /// Settings for `path` with the TNC defaults (38400 8-N-1, no handshake, 500 ms timeouts).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            read_timeout: Some(DEFAULT_TIMEOUT),
            write_timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Override the line speed.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the read timeout.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Override the write timeout.
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }
}
