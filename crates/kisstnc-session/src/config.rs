use std::path::Path;
use std::time::Duration;

use kisstnc_frame::FrameConfig;
use kisstnc_transport::SerialConfig;

/// Pacing per command character while configuring the TNC.
pub const DEFAULT_COMMAND_DELAY_PER_BYTE: Duration = Duration::from_millis(8);

/// Received frames buffered before the reader thread waits on the consumer.
pub const DEFAULT_FRAME_QUEUE: usize = 64;

/// Bound on one blocking read in the reader thread when no timeout is configured.
pub(crate) const READER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a TNC session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Link to open.
    pub serial: SerialConfig,
    /// Framing limits and per-operation timeouts. Unset timeouts fall back to `serial`'s.
    pub frame: FrameConfig,
    /// Delay per command character after each configuration command.
    pub command_delay_per_byte: Duration,
    /// Pause after each data frame so the TNC can key up and transmit.
    pub pace_data_frames: bool,
    /// Capacity of the inbound frame queue.
    pub frame_queue: usize,
}

impl SessionConfig {
    pub fn new(serial: SerialConfig) -> Self {
        Self {
            serial,
            frame: FrameConfig::default(),
            command_delay_per_byte: DEFAULT_COMMAND_DELAY_PER_BYTE,
            pace_data_frames: true,
            frame_queue: DEFAULT_FRAME_QUEUE,
        }
    }

    /// Session on the device at `path` with default line settings.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self::new(SerialConfig::new(path))
    }

    /// Drop all pacing delays (socket bridges and tests).
    pub fn without_pacing(mut self) -> Self {
        self.command_delay_per_byte = Duration::ZERO;
        self.pace_data_frames = false;
        self
    }

    pub(crate) fn effective_read_timeout(&self) -> Duration {
        self.frame
            .read_timeout
            .or(self.serial.read_timeout)
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(READER_POLL_INTERVAL)
    }

    pub(crate) fn effective_write_timeout(&self) -> Option<Duration> {
        self.frame.write_timeout.or(self.serial.write_timeout)
    }
}

#[cfg(test)]
mod tests {
    use kisstnc_transport::DEFAULT_BAUD_RATE;

    use super::*;

    #[test]
    fn defaults() {
        let cfg = SessionConfig::for_path("/dev/ttyUSB0");
        assert_eq!(cfg.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(cfg.frame.max_frame_size, 512);
        assert_eq!(cfg.command_delay_per_byte, Duration::from_millis(8));
        assert!(cfg.pace_data_frames);
        assert_eq!(cfg.frame_queue, 64);
    }

    #[test]
    fn timeouts_fall_back_to_serial() {
        let cfg = SessionConfig::for_path("/dev/ttyUSB0");
        assert_eq!(cfg.effective_read_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.effective_write_timeout(), Some(Duration::from_millis(500)));

        let mut cfg = cfg;
        cfg.frame.read_timeout = Some(Duration::from_millis(20));
        cfg.serial.write_timeout = None;
        assert_eq!(cfg.effective_read_timeout(), Duration::from_millis(20));
        assert_eq!(cfg.effective_write_timeout(), None);
    }

    #[test]
    fn unbounded_read_timeout_is_replaced() {
        let mut cfg = SessionConfig::for_path("/dev/ttyUSB0");
        cfg.serial.read_timeout = None;
        assert_eq!(cfg.effective_read_timeout(), READER_POLL_INTERVAL);
    }

    #[test]
    fn without_pacing() {
        let cfg = SessionConfig::for_path("/dev/ttyUSB0").without_pacing();
        assert_eq!(cfg.command_delay_per_byte, Duration::ZERO);
        assert!(!cfg.pace_data_frames);
    }
}
