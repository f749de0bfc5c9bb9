use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::config::SerialConfig;
use crate::error::Result;

/// A duplex byte link to a TNC.
///
/// Reads and writes block for at most the configured timeout. A read or write
/// that times out fails with [`ErrorKind::TimedOut`] or [`ErrorKind::WouldBlock`]
/// (see [`is_timeout`]); a read returning `Ok(0)` means the link is closed.
/// `flush` waits for the bytes to leave the link, bounded by the write timeout
/// where the platform can report the output queue.
pub trait Link: Read + Write + Send + Sized + 'static {
    /// Open the link described by `config`, applying its timeouts.
    fn open(config: &SerialConfig) -> Result<Self>;

    /// Duplicate the handle so reading and writing can live on different threads.
    fn try_clone(&self) -> Result<Self>;

    /// Set the bound on a single blocking read.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Set the bound on a single blocking write.
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

/// Returns true if `kind` is how a link reports an expired read or write timeout.
pub fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

#[cfg(unix)]
impl Link for std::os::unix::net::UnixStream {
    fn open(config: &SerialConfig) -> Result<Self> {
        let stream = std::os::unix::net::UnixStream::connect(&config.path).map_err(|source| {
            crate::error::TransportError::Open {
                path: config.path.clone(),
                source,
            }
        })?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        tracing::debug!(path = ?config.path, "opened socket link");
        Ok(stream)
    }

    fn try_clone(&self) -> Result<Self> {
        std::os::unix::net::UnixStream::try_clone(self).map_err(Into::into)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout).map_err(Into::into)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        std::os::unix::net::UnixStream::set_write_timeout(self, timeout).map_err(Into::into)
    }
}
