use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{DataBits, FlowControl, Parity, SerialConfig, StopBits};
use crate::error::{Result, TransportError};
use crate::traits::Link;

/// A tty device configured as a raw serial line.
///
/// The descriptor is opened non-blocking; every read and write first waits in
/// `poll(2)` for at most the configured timeout.
pub struct SerialPort {
    file: File,
    path: PathBuf,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl SerialPort {
    /// Open and configure the device at `config.path`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let speed = baud_constant(config.baud_rate)
            .ok_or(TransportError::UnsupportedBaudRate(config.baud_rate))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&config.path)
            .map_err(|source| TransportError::Open {
                path: config.path.clone(),
                source,
            })?;

        apply_line_settings(file.as_raw_fd(), speed, config).map_err(|source| {
            TransportError::Configure {
                path: config.path.clone(),
                source,
            }
        })?;

        info!(
            path = ?config.path,
            baud = config.baud_rate,
            "opened serial port"
        );

        Ok(Self {
            file,
            path: config.path.clone(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        })
    }

    /// Device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Link for SerialPort {
    fn open(config: &SerialConfig) -> Result<Self> {
        SerialPort::open(config)
    }

    fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        })
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.write_timeout = timeout;
        Ok(())
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !wait_ready(self.file.as_raw_fd(), libc::POLLIN, self.read_timeout)? {
            return Err(std::io::Error::new(ErrorKind::TimedOut, "serial read timed out"));
        }
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !wait_ready(self.file.as_raw_fd(), libc::POLLOUT, self.write_timeout)? {
            return Err(std::io::Error::new(ErrorKind::TimedOut, "serial write timed out"));
        }
        self.file.write(buf)
    }

    /// Wait until the line has transmitted everything written, bounded by the write timeout.
    fn flush(&mut self) -> std::io::Result<()> {
        let fd = self.file.as_raw_fd();
        match self.write_timeout {
            None => tcdrain(fd),
            Some(timeout) => wait_drained(|| output_queue_len(fd), timeout),
        }
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

/// Map a numeric line speed onto its termios constant.
fn baud_constant(baud_rate: u32) -> Option<libc::speed_t> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}

fn apply_line_settings(
    fd: RawFd,
    speed: libc::speed_t,
    config: &SerialConfig,
) -> std::io::Result<()> {
    // SAFETY: termios is a plain C struct; all-zero is a valid value to be overwritten by tcgetattr.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor and `tio` is a valid writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `tio` was initialised by tcgetattr above.
    unsafe { libc::cfmakeraw(&mut tio) };

    tio.c_cflag |= libc::CLOCAL | libc::CREAD;

    tio.c_cflag &= !libc::CSIZE;
    tio.c_cflag |= match config.data_bits {
        DataBits::Seven => libc::CS7,
        DataBits::Eight => libc::CS8,
    };

    match config.parity {
        Parity::None => {
            tio.c_cflag &= !(libc::PARENB | libc::PARODD);
            tio.c_iflag &= !libc::INPCK;
        }
        Parity::Odd => {
            tio.c_cflag |= libc::PARENB | libc::PARODD;
            tio.c_iflag |= libc::INPCK;
        }
        Parity::Even => {
            tio.c_cflag |= libc::PARENB;
            tio.c_cflag &= !libc::PARODD;
            tio.c_iflag |= libc::INPCK;
        }
    }

    match config.stop_bits {
        StopBits::One => tio.c_cflag &= !libc::CSTOPB,
        StopBits::Two => tio.c_cflag |= libc::CSTOPB,
    }

    tio.c_cflag &= !libc::CRTSCTS;
    tio.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
    match config.flow_control {
        FlowControl::None => {}
        FlowControl::Software => tio.c_iflag |= libc::IXON | libc::IXOFF,
        FlowControl::Hardware => tio.c_cflag |= libc::CRTSCTS,
    }

    // Timeouts are enforced by poll(2), not by the line discipline.
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: `tio` is a valid termios value; the speed constants come from libc.
    unsafe {
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    // SAFETY: `fd` is an open descriptor and `tio` is fully initialised.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // Drop whatever the device buffered before we took it over.
    // SAFETY: `fd` is an open descriptor.
    if unsafe { libc::tcflush(fd, libc::TCIOFLUSH) } != 0 {
        debug!("tcflush failed on freshly opened port");
    }

    Ok(())
}

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(2);

fn tcdrain(fd: RawFd) -> std::io::Result<()> {
    // SAFETY: `fd` is an open descriptor for the lifetime of the call.
    if unsafe { libc::tcdrain(fd) } == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

/// Bytes written to the tty but not yet sent on the line.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn output_queue_len(fd: RawFd) -> std::io::Result<usize> {
    let mut pending: libc::c_int = 0;
    // SAFETY: `fd` is an open descriptor and TIOCOUTQ writes one c_int into `pending`.
    if unsafe { libc::ioctl(fd, libc::TIOCOUTQ, &mut pending as *mut libc::c_int) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(usize::try_from(pending).unwrap_or(0))
}

// No portable output-queue query here; tcdrain blocks until the queue is empty.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn output_queue_len(fd: RawFd) -> std::io::Result<usize> {
    tcdrain(fd).map(|()| 0)
}

/// Poll `pending` until it reports an empty queue or `timeout` expires.
fn wait_drained(
    mut pending: impl FnMut() -> std::io::Result<usize>,
    timeout: Duration,
) -> std::io::Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if pending()? == 0 {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(std::io::Error::new(
                ErrorKind::TimedOut,
                "serial output did not drain",
            ));
        }
        std::thread::sleep(DRAIN_POLL_INTERVAL.min(deadline - now));
    }
}

/// Wait until `fd` is ready for `events`. Returns `false` when the timeout expires first.
fn wait_ready(
    fd: RawFd,
    events: libc::c_short,
    timeout: Option<Duration>,
) -> std::io::Result<bool> {
    let timeout_ms: libc::c_int = match timeout {
        None => -1,
        Some(timeout) => timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
    };

    let mut pfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };

    loop {
        // SAFETY: `pfd` is a valid pollfd and the count passed is exactly one.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(rc > 0);
    }
}
