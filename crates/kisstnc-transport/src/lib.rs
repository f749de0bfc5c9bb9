//! Byte link to a KISS terminal node controller.
//!
//! Provides a unified interface over the links a TNC can sit behind:
//! - Serial ports (tty devices, raw 8-N-1)
//! - Unix domain sockets (KISS-over-socket bridges)
//!
//! This is the lowest layer of kisstnc. Everything else builds on top of
//! the [`Link`] trait provided here.

pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use config::{DataBits, FlowControl, Parity, SerialConfig, StopBits, DEFAULT_BAUD_RATE};
pub use error::{Result, TransportError};
pub use traits::{is_timeout, Link};

#[cfg(unix)]
pub use serial::SerialPort;
