//! Session control for a KISS-mode TNC.
//!
//! This is the "just works" layer. Open the link, walk the TNC through its
//! configuration dialect into KISS mode, then send AX.25 frames and receive
//! the ones the radio hears.

pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod tnc;

pub use config::{SessionConfig, DEFAULT_COMMAND_DELAY_PER_BYTE, DEFAULT_FRAME_QUEUE};
pub use error::{Result, SessionError};
#[cfg(unix)]
pub use session::SerialSession;
pub use session::{Session, SessionStats};
pub use state::SessionState;
pub use tnc::{
    command_delay, data_frame_delay, envelope, TncCommand, CONFIGURE_SEQUENCE, KISS_ON,
    RESET_COMMAND,
};
