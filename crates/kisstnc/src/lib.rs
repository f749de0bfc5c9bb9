//! Drive packet-radio TNCs in KISS mode.
//!
//! kisstnc talks to a terminal node controller over a serial line: it walks the
//! TNC through its configuration dialect into KISS mode, frames outgoing AX.25
//! frames, and reassembles and parses the frames the radio hears.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte links to the TNC (serial ports, Unix sockets)
//! - [`frame`]: KISS byte-stuffing, stream reassembly, AX.25 parsing
//! - [`session`]: TNC configuration and the connected session (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use kisstnc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use kisstnc_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use kisstnc_session::*;
}
