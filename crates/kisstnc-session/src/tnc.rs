//! The TNC's configuration dialect.
//!
//! Commands are plain ASCII wrapped as `ESC <text> CR` and written outside KISS
//! framing. The TNC needs roughly 8 ms per command character to digest them.

use std::time::Duration;

/// Start of a command envelope.
pub const COMMAND_START: u8 = 0x1B;
/// End of a command envelope.
pub const COMMAND_END: u8 = 0x0D;

/// One configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TncCommand {
    /// ASCII command text, without envelope.
    pub text: &'static str,
    /// What the command does, for logs.
    pub description: &'static str,
}

impl TncCommand {
    const fn new(text: &'static str, description: &'static str) -> Self {
        Self { text, description }
    }

    /// The bytes written to the link for this command.
    pub fn envelope(&self) -> Vec<u8> {
        envelope(self.text)
    }
}

/// Configuration sent during connect, before KISS mode is switched on (9600 baud G3RUH FSK).
pub const CONFIGURE_SEQUENCE: [TncCommand; 11] = [
    TncCommand::new("@D0", "half duplex"),
    TncCommand::new("@F0", "no flags during pause"),
    TncCommand::new("%B9600", "9600 baud FSK"),
    TncCommand::new("X1", "PTT normal operation"),
    TncCommand::new("%X400", "output level 400 mV"),
    TncCommand::new("%T25", "TX delay 250 ms"),
    TncCommand::new("P128", "persistence"),
    TncCommand::new("W20", "slot time"),
    TncCommand::new("O2", "max frames"),
    TncCommand::new("R0", "digipeating off"),
    TncCommand::new("@V0", "callsign check off"),
];

/// Switches the TNC into KISS mode. Last command of the connect sequence.
pub const KISS_ON: TncCommand = TncCommand::new("@K", "KISS mode on");

/// General reset, sent after the KISS exit sequence.
pub const RESET_COMMAND: TncCommand = TncCommand::new("%R", "reset");

/// Wrap `text` in the command envelope.
pub fn envelope(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(COMMAND_START);
    out.extend_from_slice(text.as_bytes());
    out.push(COMMAND_END);
    out
}

/// Pause after writing `text`, proportional to its length.
pub fn command_delay(text: &str, per_byte: Duration) -> Duration {
    per_byte.saturating_mul(u32::try_from(text.len()).unwrap_or(u32::MAX))
}

/// Pause after writing a KISS data frame carrying `payload_len` bytes.
///
/// Sized on the worst-case stuffed frame (`2 * payload_len + 3` bytes) at 8 ms per
/// byte plus 32 ms, halved.
pub fn data_frame_delay(payload_len: usize) -> Duration {
    let worst_case = payload_len.saturating_mul(2).saturating_add(3) as u64;
    Duration::from_millis(worst_case.saturating_mul(8).saturating_add(32) / 2)
}
