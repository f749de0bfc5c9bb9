//! KISS special bytes and command codes.
//!
//! The command byte carries the TNC port in the high nibble and the command in
//! the low nibble. Only data frames on port 0 are sent or interpreted.

/// Frame delimiter.
pub const FEND: u8 = 0xC0;

/// Escape introducer.
pub const FESC: u8 = 0xDB;

/// Follows `FESC` to stand for a literal `FEND`.
pub const TFEND: u8 = 0xDC;

/// Follows `FESC` to stand for a literal `FESC`.
pub const TFESC: u8 = 0xDD;

/// Data frame.
pub const CMD_DATA: u8 = 0x00;

/// Transmitter keyup delay, in 10 ms units.
pub const CMD_TX_DELAY: u8 = 0x01;

/// p-persistence parameter.
pub const CMD_PERSISTENCE: u8 = 0x02;

/// Slot interval, in 10 ms units.
pub const CMD_SLOT_TIME: u8 = 0x03;

/// Time to hold the transmitter after the frame, in 10 ms units.
pub const CMD_TX_TAIL: u8 = 0x04;

/// Full or half duplex.
pub const CMD_FULL_DUPLEX: u8 = 0x05;

/// Hardware-specific setting.
pub const CMD_SET_HARDWARE: u8 = 0x06;

/// Leave KISS mode. Sent as a whole byte, not per port.
pub const CMD_RETURN: u8 = 0xFF;

/// Magic sequence that takes the TNC out of KISS mode.
pub const EXIT_KISS: [u8; 3] = [FEND, CMD_RETURN, FEND];

/// Port number carried in the high nibble of a command byte.
pub fn port_of(command: u8) -> u8 {
    command >> 4
}

/// Command code carried in the low nibble of a command byte.
pub fn command_of(command: u8) -> u8 {
    command & 0x0F
}

/// Returns a human-readable name for a command byte.
pub fn command_name(command: u8) -> &'static str {
    if command == CMD_RETURN {
        return "RETURN";
    }
    match command_of(command) {
        CMD_DATA => "DATA",
        CMD_TX_DELAY => "TXDELAY",
        CMD_PERSISTENCE => "P",
        CMD_SLOT_TIME => "SLOTTIME",
        CMD_TX_TAIL => "TXTAIL",
        CMD_FULL_DUPLEX => "FULLDUPLEX",
        CMD_SET_HARDWARE => "SETHARDWARE",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibbles() {
        assert_eq!(port_of(0x00), 0);
        assert_eq!(command_of(0x00), CMD_DATA);
        assert_eq!(port_of(0x21), 2);
        assert_eq!(command_of(0x21), CMD_TX_DELAY);
    }

    #[test]
    fn names() {
        assert_eq!(command_name(0x00), "DATA");
        assert_eq!(command_name(0x10), "DATA");
        assert_eq!(command_name(0x03), "SLOTTIME");
        assert_eq!(command_name(0xFF), "RETURN");
        assert_eq!(command_name(0x0C), "UNKNOWN");
    }

    #[test]
    fn exit_sequence() {
        assert_eq!(EXIT_KISS, [0xC0, 0xFF, 0xC0]);
    }
}
