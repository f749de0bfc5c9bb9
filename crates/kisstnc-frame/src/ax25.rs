//! AX.25 field extraction from decoded KISS data frames.
//!
//! ```text
//! | Cmd (1) | Dest Addr (7) | Src Addr (7) | Control (1) | PID (1) | Info (N) |
//! ```
//!
//! Address bytes are ASCII shifted left by one bit. The seventh byte holds the
//! SSID in bits 1-4, two reserved bits (0x60), and the address-extension bit 0
//! which marks the last address in the header.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{strip_delimiters, unescape, KissFrame};
use crate::command::CMD_DATA;
use crate::error::ParseError;

/// Wire size of one address field.
pub const ADDRESS_LEN: usize = 7;

/// Destination + source + control + PID.
pub const HEADER_LEN: usize = 2 * ADDRESS_LEN + 2;

/// Largest info field [`Ax25Frame::ui`] will carry.
pub const MAX_INFO_LEN: usize = 256;

/// Unnumbered information frame.
pub const CONTROL_UI: u8 = 0x03;

/// No layer 3 protocol.
pub const PID_NO_LAYER3: u8 = 0xF0;

const SSID_RESERVED_BITS: u8 = 0x60;
const EXTENSION_BIT: u8 = 0x01;
const CALLSIGN_LEN: usize = 6;

/// One 7-byte AX.25 address field, kept exactly as it appears on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Wrap wire bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a callsign (up to 6 characters, space padded) and SSID (0-15).
    ///
    /// `last` sets the extension bit that terminates the address list.
    pub fn new(callsign: &str, ssid: u8, last: bool) -> Self {
        let mut bytes = [b' ' << 1; ADDRESS_LEN];
        for (slot, ch) in bytes
            .iter_mut()
            .zip(callsign.bytes().take(CALLSIGN_LEN))
        {
            *slot = ch.to_ascii_uppercase() << 1;
        }
        let mut ssid_byte = SSID_RESERVED_BITS | ((ssid & 0x0F) << 1);
        if last {
            ssid_byte |= EXTENSION_BIT;
        }
        bytes[CALLSIGN_LEN] = ssid_byte;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Callsign with trailing padding removed.
    pub fn callsign(&self) -> String {
        self.0[..CALLSIGN_LEN]
            .iter()
            .map(|&b| char::from(b >> 1))
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    pub fn ssid(&self) -> u8 {
        (self.0[CALLSIGN_LEN] >> 1) & 0x0F
    }

    /// True if this address terminates the address list.
    pub fn is_last(&self) -> bool {
        self.0[CALLSIGN_LEN] & EXTENSION_BIT != 0
    }

    fn with_last(mut self, last: bool) -> Self {
        if last {
            self.0[CALLSIGN_LEN] |= EXTENSION_BIT;
        } else {
            self.0[CALLSIGN_LEN] &= !EXTENSION_BIT;
        }
        self
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ssid() {
            0 => write!(f, "{}", self.callsign()),
            ssid => write!(f, "{}-{}", self.callsign(), ssid),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_string()).finish()
    }
}

/// The fields of one AX.25 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Frame {
    pub destination: Address,
    pub source: Address,
    pub control: u8,
    pub pid: u8,
    pub info: Bytes,
}

impl Ax25Frame {
    /// Build a UI frame (control 0x03, no layer 3).
    ///
    /// The info field is truncated to [`MAX_INFO_LEN`] bytes.
    pub fn ui(destination: Address, source: Address, info: &[u8]) -> Self {
        let info = &info[..info.len().min(MAX_INFO_LEN)];
        Self {
            destination: destination.with_last(false),
            source: source.with_last(true),
            control: CONTROL_UI,
            pid: PID_NO_LAYER3,
            info: Bytes::copy_from_slice(info),
        }
    }

    /// Serialize to the raw frame body handed to the KISS encoder.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_len());
        dst.put_slice(self.destination.as_bytes());
        dst.put_slice(self.source.as_bytes());
        dst.put_u8(self.control);
        dst.put_u8(self.pid);
        dst.put_slice(&self.info);
        dst.freeze()
    }

    /// Unescaped size of the frame body.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.info.len()
    }
}

/// Interpret a decoded KISS frame as AX.25.
pub fn parse(frame: &KissFrame) -> Result<Ax25Frame, ParseError> {
    parse_wire(frame.as_bytes())
}

/// Interpret raw KISS wire bytes (delimiters optional, still escaped) as AX.25.
pub fn parse_wire(wire: &[u8]) -> Result<Ax25Frame, ParseError> {
    let content = strip_delimiters(wire);
    if content.len() <= 1 {
        return Err(ParseError::EmptyFrame);
    }

    let raw = unescape(content);
    let Some((&command, body)) = raw.split_first() else {
        return Err(ParseError::EmptyFrame);
    };
    if command != CMD_DATA {
        return Err(ParseError::UnsupportedCommand(command));
    }
    if body.len() < HEADER_LEN {
        return Err(ParseError::TooShort {
            len: body.len(),
            min: HEADER_LEN,
        });
    }

    let destination = address_at(&raw, 1);
    let source = address_at(&raw, 1 + ADDRESS_LEN);
    let control = raw[1 + 2 * ADDRESS_LEN];
    let pid = raw[2 + 2 * ADDRESS_LEN];
    let info = raw.slice(1 + HEADER_LEN..);

    Ok(Ax25Frame {
        destination,
        source,
        control,
        pid,
        info,
    })
}

fn address_at(raw: &[u8], offset: usize) -> Address {
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&raw[offset..offset + ADDRESS_LEN]);
    Address(bytes)
}
