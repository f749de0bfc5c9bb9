//! KISS framing and AX.25 frame parsing.
//!
//! This is the protocol core of kisstnc. Every frame on the wire is:
//! - A `FEND` (0xC0) start delimiter
//! - One command byte (port in the high nibble, command in the low nibble)
//! - The byte-stuffed payload (`FEND` → `FESC TFEND`, `FESC` → `FESC TFESC`)
//! - A `FEND` end delimiter
//!
//! Inbound bytes are reassembled by [`StreamDecoder`] regardless of how the link
//! fragments them, and data frames on port 0 are split into AX.25 fields by [`parse`].

pub mod ax25;
pub mod codec;
pub mod command;
pub mod decoder;
pub mod error;
pub mod fcs;
#[cfg(feature = "async")]
pub mod kiss_codec;
pub mod reader;
pub mod writer;

pub use ax25::{parse, parse_wire, Address, Ax25Frame, ADDRESS_LEN, HEADER_LEN, MAX_INFO_LEN};
pub use codec::{
    encode, encode_frame, escape, escape_into, unescape, FrameConfig, KissFrame,
    DEFAULT_MAX_FRAME_SIZE,
};
pub use command::{CMD_DATA, EXIT_KISS, FEND, FESC, TFEND, TFESC};
pub use decoder::{DecodeEvent, DecodeStats, StreamDecoder};
pub use error::{FrameError, ParseError, Result};
#[cfg(feature = "async")]
pub use kiss_codec::KissCodec;
pub use reader::FrameReader;
pub use writer::FrameWriter;
