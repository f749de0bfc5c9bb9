//! Parsers for command-line values.

use std::time::Duration;

use kisstnc_frame::{Address, Ax25Frame};

use crate::cmd::{AddressArgs, PayloadArgs};
use crate::exit::{CliError, CliResult};

/// Longest callsign an AX.25 address field holds.
const MAX_CALLSIGN_LEN: usize = 6;
const MAX_SSID: u8 = 15;

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Parse hex bytes. Tokens may be separated by whitespace, `,` or `:` and carry a `0x` prefix.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let mut out = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|token| !token.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() {
            return Err(CliError::usage(format!("invalid hex token: {token:?}")));
        }
        let bytes = hex::decode(digits)
            .map_err(|err| CliError::usage(format!("invalid hex token {token:?}: {err}")))?;
        out.extend(bytes);
    }
    Ok(out)
}

/// Parse `CALL` or `CALL-SSID`.
pub fn parse_address(input: &str, last: bool) -> CliResult<Address> {
    let (callsign, ssid) = match input.split_once('-') {
        Some((callsign, ssid)) => {
            let ssid: u8 = ssid
                .parse()
                .map_err(|_| CliError::usage(format!("invalid SSID in {input:?}")))?;
            (callsign, ssid)
        }
        None => (input, 0),
    };

    if callsign.is_empty()
        || callsign.len() > MAX_CALLSIGN_LEN
        || !callsign.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(CliError::usage(format!(
            "invalid callsign {input:?}: expected 1-{MAX_CALLSIGN_LEN} letters or digits"
        )));
    }
    if ssid > MAX_SSID {
        return Err(CliError::usage(format!(
            "invalid SSID in {input:?}: must be 0-{MAX_SSID}"
        )));
    }
    Ok(Address::new(callsign, ssid, last))
}

/// Build the UI frame described by the address and payload flags.
pub fn ui_frame(address: &AddressArgs, payload: &PayloadArgs) -> CliResult<Ax25Frame> {
    let destination = parse_address(&address.dest, false)?;
    let source = parse_address(&address.src, true)?;
    let info = payload.bytes()?;
    if info.len() > kisstnc_frame::MAX_INFO_LEN {
        tracing::warn!(
            len = info.len(),
            max = kisstnc_frame::MAX_INFO_LEN,
            "information field truncated"
        );
    }
    Ok(Ax25Frame::ui(destination, source, &info))
}
