use std::path::PathBuf;

use clap::{Args, Subcommand};
use kisstnc_frame::DEFAULT_MAX_FRAME_SIZE;
use kisstnc_session::SessionConfig;
use kisstnc_transport::{SerialConfig, DEFAULT_BAUD_RATE};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod monitor;
pub mod parse;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a TNC and print the frames it receives.
    Monitor(MonitorArgs),
    /// Send one UI frame through a TNC.
    Send(SendArgs),
    /// Decode captured KISS bytes offline.
    Decode(DecodeArgs),
    /// Print the KISS bytes of a UI frame.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the TNC is and how to talk to it.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial device of the TNC (socket path with --socket).
    pub port: PathBuf,
    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Read and write timeout (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms")]
    pub timeout: String,
    /// PORT is a Unix socket carrying the TNC byte stream (simulators, bridges).
    #[arg(long)]
    pub socket: bool,
    /// Skip the TNC pacing delays after commands and data frames.
    #[arg(long)]
    pub no_pacing: bool,
}

impl LinkArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        let timeout = parse::parse_duration(&self.timeout)?;
        let serial = SerialConfig::new(&self.port)
            .with_baud_rate(self.baud)
            .with_read_timeout(Some(timeout))
            .with_write_timeout(Some(timeout));
        let config = SessionConfig::new(serial);
        Ok(if self.no_pacing {
            config.without_pacing()
        } else {
            config
        })
    }
}

/// Frame payload given on the command line.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Information field as text.
    #[arg(long)]
    pub data: Option<String>,
    /// Information field as hex bytes (e.g. "01 02 ff").
    #[arg(long)]
    pub hex: Option<String>,
}

impl PayloadArgs {
    pub fn bytes(&self) -> CliResult<Vec<u8>> {
        match (&self.data, &self.hex) {
            (Some(data), _) => Ok(data.as_bytes().to_vec()),
            (None, Some(hex)) => parse::parse_hex(hex),
            (None, None) => Ok(Vec::new()),
        }
    }
}

/// Addressing of an outgoing UI frame.
#[derive(Args, Debug, Clone)]
pub struct AddressArgs {
    /// Destination callsign, CALL or CALL-SSID.
    #[arg(long)]
    pub dest: String,
    /// Source callsign, CALL or CALL-SSID.
    #[arg(long)]
    pub src: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Append a hex dump of every received frame to FILE.
    #[arg(long, value_name = "FILE")]
    pub dump: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub address: AddressArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub input: DecodeInput,
    /// Decode accumulator capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct DecodeInput {
    /// Captured bytes as hex.
    #[arg(long)]
    pub hex: Option<String>,
    /// Read captured bytes from a binary file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub address: AddressArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
