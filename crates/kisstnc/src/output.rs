use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kisstnc_frame::Ax25Frame;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    destination: String,
    source: String,
    control: u8,
    pid: u8,
    info_len: usize,
    info: String,
    timestamp: String,
}

impl FrameOutput {
    fn new(frame: &Ax25Frame) -> Self {
        Self {
            destination: frame.destination.to_string(),
            source: frame.source.to_string(),
            control: frame.control,
            pid: frame.pid,
            info_len: frame.info.len(),
            info: info_preview(frame.info.as_ref()),
            timestamp: now_unix_seconds(),
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    destination: String,
    source: String,
    wire_len: usize,
    hex: &'a str,
}

pub fn print_frame(frame: &Ax25Frame, format: OutputFormat) {
    print_frames(std::slice::from_ref(frame), format);
}

/// Print frames in one block; table format shares a single header.
pub fn print_frames(frames: &[Ax25Frame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                println!(
                    "{}",
                    serde_json::to_string(&FrameOutput::new(frame))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if frames.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "DEST", "CTRL", "PID", "SIZE", "INFO"]);
            for frame in frames {
                table.add_row(vec![
                    frame.source.to_string(),
                    frame.destination.to_string(),
                    format!("0x{:02X}", frame.control),
                    format!("0x{:02X}", frame.pid),
                    frame.info.len().to_string(),
                    info_preview(frame.info.as_ref()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "{}>{} ctrl=0x{:02X} pid=0x{:02X} size={} info={}",
                    frame.source,
                    frame.destination,
                    frame.control,
                    frame.pid,
                    frame.info.len(),
                    info_preview(frame.info.as_ref())
                );
            }
        }
        OutputFormat::Raw => {
            for frame in frames {
                print_raw(frame.info.as_ref());
            }
        }
    }
}

/// Print the KISS bytes of an encoded frame.
pub fn print_encoded(frame: &Ax25Frame, wire: &[u8], format: OutputFormat) {
    let hex = format_hex(wire);
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                destination: frame.destination.to_string(),
                source: frame.source.to_string(),
                wire_len: wire.len(),
                hex: &hex,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{hex}"),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Lowercase, space separated: `c0 00 41 c0`.
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Appends a field-by-field hex dump of each received frame to a text file.
pub struct FrameDump {
    file: File,
}

impl FrameDump {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn append(&mut self, frame: &Ax25Frame) -> io::Result<()> {
        write_dump(&mut self.file, frame, &now_unix_seconds())?;
        self.file.flush()
    }
}

fn write_dump(out: &mut impl Write, frame: &Ax25Frame, timestamp: &str) -> io::Result<()> {
    writeln!(out, "Frame received at {timestamp}:")?;
    writeln!(
        out,
        "DEST: {}  ({})",
        dump_bytes(frame.destination.as_bytes()),
        frame.destination
    )?;
    writeln!(
        out,
        "SRC:  {}  ({})",
        dump_bytes(frame.source.as_bytes()),
        frame.source
    )?;
    writeln!(out, "CTRL: 0x{:02X}", frame.control)?;
    writeln!(out, "PID:  0x{:02X}", frame.pid)?;
    writeln!(out, "INFO: {}", dump_bytes(frame.info.as_ref()))?;
    writeln!(out)
}

fn dump_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("0x{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn info_preview(info: &[u8]) -> String {
    match std::str::from_utf8(info) {
        Ok(text) if !text.chars().any(|c| c.is_control() && c != '\n' && c != '\r') => {
            text.to_string()
        }
        _ => format!("<binary {} bytes: {}>", info.len(), format_hex(info)),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use kisstnc_frame::Address;

    use super::*;

    fn frame(info: &[u8]) -> Ax25Frame {
        Ax25Frame::ui(
            Address::new("ON4ULG", 0, false),
            Address::new("OUFTI1", 1, true),
            info,
        )
    }

    #[test]
    fn hex_is_lowercase_and_spaced() {
        assert_eq!(format_hex(&[0xC0, 0x00, 0x0A]), "c0 00 0a");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn preview_falls_back_to_hex_for_binary() {
        assert_eq!(info_preview(b"hello"), "hello");
        assert_eq!(info_preview(&[0x00, 0xFF]), "<binary 2 bytes: 00 ff>");
    }

    #[test]
    fn json_output_names_fields() {
        let out = serde_json::to_value(FrameOutput::new(&frame(b"hi"))).unwrap();
        assert_eq!(out["destination"], "ON4ULG");
        assert_eq!(out["source"], "OUFTI1-1");
        assert_eq!(out["control"], 3);
        assert_eq!(out["pid"], 0xF0);
        assert_eq!(out["info"], "hi");
    }

    #[test]
    fn dump_lists_each_field() {
        let mut out = Vec::new();
        write_dump(&mut out, &frame(b"A"), "1700000000").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Frame received at 1700000000:\n"));
        assert!(text.contains("(ON4ULG)"));
        assert!(text.contains("(OUFTI1-1)"));
        assert!(text.contains("CTRL: 0x03\n"));
        assert!(text.contains("PID:  0xF0\n"));
        assert!(text.contains("INFO: 0x41\n"));
    }

    #[test]
    fn dump_appends_to_file() {
        let path = std::env::temp_dir().join(format!("kisstnc-dump-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut dump = FrameDump::open(&path).unwrap();
        dump.append(&frame(b"one")).unwrap();
        dump.append(&frame(b"two")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Frame received at").count(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
