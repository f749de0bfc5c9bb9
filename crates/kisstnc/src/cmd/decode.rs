use std::fs;

use kisstnc_frame::command::command_name;
use kisstnc_frame::{parse, Ax25Frame, DecodeEvent, StreamDecoder};

use crate::cmd::{parse::parse_hex, DecodeArgs};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let decoded = decode_stream(&input, args.max_frame_size);

    print_frames(&decoded.frames, format);
    tracing::debug!(
        bytes = input.len(),
        frames = decoded.frames.len(),
        dropped = decoded.dropped,
        "decode finished"
    );

    if decoded.frames.is_empty() && decoded.dropped > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no valid frames ({} dropped)", decoded.dropped),
        ));
    }
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.input.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.input.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

#[derive(Debug, Default)]
struct Decoded {
    frames: Vec<Ax25Frame>,
    dropped: usize,
}

/// Run captured bytes through the stream decoder and parser, logging what gets dropped.
fn decode_stream(input: &[u8], max_frame_size: usize) -> Decoded {
    let mut decoder = StreamDecoder::with_max_frame_size(max_frame_size);
    let mut decoded = Decoded::default();

    for event in decoder.feed_batch(input) {
        match event {
            DecodeEvent::Frame(frame) => match parse(&frame) {
                Ok(frame) => decoded.frames.push(frame),
                Err(err) => {
                    let command = frame.content().first().copied().map_or("none", command_name);
                    tracing::warn!(error = %err, command, len = frame.len(), "dropping frame");
                    decoded.dropped += 1;
                }
            },
            DecodeEvent::Overflow { limit } => {
                tracing::warn!(limit, "dropping oversized frame");
                decoded.dropped += 1;
            }
        }
    }

    if decoder.buffered() > 1 {
        tracing::warn!(bytes = decoder.buffered(), "input ends inside a frame");
    }
    decoded
}
