use kisstnc_frame::encode;

use crate::cmd::parse::ui_frame;
use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = ui_frame(&args.address, &args.payload)?;
    let wire = encode(&frame.to_bytes());
    print_encoded(&frame, wire.as_bytes(), format);
    Ok(SUCCESS)
}
