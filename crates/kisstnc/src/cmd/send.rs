use kisstnc_frame::Ax25Frame;
use kisstnc_session::{Session, SessionConfig};
use kisstnc_transport::Link;

use crate::cmd::parse::ui_frame;
use crate::cmd::SendArgs;
use crate::exit::{session_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let frame = ui_frame(&args.address, &args.payload)?;
    let config = args.link.session_config()?;

    #[cfg(not(unix))]
    {
        let _ = (frame, config);
        return Err(crate::exit::CliError::usage("TNC links require a Unix host"));
    }

    #[cfg(unix)]
    {
        if args.link.socket {
            send::<std::os::unix::net::UnixStream>(&frame, config)
        } else {
            send::<kisstnc_transport::SerialPort>(&frame, config)
        }
    }
}

fn send<L: Link>(frame: &Ax25Frame, config: SessionConfig) -> CliResult<i32> {
    let mut session = Session::<L>::new(config);
    session
        .connect()
        .map_err(|err| session_error("connect failed", err))?;

    let result = session.send_frame(frame);
    session.disconnect();
    result.map_err(|err| session_error("send failed", err))?;

    tracing::info!(
        source = %frame.source,
        destination = %frame.destination,
        info_len = frame.info.len(),
        "frame sent"
    );
    Ok(SUCCESS)
}
