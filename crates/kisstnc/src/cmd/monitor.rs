use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kisstnc_session::{Session, SessionConfig};
use kisstnc_transport::Link;

use crate::cmd::MonitorArgs;
use crate::exit::{io_error, session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, FrameDump, OutputFormat};

/// How often the receive loop wakes to check for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.session_config()?;

    #[cfg(not(unix))]
    {
        let _ = (config, format);
        return Err(CliError::usage("TNC links require a Unix host"));
    }

    #[cfg(unix)]
    {
        if args.link.socket {
            monitor::<std::os::unix::net::UnixStream>(&args, config, format)
        } else {
            monitor::<kisstnc_transport::SerialPort>(&args, config, format)
        }
    }
}

fn monitor<L: Link>(
    args: &MonitorArgs,
    config: SessionConfig,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut dump = args
        .dump
        .as_deref()
        .map(|path| {
            FrameDump::open(path)
                .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))
        })
        .transpose()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut session = Session::<L>::new(config);
    session
        .connect()
        .map_err(|err| session_error("connect failed", err))?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let frame = match session.recv_timeout(POLL_INTERVAL) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(err) => {
                session.disconnect();
                return Err(session_error("receive failed", err));
            }
        };

        print_frame(&frame, format);
        if let Some(dump) = dump.as_mut() {
            dump.append(&frame)
                .map_err(|err| io_error("dump write failed", err))?;
        }

        printed = printed.saturating_add(1);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    let stats = session.stats();
    session.disconnect();
    tracing::info!(
        frames = stats.frames_received,
        parse_failures = stats.parse_failures,
        overflows = stats.overflows,
        "monitor stopped"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
