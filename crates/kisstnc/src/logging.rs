use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events follow `--log-level`.
const KISSTNC_TARGETS: [&str; 4] = [
    "kisstnc",
    "kisstnc_transport",
    "kisstnc_frame",
    "kisstnc_session",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `level` for our own crates, never more than warn for anything else.
pub fn log_filter(level: LogLevel) -> Targets {
    let level = LevelFilter::from(level);
    Targets::new()
        .with_targets(KISSTNC_TARGETS.map(|target| (target, level)))
        .with_default(level.min(LevelFilter::WARN))
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(false)
        // Frames are decoded on the session's reader thread.
        .with_thread_names(level >= LogLevel::Debug);
    let filter = log_filter(level);

    match format {
        LogFormat::Text => {
            let _ = builder.finish().with(filter).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().finish().with(filter).try_init();
        }
    }
}
