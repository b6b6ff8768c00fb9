use is_terminal::IsTerminal;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Pretty,
    Json,
}

/// Install the global subscriber. Logs go to stderr so they never mix
/// with rendered updates on stdout.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies.
pub fn init_logging(default_level: &str, mode: LogMode) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = match mode {
        LogMode::Pretty => builder
            .with_ansi(std::io::stderr().is_terminal())
            .try_init(),
        LogMode::Json => builder.json().flatten_event(true).try_init(),
    };
    // A subscriber installed by a test harness is fine
    let _ = result;
}
