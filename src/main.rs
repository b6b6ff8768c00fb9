use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use pcclog::colors::should_use_colors;
use pcclog::logging::{init_logging, LogMode};
use pcclog::output_format::terminal_width;
use pcclog::{
    detect_sdk_version, LineSource, OutputFormat, OutputFormatter, PipelineConfig,
    SessionSupervisor, SourceCommand, SourceError,
};

#[derive(Parser)]
#[command(name = "pcclog")]
#[command(about = "Watch physical channel configuration updates in the Android radio log")]
#[command(version)]
struct Args {
    /// Platform SDK level (34 = Android 14, 35 = Android 15); probed with getprop if omitted
    #[arg(long, value_name = "N")]
    sdk: Option<u32>,

    /// Log command to run
    #[arg(short = 'c', long = "command", default_value = "logcat -b radio")]
    command: String,

    /// Replay a saved log instead of running the command ("-" for stdin)
    #[arg(short = 'i', long = "input", conflicts_with = "command")]
    input_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long = "format", value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// History entries shown per update (0 hides history)
    #[arg(long, value_name = "N", default_value = "5")]
    history: usize,

    /// Marker phrase selecting relevant messages (case-insensitive)
    #[arg(long, default_value = pcclog::input_format::UPDATE_MARKER)]
    marker: String,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Debug mode - debug logging and final statistics
    #[arg(long)]
    debug: bool,

    /// Write log records as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn color_preference(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn input(&self) -> Result<Input, SourceError> {
        match &self.input_file {
            Some(path) if path.as_os_str() == "-" => Ok(Input::Stdin),
            Some(path) => Ok(Input::File(path.clone())),
            None => Ok(Input::Command(self.command.parse()?)),
        }
    }
}

enum Input {
    Command(SourceCommand),
    File(PathBuf),
    Stdin,
}

impl Input {
    fn open(&self) -> Result<LineSource, SourceError> {
        match self {
            Input::Command(command) => LineSource::spawn(command),
            Input::File(path) => LineSource::open_file(path),
            Input::Stdin => Ok(LineSource::stdin()),
        }
    }
}

/// SIGHUP restarts the session, like re-entering the screen does on the device
#[cfg(unix)]
struct RestartSignal(tokio::signal::unix::Signal);

#[cfg(unix)]
impl RestartSignal {
    fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(RestartSignal(signal(SignalKind::hangup())?))
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct RestartSignal;

#[cfg(not(unix))]
impl RestartSignal {
    fn new() -> io::Result<Self> {
        Ok(RestartSignal)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    let mode = if args.log_json {
        LogMode::Json
    } else {
        LogMode::Pretty
    };
    init_logging(level, mode);

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    let sdk_version = match args.sdk {
        Some(sdk) => sdk,
        None => detect_sdk_version()
            .await
            .context("pass --sdk to set the platform version explicitly")?,
    };

    let config = PipelineConfig {
        marker: args.marker.clone(),
        ..PipelineConfig::for_sdk(sdk_version)
    };
    info!(sdk_version, strategy = config.strategy().name(), "format selected");

    let input = args.input()?;

    let width = if args.format != OutputFormat::Jsonl && io::stdout().is_terminal() {
        terminal_width()
    } else {
        None
    };
    let formatter = OutputFormatter::new(args.format, args.history)
        .with_colors(should_use_colors(args.color_preference()))
        .with_width(width);

    let mut supervisor = SessionSupervisor::new();
    let mut updates = supervisor
        .start(|| input.open(), config.clone())
        .await
        .context("Failed to open log source")?;
    let mut restart = RestartSignal::new()?;

    let mut output = io::BufWriter::new(io::stdout());
    let mut rendered = 0usize;

    // Created once so a Ctrl-C during rendering or a restart is not lost
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome: Result<()> = loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(snapshot) = update else {
                    break Ok(());
                };
                let written = formatter
                    .write_snapshot(&mut output, &snapshot)
                    .and_then(|_| output.flush().map_err(Into::into));
                match written {
                    Ok(()) => rendered += 1,
                    // Reader went away (e.g. piped into head)
                    Err(e) if e.is_broken_pipe() => break Ok(()),
                    Err(e) => break Err(e.into()),
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break Ok(());
            }
            _ = restart.recv() => {
                info!("restarting session");
                match supervisor.start(|| input.open(), config.clone()).await {
                    Ok(rx) => updates = rx,
                    Err(e) => {
                        break Err(anyhow::Error::new(e).context("Failed to reopen log source"))
                    }
                }
            }
        }
    };

    // Always tear the session down so the log process does not outlive us
    let report = supervisor.stop().await;
    outcome?;

    if let Some(report) = report {
        if let Some(status) = report.exit_status {
            if !report.cancelled && !status.success() {
                warn!(%status, "log command exited unsuccessfully");
            }
        }

        if args.debug {
            let stats = &report.stats;
            eprintln!("Final statistics:");
            eprintln!("  Lines processed: {}", stats.lines_seen);
            eprintln!("  Lines malformed: {}", stats.lines_malformed);
            eprintln!("  Lines irrelevant: {}", stats.lines_irrelevant);
            eprintln!("  Updates: {}", stats.updates);
            eprintln!("  Configs extracted: {}", stats.configs_extracted);
            eprintln!("  Envelope misses: {}", stats.envelope_misses);
            eprintln!("  Processing time: {:?}", report.processing_time);
        }
    }

    Ok(if rendered > 0 { 0 } else { 2 })
}
