// src/source.rs - Line sources: the log process, files and stdin

use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::SourceError;

/// How long a process that closed its stdout gets to exit before it is killed
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// External command producing the log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SourceCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        SourceCommand {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl Default for SourceCommand {
    fn default() -> Self {
        SourceCommand::new("logcat", &["-b", "radio"])
    }
}

impl FromStr for SourceCommand {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SourceError::InvalidCommand("empty command".to_string()))?;
        Ok(SourceCommand {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for SourceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A sequence of raw lines, optionally backed by a child process.
///
/// The child is spawned with `kill_on_drop`, so abandoning the source
/// without calling [`LineSource::close`] still terminates it.
pub struct LineSource {
    label: String,
    reader: BufReader<Box<dyn AsyncRead + Send + Unpin>>,
    child: Option<Child>,
    exit_status: Option<ExitStatus>,
    eof: bool,
    closed: bool,
    buf: Vec<u8>,
}

impl LineSource {
    pub fn spawn(command: &SourceCommand) -> Result<Self, SourceError> {
        let label = command.to_string();
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: label.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::MissingStdout {
                command: label.clone(),
            })?;

        info!(command = %label, pid = child.id(), "log process started");
        Ok(Self::with_child(label, Box::new(stdout), Some(child)))
    }

    /// Replay a saved log. Must be called from within a tokio runtime.
    pub fn open_file(path: &Path) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path).map_err(|source| SourceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_reader(
            path.display().to_string(),
            tokio::fs::File::from_std(file),
        ))
    }

    pub fn stdin() -> Self {
        Self::from_reader("<stdin>", tokio::io::stdin())
    }

    pub fn from_reader<R>(label: impl Into<String>, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::with_child(label.into(), Box::new(reader), None)
    }

    fn with_child(
        label: String,
        reader: Box<dyn AsyncRead + Send + Unpin>,
        child: Option<Child>,
    ) -> Self {
        LineSource {
            label,
            reader: BufReader::new(reader),
            child,
            exit_status: None,
            eof: false,
            closed: false,
            buf: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pid of the child process while it is running
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// Next line without its line terminator, or `None` at end of stream.
    ///
    /// Invalid UTF-8 is replaced rather than treated as an error. A read
    /// error ends the sequence.
    pub async fn next_line(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) => {
                self.eof = true;
                None
            }
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(String::from_utf8_lossy(&self.buf).into_owned())
            }
            Err(e) => {
                warn!(source = %self.label, error = %e, "read failed, ending stream");
                None
            }
        }
    }

    /// Terminate the child (if any), reap it and stop reading.
    ///
    /// Only the first call does any work; later calls return the same status.
    pub async fn close(&mut self) -> Option<ExitStatus> {
        if self.closed {
            return self.exit_status;
        }
        self.closed = true;
        // Drop our end of the pipe before reaping
        self.reader = BufReader::new(Box::new(tokio::io::empty()));

        let mut child = self.child.take()?;
        let status = if self.eof {
            // The process closed its output and is most likely exiting on its own
            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(status) => status,
                Err(_) => kill_and_reap(&mut child, &self.label).await,
            }
        } else {
            match child.try_wait() {
                Ok(Some(status)) => Ok(status),
                _ => kill_and_reap(&mut child, &self.label).await,
            }
        };

        match status {
            Ok(status) => {
                info!(source = %self.label, %status, "log process terminated");
                self.exit_status = Some(status);
            }
            Err(e) => warn!(source = %self.label, error = %e, "could not reap log process"),
        }
        self.exit_status
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

async fn kill_and_reap(child: &mut Child, label: &str) -> std::io::Result<ExitStatus> {
    if let Err(e) = child.start_kill() {
        debug!(source = label, error = %e, "kill failed");
    }
    child.wait().await
}

/// Ask the device for its SDK level (`getprop ro.build.version.sdk`)
pub async fn detect_sdk_version() -> Result<u32, SourceError> {
    let output = Command::new("getprop")
        .arg("ro.build.version.sdk")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| SourceError::SdkProbe(format!("getprop: {}", e)))?;

    if !output.status.success() {
        return Err(SourceError::SdkProbe(format!(
            "getprop exited with {}",
            output.status
        )));
    }

    parse_sdk_version(&String::from_utf8_lossy(&output.stdout))
}

fn parse_sdk_version(text: &str) -> Result<u32, SourceError> {
    let text = text.trim();
    text.parse::<u32>()
        .map_err(|_| SourceError::SdkProbe(format!("unexpected value '{}'", text)))
}
