#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process '{command}' has no stdout pipe")]
    MissingStdout { command: String },

    #[error("Failed to open input '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform SDK version: {0}")]
    SdkProbe(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl ProcessingError {
    /// True when the reader on the other end of stdout went away
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, ProcessingError::IoError(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

impl From<serde_json::Error> for ProcessingError {
    fn from(err: serde_json::Error) -> Self {
        ProcessingError::OutputError(format!("JSON encoding error: {}", err))
    }
}
