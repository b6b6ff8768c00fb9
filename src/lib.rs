// src/lib.rs
pub mod colors;
pub mod error;
pub mod input_format;
pub mod logging;
pub mod output_format;
pub mod pattern_extraction;
pub mod pipeline;
pub mod session;
pub mod source;

pub use error::*;
pub use pipeline::*;

pub use input_format::{decode_line, is_relevant, RawLogLine, RelevanceFilter};
pub use output_format::{OutputFormat, OutputFormatter};
pub use pattern_extraction::{
    extract_configs, extract_envelope, ChannelConfigUpdateEnvelope, PhysicalChannelConfig,
};
pub use pipeline::config::{FormatStrategy, PipelineConfig};
pub use pipeline::context::{ProcessResult, ProcessingStats, Snapshot};
pub use pipeline::router::{route, Extraction};
pub use pipeline::stream::{run_session, Publisher, SessionReport};
pub use session::SessionSupervisor;
pub use source::{detect_sdk_version, LineSource, SourceCommand};
