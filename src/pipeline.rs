pub mod config;
pub mod context;
pub mod router;
pub mod stream;

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::input_format::{decode_line, RelevanceFilter};
use config::{FormatStrategy, PipelineConfig};
use context::{ProcessResult, ProcessingStats, Snapshot};
use router::route;

/// Sequential decode -> filter -> route -> extract -> aggregate pipeline.
///
/// Holds the latest snapshot; every relevant line produces a new one.
pub struct StreamPipeline {
    filter: RelevanceFilter,
    strategy: FormatStrategy,
    snapshot: Arc<Snapshot>,
    stats: ProcessingStats,
}

impl StreamPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::for_session(config, 0)
    }

    pub fn for_session(config: PipelineConfig, session: u64) -> Self {
        let strategy = config.strategy();
        if strategy == FormatStrategy::Unverified {
            warn!(
                sdk_version = config.sdk_version,
                "log format of this platform version is unverified, parsing it like Android 15"
            );
        }

        StreamPipeline {
            filter: RelevanceFilter::new(&config.marker),
            strategy,
            snapshot: Arc::new(Snapshot::empty(session, strategy)),
            stats: ProcessingStats::default(),
        }
    }

    pub fn process_line(&mut self, line: &str) -> ProcessResult {
        self.stats.lines_seen += 1;

        let Some(decoded) = decode_line(line) else {
            self.stats.lines_malformed += 1;
            trace!(line, "skipping malformed line");
            return ProcessResult::Malformed;
        };

        if !self.filter.matches(&decoded.message) {
            self.stats.lines_irrelevant += 1;
            return ProcessResult::Irrelevant;
        }

        let extraction = route(self.strategy, &decoded.message);
        if extraction.envelope().is_some_and(|e| e.is_empty()) {
            self.stats.envelope_misses += 1;
            debug!(message = %decoded.message, "envelope pattern did not match");
        }

        self.stats.updates += 1;
        self.stats.configs_extracted += extraction.configs().len();
        debug!(
            time = %decoded.time,
            configs = extraction.configs().len(),
            "physical channel configs updated"
        );

        Arc::make_mut(&mut self.snapshot).apply(decoded, extraction);
        ProcessResult::Updated(Arc::clone(&self.snapshot))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn strategy(&self) -> FormatStrategy {
        self.strategy
    }
}
