// src/pipeline/stream.rs
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::pipeline::context::{ProcessResult, ProcessingStats, Snapshot};
use crate::pipeline::StreamPipeline;
use crate::source::LineSource;

/// Where a session delivers its snapshots
#[derive(Clone)]
pub struct Publisher {
    state: watch::Sender<Arc<Snapshot>>,
    updates: Option<mpsc::Sender<Arc<Snapshot>>>,
}

impl Publisher {
    pub fn new(
        state: watch::Sender<Arc<Snapshot>>,
        updates: Option<mpsc::Sender<Arc<Snapshot>>>,
    ) -> Self {
        Publisher { state, updates }
    }

    /// Replace the shared state, then queue the update for the renderer.
    /// Returns false if cancellation interrupted a full update queue.
    async fn publish(&mut self, snapshot: Arc<Snapshot>, cancel: &CancellationToken) -> bool {
        self.state.send_replace(Arc::clone(&snapshot));

        let Some(updates) = &self.updates else {
            return true;
        };
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            sent = updates.send(snapshot) => sent,
        };
        if sent.is_err() {
            debug!("update receiver dropped, keeping state only");
            self.updates = None;
        }
        true
    }
}

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session: u64,
    pub stats: ProcessingStats,
    pub cancelled: bool,
    pub exit_status: Option<ExitStatus>,
    pub processing_time: Duration,
}

/// Drive one session until the stream ends or `cancel` fires.
///
/// Lines are handled one at a time; a line's snapshot is published before
/// the next line is read. The source is closed on every exit path.
pub async fn run_session(
    mut source: LineSource,
    mut pipeline: StreamPipeline,
    cancel: CancellationToken,
    mut publisher: Publisher,
) -> SessionReport {
    let start_time = Instant::now();
    let session = pipeline.snapshot().session;
    let mut cancelled = false;

    info!(
        session,
        source = source.label(),
        strategy = pipeline.strategy().name(),
        "session started"
    );

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                cancelled = true;
                break;
            }
            line = source.next_line() => line,
        };

        let Some(line) = line else {
            debug!(session, "end of stream");
            break;
        };

        if let ProcessResult::Updated(snapshot) = pipeline.process_line(&line) {
            if !publisher.publish(snapshot, &cancel).await {
                cancelled = true;
                break;
            }
        }
    }

    let exit_status = source.close().await;
    let stats = pipeline.stats().clone();
    info!(
        session,
        cancelled,
        lines = stats.lines_seen,
        updates = stats.updates,
        "session finished"
    );

    SessionReport {
        session,
        stats,
        cancelled,
        exit_status,
        processing_time: start_time.elapsed(),
    }
}
