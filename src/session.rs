// src/session.rs - At most one running session at a time

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::SourceError;
use crate::pipeline::config::{FormatStrategy, PipelineConfig};
use crate::pipeline::context::Snapshot;
use crate::pipeline::stream::{run_session, Publisher, SessionReport};
use crate::pipeline::StreamPipeline;
use crate::source::LineSource;

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<SessionReport>,
}

/// Owns the running session and the state it publishes.
///
/// Starting a session first cancels the previous one and waits until its
/// source is closed, so the published state only ever comes from the most
/// recently started session.
pub struct SessionSupervisor {
    state: watch::Sender<Arc<Snapshot>>,
    active: Option<ActiveSession>,
    next_id: u64,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(Snapshot::empty(0, FormatStrategy::Wrapped)));
        SessionSupervisor {
            state,
            active: None,
            next_id: 1,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.state.subscribe()
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Id of the current (or last) session
    pub fn current_session(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Replace any running session with a new one reading from `open()`.
    ///
    /// The previous session is torn down before `open()` runs. The state is
    /// reset to an empty snapshot of the new session only once the source
    /// is open.
    ///
    /// Returns the receiving end of the new session's update stream. It
    /// yields one snapshot per relevant line and ends with the session.
    pub async fn start<F>(
        &mut self,
        open: F,
        config: PipelineConfig,
    ) -> Result<mpsc::Receiver<Arc<Snapshot>>, SourceError>
    where
        F: FnOnce() -> Result<LineSource, SourceError>,
    {
        if let Some(report) = self.stop().await {
            debug!(session = report.session, "previous session torn down");
        }

        // A source that fails to open leaves the published state alone
        let source = open()?;

        let id = self.next_id;
        self.next_id += 1;

        let pipeline = StreamPipeline::for_session(config.clone(), id);
        self.state.send_replace(pipeline.snapshot());

        let (updates_tx, updates_rx) = mpsc::channel(config.update_capacity.max(1));
        let publisher = Publisher::new(self.state.clone(), Some(updates_tx));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_session(source, pipeline, cancel.clone(), publisher));

        self.active = Some(ActiveSession { id, cancel, handle });
        Ok(updates_rx)
    }

    /// Cancel the running session and wait for its teardown
    pub async fn stop(&mut self) -> Option<SessionReport> {
        let active = self.active.take()?;
        active.cancel.cancel();
        Self::join(active).await
    }

    /// Wait for the running session to end by itself
    pub async fn wait(&mut self) -> Option<SessionReport> {
        let active = self.active.take()?;
        Self::join(active).await
    }

    async fn join(active: ActiveSession) -> Option<SessionReport> {
        match active.handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(session = active.id, error = %e, "session task failed");
                None
            }
        }
    }
}

impl Default for SessionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionSupervisor {
    fn drop(&mut self) {
        // The task closes its source once it observes the cancellation
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}
