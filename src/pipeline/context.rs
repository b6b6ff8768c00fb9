use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::input_format::RawLogLine;
use crate::pattern_extraction::{ChannelConfigUpdateEnvelope, PhysicalChannelConfig};
use crate::pipeline::config::FormatStrategy;
use crate::pipeline::router::Extraction;

/// Everything the presentation layer reads, as one immutable value.
///
/// A new snapshot is built for every relevant line and swapped in whole,
/// so readers never observe a config list from one update next to the
/// envelope of another.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub session: u64,
    pub sequence: u64, // Updates applied in this session
    pub strategy: FormatStrategy,
    pub latest: Option<RawLogLine>,
    pub envelope: Option<ChannelConfigUpdateEnvelope>,
    pub configs: Vec<PhysicalChannelConfig>,
    /// Raw relevant messages, newest first. Never truncated.
    #[serde(skip)]
    pub history: History,
}

impl Snapshot {
    pub fn empty(session: u64, strategy: FormatStrategy) -> Self {
        Snapshot {
            session,
            sequence: 0,
            strategy,
            latest: None,
            envelope: None,
            configs: Vec::new(),
            history: History::new(),
        }
    }

    /// Apply one update: replace envelope and configs in full, prepend history
    pub fn apply(&mut self, line: RawLogLine, extraction: Extraction) {
        let (envelope, configs) = extraction.into_parts();

        self.history.push_front(&line.message);
        self.sequence += 1;
        self.latest = Some(line);
        self.envelope = envelope;
        self.configs = configs;
    }

    pub fn is_empty(&self) -> bool {
        self.sequence == 0
    }
}

struct HistoryNode {
    message: Arc<str>,
    next: Option<Arc<HistoryNode>>,
}

/// Persistent newest-first list of raw messages.
///
/// Cloning is O(1) and prepending never touches existing entries, so every
/// snapshot shares the entries of the snapshots before it.
#[derive(Clone, Default)]
pub struct History {
    head: Option<Arc<HistoryNode>>,
    len: usize,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    pub fn push_front(&mut self, message: &str) {
        self.head = Some(Arc::new(HistoryNode {
            message: Arc::from(message),
            next: self.head.take(),
        }));
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Newest message, if any
    pub fn front(&self) -> Option<&str> {
        self.head.as_deref().map(|node| &*node.message)
    }

    pub fn iter(&self) -> HistoryIter<'_> {
        HistoryIter {
            next: self.head.as_deref(),
        }
    }
}

impl Drop for History {
    fn drop(&mut self) {
        // Unlink iteratively; the default recursive drop overflows the stack
        // on long histories. Stops at the first node another snapshot shares.
        let mut next = self.head.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a str;
    type IntoIter = HistoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct HistoryIter<'a> {
    next: Option<&'a HistoryNode>,
}

impl<'a> Iterator for HistoryIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.message)
    }
}

/// Result of feeding one raw line to the pipeline
#[derive(Debug, Clone)]
pub enum ProcessResult {
    /// Fewer tokens than a log line has; dropped silently
    Malformed,
    /// Decoded fine but not a physical channel config update
    Irrelevant,
    /// New state after this line
    Updated(Arc<Snapshot>),
}

/// Runtime statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub lines_seen: usize,
    pub lines_malformed: usize,
    pub lines_irrelevant: usize,
    pub updates: usize,
    pub configs_extracted: usize,
    pub envelope_misses: usize, // Wrapped/unverified lines whose envelope did not match
}
