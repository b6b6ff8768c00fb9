// src/pipeline/router.rs
use crate::pattern_extraction::{
    extract_configs, extract_envelope, ChannelConfigUpdateEnvelope, PhysicalChannelConfig,
};
use crate::pipeline::config::FormatStrategy;

/// What one relevant message yielded, tagged by the strategy that parsed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Direct {
        configs: Vec<PhysicalChannelConfig>,
    },
    Wrapped {
        envelope: ChannelConfigUpdateEnvelope,
        configs: Vec<PhysicalChannelConfig>,
    },
    Unverified {
        envelope: ChannelConfigUpdateEnvelope,
        configs: Vec<PhysicalChannelConfig>,
    },
}

impl Extraction {
    pub fn envelope(&self) -> Option<&ChannelConfigUpdateEnvelope> {
        match self {
            Extraction::Direct { .. } => None,
            Extraction::Wrapped { envelope, .. } | Extraction::Unverified { envelope, .. } => {
                Some(envelope)
            }
        }
    }

    pub fn configs(&self) -> &[PhysicalChannelConfig] {
        match self {
            Extraction::Direct { configs }
            | Extraction::Wrapped { configs, .. }
            | Extraction::Unverified { configs, .. } => configs,
        }
    }

    pub fn into_parts(self) -> (Option<ChannelConfigUpdateEnvelope>, Vec<PhysicalChannelConfig>) {
        match self {
            Extraction::Direct { configs } => (None, configs),
            Extraction::Wrapped { envelope, configs }
            | Extraction::Unverified { envelope, configs } => (Some(envelope), configs),
        }
    }
}

/// Parse a relevant message with the given strategy. Never fails.
pub fn route(strategy: FormatStrategy, message: &str) -> Extraction {
    match strategy {
        FormatStrategy::Direct => Extraction::Direct {
            configs: extract_configs(message),
        },
        FormatStrategy::Wrapped => {
            let (envelope, configs) = extract_wrapped(message);
            Extraction::Wrapped { envelope, configs }
        }
        FormatStrategy::Unverified => {
            // TODO: give this its own patterns once logs from SDK 36+ devices are collected
            let (envelope, configs) = extract_wrapped(message);
            Extraction::Unverified { envelope, configs }
        }
    }
}

fn extract_wrapped(message: &str) -> (ChannelConfigUpdateEnvelope, Vec<PhysicalChannelConfig>) {
    let envelope = extract_envelope(message);
    // Only the envelope's configs field is scanned, never the whole message
    let configs = envelope
        .raw_configs
        .as_deref()
        .map(extract_configs)
        .unwrap_or_default();
    (envelope, configs)
}
