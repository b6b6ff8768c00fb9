use serde::Serialize;

use crate::input_format::UPDATE_MARKER;

/// Android 14. Last release that logs config fragments directly.
pub const SDK_UPSIDE_DOWN_CAKE: u32 = 34;

/// Android 15. Last release known to log the wrapped envelope format.
pub const SDK_VANILLA_ICE_CREAM: u32 = 35;

/// How a relevant message is taken apart, chosen from the platform version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStrategy {
    /// The message itself holds the config fragments
    Direct,
    /// An envelope record holds the config fragments in its `configs` field
    Wrapped,
    /// Newer than any verified release. Reuses the wrapped parsing for now.
    Unverified,
}

impl FormatStrategy {
    pub fn for_sdk(sdk_version: u32) -> Self {
        if sdk_version <= SDK_UPSIDE_DOWN_CAKE {
            FormatStrategy::Direct
        } else if sdk_version <= SDK_VANILLA_ICE_CREAM {
            FormatStrategy::Wrapped
        } else {
            FormatStrategy::Unverified
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatStrategy::Direct => "direct",
            FormatStrategy::Wrapped => "wrapped",
            FormatStrategy::Unverified => "unverified",
        }
    }
}

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sdk_version: u32,
    pub marker: String,
    pub update_capacity: usize, // Bounded update channel between session and renderer
}

impl PipelineConfig {
    pub fn for_sdk(sdk_version: u32) -> Self {
        PipelineConfig {
            sdk_version,
            ..PipelineConfig::default()
        }
    }

    pub fn strategy(&self) -> FormatStrategy {
        FormatStrategy::for_sdk(self.sdk_version)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            sdk_version: SDK_VANILLA_ICE_CREAM,
            marker: UPDATE_MARKER.to_string(),
            update_capacity: 64,
        }
    }
}
