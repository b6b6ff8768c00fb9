use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Field names of the envelope record, in capture order
pub const ENVELOPE_FIELDS: [&str; 4] = ["anchorNrCell", "nrBandwidths", "nrBands", "configs"];

/// Field names of one `PhysicalChannelConfig` fragment, in capture order
pub const CONFIG_FIELDS: [&str; 12] = [
    "mConnectionStatus",
    "mCellBandwidthDownlinkKhz",
    "mCellBandwidthUplinkKhz",
    "mNetworkType",
    "mFrequencyRange",
    "mDownlinkChannelNumber",
    "mUplinkChannelNumber",
    "mContextIds",
    "mPhysicalCellId",
    "mBand",
    "mDownlinkFrequency",
    "mUplinkFrequency",
];

static ENVELOPE_EXTRACTOR: Lazy<PatternExtractor> = Lazy::new(|| {
    PatternExtractor::envelope().expect("envelope pattern is a valid regex")
});

static CONFIG_EXTRACTOR: Lazy<PatternExtractor> = Lazy::new(|| {
    PatternExtractor::config().expect("config pattern is a valid regex")
});

/// Outer record of the Android 15 log format wrapping a batch of configs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfigUpdateEnvelope {
    pub anchor_nr_cell_id: Option<String>,
    pub nr_bandwidths: Option<String>,
    pub nr_bands: Option<String>,
    pub raw_configs: Option<String>,
}

impl ChannelConfigUpdateEnvelope {
    fn from_groups(groups: Vec<Option<String>>) -> Self {
        let mut groups = groups.into_iter();
        ChannelConfigUpdateEnvelope {
            anchor_nr_cell_id: groups.next().flatten(),
            nr_bandwidths: groups.next().flatten(),
            nr_bands: groups.next().flatten(),
            raw_configs: groups.next().flatten(),
        }
    }

    /// True when the envelope pattern did not match at all
    pub fn is_empty(&self) -> bool {
        self.anchor_nr_cell_id.is_none()
            && self.nr_bandwidths.is_none()
            && self.nr_bands.is_none()
            && self.raw_configs.is_none()
    }
}

/// One active cell. Values are kept exactly as logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalChannelConfig {
    pub connection_status: Option<String>,
    pub cell_bandwidth_downlink_khz: Option<String>,
    pub cell_bandwidth_uplink_khz: Option<String>,
    pub network_type: Option<String>,
    pub frequency_range: Option<String>,
    pub downlink_channel_number: Option<String>,
    pub uplink_channel_number: Option<String>,
    pub context_ids: Option<String>,
    pub physical_cell_id: Option<String>,
    pub band: Option<String>,
    pub downlink_frequency: Option<String>,
    pub uplink_frequency: Option<String>,
}

impl PhysicalChannelConfig {
    fn from_groups(groups: Vec<Option<String>>) -> Self {
        let mut groups = groups.into_iter();
        let mut next = || groups.next().flatten();
        PhysicalChannelConfig {
            connection_status: next(),
            cell_bandwidth_downlink_khz: next(),
            cell_bandwidth_uplink_khz: next(),
            network_type: next(),
            frequency_range: next(),
            downlink_channel_number: next(),
            uplink_channel_number: next(),
            context_ids: next(),
            physical_cell_id: next(),
            band: next(),
            downlink_frequency: next(),
            uplink_frequency: next(),
        }
    }

    /// Field values paired with their log names, in log order
    pub fn fields(&self) -> [(&'static str, Option<&str>); 12] {
        let values = [
            &self.connection_status,
            &self.cell_bandwidth_downlink_khz,
            &self.cell_bandwidth_uplink_khz,
            &self.network_type,
            &self.frequency_range,
            &self.downlink_channel_number,
            &self.uplink_channel_number,
            &self.context_ids,
            &self.physical_cell_id,
            &self.band,
            &self.downlink_frequency,
            &self.uplink_frequency,
        ];
        std::array::from_fn(|i| (CONFIG_FIELDS[i], values[i].as_deref()))
    }
}

/// A compiled `name=(value)` pattern with positional capture groups
pub struct PatternExtractor {
    regex: Regex,
    fields: &'static [&'static str],
}

impl PatternExtractor {
    /// `Physical channel configs updated: anchorNrCell=(..), ..., configs=(..)`
    ///
    /// The last group is greedy so it takes the whole remainder of the
    /// message, which holds the nested config list.
    pub fn envelope() -> Result<Self> {
        let last = ENVELOPE_FIELDS.len() - 1;
        let groups: Vec<String> = ENVELOPE_FIELDS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == last {
                    format!("{}=(.*)", name)
                } else {
                    format!("{}=(.*?)", name)
                }
            })
            .collect();
        let pattern = format!(
            "{}: {}",
            regex::escape(crate::input_format::UPDATE_MARKER),
            groups.join(", ")
        );
        Self::compile(&pattern, &ENVELOPE_FIELDS)
    }

    /// `{mConnectionStatus=(..),...,mUplinkFrequency=(..)}`
    pub fn config() -> Result<Self> {
        let groups: Vec<String> = CONFIG_FIELDS
            .iter()
            .map(|name| format!("{}=(.*?)", name))
            .collect();
        let pattern = format!(r"\{{{}\}}", groups.join(","));
        Self::compile(&pattern, &CONFIG_FIELDS)
    }

    fn compile(pattern: &str, fields: &'static [&'static str]) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| anyhow!("Failed to compile regex pattern: {}", e))?;
        Ok(PatternExtractor { regex, fields })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Capture groups of the first match, positionally
    pub fn first(&self, text: &str) -> Option<Vec<Option<String>>> {
        self.regex
            .captures(text)
            .map(|captures| self.groups(&captures))
    }

    /// Capture groups of every non-overlapping match
    pub fn all(&self, text: &str) -> Vec<Vec<Option<String>>> {
        self.regex
            .captures_iter(text)
            .map(|captures| self.groups(&captures))
            .collect()
    }

    fn groups(&self, captures: &regex::Captures<'_>) -> Vec<Option<String>> {
        // Capture groups are 1-indexed (0 is the full match)
        (1..=self.fields.len())
            .map(|i| captures.get(i).map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// Match the envelope pattern against a whole message.
/// No match gives an envelope with every field absent.
pub fn extract_envelope(message: &str) -> ChannelConfigUpdateEnvelope {
    ENVELOPE_EXTRACTOR
        .first(message)
        .map(ChannelConfigUpdateEnvelope::from_groups)
        .unwrap_or_default()
}

/// Every config fragment found in `text`, in order of appearance
pub fn extract_configs(text: &str) -> Vec<PhysicalChannelConfig> {
    CONFIG_EXTRACTOR
        .all(text)
        .into_iter()
        .map(PhysicalChannelConfig::from_groups)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "{mConnectionStatus=PrimaryServing,mCellBandwidthDownlinkKhz=20000,mCellBandwidthUplinkKhz=20000,mNetworkType=NR,mFrequencyRange=2,mDownlinkChannelNumber=500000,mUplinkChannelNumber=500000,mContextIds=[1],mPhysicalCellId=100,mBand=78,mDownlinkFrequency=3500.0,mUplinkFrequency=3500.0}";

    #[test]
    fn test_compile_patterns() {
        let envelope = PatternExtractor::envelope().unwrap();
        assert_eq!(
            envelope.as_str(),
            "Physical channel configs updated: anchorNrCell=(.*?), nrBandwidths=(.*?), nrBands=(.*?), configs=(.*)"
        );

        let config = PatternExtractor::config().unwrap();
        assert!(config
            .as_str()
            .starts_with(r"\{mConnectionStatus=(.*?),mCellBandwidthDownlinkKhz="));
        assert!(config.as_str().ends_with(r"mUplinkFrequency=(.*?)\}"));
    }

    #[test]
    fn test_single_config() {
        let configs = extract_configs(CONFIG);
        assert_eq!(configs.len(), 1);
        let config = &configs[0];
        assert_eq!(config.connection_status.as_deref(), Some("PrimaryServing"));
        assert_eq!(config.network_type.as_deref(), Some("NR"));
        assert_eq!(config.context_ids.as_deref(), Some("[1]"));
        assert_eq!(config.band.as_deref(), Some("78"));
        assert_eq!(config.uplink_frequency.as_deref(), Some("3500.0"));
    }

    #[test]
    fn test_fields_follow_log_order() {
        let config = &extract_configs(CONFIG)[0];
        let fields = config.fields();
        assert_eq!(fields[0], ("mConnectionStatus", Some("PrimaryServing")));
        assert_eq!(fields[9], ("mBand", Some("78")));
        assert_eq!(fields[11], ("mUplinkFrequency", Some("3500.0")));
    }

    #[test]
    fn test_no_match() {
        assert!(extract_configs("nothing here").is_empty());
        assert!(extract_envelope("nothing here").is_empty());
    }

    #[test]
    fn test_truncated_fragment_does_not_match() {
        let truncated = &CONFIG[..CONFIG.len() - 20];
        assert!(extract_configs(truncated).is_empty());
    }

    #[test]
    fn test_envelope_keeps_raw_configs() {
        let message = format!(
            "Physical channel configs updated: anchorNrCell=5, nrBandwidths=20, nrBands=78, configs=[{}]",
            CONFIG
        );
        let envelope = extract_envelope(&message);
        assert_eq!(envelope.anchor_nr_cell_id.as_deref(), Some("5"));
        assert_eq!(envelope.nr_bandwidths.as_deref(), Some("20"));
        assert_eq!(envelope.nr_bands.as_deref(), Some("78"));
        assert_eq!(envelope.raw_configs, Some(format!("[{}]", CONFIG)));
    }
}
