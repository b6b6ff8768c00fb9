use serde::Serialize;
use std::borrow::Cow;
use std::io::Write;

use crate::colors::ColorScheme;
use crate::error::ProcessingError;
use crate::pattern_extraction::{ChannelConfigUpdateEnvelope, PhysicalChannelConfig};
use crate::pipeline::config::FormatStrategy;
use crate::pipeline::context::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(name = "summary", help = "Envelope, one table row per cell and recent history")]
    Summary,
    #[value(name = "detail", help = "Every field of every cell")]
    Detail,
    #[value(name = "jsonl", help = "JSON Lines format (one object per update)")]
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "detail" => Ok(OutputFormat::Detail),
            "jsonl" => Ok(OutputFormat::Jsonl),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// One update as written by the jsonl renderer
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRecord<'a> {
    session: u64,
    sequence: u64,
    strategy: FormatStrategy,
    date: Option<&'a str>,
    time: Option<&'a str>,
    envelope: Option<&'a ChannelConfigUpdateEnvelope>,
    configs: &'a [PhysicalChannelConfig],
    history_length: usize,
}

pub struct OutputFormatter {
    format: OutputFormat,
    history_limit: usize,
    colors: ColorScheme,
    width: Option<usize>, // Truncate history lines to this many characters
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, history_limit: usize) -> Self {
        OutputFormatter {
            format,
            history_limit,
            colors: ColorScheme::new(false),
            width: None,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.colors = ColorScheme::new(use_colors);
        self
    }

    pub fn with_width(mut self, width: Option<usize>) -> Self {
        self.width = width;
        self
    }

    pub fn write_snapshot<W: Write>(
        &self,
        output: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ProcessingError> {
        match self.format {
            OutputFormat::Summary => self.write_summary(output, snapshot),
            OutputFormat::Detail => self.write_detail(output, snapshot),
            OutputFormat::Jsonl => self.write_jsonl(output, snapshot),
        }
    }

    fn write_jsonl<W: Write>(
        &self,
        output: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ProcessingError> {
        let record = UpdateRecord {
            session: snapshot.session,
            sequence: snapshot.sequence,
            strategy: snapshot.strategy,
            date: snapshot.latest.as_ref().map(|l| l.date.as_str()),
            time: snapshot.latest.as_ref().map(|l| l.time.as_str()),
            envelope: snapshot.envelope.as_ref(),
            configs: &snapshot.configs,
            history_length: snapshot.history.len(),
        };
        let json_line = serde_json::to_string(&record)?;
        writeln!(output, "{}", json_line)?;
        Ok(())
    }

    fn write_summary<W: Write>(
        &self,
        output: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ProcessingError> {
        let c = &self.colors;
        self.write_heading(output, snapshot)?;
        self.write_envelope(output, snapshot.envelope.as_ref())?;

        writeln!(
            output,
            "{}Gen\t(Pri|Sec)Cell\tBand/BandWidth\tPCI{}",
            c.heading, c.reset
        )?;
        if snapshot.configs.is_empty() {
            writeln!(output, "{}(no configs){}", c.missing, c.reset)?;
        }
        for config in &snapshot.configs {
            let row = format!(
                "{}\t{}\t{}/{}\t{}",
                display(&config.network_type),
                display(&config.connection_status),
                display(&config.band),
                display(&config.cell_bandwidth_downlink_khz),
                display(&config.physical_cell_id),
            );
            if config.connection_status.as_deref() == Some("PrimaryServing") {
                writeln!(output, "{}{}{}", c.primary, row, c.reset)?;
            } else {
                writeln!(output, "{}", row)?;
            }
        }

        self.write_history(output, snapshot)
    }

    fn write_detail<W: Write>(
        &self,
        output: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ProcessingError> {
        let c = &self.colors;
        self.write_heading(output, snapshot)?;
        self.write_envelope(output, snapshot.envelope.as_ref())?;

        if snapshot.configs.is_empty() {
            writeln!(output, "{}(no configs){}", c.missing, c.reset)?;
        }
        for config in &snapshot.configs {
            for (name, value) in config.fields() {
                self.write_field(output, name, value)?;
            }
            writeln!(output, "{}----{}", c.dim, c.reset)?;
        }

        self.write_history(output, snapshot)
    }

    fn write_heading<W: Write>(
        &self,
        output: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ProcessingError> {
        let c = &self.colors;
        let when = snapshot
            .latest
            .as_ref()
            .map(|l| format!("{} {}", l.date, l.time))
            .unwrap_or_default();
        writeln!(
            output,
            "{}== update {} ({}, {}){}",
            c.heading,
            snapshot.sequence,
            when,
            snapshot.strategy.name(),
            c.reset
        )?;
        Ok(())
    }

    fn write_envelope<W: Write>(
        &self,
        output: &mut W,
        envelope: Option<&ChannelConfigUpdateEnvelope>,
    ) -> Result<(), ProcessingError> {
        // Direct-format updates carry no envelope
        let Some(envelope) = envelope else {
            return Ok(());
        };
        self.write_field(output, "anchorNrCell", envelope.anchor_nr_cell_id.as_deref())?;
        self.write_field(output, "nrBandwidths", envelope.nr_bandwidths.as_deref())?;
        self.write_field(output, "nrBands", envelope.nr_bands.as_deref())
    }

    fn write_field<W: Write>(
        &self,
        output: &mut W,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), ProcessingError> {
        let c = &self.colors;
        match value {
            Some(value) => writeln!(
                output,
                "{}{}{} = {}{}{}",
                c.key, name, c.reset, c.value, value, c.reset
            )?,
            None => writeln!(
                output,
                "{}{}{} = {}null{}",
                c.key, name, c.reset, c.missing, c.reset
            )?,
        }
        Ok(())
    }

    fn write_history<W: Write>(
        &self,
        output: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ProcessingError> {
        if self.history_limit == 0 {
            return Ok(());
        }
        let c = &self.colors;
        let shown = snapshot.history.len().min(self.history_limit);
        writeln!(
            output,
            "{}-- history ({} of {}){}",
            c.heading,
            shown,
            snapshot.history.len(),
            c.reset
        )?;
        for message in snapshot.history.iter().take(shown) {
            writeln!(output, "{}{}{}", c.dim, truncate(message, self.width), c.reset)?;
        }
        Ok(())
    }
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

fn truncate(line: &str, width: Option<usize>) -> Cow<'_, str> {
    match width {
        Some(width) if width > 3 && line.chars().count() > width => {
            let kept: String = line.chars().take(width - 3).collect();
            Cow::Owned(format!("{}...", kept))
        }
        _ => Cow::Borrowed(line),
    }
}

/// Width of the attached terminal, if stdout is one
pub fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize)
}
