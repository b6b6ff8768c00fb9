// src/input_format.rs - Decoding of raw radio log lines

use serde::Serialize;

/// Number of leading space-separated tokens before the message text
/// (date, time, pid, tid, level and tag columns, with padding).
pub const MESSAGE_OFFSET: usize = 6;

/// Marker phrase of a physical channel configuration update
pub const UPDATE_MARKER: &str = "Physical channel configs updated";

/// One decoded log line. Date and time are passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLogLine {
    pub date: String,
    pub time: String,
    pub message: String,
}

/// Split a raw line on single spaces and rebuild the message part.
///
/// Consecutive spaces produce empty tokens, which count towards the offset
/// exactly like the column padding of the device log does. Lines with fewer
/// than `MESSAGE_OFFSET + 1` tokens are noise and yield `None`.
pub fn decode_line(line: &str) -> Option<RawLogLine> {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() <= MESSAGE_OFFSET {
        return None;
    }

    Some(RawLogLine {
        date: tokens[0].to_string(),
        time: tokens[1].to_string(),
        message: tokens[MESSAGE_OFFSET..].join(" "),
    })
}

/// Case-insensitive substring filter for relevant messages
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    marker: String, // lower-cased
}

impl RelevanceFilter {
    pub fn new(marker: &str) -> Self {
        RelevanceFilter {
            marker: marker.to_lowercase(),
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        message.to_lowercase().contains(&self.marker)
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        RelevanceFilter::new(UPDATE_MARKER)
    }
}

/// Shorthand for the default marker
pub fn is_relevant(message: &str) -> bool {
    RelevanceFilter::default().matches(message)
}
