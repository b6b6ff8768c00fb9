use is_terminal::IsTerminal;

/// ANSI color codes for the text renderers
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub heading: &'static str, // Bold for section headings
    pub key: &'static str,     // Cyan for field names
    pub value: &'static str,   // Green for captured values
    pub missing: &'static str, // Gray for absent values
    pub primary: &'static str, // Yellow for the primary serving cell
    pub dim: &'static str,     // Gray for history lines
    pub reset: &'static str,   // Reset to default color
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                heading: "\x1b[1m",
                key: "\x1b[36m",
                value: "\x1b[32m",
                missing: "\x1b[90m",
                primary: "\x1b[33m",
                dim: "\x1b[90m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                heading: "",
                key: "",
                value: "",
                missing: "",
                primary: "",
                dim: "",
                reset: "",
            }
        }
    }
}

/// Forced preference wins, otherwise color only when stdout is a terminal
/// and `NO_COLOR` is unset
pub fn should_use_colors(preference: Option<bool>) -> bool {
    match preference {
        Some(forced) => forced,
        None => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
    }
}
