//! Client → server command grammar
//!
//! Commands are plain-text lines. Filter commands are a lowercase keyword,
//! one space and a regular expression taking the rest of the line; the
//! keyword match is case-sensitive and the pattern is passed through
//! verbatim. Bare keywords (`start`, `stop`, `quit`) match ignoring ASCII
//! case. Anything else is `Unknown` and never closes the connection.

/// Usage text sent after an unrecognized command
pub const USAGE: &str = "Use commands: start, stop, hosts regex, categories regex, counters regex, instances regex, or quit";

/// Filter field addressed by a pattern command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Hosts,
    Categories,
    Counters,
    Instances,
}

impl FilterField {
    /// All fields, in command-matching order
    pub const ALL: [FilterField; 4] = [
        FilterField::Hosts,
        FilterField::Categories,
        FilterField::Counters,
        FilterField::Instances,
    ];

    /// Command keyword (e.g. `hosts`)
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::Categories => "categories",
            Self::Counters => "counters",
            Self::Instances => "instances",
        }
    }

    /// Capitalized label used in acknowledgements
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hosts => "Hosts",
            Self::Categories => "Categories",
            Self::Counters => "Counters",
            Self::Instances => "Instances",
        }
    }
}

/// A parsed client command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace one filter pattern
    SetPattern { field: FilterField, pattern: String },
    /// Resume streaming
    Start,
    /// Pause streaming
    Stop,
    /// End the session
    Quit,
    /// Unrecognized input
    Unknown(String),
}

impl Command {
    /// Parse one command line (without its line terminator)
    pub fn parse(line: &str) -> Self {
        for field in FilterField::ALL {
            if let Some(pattern) = line
                .strip_prefix(field.keyword())
                .and_then(|rest| rest.strip_prefix(' '))
            {
                return Self::SetPattern {
                    field,
                    pattern: pattern.to_string(),
                };
            }
        }

        if line.eq_ignore_ascii_case("start") {
            Self::Start
        } else if line.eq_ignore_ascii_case("stop") {
            Self::Stop
        } else if line.eq_ignore_ascii_case("quit") {
            Self::Quit
        } else {
            Self::Unknown(line.to_string())
        }
    }

    /// Render the command as a client would send it
    pub fn to_line(&self) -> String {
        match self {
            Self::SetPattern { field, pattern } => format!("{} {}\n", field.keyword(), pattern),
            Self::Start => "start\n".to_string(),
            Self::Stop => "stop\n".to_string(),
            Self::Quit => "quit\n".to_string(),
            Self::Unknown(line) => format!("{}\n", line),
        }
    }
}

/// Acknowledgement for an accepted pattern (e.g. `Hosts pattern:^web`)
pub fn pattern_ack(field: FilterField, pattern: &str) -> String {
    format!("{} pattern:{}", field.label(), pattern)
}

/// Format an `I` line
pub fn info_line(message: &str) -> String {
    format!("I {}\n", message)
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
