//! Output formatting for decoded samples

use chrono::NaiveDateTime;
use owo_colors::{OwoColorize, Style};

use perftap_protocol::{DecodedSample, TIMESTAMP_FORMAT, format_value};

/// Length of a `T` line timestamp without the optional offset
const TIMESTAMP_LEN: usize = 15;

/// Sample printer
pub struct Formatter {
    use_color: bool,
}

impl Formatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Print one sample to stdout
    pub fn print(&self, sample: &DecodedSample) {
        println!("{}", self.format(sample));
    }

    /// `<time> <host>\<category>\<counter>[(<instance>)] = <value>`
    pub fn format(&self, sample: &DecodedSample) -> String {
        let dim = if self.use_color {
            Style::new().dimmed()
        } else {
            Style::new()
        };

        let mut path = format!("{}\\{}\\{}", sample.host, sample.category, sample.counter);
        if let Some(instance) = &sample.instance {
            path.push('(');
            path.push_str(instance);
            path.push(')');
        }

        let time = sample
            .timestamp
            .as_deref()
            .map(display_time)
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {}",
            time.style(dim),
            path,
            "=".style(dim),
            format_value(sample.value)
        )
    }
}

/// Render a wire timestamp as `YYYY-mm-dd HH:MM:SS`, keeping any offset
fn display_time(raw: &str) -> String {
    let stamp = raw.get(..TIMESTAMP_LEN).unwrap_or(raw);
    let offset = &raw[stamp.len()..];
    match NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
        Ok(time) => format!("{}{}", time.format("%Y-%m-%d %H:%M:%S"), offset),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
