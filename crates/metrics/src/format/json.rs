//! JSON metrics formatter
//!
//! One object per report, suitable for log shipping:
//!
//! ```json
//! {"type":"perftap","tap":{...},"poll":{...},"interval":{"elapsed_secs":60.0,...}}
//! ```

use super::MetricsFormatter;
use crate::{
    CollectedMetrics, MetricsDeltas, PollDeltas, PollMetricsSnapshot, TapDeltas,
    TapMetricsSnapshot,
};
use serde::Serialize;

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tap: Option<&'a TapMetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll: Option<&'a PollMetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<IntervalJson<'a>>,
}

#[derive(Serialize)]
struct IntervalJson<'a> {
    elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tap: Option<&'a TapDeltas>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll: Option<&'a PollDeltas>,
}

impl MetricsFormatter for JsonFormatter {
    fn format(&self, metrics: &CollectedMetrics, deltas: Option<&MetricsDeltas>) -> String {
        let report = ReportJson {
            report_type: "perftap",
            tap: metrics.tap.as_ref(),
            poll: metrics.poll.as_ref(),
            interval: deltas.map(|d| IntervalJson {
                elapsed_secs: d.elapsed_secs,
                tap: d.tap.as_ref(),
                poll: d.poll.as_ref(),
            }),
        };

        serde_json::to_string(&report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}
