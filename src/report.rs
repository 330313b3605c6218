//! Plain-text summaries for the command line.

use std::fmt::Write;

use crate::decoding::ErrorBitVariant;
use crate::models::{SampleRecord, StateInterval};
use crate::replay::ReplayReport;

/// Field/value rows for one sample, in the order the console viewer shows them.
pub fn sample_fields(sample: &SampleRecord, variant: ErrorBitVariant) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Time", sample.timestamp.to_string()),
        ("State", sample.state.to_string()),
    ];
    if let Some(next) = &sample.next_state {
        rows.push(("Next", next.to_string()));
    }
    rows.extend([
        ("Day/Night", sample.day_text()),
        ("DayCount", sample.day_count_text()),
        ("Sleeping", sample.sleep_text()),
        (
            "lSensor",
            format!("{} ({:.2}V)", sample.light_text(), sample.light_volts()),
        ),
        (
            "bSensor",
            format!("{} ({:.2}V)", sample.battery_sensor, sample.battery_volts()),
        ),
        ("uSensor", sample.upper_limit_closed.to_string()),
        ("lSwitch", sample.lower_limit_closed.to_string()),
        ("Error Value", sample.error_flags.to_string()),
        ("Error Flags", sample.error_labels(variant).join(", ")),
    ]);
    rows
}

pub fn render_sample(sample: &SampleRecord, variant: ErrorBitVariant) -> String {
    let mut out = String::new();
    for (field, value) in sample_fields(sample, variant) {
        let _ = writeln!(out, "  {field:<12} {value}");
    }
    out
}

pub fn render_interval(interval: &StateInterval) -> String {
    let duration = interval
        .duration()
        .map(|d| format!(" ({}s)", d.num_seconds()))
        .unwrap_or_default();
    format!(
        "{} -> {}  {}{}",
        interval.start, interval.end, interval.state, duration
    )
}

pub fn render_report(report: &ReplayReport, variant: ErrorBitVariant) -> String {
    let mut out = String::new();
    let stats = &report.stats;

    let _ = writeln!(
        out,
        "{} lines: {} samples, {} configs, {} messages, {} malformed configs, {} malformed samples",
        stats.lines,
        stats.samples,
        stats.configs,
        stats.messages,
        stats.malformed_configs,
        stats.malformed_samples
    );

    let _ = writeln!(out, "\nIntervals:");
    if report.intervals.is_empty() {
        let _ = writeln!(out, "  (no state changes)");
    }
    for interval in &report.intervals {
        let _ = writeln!(out, "  {}", render_interval(interval));
    }

    if let Some(sample) = report.latest_sample() {
        let _ = writeln!(out, "\nLast sample:");
        out.push_str(&render_sample(sample, variant));
    }

    if let (Some(light), Some(battery)) = (report.filtered.light.last(), report.filtered.battery.last()) {
        let _ = writeln!(out, "\nFiltered: light {light:.1}, battery {battery:.1}");
    }

    out
}
