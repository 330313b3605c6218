use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::decoding::{DecodeStats, Decoded, Decoder};
use crate::models::{ConfigRecord, SampleRecord, StateInterval, StateRun};
use crate::segmentation::{group_runs, segment_with};
use crate::settings::Settings;
use crate::signal::{filter_channels, ChannelSeries};

// Set to true to log replay progress
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Everything derived from one offline log.
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    pub samples: Vec<SampleRecord>,
    pub configs: Vec<Arc<ConfigRecord>>,
    pub messages: Vec<String>,
    pub intervals: Vec<StateInterval>,
    pub runs: Vec<StateRun>,
    /// Empty when the log holds no samples.
    pub filtered: ChannelSeries,
    pub stats: DecodeStats,
}

impl ReplayReport {
    pub fn latest_sample(&self) -> Option<&SampleRecord> {
        self.samples.last()
    }
}

/// Decode a sequence of already-framed lines.
pub fn replay_lines<I, S>(lines: I, settings: &Settings) -> Result<ReplayReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    replay_fallible(lines.into_iter().map(Ok::<S, anyhow::Error>), settings)
}

/// Decode lines pulled one at a time from a fallible source. The first source
/// error aborts the replay; malformed lines never do.
fn replay_fallible<I, S>(lines: I, settings: &Settings) -> Result<ReplayReport>
where
    I: IntoIterator<Item = Result<S>>,
    S: AsRef<str>,
{
    let mut decoder = Decoder::new(settings.profile);
    let mut report = ReplayReport::default();

    for line in lines {
        match decoder.feed(line?.as_ref()) {
            Decoded::Sample(sample) => report.samples.push(sample),
            Decoded::Config(config) => report.configs.push(config),
            Decoded::Message(text) => report.messages.push(text),
            Decoded::Blank | Decoded::Rejected(_) => {}
        }
    }

    report.intervals = segment_with(&report.samples, &settings.segmentation());
    report.runs = group_runs(&report.samples);
    if !report.samples.is_empty() {
        report.filtered = filter_channels(&report.samples, settings.filter_alpha)
            .context("failed to filter sensor channels")?;
    }
    report.stats = decoder.stats().clone();

    Ok(report)
}

/// Stream a log file through the decoder once, in order. Invalid UTF-8 is
/// replaced rather than aborting the read, as serial captures often start
/// mid-byte.
pub fn replay_file(path: &Path, settings: &Settings) -> Result<ReplayReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let lines = BufReader::new(file).split(b'\n').map(|chunk| {
        chunk
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .with_context(|| format!("Failed to read {}", path.display()))
    });

    let report = replay_fallible(lines, settings)?;
    log_info!(
        "replayed {}: {} lines, {} samples, {} intervals, {} rejected",
        path.display(),
        report.stats.lines,
        report.stats.samples,
        report.intervals.len(),
        report.stats.rejected()
    );
    Ok(report)
}
