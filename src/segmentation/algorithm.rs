use crate::models::{ControllerState, SampleRecord, StateInterval, StateRun, Timestamp};
use crate::segmentation::config::SegmentationConfig;

/// Incremental segmenter: feed samples in order, collect intervals as each
/// state change is observed.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentationConfig,
    current: Option<(ControllerState, Timestamp)>,
    last_seen: Option<Timestamp>,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            config,
            current: None,
            last_seen: None,
        }
    }

    /// Returns the interval closed by `sample`, if its state differs from the
    /// running one. Equal timestamps yield a zero-length interval.
    pub fn push(&mut self, sample: &SampleRecord) -> Option<StateInterval> {
        self.last_seen = Some(sample.timestamp);

        match self.current.take() {
            Some((state, start)) if state == sample.state => {
                self.current = Some((state, start));
                None
            }
            Some((state, start)) => {
                self.current = Some((sample.state.clone(), sample.timestamp));
                Some(StateInterval::new(state, start, sample.timestamp))
            }
            None => {
                self.current = Some((sample.state.clone(), sample.timestamp));
                None
            }
        }
    }

    /// State of the open run, if any sample has been seen.
    pub fn current_state(&self) -> Option<&ControllerState> {
        self.current.as_ref().map(|(state, _)| state)
    }

    /// End of stream. Only yields the open run when `emit_trailing` is set.
    pub fn finish(self) -> Option<StateInterval> {
        if !self.config.emit_trailing {
            return None;
        }
        let (state, start) = self.current?;
        let end = self.last_seen.unwrap_or(start);
        Some(StateInterval::new(state, start, end))
    }
}

/// Run-length encode samples into state intervals. The trailing run is not
/// emitted; empty or single-sample input gives no intervals.
pub fn segment(samples: &[SampleRecord]) -> Vec<StateInterval> {
    segment_with(samples, &SegmentationConfig::default())
}

pub fn segment_with(samples: &[SampleRecord], config: &SegmentationConfig) -> Vec<StateInterval> {
    let mut segmenter = Segmenter::new(config.clone());
    let mut intervals: Vec<StateInterval> = samples
        .iter()
        .filter_map(|sample| segmenter.push(sample))
        .collect();
    intervals.extend(segmenter.finish());
    intervals
}

/// Group consecutive samples by state, final run included.
pub fn group_runs(samples: &[SampleRecord]) -> Vec<StateRun> {
    let mut runs = Vec::new();
    let mut current_run: Option<StateRun> = None;

    for sample in samples {
        match &mut current_run {
            Some(run) if run.state == sample.state => {
                run.last_seen = sample.timestamp;
                run.sample_count += 1;
            }
            _ => {
                if let Some(run) = current_run.take() {
                    runs.push(run);
                }
                current_run = Some(StateRun {
                    state: sample.state.clone(),
                    first_seen: sample.timestamp,
                    last_seen: sample.timestamp,
                    sample_count: 1,
                });
            }
        }
    }

    if let Some(run) = current_run {
        runs.push(run);
    }

    runs
}
