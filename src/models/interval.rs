use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{ControllerState, Timestamp};

/// A reconstructed span during which the controller stayed in one state.
/// `end` is exclusive: the timestamp of the first sample in the next state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateInterval {
    pub state: ControllerState,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl StateInterval {
    pub fn new(state: ControllerState, start: Timestamp, end: Timestamp) -> Self {
        Self { state, start, end }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end.duration_since(&self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A run of consecutive samples sharing one state, with its sample count.
/// Unlike `StateInterval`, the final run of a stream is always included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRun {
    pub state: ControllerState,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub sample_count: usize,
}
