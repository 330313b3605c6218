use chrono::{Duration, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::classifier::classify;
use super::config_state::ConfigState;
use super::errors::ParseError;
use super::parser::{parse, ParseContext, ParsedRecord};
use super::profile::DecodeProfile;
use crate::models::{ConfigRecord, SampleRecord, Timestamp};

// Set to true to log rejected lines and config swaps
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// What one line turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Config(Arc<ConfigRecord>),
    Sample(SampleRecord),
    Message(String),
    Blank,
    Rejected(ParseError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeStats {
    pub lines: u64,
    pub samples: u64,
    pub configs: u64,
    pub messages: u64,
    pub blanks: u64,
    pub malformed_configs: u64,
    pub malformed_samples: u64,
}

impl DecodeStats {
    pub fn rejected(&self) -> u64 {
        self.malformed_configs + self.malformed_samples
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleStamp {
    Sequence,
    WallClock,
}

/// A backwards clock step larger than this is a midnight rollover; anything
/// smaller is a line logged out of order.
const ROLLOVER_MIN_JUMP_HOURS: i64 = 12;

/// Logger clock times carry no date; bump a day counter when the clock jumps
/// back across midnight so a log spanning days stays ordered.
#[derive(Debug, Default)]
struct ClockTracker {
    day: u32,
    last: Option<NaiveTime>,
}

impl ClockTracker {
    fn stamp(&mut self, time: NaiveTime) -> Timestamp {
        if let Some(last) = self.last {
            if last - time > Duration::hours(ROLLOVER_MIN_JUMP_HOURS) {
                self.day += 1;
                log_debug!("clock went from {last} to {time}, assuming day {}", self.day);
            }
        }
        self.last = Some(time);
        Timestamp::Clock {
            day: self.day,
            time,
        }
    }
}

/// Line-at-a-time decoder shared by file replay and live sessions.
///
/// Owns the config state: a parsed config replaces it, a malformed one is
/// reported and leaves it untouched.
#[derive(Debug)]
pub struct Decoder {
    profile: DecodeProfile,
    config: ConfigState,
    stats: DecodeStats,
    clock: ClockTracker,
    stamp: SampleStamp,
}

impl Decoder {
    pub fn new(profile: DecodeProfile) -> Self {
        Self::with_config_state(profile, ConfigState::new())
    }

    /// Decoder writing into an existing, possibly shared, config state.
    pub fn with_config_state(profile: DecodeProfile, config: ConfigState) -> Self {
        Self {
            profile,
            config,
            stats: DecodeStats::default(),
            clock: ClockTracker::default(),
            stamp: SampleStamp::Sequence,
        }
    }

    /// Stamp CSV samples with receive time instead of their stream index.
    pub fn with_wall_clock(mut self) -> Self {
        self.stamp = SampleStamp::WallClock;
        self
    }

    pub fn profile(&self) -> DecodeProfile {
        self.profile
    }

    pub fn config_state(&self) -> &ConfigState {
        &self.config
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn feed(&mut self, line: &str) -> Decoded {
        self.stats.lines += 1;
        let line_no = self.stats.lines;

        let ctx = ParseContext {
            config: self.config.current(),
            profile: self.profile,
            fallback_timestamp: match self.stamp {
                SampleStamp::Sequence => Timestamp::Sequence(self.stats.samples),
                SampleStamp::WallClock => Timestamp::Wall(Utc::now()),
            },
        };

        let classified = classify(line);
        match parse(&classified, &ctx) {
            Ok(ParsedRecord::Config(record)) => {
                self.stats.configs += 1;
                let record = self.config.replace(record);
                log_debug!("line {line_no}: config now {}", record.to_wire());
                Decoded::Config(record)
            }
            Ok(ParsedRecord::Sample(mut sample)) => {
                self.stats.samples += 1;
                if let Timestamp::Clock { time, .. } = sample.timestamp {
                    sample.timestamp = self.clock.stamp(time);
                }
                if !sample.counts_within_config() {
                    log_debug!(
                        "line {line_no}: counters {}/{} exceed config",
                        sample.day_count,
                        sample.sleep_count
                    );
                }
                Decoded::Sample(sample)
            }
            Ok(ParsedRecord::Message(text)) => {
                self.stats.messages += 1;
                Decoded::Message(text)
            }
            Ok(ParsedRecord::Blank) => {
                self.stats.blanks += 1;
                Decoded::Blank
            }
            Err(err) => {
                if err.is_config() {
                    self.stats.malformed_configs += 1;
                    log_warn!("line {line_no}: {err}; keeping previous config");
                } else {
                    self.stats.malformed_samples += 1;
                    log_warn!("line {line_no}: {err}; line dropped");
                }
                Decoded::Rejected(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ControllerState, StateCode};

    fn expect_sample(decoded: Decoded) -> SampleRecord {
        match decoded {
            Decoded::Sample(sample) => sample,
            other => panic!("expected sample, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_config_keeps_previous() {
        let mut decoder = Decoder::new(DecodeProfile::Pic);
        assert!(matches!(
            decoder.feed("C:200,200,5,3,100,50,50,40,10"),
            Decoded::Config(_)
        ));

        let rejected = decoder.feed("C:300,300,5,3,100,50,50,40");
        assert!(matches!(
            rejected,
            Decoded::Rejected(ParseError::MalformedConfig { .. })
        ));

        let current = decoder.config_state().current().unwrap();
        assert_eq!(current.day_threshold, 200);
        assert_eq!(decoder.stats().malformed_configs, 1);
    }

    #[test]
    fn test_samples_annotated_with_latest_config() {
        let mut decoder = Decoder::new(DecodeProfile::Pic);
        let before = expect_sample(decoder.feed("1,1,1,0,300,700,1,0,0"));
        assert!(before.config.is_none());

        decoder.feed("C:200,200,5,3,100,50,50,40,10");
        let after = expect_sample(decoder.feed("1,1,1,0,300,700,1,0,0"));
        assert_eq!(after.day_count_text(), "1/3");
    }

    #[test]
    fn test_csv_samples_get_sequence_index() {
        let mut decoder = Decoder::new(DecodeProfile::Pic);
        decoder.feed("C:200,200,5,3,100,50,50,40,10");
        decoder.feed("some message");
        let first = expect_sample(decoder.feed("1,0,0,0,10,700,0,1,0"));
        decoder.feed("1,0,0,0,10,700,0,1");
        let second = expect_sample(decoder.feed("9,0,0,0,10,700,0,1,0"));

        assert_eq!(first.timestamp, Timestamp::Sequence(0));
        assert_eq!(second.timestamp, Timestamp::Sequence(1));
        assert_eq!(second.state, ControllerState::Unknown(StateCode::Numeric(9)));
    }

    #[test]
    fn test_wall_clock_stamping() {
        let mut decoder = Decoder::new(DecodeProfile::Pic).with_wall_clock();
        let sample = expect_sample(decoder.feed("1,0,0,0,10,700,0,1,0"));
        assert!(matches!(sample.timestamp, Timestamp::Wall(_)));
    }

    #[test]
    fn test_clock_rollover() {
        let mut decoder = Decoder::new(DecodeProfile::Legacy);
        let json = r#"{"epoch":1,"state":"Sleep","next":"Sleep","day":false,"lSensorValue":0,"bSensorValue":700,"error":0}"#;
        let late = expect_sample(decoder.feed(&format!("23:59:30 {json}")));
        let early = expect_sample(decoder.feed(&format!("00:00:30 {json}")));
        assert!(early.timestamp > late.timestamp);
        assert_eq!(
            early.timestamp.duration_since(&late.timestamp),
            Some(chrono::Duration::seconds(60))
        );
    }

    #[test]
    fn test_small_backwards_step_is_not_rollover() {
        let mut decoder = Decoder::new(DecodeProfile::Legacy);
        let json = r#"{"epoch":1,"state":"Sleep","next":"Sleep","day":false,"lSensorValue":0,"bSensorValue":700,"error":0}"#;
        let first = expect_sample(decoder.feed(&format!("12:00:01 {json}")));
        let second = expect_sample(decoder.feed(&format!("12:00:00 {json}")));
        let third = expect_sample(decoder.feed(&format!("12:00:02 {json}")));

        assert!(matches!(second.timestamp, Timestamp::Clock { day: 0, .. }));
        assert_eq!(
            second.timestamp.duration_since(&first.timestamp),
            Some(chrono::Duration::seconds(-1))
        );
        assert!(matches!(third.timestamp, Timestamp::Clock { day: 0, .. }));
    }

    #[test]
    fn test_stats() {
        let mut decoder = Decoder::new(DecodeProfile::Pic);
        for line in [
            "",
            "C:200,200,5,3,100,50,50,40,10",
            "C:bad",
            "1,0,0,0,10,700,0,1,0",
            "1,0,0,0,10,700,0,7,0",
            "Faking day",
        ] {
            decoder.feed(line);
        }
        let stats = decoder.stats();
        assert_eq!(stats.lines, 6);
        assert_eq!(stats.blanks, 1);
        assert_eq!(stats.configs, 1);
        assert_eq!(stats.malformed_configs, 1);
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.malformed_samples, 1);
        assert_eq!(stats.messages, 1);
        assert_eq!(stats.rejected(), 2);
    }
}
