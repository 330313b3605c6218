use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const CLOCK_FORMAT: &str = "%H:%M:%S";

/// When a sample was observed.
///
/// A single stream only ever produces one variant, so the derived ordering
/// (variant first, then value) is only meaningful within a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Timestamp {
    /// Position in the stream: the controller epoch, or the sample index.
    Sequence(u64),
    /// Clock time from a logger prefix. `day` counts midnight rollovers.
    Clock { day: u32, time: NaiveTime },
    /// Receive time stamped by a live session.
    Wall(DateTime<Utc>),
}

impl Timestamp {
    pub fn clock(time: NaiveTime) -> Self {
        Timestamp::Clock { day: 0, time }
    }

    /// Parse a strict `HH:MM:SS` clock prefix.
    pub fn parse_clock(text: &str) -> Option<NaiveTime> {
        let bytes = text.as_bytes();
        if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
            return None;
        }
        NaiveTime::parse_from_str(text, CLOCK_FORMAT).ok()
    }

    /// Elapsed time since `earlier`. `None` for sequence positions and for
    /// mismatched variants, neither of which carries a time unit.
    pub fn duration_since(&self, earlier: &Timestamp) -> Option<Duration> {
        match (self, earlier) {
            (
                Timestamp::Clock { day, time },
                Timestamp::Clock {
                    day: earlier_day,
                    time: earlier_time,
                },
            ) => {
                let days = i64::from(*day) - i64::from(*earlier_day);
                Some(Duration::days(days) + (*time - *earlier_time))
            }
            (Timestamp::Wall(now), Timestamp::Wall(then)) => Some(*now - *then),
            _ => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Sequence(index) => write!(f, "#{index}"),
            Timestamp::Clock { day: 0, time } => write!(f, "{}", time.format(CLOCK_FORMAT)),
            Timestamp::Clock { day, time } => {
                write!(f, "+{day}d {}", time.format(CLOCK_FORMAT))
            }
            Timestamp::Wall(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_parse_clock_is_strict() {
        assert_eq!(Timestamp::parse_clock("07:05:09"), Some(hms(7, 5, 9)));
        assert_eq!(Timestamp::parse_clock("7:05:09"), None);
        assert_eq!(Timestamp::parse_clock("07-05-09"), None);
        assert_eq!(Timestamp::parse_clock("25:00:00"), None);
        assert_eq!(Timestamp::parse_clock(""), None);
    }

    #[test]
    fn test_duration_across_midnight() {
        let before = Timestamp::Clock { day: 0, time: hms(23, 59, 0) };
        let after = Timestamp::Clock { day: 1, time: hms(0, 1, 0) };
        assert!(after > before);
        assert_eq!(after.duration_since(&before), Some(Duration::minutes(2)));
    }

    #[test]
    fn test_sequence_has_no_duration() {
        let a = Timestamp::Sequence(3);
        let b = Timestamp::Sequence(10);
        assert!(b > a);
        assert_eq!(b.duration_since(&a), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::Sequence(12).to_string(), "#12");
        assert_eq!(Timestamp::clock(hms(6, 30, 0)).to_string(), "06:30:00");
        assert_eq!(
            Timestamp::Clock { day: 2, time: hms(6, 30, 0) }.to_string(),
            "+2d 06:30:00"
        );
    }
}
