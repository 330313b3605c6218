use chrono::NaiveTime;

use crate::models::Timestamp;

/// Prefix of a config line on the CSV firmware.
pub const CONFIG_PREFIX: &str = "C:";
/// Number of positional fields in a CSV sample line.
pub const SAMPLE_FIELD_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Blank,
    ConfigCsv,
    JsonSample,
    JsonSampleWithTimestamp,
    CsvSample,
    Message,
}

/// A line tagged with its kind and the payload the parser needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine<'a> {
    Blank,
    /// Text after the `C:` prefix.
    ConfigCsv(&'a str),
    JsonSample(&'a str),
    JsonSampleWithTimestamp { time: NaiveTime, json: &'a str },
    CsvSample([&'a str; SAMPLE_FIELD_COUNT]),
    /// Free text from the controller, e.g. "Faking day".
    Message(&'a str),
}

impl ClassifiedLine<'_> {
    pub fn kind(&self) -> LineKind {
        match self {
            ClassifiedLine::Blank => LineKind::Blank,
            ClassifiedLine::ConfigCsv(_) => LineKind::ConfigCsv,
            ClassifiedLine::JsonSample(_) => LineKind::JsonSample,
            ClassifiedLine::JsonSampleWithTimestamp { .. } => LineKind::JsonSampleWithTimestamp,
            ClassifiedLine::CsvSample(_) => LineKind::CsvSample,
            ClassifiedLine::Message(_) => LineKind::Message,
        }
    }
}

/// Classify one raw line. Never fails: anything unrecognised is a `Message`.
pub fn classify(line: &str) -> ClassifiedLine<'_> {
    let text = line.trim();
    if text.is_empty() {
        return ClassifiedLine::Blank;
    }

    if let Some(payload) = text.strip_prefix(CONFIG_PREFIX) {
        return ClassifiedLine::ConfigCsv(payload);
    }

    if text.starts_with('{') && text.ends_with('}') {
        return ClassifiedLine::JsonSample(text);
    }

    if let Some((left, right)) = text.split_once(' ') {
        if right.starts_with('{') {
            if let Some(time) = Timestamp::parse_clock(left) {
                return ClassifiedLine::JsonSampleWithTimestamp { time, json: right };
            }
        }
    }

    if let Some(fields) = csv_sample_fields(text) {
        return ClassifiedLine::CsvSample(fields);
    }

    ClassifiedLine::Message(text)
}

fn csv_sample_fields(text: &str) -> Option<[&str; SAMPLE_FIELD_COUNT]> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if !fields.iter().all(|field| looks_like_integer(field)) {
        return None;
    }
    fields.try_into().ok()
}

fn looks_like_integer(field: &str) -> bool {
    let digits = field.strip_prefix('-').unwrap_or(field);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
