use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use super::classifier::{ClassifiedLine, SAMPLE_FIELD_COUNT};
use super::errors::ParseError;
use super::profile::DecodeProfile;
use crate::models::{ConfigRecord, ControllerState, SampleRecord, Timestamp, CONFIG_FIELD_COUNT};

/// Outcome of parsing one classified line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    Config(ConfigRecord),
    Sample(SampleRecord),
    Message(String),
    Blank,
}

/// Everything a parse needs besides the line itself.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Config in effect; attached to samples, never modified here.
    pub config: Option<Arc<ConfigRecord>>,
    pub profile: DecodeProfile,
    /// Timestamp for CSV samples, which carry none on the wire.
    pub fallback_timestamp: Timestamp,
}

impl ParseContext {
    pub fn new(profile: DecodeProfile) -> Self {
        Self {
            config: None,
            profile,
            fallback_timestamp: Timestamp::Sequence(0),
        }
    }
}

pub fn parse(line: &ClassifiedLine<'_>, ctx: &ParseContext) -> Result<ParsedRecord, ParseError> {
    match line {
        ClassifiedLine::Blank => Ok(ParsedRecord::Blank),
        ClassifiedLine::Message(text) => Ok(ParsedRecord::Message((*text).to_string())),
        ClassifiedLine::ConfigCsv(payload) => parse_config(payload).map(ParsedRecord::Config),
        ClassifiedLine::JsonSample(json) => parse_json_sample(json, None, ctx).map(ParsedRecord::Sample),
        ClassifiedLine::JsonSampleWithTimestamp { time, json } => {
            parse_json_sample(json, Some(Timestamp::clock(*time)), ctx).map(ParsedRecord::Sample)
        }
        ClassifiedLine::CsvSample(fields) => parse_csv_sample(fields, ctx).map(ParsedRecord::Sample),
    }
}

/// Parse the payload of a `C:` line (prefix already stripped).
pub fn parse_config(payload: &str) -> Result<ConfigRecord, ParseError> {
    let parts: Vec<&str> = payload.trim().split(',').map(str::trim).collect();
    if parts.len() != CONFIG_FIELD_COUNT {
        return Err(ParseError::config(format!(
            "expected {CONFIG_FIELD_COUNT} fields, got {}",
            parts.len()
        )));
    }

    let mut fields = [0u16; CONFIG_FIELD_COUNT];
    for (index, part) in parts.iter().enumerate() {
        fields[index] = part.parse().map_err(|_| {
            ParseError::config(format!("field {index} ('{part}') is not an unsigned integer"))
        })?;
    }
    Ok(ConfigRecord::from_fields(fields))
}

/// State as either firmware prints it: a numeric code or a name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawState {
    Code(i64),
    Name(String),
}

impl RawState {
    fn resolve(self, profile: DecodeProfile) -> ControllerState {
        match self {
            RawState::Code(code) => profile.state_for_code(code),
            RawState::Name(name) => ControllerState::from_name(&name),
        }
    }
}

/// ArduinoJson prints booleans, older builds printed 0/1.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(u8),
}

impl Default for RawFlag {
    fn default() -> Self {
        RawFlag::Bool(false)
    }
}

impl RawFlag {
    fn resolve(self, key: &str) -> Result<bool, ParseError> {
        match self {
            RawFlag::Bool(value) => Ok(value),
            RawFlag::Int(0) => Ok(false),
            RawFlag::Int(1) => Ok(true),
            RawFlag::Int(other) => Err(ParseError::sample(format!(
                "'{key}' must be a boolean or 0/1, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonSample {
    epoch: u64,
    state: RawState,
    next: RawState,
    day: RawFlag,
    l_sensor_value: u16,
    b_sensor_value: u16,
    error: u16,
    #[serde(default)]
    day_count: u16,
    #[serde(default)]
    sleep_count: u16,
    #[serde(default)]
    motor_running_count: Option<u32>,
    #[serde(default)]
    u_sensor_closed: RawFlag,
    #[serde(default)]
    b_sensor_closed: RawFlag,
}

fn parse_json_sample(
    json: &str,
    clock: Option<Timestamp>,
    ctx: &ParseContext,
) -> Result<SampleRecord, ParseError> {
    let raw: JsonSample =
        serde_json::from_str(json).map_err(|err| ParseError::sample(err.to_string()))?;

    Ok(SampleRecord {
        timestamp: clock.unwrap_or(Timestamp::Sequence(raw.epoch)),
        epoch: Some(raw.epoch),
        state: raw.state.resolve(ctx.profile),
        next_state: Some(raw.next.resolve(ctx.profile)),
        is_day: raw.day.resolve("day")?,
        day_count: raw.day_count,
        sleep_count: raw.sleep_count,
        motor_running_count: raw.motor_running_count,
        light_sensor: raw.l_sensor_value,
        battery_sensor: raw.b_sensor_value,
        upper_limit_closed: raw.u_sensor_closed.resolve("uSensorClosed")?,
        lower_limit_closed: raw.b_sensor_closed.resolve("bSensorClosed")?,
        error_flags: raw.error,
        config: ctx.config.clone(),
    })
}

const CSV_FIELD_NAMES: [&str; SAMPLE_FIELD_COUNT] = [
    "state",
    "day",
    "dayCount",
    "sleepCount",
    "lSensor",
    "bSensor",
    "uSensor",
    "limitSwitch",
    "error",
];

fn parse_csv_sample(
    fields: &[&str; SAMPLE_FIELD_COUNT],
    ctx: &ParseContext,
) -> Result<SampleRecord, ParseError> {
    let code: i64 = int_field(fields, 0)?;

    Ok(SampleRecord {
        timestamp: ctx.fallback_timestamp,
        epoch: None,
        state: ctx.profile.state_for_code(code),
        next_state: None,
        is_day: flag_field(fields, 1)?,
        day_count: int_field(fields, 2)?,
        sleep_count: int_field(fields, 3)?,
        motor_running_count: None,
        light_sensor: int_field(fields, 4)?,
        battery_sensor: int_field(fields, 5)?,
        upper_limit_closed: flag_field(fields, 6)?,
        lower_limit_closed: flag_field(fields, 7)?,
        error_flags: int_field(fields, 8)?,
        config: ctx.config.clone(),
    })
}

fn int_field<T: FromStr>(fields: &[&str; SAMPLE_FIELD_COUNT], index: usize) -> Result<T, ParseError> {
    let text = fields[index];
    text.parse().map_err(|_| {
        ParseError::sample_field(
            index,
            format!(
                "field {index} ({}) has value '{text}', expected {}",
                CSV_FIELD_NAMES[index],
                std::any::type_name::<T>()
            ),
        )
    })
}

fn flag_field(fields: &[&str; SAMPLE_FIELD_COUNT], index: usize) -> Result<bool, ParseError> {
    match fields[index] {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ParseError::sample_field(
            index,
            format!(
                "field {index} ({}) has value '{other}', expected 0 or 1",
                CSV_FIELD_NAMES[index]
            ),
        )),
    }
}
