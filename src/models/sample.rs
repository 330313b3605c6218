use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ConfigRecord, ControllerState, StateCode, Timestamp};
use crate::decoding::{decode_errors, DecodeProfile, ErrorBitVariant};

/// ADC reference voltage on the controller board.
const ADC_REFERENCE_VOLTS: f64 = 3.3;
const ADC_FULL_SCALE: f64 = 1023.0;
/// The battery input is attenuated to 2/3 by a resistor divider.
const BATTERY_DIVIDER: f64 = 2.0 / 3.0;

/// One controller observation, normalised across wire formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub timestamp: Timestamp,
    /// Controller tick counter. Only the JSON firmware reports it.
    pub epoch: Option<u64>,
    pub state: ControllerState,
    /// Only the JSON firmware reports the pending state.
    pub next_state: Option<ControllerState>,
    pub is_day: bool,
    pub day_count: u16,
    pub sleep_count: u16,
    pub motor_running_count: Option<u32>,
    pub light_sensor: u16,
    pub battery_sensor: u16,
    pub upper_limit_closed: bool,
    /// `bSensorClosed` on the JSON firmware, the limit switch on the CSV one.
    pub lower_limit_closed: bool,
    pub error_flags: u16,
    /// Config in effect when this sample was decoded.
    #[serde(skip)]
    pub config: Option<Arc<ConfigRecord>>,
}

impl SampleRecord {
    /// "Day"/"Night", with `*` while a day confirmation is pending.
    pub fn day_text(&self) -> String {
        let mut text = if self.is_day { "Day" } else { "Night" }.to_string();
        if let Some(config) = &self.config {
            if self.day_count > 0 && self.day_count < config.day_count {
                text.push('*');
            }
        }
        text
    }

    /// Day counter against the configured target, e.g. `2/3`.
    pub fn day_count_text(&self) -> String {
        match &self.config {
            Some(config) => format!("{}/{}", self.day_count, config.day_count),
            None => self.day_count.to_string(),
        }
    }

    /// One character per configured sleep: `*` for sleeps done, `.` for the rest.
    pub fn sleep_text(&self) -> String {
        let configured = self.config.as_ref().map_or(0, |config| config.sleep_count);
        let width = configured.max(self.sleep_count);
        (0..width)
            .map(|i| if i < self.sleep_count { '*' } else { '.' })
            .collect()
    }

    /// Light reading against the day threshold, e.g. `180/200`.
    pub fn light_text(&self) -> String {
        match &self.config {
            Some(config) => format!("{}/{}", self.light_sensor, config.day_threshold),
            None => self.light_sensor.to_string(),
        }
    }

    pub fn light_volts(&self) -> f64 {
        f64::from(self.light_sensor) / ADC_FULL_SCALE * ADC_REFERENCE_VOLTS
    }

    pub fn battery_volts(&self) -> f64 {
        f64::from(self.battery_sensor) / BATTERY_DIVIDER / ADC_FULL_SCALE * ADC_REFERENCE_VOLTS
    }

    pub fn error_labels(&self, variant: ErrorBitVariant) -> Vec<&'static str> {
        decode_errors(u32::from(self.error_flags), variant)
    }

    /// Whether the hysteresis counters stay within the attached config.
    /// Always true without a config.
    pub fn counts_within_config(&self) -> bool {
        match &self.config {
            Some(config) => {
                self.day_count <= config.day_count && self.sleep_count <= config.sleep_count
            }
            None => true,
        }
    }

    /// Re-emit the nine positional CSV fields. `None` when the state has no
    /// numeric code under `profile`.
    pub fn to_csv_fields(&self, profile: DecodeProfile) -> Option<[String; 9]> {
        let code = match &self.state {
            ControllerState::Unknown(StateCode::Numeric(code)) => *code,
            ControllerState::Unknown(StateCode::Named(_)) => return None,
            known => profile.code_for(known)?,
        };
        Some([
            code.to_string(),
            flag(self.is_day).to_string(),
            self.day_count.to_string(),
            self.sleep_count.to_string(),
            self.light_sensor.to_string(),
            self.battery_sensor.to_string(),
            flag(self.upper_limit_closed).to_string(),
            flag(self.lower_limit_closed).to_string(),
            self.error_flags.to_string(),
        ])
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}
