use serde::{Deserialize, Serialize};

use super::error_flags::ErrorBitVariant;
use crate::models::{ControllerState, StateCode};

/// Firmware revision whose numeric state codes and error bits we decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecodeProfile {
    /// Arduino build, JSON telemetry.
    Legacy,
    /// PIC build, CSV telemetry.
    #[default]
    Pic,
}

const LEGACY_STATES: [ControllerState; 5] = [
    ControllerState::Sensor,
    ControllerState::Sleep,
    ControllerState::MotorRun,
    ControllerState::MotorCheck,
    ControllerState::MotorStop,
];

const PIC_STATES: [ControllerState; 8] = [
    ControllerState::Calculate,
    ControllerState::Sleep,
    ControllerState::MotorStart,
    ControllerState::MotorRunning,
    ControllerState::MotorSlow,
    ControllerState::MotorStop,
    ControllerState::ForceUp,
    ControllerState::ForceDown,
];

impl DecodeProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeProfile::Legacy => "legacy",
            DecodeProfile::Pic => "pic",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "legacy" | "arduino" => Some(DecodeProfile::Legacy),
            "pic" => Some(DecodeProfile::Pic),
            _ => None,
        }
    }

    fn states(&self) -> &'static [ControllerState] {
        match self {
            DecodeProfile::Legacy => &LEGACY_STATES,
            DecodeProfile::Pic => &PIC_STATES,
        }
    }

    /// Map a numeric state code. Codes outside the table become `Unknown`.
    pub fn state_for_code(&self, code: i64) -> ControllerState {
        usize::try_from(code)
            .ok()
            .and_then(|index| self.states().get(index))
            .cloned()
            .unwrap_or(ControllerState::Unknown(StateCode::Numeric(code)))
    }

    /// Inverse of `state_for_code` for named states.
    pub fn code_for(&self, state: &ControllerState) -> Option<i64> {
        self.states()
            .iter()
            .position(|candidate| candidate == state)
            .and_then(|index| i64::try_from(index).ok())
    }

    /// Meaning of error bit 0x01 on this firmware.
    pub fn error_bits(&self) -> ErrorBitVariant {
        match self {
            DecodeProfile::Legacy => ErrorBitVariant::SensorPair,
            DecodeProfile::Pic => ErrorBitVariant::LimitSwitch,
        }
    }
}
