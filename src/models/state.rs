use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw state code as it appeared on the wire, kept for states we can't name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateCode {
    Numeric(i64),
    Named(String),
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateCode::Numeric(code) => write!(f, "{code}"),
            StateCode::Named(name) => f.write_str(name),
        }
    }
}

/// Controller FSM state.
///
/// Covers both firmware revisions: the Arduino build reports
/// `Sensor/Sleep/MotorRun/MotorCheck/MotorStop`, the PIC build reports
/// `Calculate/Sleep/MotorStart/MotorRunning/MotorSlow/MotorStop/ForceUp/ForceDown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControllerState {
    Calculate,
    Sensor,
    Sleep,
    MotorStart,
    MotorRunning,
    MotorSlow,
    MotorStop,
    MotorRun,
    MotorCheck,
    ForceUp,
    ForceDown,
    Unknown(StateCode),
}

const NAMED_STATES: [ControllerState; 11] = [
    ControllerState::Calculate,
    ControllerState::Sensor,
    ControllerState::Sleep,
    ControllerState::MotorStart,
    ControllerState::MotorRunning,
    ControllerState::MotorSlow,
    ControllerState::MotorStop,
    ControllerState::MotorRun,
    ControllerState::MotorCheck,
    ControllerState::ForceUp,
    ControllerState::ForceDown,
];

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Calculate => "Calculate",
            ControllerState::Sensor => "Sensor",
            ControllerState::Sleep => "Sleep",
            ControllerState::MotorStart => "MotorStart",
            ControllerState::MotorRunning => "MotorRunning",
            ControllerState::MotorSlow => "MotorSlow",
            ControllerState::MotorStop => "MotorStop",
            ControllerState::MotorRun => "MotorRun",
            ControllerState::MotorCheck => "MotorCheck",
            ControllerState::ForceUp => "ForceUp",
            ControllerState::ForceDown => "ForceDown",
            ControllerState::Unknown(_) => "Unknown",
        }
    }

    /// Resolve a state name as printed by either firmware. Names are matched
    /// exactly; anything else becomes `Unknown(Named)`.
    pub fn from_name(name: &str) -> Self {
        NAMED_STATES
            .iter()
            .find(|state| state.as_str() == name)
            .cloned()
            .unwrap_or_else(|| ControllerState::Unknown(StateCode::Named(name.to_string())))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ControllerState::Unknown(_))
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Unknown(code) => write!(f, "Unknown({code})"),
            known => f.write_str(known.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_resolves_both_firmware_vocabularies() {
        assert_eq!(ControllerState::from_name("Sensor"), ControllerState::Sensor);
        assert_eq!(ControllerState::from_name("MotorCheck"), ControllerState::MotorCheck);
        assert_eq!(ControllerState::from_name("ForceDown"), ControllerState::ForceDown);
    }

    #[test]
    fn test_from_name_keeps_unrecognised_name() {
        let state = ControllerState::from_name("UNKNOWN STATE");
        assert_eq!(
            state,
            ControllerState::Unknown(StateCode::Named("UNKNOWN STATE".into()))
        );
        assert_eq!(state.to_string(), "Unknown(UNKNOWN STATE)");
    }

    #[test]
    fn test_display_numeric_unknown() {
        let state = ControllerState::Unknown(StateCode::Numeric(9));
        assert_eq!(state.to_string(), "Unknown(9)");
        assert!(state.is_unknown());
    }
}
