use serde::{Deserialize, Serialize};

/// Label returned when no known error bit is set.
pub const NO_ERRORS: &str = "none";

/// Meaning of error bit 0x01, which the two firmware revisions disagree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorBitVariant {
    /// Upper and lower door sensors both read closed.
    SensorPair,
    /// Limit switch closed.
    LimitSwitch,
}

const SENSOR_UP_WHILE_NIGHT: u32 = 0x02;
const SENSOR_DOWN_WHILE_DAY: u32 = 0x04;
const MOTOR_RAN_TOO_LONG: u32 = 0x08;
const BIT_ONE: u32 = 0x01;

/// Decode an error bitfield into labels, lowest bit first.
///
/// Bits outside the table are ignored. The result is never empty: with no
/// known bit set it is `[NO_ERRORS]`.
pub fn decode_errors(bits: u32, variant: ErrorBitVariant) -> Vec<&'static str> {
    let bit_one = match variant {
        ErrorBitVariant::SensorPair => "both sensors closed",
        ErrorBitVariant::LimitSwitch => "limit switch closed",
    };
    let table = [
        (BIT_ONE, bit_one),
        (SENSOR_UP_WHILE_NIGHT, "sensor up while night"),
        (SENSOR_DOWN_WHILE_DAY, "sensor down while day"),
        (MOTOR_RAN_TOO_LONG, "motor ran too long"),
    ];

    let labels: Vec<&'static str> = table
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, label)| *label)
        .collect();

    if labels.is_empty() {
        vec![NO_ERRORS]
    } else {
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_none() {
        assert_eq!(decode_errors(0, ErrorBitVariant::LimitSwitch), vec![NO_ERRORS]);
    }

    #[test]
    fn test_fixed_order() {
        assert_eq!(
            decode_errors(0x05, ErrorBitVariant::SensorPair),
            vec!["both sensors closed", "sensor down while day"]
        );
        assert_eq!(
            decode_errors(0x05, ErrorBitVariant::LimitSwitch),
            vec!["limit switch closed", "sensor down while day"]
        );
    }

    #[test]
    fn test_unknown_bits_ignored() {
        assert_eq!(decode_errors(0x10, ErrorBitVariant::SensorPair), vec![NO_ERRORS]);
        assert_eq!(
            decode_errors(0x18, ErrorBitVariant::SensorPair),
            vec!["motor ran too long"]
        );
    }
}
