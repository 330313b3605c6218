use serde::{Deserialize, Serialize};

/// Number of positional fields in a `C:` config line.
pub const CONFIG_FIELD_COUNT: usize = 9;

/// Controller tuning snapshot, as printed by the firmware every few sleeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    pub day_threshold: u16,
    pub night_threshold: u16,
    /// Sleeps to wait before re-reading the light sensor.
    pub sleep_count: u16,
    /// Consecutive readings required to confirm a day/night change.
    pub day_count: u16,
    pub motor_full_speed: u16,
    pub motor_half_speed: u16,
    pub max_motor_count: u16,
    pub motor_down_full_count: u16,
    pub motor_down_slow_count: u16,
}

impl ConfigRecord {
    /// Build from the nine fields in wire order.
    pub fn from_fields(fields: [u16; CONFIG_FIELD_COUNT]) -> Self {
        let [day_threshold, night_threshold, sleep_count, day_count, motor_full_speed, motor_half_speed, max_motor_count, motor_down_full_count, motor_down_slow_count] =
            fields;
        Self {
            day_threshold,
            night_threshold,
            sleep_count,
            day_count,
            motor_full_speed,
            motor_half_speed,
            max_motor_count,
            motor_down_full_count,
            motor_down_slow_count,
        }
    }

    pub fn fields(&self) -> [u16; CONFIG_FIELD_COUNT] {
        [
            self.day_threshold,
            self.night_threshold,
            self.sleep_count,
            self.day_count,
            self.motor_full_speed,
            self.motor_half_speed,
            self.max_motor_count,
            self.motor_down_full_count,
            self.motor_down_slow_count,
        ]
    }

    /// Render back to the `C:` wire form, without line terminator.
    pub fn to_wire(&self) -> String {
        let fields: Vec<String> = self.fields().iter().map(u16::to_string).collect();
        format!("C:{}", fields.join(","))
    }
}
