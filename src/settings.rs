use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::decoding::{DecodeProfile, ErrorBitVariant};
use crate::segmentation::SegmentationConfig;
use crate::signal::validate_alpha;

/// Overrides `profile` when set, e.g. `DOORWATCH_PROFILE=legacy`.
pub const PROFILE_ENV: &str = "DOORWATCH_PROFILE";

const DEFAULT_FILTER_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub profile: DecodeProfile,
    /// Meaning of error bit 0x01. Follows `profile` when unset.
    pub error_bits: Option<ErrorBitVariant>,
    pub filter_alpha: f64,
    pub emit_trailing_interval: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: DecodeProfile::default(),
            error_bits: None,
            filter_alpha: DEFAULT_FILTER_ALPHA,
            emit_trailing_interval: false,
        }
    }
}

impl Settings {
    /// Load from a JSON file. A missing file yields defaults; a present but
    /// unreadable or invalid one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            Settings::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(err) = validate_alpha(self.filter_alpha) {
            bail!("invalid settings: {err}");
        }
        Ok(())
    }

    /// Apply `DOORWATCH_PROFILE` if it is set.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(PROFILE_ENV) {
            self.profile = DecodeProfile::parse(&value)
                .with_context(|| format!("{PROFILE_ENV}={value} is not a known profile"))?;
        }
        Ok(self)
    }

    pub fn error_bit_variant(&self) -> ErrorBitVariant {
        self.error_bits.unwrap_or_else(|| self.profile.error_bits())
    }

    pub fn segmentation(&self) -> SegmentationConfig {
        SegmentationConfig {
            emit_trailing: self.emit_trailing_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("doorwatch-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load(&temp_path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.error_bit_variant(), ErrorBitVariant::LimitSwitch);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path();
        fs::write(&path, r#"{"profile":"legacy","filterAlpha":0.1}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.profile, DecodeProfile::Legacy);
        assert_eq!(settings.filter_alpha, 0.1);
        assert!(!settings.emit_trailing_interval);
        assert_eq!(settings.error_bit_variant(), ErrorBitVariant::SensorPair);
    }

    #[test]
    fn test_error_bits_override() {
        let settings = Settings {
            profile: DecodeProfile::Legacy,
            error_bits: Some(ErrorBitVariant::LimitSwitch),
            ..Settings::default()
        };
        assert_eq!(settings.error_bit_variant(), ErrorBitVariant::LimitSwitch);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let path = temp_path();
        fs::write(&path, r#"{"filterAlpha":2.0}"#).unwrap();
        let result = Settings::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path();
        let settings = Settings {
            emit_trailing_interval: true,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
        assert!(loaded.segmentation().emit_trailing);
    }
}
