//! Exponential low-pass smoothing for the analog channels.
//!
//! `y[0] = x[0]`, `y[i] = alpha * x[i] + (1 - alpha) * y[i - 1]`, folded strictly
//! left to right so the same input always yields bit-identical output.

use serde::Serialize;

use crate::models::SampleRecord;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("cannot filter an empty series")]
    EmptyInput,

    #[error("filter alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),
}

pub fn validate_alpha(alpha: f64) -> Result<f64, FilterError> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(alpha)
    } else {
        Err(FilterError::InvalidAlpha(alpha))
    }
}

/// Streaming form of the filter. The first value passes through unchanged.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f64,
    last: Option<f64>,
}

impl LowPassFilter {
    pub fn new(alpha: f64) -> Result<Self, FilterError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            last: None,
        })
    }

    pub fn push(&mut self, value: f64) -> f64 {
        let filtered = match self.last {
            None => value,
            Some(previous) => self.alpha * value + (1.0 - self.alpha) * previous,
        };
        self.last = Some(filtered);
        filtered
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Filter a whole series. Callers must not pass an empty slice.
pub fn low_pass(raw: &[f64], alpha: f64) -> Result<Vec<f64>, FilterError> {
    if raw.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    let mut filter = LowPassFilter::new(alpha)?;
    Ok(raw.iter().map(|value| filter.push(*value)).collect())
}

/// Filtered light and battery channels, aligned 1:1 with the samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSeries {
    pub light: Vec<f64>,
    pub battery: Vec<f64>,
}

impl ChannelSeries {
    pub fn len(&self) -> usize {
        self.light.len()
    }

    pub fn is_empty(&self) -> bool {
        self.light.is_empty()
    }
}

pub fn filter_channels(samples: &[SampleRecord], alpha: f64) -> Result<ChannelSeries, FilterError> {
    let light: Vec<f64> = samples.iter().map(|s| f64::from(s.light_sensor)).collect();
    let battery: Vec<f64> = samples.iter().map(|s| f64::from(s.battery_sensor)).collect();
    Ok(ChannelSeries {
        light: low_pass(&light, alpha)?,
        battery: low_pass(&battery, alpha)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sequence() {
        let out = low_pass(&[100.0, 200.0, 200.0, 200.0], 0.5).unwrap();
        assert_eq!(out, vec![100.0, 150.0, 175.0, 187.5]);
    }

    #[test]
    fn test_alpha_one_is_identity() {
        let raw = [3.0, 9.0, -1.0, 4.5];
        assert_eq!(low_pass(&raw, 1.0).unwrap(), raw.to_vec());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(low_pass(&[], 0.5), Err(FilterError::EmptyInput));
    }

    #[test]
    fn test_invalid_alpha() {
        assert_eq!(low_pass(&[1.0], 0.0), Err(FilterError::InvalidAlpha(0.0)));
        assert_eq!(low_pass(&[1.0], 1.5), Err(FilterError::InvalidAlpha(1.5)));
        assert!(low_pass(&[1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_reproducible() {
        let raw: Vec<f64> = (0..500).map(|i| ((i * 37) % 1024) as f64).collect();
        let a = low_pass(&raw, 0.05).unwrap();
        let b = low_pass(&raw, 0.05).unwrap();
        assert_eq!(a.len(), raw.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_streaming_matches_batch() {
        let raw = [640.0, 700.0, 868.0, 812.0];
        let batch = low_pass(&raw, 0.1).unwrap();
        let mut filter = LowPassFilter::new(0.1).unwrap();
        let streamed: Vec<f64> = raw.iter().map(|v| filter.push(*v)).collect();
        assert_eq!(batch, streamed);
        assert_eq!(filter.last(), batch.last().copied());

        filter.reset();
        assert_eq!(filter.push(5.0), 5.0);
    }
}
