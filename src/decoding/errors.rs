//! Error types for line decoding

/// Why a telemetry line was rejected. Always recoverable: the caller logs it
/// and moves on to the next line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Wrong field count or non-integer field in a `C:` line. The previous
    /// config stays in effect.
    #[error("malformed config: {reason}")]
    MalformedConfig { reason: String },

    /// Wrong field count or type in a sample line. The line is dropped.
    /// `field` is the zero-based position of the offending CSV field.
    #[error("malformed sample: {reason}")]
    MalformedSample { field: Option<usize>, reason: String },
}

impl ParseError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        ParseError::MalformedConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn sample(reason: impl Into<String>) -> Self {
        ParseError::MalformedSample {
            field: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn sample_field(field: usize, reason: impl Into<String>) -> Self {
        ParseError::MalformedSample {
            field: Some(field),
            reason: reason.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ParseError::MalformedConfig { .. })
    }
}
