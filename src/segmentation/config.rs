/// Configuration for state segmentation.
#[derive(Debug, Clone, Default)]
pub struct SegmentationConfig {
    /// Also emit the final, still-open run, closed at the last sample seen.
    /// Off by default: a stream ending in `Sleep` shows no trailing interval.
    pub emit_trailing: bool,
}

impl SegmentationConfig {
    pub fn with_trailing() -> Self {
        Self {
            emit_trailing: true,
        }
    }
}
