pub mod algorithm;
pub mod config;

pub use algorithm::{group_runs, segment, segment_with, Segmenter};
pub use config::SegmentationConfig;
