pub mod filter;

pub use filter::{filter_channels, low_pass, validate_alpha, ChannelSeries, FilterError, LowPassFilter};
