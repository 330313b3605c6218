pub mod config;
pub mod interval;
pub mod sample;
pub mod state;
pub mod timestamp;

pub use config::{ConfigRecord, CONFIG_FIELD_COUNT};
pub use interval::{StateInterval, StateRun};
pub use sample::SampleRecord;
pub use state::{ControllerState, StateCode};
pub use timestamp::Timestamp;
