pub mod command;
pub mod controller;
pub mod loop_worker;

pub use command::{send_command, DoorCommand};
pub use controller::{LiveSession, LiveSummary};
pub use loop_worker::{LineProcessor, LiveEvent, LiveSnapshot};
