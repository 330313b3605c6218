pub mod classifier;
pub mod config_state;
pub mod decoder;
pub mod error_flags;
pub mod errors;
pub mod parser;
pub mod profile;

pub use classifier::{classify, ClassifiedLine, LineKind};
pub use config_state::ConfigState;
pub use decoder::{DecodeStats, Decoded, Decoder};
pub use error_flags::{decode_errors, ErrorBitVariant, NO_ERRORS};
pub use errors::ParseError;
pub use parser::{parse, parse_config, ParseContext, ParsedRecord};
pub use profile::DecodeProfile;
