// Configuration loading

pub mod error;
pub mod profile;

pub use error::ConfigError;
pub use profile::{ExportProfile, ReviewProfile};
