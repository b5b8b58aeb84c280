use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read profile {}: {message}", path.display())
            }
            Self::Parse(msg) => write!(f, "profile parse error: {msg}"),
            Self::Validation(msg) => write!(f, "profile validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
