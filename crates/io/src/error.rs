use std::fmt;
use std::path::{Path, PathBuf};

use fieldcheck_engine::ReviewError;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or read.
    Read { path: PathBuf, message: String },
    /// File could not be written.
    Write { path: PathBuf, message: String },
    /// Extension is not a supported upload format.
    UnsupportedFormat { path: PathBuf },
    /// Delimited text or workbook content could not be parsed.
    Parse { path: PathBuf, message: String },
    /// Verdict side file is malformed.
    Store { path: PathBuf, message: String },
    /// Verdict side file was written by a newer version.
    StoreVersion { path: PathBuf, found: u32, supported: u32 },
    /// Spreadsheet writer failure.
    Export(String),
    /// Upload failed validation.
    Review(ReviewError),
}

impl IoError {
    pub(crate) fn read(path: &Path, e: impl fmt::Display) -> Self {
        Self::Read { path: path.to_path_buf(), message: e.to_string() }
    }

    pub(crate) fn write(path: &Path, e: impl fmt::Display) -> Self {
        Self::Write { path: path.to_path_buf(), message: e.to_string() }
    }

    pub(crate) fn parse(path: &Path, e: impl fmt::Display) -> Self {
        Self::Parse { path: path.to_path_buf(), message: e.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::UnsupportedFormat { path } => write!(
                f,
                "unsupported file type: {} (expected .csv, .tsv, .xlsx, .xls, .xlsb or .ods)",
                path.display()
            ),
            Self::Parse { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Store { path, message } => {
                write!(f, "verdict file {} is invalid: {message}", path.display())
            }
            Self::StoreVersion { path, found, supported } => write!(
                f,
                "verdict file {} has version {found}, this build reads up to {supported}",
                path.display()
            ),
            Self::Export(message) => write!(f, "export failed: {message}"),
            Self::Review(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Review(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReviewError> for IoError {
    fn from(e: ReviewError) -> Self {
        Self::Review(e)
    }
}
