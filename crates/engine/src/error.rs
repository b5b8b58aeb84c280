use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Upload lacks one or more required columns (sorted, deduplicated).
    MissingColumns { columns: Vec<String> },
    /// Upload has no header row at all.
    Empty,
    /// Verdict text did not parse.
    InvalidVerdict(String),
    /// `Incorrect` was given without a disapproval reason.
    MissingReason { id: String },
    /// A reason was given for a verdict that does not take one.
    UnexpectedReason { id: String, verdict: String },
    /// Reason is not in the configured catalog.
    UnknownReason { reason: String },
    /// No uploaded row carries this record identifier.
    UnknownRecord { id: String },
    /// Filter column is not one of the configured filter columns.
    UnknownFilterColumn(String),
    /// More filter columns configured than the engine supports.
    TooManyFilterColumns { count: usize, max: usize },
    /// Page size of zero.
    InvalidPageSize,
    /// Export requested while in-session edits are uncommitted.
    PendingEdits { count: usize },
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns { columns } => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            Self::Empty => write!(f, "file has no header row"),
            Self::InvalidVerdict(value) => write!(
                f,
                "invalid verdict '{value}' (expected one of: not_yet_updated, not_reviewed, correct, incorrect)"
            ),
            Self::MissingReason { id } => {
                write!(f, "record '{id}': a disapproval reason is required for Incorrect")
            }
            Self::UnexpectedReason { id, verdict } => {
                write!(f, "record '{id}': verdict '{verdict}' does not take a reason")
            }
            Self::UnknownReason { reason } => write!(f, "unknown disapproval reason '{reason}'"),
            Self::UnknownRecord { id } => write!(f, "no uploaded row has id '{id}'"),
            Self::UnknownFilterColumn(column) => write!(f, "'{column}' is not a filter column"),
            Self::TooManyFilterColumns { count, max } => {
                write!(f, "{count} filter columns configured, at most {max} supported")
            }
            Self::InvalidPageSize => write!(f, "page size must be at least 1"),
            Self::PendingEdits { count } => {
                write!(f, "{count} uncommitted edit(s); commit before exporting")
            }
        }
    }
}

impl std::error::Error for ReviewError {}
