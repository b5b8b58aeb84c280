//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `fcheck` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, unknown filter column)   |
//! | 3    | Dataset could not be read or parsed                  |
//! | 4    | Dataset is missing required columns                  |
//! | 5    | Verdict side file could not be read or written       |
//! | 6    | Invalid verdict or disapproval reason                |
//! | 7    | Record id not present in the upload                  |
//! | 8    | Export failed                                        |
//! | 9    | Review profile invalid or unreadable                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the mapping functions below

use fieldcheck_config::ConfigError;
use fieldcheck_engine::ReviewError;
use fieldcheck_io::IoError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed `--filter`, unknown filter column.
pub const EXIT_USAGE: u8 = 2;

/// Upload missing, unreadable, unsupported extension, or not parseable.
pub const EXIT_DATASET: u8 = 3;

/// Upload lacks one or more required columns.
pub const EXIT_MISSING_COLUMNS: u8 = 4;

/// Verdict side file malformed, too new, or not writable.
pub const EXIT_STORE: u8 = 5;

/// Verdict text not recognized, or reason missing/unexpected/unknown.
pub const EXIT_INVALID_VERDICT: u8 = 6;

/// `mark` named an id that no uploaded row carries.
pub const EXIT_UNKNOWN_RECORD: u8 = 7;

/// Spreadsheet could not be built or written.
pub const EXIT_EXPORT: u8 = 8;

/// Review profile unreadable, malformed, or failed validation.
pub const EXIT_CONFIG: u8 = 9;

/// Map an engine error to its exit code.
pub fn review_exit_code(err: &ReviewError) -> u8 {
    match err {
        ReviewError::MissingColumns { .. } => EXIT_MISSING_COLUMNS,
        ReviewError::Empty => EXIT_DATASET,
        ReviewError::InvalidVerdict(_)
        | ReviewError::MissingReason { .. }
        | ReviewError::UnexpectedReason { .. }
        | ReviewError::UnknownReason { .. } => EXIT_INVALID_VERDICT,
        ReviewError::UnknownRecord { .. } => EXIT_UNKNOWN_RECORD,
        ReviewError::UnknownFilterColumn(_) => EXIT_USAGE,
        ReviewError::TooManyFilterColumns { .. } | ReviewError::InvalidPageSize => EXIT_CONFIG,
        ReviewError::PendingEdits { .. } => EXIT_EXPORT,
    }
}

/// Map an upload I/O error to its exit code. Side-file and export failures
/// are mapped by the caller, which knows the domain.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::UnsupportedFormat { .. } | IoError::Parse { .. } => EXIT_DATASET,
        IoError::Write { .. } => EXIT_ERROR,
        IoError::Store { .. } | IoError::StoreVersion { .. } => EXIT_STORE,
        IoError::Export(_) => EXIT_EXPORT,
        IoError::Review(e) => review_exit_code(e),
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn review_errors_map_to_documented_codes() {
        let missing = ReviewError::MissingColumns { columns: vec!["Ward".into()] };
        assert_eq!(review_exit_code(&missing), 4);
        assert_eq!(review_exit_code(&ReviewError::InvalidVerdict("meh".into())), 6);
        assert_eq!(review_exit_code(&ReviewError::MissingReason { id: "P1".into() }), 6);
        assert_eq!(review_exit_code(&ReviewError::UnknownRecord { id: "P9".into() }), 7);
        assert_eq!(review_exit_code(&ReviewError::UnknownFilterColumn("City".into())), 2);
        assert_eq!(review_exit_code(&ReviewError::PendingEdits { count: 1 }), 8);
    }

    #[test]
    fn io_errors_map_by_domain() {
        let path = PathBuf::from("x");
        assert_eq!(io_exit_code(&IoError::UnsupportedFormat { path: path.clone() }), 3);
        assert_eq!(io_exit_code(&IoError::Parse { path: path.clone(), message: String::new() }), 3);
        assert_eq!(io_exit_code(&IoError::StoreVersion { path, found: 2, supported: 1 }), 5);
        assert_eq!(
            io_exit_code(&IoError::Review(ReviewError::MissingColumns { columns: vec![] })),
            4
        );
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_DATASET, EXIT_MISSING_COLUMNS,
            EXIT_STORE, EXIT_INVALID_VERDICT, EXIT_UNKNOWN_RECORD, EXIT_EXPORT, EXIT_CONFIG,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
