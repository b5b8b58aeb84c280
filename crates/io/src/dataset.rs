// Upload dispatch: pick a reader by extension, then validate.

use std::path::Path;

use fieldcheck_engine::{Dataset, LoadReport, RawTable};

use crate::error::IoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Delimited,
    Workbook,
}

impl UploadFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Read and validate an upload.
///
/// Fails fast when the file cannot be parsed or when any of `required`
/// (or `id_column`) is missing from the header row.
pub fn load_dataset(
    path: &Path,
    id_column: &str,
    required: &[String],
) -> Result<(Dataset, LoadReport), IoError> {
    let format = UploadFormat::from_path(path)
        .ok_or_else(|| IoError::UnsupportedFormat { path: path.to_path_buf() })?;

    let (table, delimiter, sheet): (RawTable, Option<char>, Option<String>) = match format {
        UploadFormat::Delimited => {
            let (table, delim) = crate::csv::import(path)?;
            (table, Some(delim as char), None)
        }
        UploadFormat::Workbook => {
            let (table, sheet) = crate::workbook::import(path)?;
            (table, None, Some(sheet))
        }
    };

    let (dataset, mut report) = Dataset::from_table(table, id_column, required)?;
    report.delimiter = delimiter;
    report.sheet = sheet;

    log::info!("loaded {} rows from {}", report.rows_loaded, path.display());
    Ok((dataset, report))
}
