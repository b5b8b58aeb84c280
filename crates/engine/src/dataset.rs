use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::error::ReviewError;

pub const PROJECT_ID: &str = "Project Id";
pub const RAISED_EVIDENCE: &str = "Raised Evidence";
pub const LATEST_EVIDENCE: &str = "Latest Evidence";
pub const ZONE: &str = "Zone";
pub const WARD: &str = "Ward";

/// Columns an upload must carry before it can be reviewed.
pub const DEFAULT_REQUIRED_COLUMNS: [&str; 5] =
    [PROJECT_ID, RAISED_EVIDENCE, LATEST_EVIDENCE, ZONE, WARD];

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Header + string cells as produced by a tabular reader. Row 0 of the source
/// file is `headers`; `rows` are the data rows in file order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// One uploaded row, cells aligned to the dataset headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    /// 1-based data row number in the source file (header excluded).
    pub source_row: usize,
    pub cells: Vec<String>,
}

impl Record {
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub blank_ids_skipped: usize,
    /// Identifiers that appear on more than one row, sorted.
    pub duplicate_ids: Vec<String>,
    /// Field delimiter, for delimited text uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    /// Sheet the rows were read from, for workbook uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

/// Validated upload. Every record has a non-blank identifier.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    id_column: usize,
    records: Vec<Record>,
    ids: HashSet<String>,
}

impl Dataset {
    /// Validate a raw table and build the dataset.
    ///
    /// Fails fast with every missing column named when `id_column` or any
    /// of `required` is absent from the header row.
    pub fn from_table(
        table: RawTable,
        id_column: &str,
        required: &[String],
    ) -> Result<(Self, LoadReport), ReviewError> {
        if table.headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ReviewError::Empty);
        }

        let headers: Vec<String> = table.headers.iter().map(|h| h.trim().to_string()).collect();
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // First occurrence wins for duplicate header names
            index.entry(h.clone()).or_insert(i);
        }

        let missing: BTreeSet<String> = required
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(id_column))
            .filter(|name| !index.contains_key(*name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ReviewError::MissingColumns {
                columns: missing.into_iter().collect(),
            });
        }
        let id_idx = index[id_column];

        let width = headers.len();
        let mut report = LoadReport::default();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut records = Vec::with_capacity(table.rows.len());

        for (i, mut cells) in table.rows.into_iter().enumerate() {
            cells.resize(width, String::new());
            let id = cells[id_idx].trim().to_string();
            if id.is_empty() {
                // Fully blank trailing rows are common in spreadsheet exports
                if cells.iter().any(|c| !c.trim().is_empty()) {
                    log::warn!("row {}: blank '{}', skipped", i + 1, id_column);
                }
                report.blank_ids_skipped += 1;
                continue;
            }
            *seen.entry(id.clone()).or_insert(0) += 1;
            records.push(Record {
                id,
                source_row: i + 1,
                cells,
            });
        }

        let mut duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();
        duplicates.sort();
        if !duplicates.is_empty() {
            log::warn!(
                "{} identifier(s) appear on more than one row; those rows share a verdict",
                duplicates.len()
            );
        }

        let ids: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
        report.rows_loaded = records.len();
        report.duplicate_ids = duplicates;
        log::debug!(
            "dataset: {} columns, {} rows, {} blank ids skipped",
            width,
            report.rows_loaded,
            report.blank_ids_skipped
        );

        Ok((
            Self {
                headers,
                index,
                id_column: id_idx,
                records,
                ids,
            },
            report,
        ))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn id_column(&self) -> &str {
        &self.headers[self.id_column]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell text by column name; `""` when the column is absent.
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> &'a str {
        match self.column_index(column) {
            Some(i) => record.cell(i),
            None => "",
        }
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn distinct_ids(&self) -> usize {
        self.ids.len()
    }
}
