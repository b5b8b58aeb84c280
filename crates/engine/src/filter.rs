//! Categorical row filters.
//!
//! Key invariants:
//! - At most `MAX_FILTER_COLUMNS` columns are filterable
//! - Each column is either `All` or one exact value (trimmed comparison)
//! - Filtering keeps source row order
//! - A filter column missing from the upload only passes `All`

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::ReviewError;

pub const MAX_FILTER_COLUMNS: usize = 3;

pub const DEFAULT_FILTER_COLUMNS: [&str; 3] = ["Zone", "Ward", "Organisation"];

/// Wildcard spelling shown to users.
pub const ALL: &str = "All";

// =============================================================================
// Selection
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn passes(&self, cell: &str) -> bool {
        match self {
            Self::All => true,
            Self::Value(v) => cell.trim() == v,
        }
    }
}

impl From<String> for Selection {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(ALL) {
            Self::All
        } else {
            Self::Value(trimmed.to_string())
        }
    }
}

impl From<&str> for Selection {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Selection> for String {
    fn from(s: Selection) -> Self {
        match s {
            Selection::All => ALL.to_string(),
            Selection::Value(v) => v,
        }
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Value(v) => f.write_str(v),
        }
    }
}

// =============================================================================
// FilterSet
// =============================================================================

/// Ordered filter columns with their current selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    columns: Vec<(String, Selection)>,
}

impl FilterSet {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self, ReviewError> {
        if columns.len() > MAX_FILTER_COLUMNS {
            return Err(ReviewError::TooManyFilterColumns {
                count: columns.len(),
                max: MAX_FILTER_COLUMNS,
            });
        }
        Ok(Self {
            columns: columns
                .iter()
                .map(|c| (c.as_ref().to_string(), Selection::All))
                .collect(),
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn selections(&self) -> &[(String, Selection)] {
        &self.columns
    }

    pub fn selection(&self, column: &str) -> Option<&Selection> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, s)| s)
    }

    pub fn select(&mut self, column: &str, selection: Selection) -> Result<(), ReviewError> {
        let slot = self
            .columns
            .iter_mut()
            .find(|(c, _)| c == column)
            .ok_or_else(|| ReviewError::UnknownFilterColumn(column.to_string()))?;
        slot.1 = selection;
        Ok(())
    }

    pub fn clear(&mut self) {
        for (_, s) in &mut self.columns {
            *s = Selection::All;
        }
    }

    /// Is any column narrowed?
    pub fn is_active(&self) -> bool {
        self.columns.iter().any(|(_, s)| !s.is_all())
    }

    /// Indices (into `dataset.records()`) of rows passing every selection.
    pub fn apply(&self, dataset: &Dataset) -> Vec<usize> {
        // Resolve column positions once; None = column absent from upload
        let resolved: Vec<(Option<usize>, &Selection)> = self
            .columns
            .iter()
            .filter(|(_, s)| !s.is_all())
            .map(|(c, s)| (dataset.column_index(c), s))
            .collect();

        dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                resolved.iter().all(|(col, sel)| match col {
                    Some(i) => sel.passes(record.cell(*i)),
                    None => false,
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Selections as a map, for persisting a cursor.
    pub fn to_map(&self) -> BTreeMap<String, Selection> {
        self.columns.iter().cloned().collect()
    }
}

// =============================================================================
// Picker options
// =============================================================================

/// Distinct value of a filter column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionEntry {
    pub value: String,
    /// Rows carrying this value.
    pub count: usize,
}

/// `All` (every row) followed by the sorted distinct non-empty values of
/// `column`. Only `All` is offered when the column is absent.
pub fn options(dataset: &Dataset, column: &str) -> Vec<OptionEntry> {
    let mut entries = vec![OptionEntry {
        value: ALL.to_string(),
        count: dataset.len(),
    }];
    let Some(col) = dataset.column_index(column) else {
        return entries;
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in dataset.records() {
        let value = record.cell(col).trim();
        if !value.is_empty() {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let mut values: Vec<OptionEntry> = counts
        .into_iter()
        .map(|(value, count)| OptionEntry {
            value: value.to_string(),
            count,
        })
        .collect();
    values.sort_by(|a, b| a.value.cmp(&b.value));
    entries.extend(values);
    entries
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{RawTable, DEFAULT_REQUIRED_COLUMNS};

    fn dataset() -> Dataset {
        let headers = ["Project Id", "Raised Evidence", "Latest Evidence", "Zone", "Ward", "Organisation"];
        let rows = [
            ["P1", "", "", "North", "1", "Roads"],
            ["P2", "", "", "South", "2", "Roads"],
            ["P3", "", "", "North", "2", "Parks"],
            ["P4", "", "", "North ", "1", "Roads"],
            ["P5", "", "", "", "3", "Parks"],
        ];
        let table = RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        };
        let required: Vec<String> = DEFAULT_REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect();
        Dataset::from_table(table, "Project Id", &required).unwrap().0
    }

    #[test]
    fn selection_parses_all_wildcard() {
        assert_eq!(Selection::from("all"), Selection::All);
        assert_eq!(Selection::from(" ALL "), Selection::All);
        assert_eq!(Selection::from(" North "), Selection::Value("North".into()));
        assert_eq!(Selection::Value("x".into()).to_string(), "x");
    }

    #[test]
    fn selection_serde_is_plain_string() {
        let json = serde_json::to_string(&Selection::All).unwrap();
        assert_eq!(json, "\"All\"");
        let back: Selection = serde_json::from_str("\"North\"").unwrap();
        assert_eq!(back, Selection::Value("North".into()));
    }

    #[test]
    fn too_many_columns_rejected() {
        let err = FilterSet::new(&["a", "b", "c", "d"]).unwrap_err();
        assert_eq!(err, ReviewError::TooManyFilterColumns { count: 4, max: 3 });
    }

    #[test]
    fn all_wildcard_keeps_everything() {
        let ds = dataset();
        let filters = FilterSet::new(&DEFAULT_FILTER_COLUMNS).unwrap();
        assert!(!filters.is_active());
        assert_eq!(filters.apply(&ds), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn equality_filters_combine_and_keep_order() {
        let ds = dataset();
        let mut filters = FilterSet::new(&DEFAULT_FILTER_COLUMNS).unwrap();
        filters.select("Zone", "North".into()).unwrap();
        assert_eq!(filters.apply(&ds), vec![0, 2, 3]);

        filters.select("Organisation", "Roads".into()).unwrap();
        assert_eq!(filters.apply(&ds), vec![0, 3]);

        filters.select("Ward", "2".into()).unwrap();
        assert!(filters.apply(&ds).is_empty());

        filters.clear();
        assert_eq!(filters.apply(&ds).len(), 5);
    }

    #[test]
    fn unknown_filter_column_rejected() {
        let mut filters = FilterSet::new(&DEFAULT_FILTER_COLUMNS).unwrap();
        assert_eq!(
            filters.select("City", Selection::All),
            Err(ReviewError::UnknownFilterColumn("City".into()))
        );
    }

    #[test]
    fn absent_column_only_passes_all() {
        let ds = dataset();
        let mut filters = FilterSet::new(&["Zone", "City"]).unwrap();
        assert_eq!(filters.apply(&ds).len(), 5);
        filters.select("City", "Pune".into()).unwrap();
        assert!(filters.apply(&ds).is_empty());
    }

    #[test]
    fn options_are_sorted_distinct_and_counted() {
        let ds = dataset();
        let zones = options(&ds, "Zone");
        assert_eq!(
            zones,
            vec![
                OptionEntry { value: "All".into(), count: 5 },
                OptionEntry { value: "North".into(), count: 3 },
                OptionEntry { value: "South".into(), count: 1 },
            ]
        );
        assert_eq!(options(&ds, "City"), vec![OptionEntry { value: "All".into(), count: 5 }]);
    }
}
