use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::verdict::{Verdict, VerdictBook};

pub const QUALITY_COLUMN: &str = "Quality";
pub const COMMENTS_COLUMN: &str = "Comments";

pub const DEFAULT_EXPORT_COLUMNS: [&str; 15] = [
    "Project Id",
    "Action Item",
    "Landmark*",
    "Organisation",
    "Zone",
    "Ward",
    "City",
    "State*",
    "Raised On",
    "Raised Comment",
    "Raised Evidence",
    "Raised Location",
    "Latest Comment",
    "Latest Evidence",
    "Latest Location",
];

pub const GREEN: u32 = 0x00FF00;
pub const RED: u32 = 0xFF0000;

/// Background fill for a verdict, as 0xRRGGBB.
pub fn fill_color(verdict: Verdict) -> Option<u32> {
    match verdict {
        Verdict::Correct => Some(GREEN),
        Verdict::Incorrect => Some(RED),
        Verdict::NotYetUpdated | Verdict::NotReviewed => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Every uploaded row.
    #[default]
    All,
    /// Only rows passing the current filter.
    Filtered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillScope {
    /// Every exported cell of the row.
    #[default]
    Row,
    /// The `Quality` cell only.
    Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub cells: Vec<String>,
    pub verdict: Verdict,
}

/// Header + rows ready to serialize, verdict and reason columns last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub headers: Vec<String>,
    pub rows: Vec<ExportRow>,
}

impl ExportPlan {
    pub fn quality_column(&self) -> usize {
        self.headers.len().saturating_sub(2)
    }
}

/// Upload columns to copy, in the order of `wanted`. An empty `wanted`
/// copies every upload column. Upload `Quality`/`Comments` columns are
/// never copied; the export regenerates them.
pub fn select_columns<S: AsRef<str>>(dataset: &Dataset, wanted: &[S]) -> Vec<usize> {
    let regenerated = |name: &str| name == QUALITY_COLUMN || name == COMMENTS_COLUMN;

    if wanted.is_empty() {
        return dataset
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, h)| !regenerated(h))
            .map(|(i, _)| i)
            .collect();
    }

    let mut picked = Vec::new();
    for name in wanted {
        let name = name.as_ref();
        if regenerated(name) {
            continue;
        }
        if let Some(i) = dataset.column_index(name) {
            if !picked.contains(&i) {
                picked.push(i);
            }
        }
    }
    picked
}

/// Join the selected upload columns with each row's committed verdict.
pub fn build_plan<S: AsRef<str>>(
    dataset: &Dataset,
    indices: &[usize],
    book: &VerdictBook,
    wanted: &[S],
) -> ExportPlan {
    let columns = select_columns(dataset, wanted);

    let mut headers: Vec<String> = columns
        .iter()
        .map(|&i| dataset.headers()[i].clone())
        .collect();
    headers.push(QUALITY_COLUMN.to_string());
    headers.push(COMMENTS_COLUMN.to_string());

    let rows = indices
        .iter()
        .filter_map(|&i| dataset.record(i))
        .map(|record| {
            let review = book.resolve(&record.id);
            let mut cells: Vec<String> = columns.iter().map(|&i| record.cell(i).to_string()).collect();
            cells.push(review.verdict.label().to_string());
            cells.push(review.reason);
            ExportRow {
                cells,
                verdict: review.verdict,
            }
        })
        .collect();

    ExportPlan { headers, rows }
}
