use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::verdict::{Verdict, VerdictBook};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictCount {
    pub verdict: Verdict,
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    /// Rows in the filtered collection.
    pub total: usize,
    /// One entry per verdict, in `Verdict::ALL` order.
    pub counts: Vec<VerdictCount>,
    /// Correct + Incorrect.
    pub reviewed: usize,
    /// Correct share of reviewed rows.
    pub accuracy: f64,
    /// Incorrect rows per disapproval reason.
    pub reasons: BTreeMap<String, usize>,
}

impl ReviewSummary {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.entry(verdict).map(|e| e.count).unwrap_or(0)
    }

    pub fn percent(&self, verdict: Verdict) -> f64 {
        self.entry(verdict).map(|e| e.percent).unwrap_or(0.0)
    }

    fn entry(&self, verdict: Verdict) -> Option<&VerdictCount> {
        self.counts.iter().find(|e| e.verdict == verdict)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Tally verdicts over the rows at `indices`, every row counted (duplicates included).
pub fn summarize(dataset: &Dataset, indices: &[usize], book: &VerdictBook) -> ReviewSummary {
    let mut tally: BTreeMap<Verdict, usize> = BTreeMap::new();
    let mut reasons: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0;

    for record in indices.iter().filter_map(|&i| dataset.record(i)) {
        total += 1;
        let review = book.resolve(&record.id);
        *tally.entry(review.verdict).or_insert(0) += 1;
        if review.verdict == Verdict::Incorrect && !review.reason.is_empty() {
            *reasons.entry(review.reason).or_insert(0) += 1;
        }
    }

    let counts: Vec<VerdictCount> = Verdict::ALL
        .iter()
        .map(|&verdict| {
            let count = tally.get(&verdict).copied().unwrap_or(0);
            VerdictCount {
                verdict,
                label: verdict.label(),
                count,
                percent: percent(count, total),
            }
        })
        .collect();

    let correct = tally.get(&Verdict::Correct).copied().unwrap_or(0);
    let reviewed = correct + tally.get(&Verdict::Incorrect).copied().unwrap_or(0);

    ReviewSummary {
        total,
        counts,
        reviewed,
        accuracy: percent(correct, reviewed),
        reasons,
    }
}
