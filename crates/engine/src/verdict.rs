use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Sentinel for identifiers with no recorded review.
    #[default]
    NotYetUpdated,
    NotReviewed,
    Correct,
    Incorrect,
}

impl Verdict {
    /// Fixed reporting order.
    pub const ALL: [Verdict; 4] = [
        Verdict::NotYetUpdated,
        Verdict::NotReviewed,
        Verdict::Correct,
        Verdict::Incorrect,
    ];

    /// Label written to the `Quality` column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotYetUpdated => "Not Yet Updated",
            Self::NotReviewed => "Not Reviewed",
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotYetUpdated => "not_yet_updated",
            Self::NotReviewed => "not_reviewed",
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }

    pub fn requires_reason(&self) -> bool {
        matches!(self, Self::Incorrect)
    }

    pub fn is_reviewed(&self) -> bool {
        matches!(self, Self::Correct | Self::Incorrect)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Verdict {
    type Err = ReviewError;

    /// Accepts labels ("Not Reviewed") and names ("not_reviewed"), any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match folded.as_str() {
            "not_yet_updated" => Ok(Self::NotYetUpdated),
            "not_reviewed" => Ok(Self::NotReviewed),
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            _ => Err(ReviewError::InvalidVerdict(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// A verdict and its disapproval reason, as persisted per identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn new(verdict: Verdict, reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
            updated_at: Some(at),
        }
    }
}

// ---------------------------------------------------------------------------
// Disapproval reasons
// ---------------------------------------------------------------------------

pub const DEFAULT_REASONS: [&str; 4] = [
    "Wrong Before Image/Poor Identification",
    "After Photo-Missing",
    "After Photo-Wrong/Blurry",
    "Incomplete Work/Work Not Started",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonCatalog {
    reasons: Vec<String>,
}

impl Default for ReasonCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_REASONS.iter().map(|s| s.to_string()).collect())
    }
}

impl ReasonCatalog {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Exact match first, then case-insensitive; returns the catalog spelling.
    pub fn find(&self, reason: &str) -> Option<&str> {
        let reason = reason.trim();
        self.reasons
            .iter()
            .find(|r| r.as_str() == reason)
            .or_else(|| self.reasons.iter().find(|r| r.eq_ignore_ascii_case(reason)))
            .map(String::as_str)
    }

    /// Check a verdict/reason pair and return the reason to store.
    pub fn check(&self, id: &str, verdict: Verdict, reason: Option<&str>) -> Result<String, ReviewError> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        match (verdict.requires_reason(), reason) {
            (true, None) => Err(ReviewError::MissingReason { id: id.to_string() }),
            (true, Some(r)) => self
                .find(r)
                .map(str::to_string)
                .ok_or_else(|| ReviewError::UnknownReason { reason: r.to_string() }),
            (false, Some(_)) => Err(ReviewError::UnexpectedReason {
                id: id.to_string(),
                verdict: verdict.label().to_string(),
            }),
            (false, None) => Ok(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// VerdictBook: persisted layer + in-session edits
// ---------------------------------------------------------------------------

/// Verdicts keyed by record identifier.
///
/// Reads resolve pending edit -> persisted entry -> `NotYetUpdated`.
/// An explicit revert is kept as a `NotYetUpdated` entry so a re-uploaded
/// export cannot seed the old verdict back. Persisted entries for
/// identifiers absent from the current upload are kept as-is.
#[derive(Debug, Clone, Default)]
pub struct VerdictBook {
    persisted: BTreeMap<String, Review>,
    pending: BTreeMap<String, Review>,
}

impl VerdictBook {
    pub fn new(persisted: BTreeMap<String, Review>) -> Self {
        Self {
            persisted,
            pending: BTreeMap::new(),
        }
    }

    pub fn persisted(&self) -> &BTreeMap<String, Review> {
        &self.persisted
    }

    pub fn into_persisted(self) -> BTreeMap<String, Review> {
        self.persisted
    }

    pub fn get(&self, id: &str) -> Option<&Review> {
        self.pending.get(id).or_else(|| self.persisted.get(id))
    }

    /// Effective review for `id`, defaulting to the sentinel.
    pub fn resolve(&self, id: &str) -> Review {
        self.get(id).cloned().unwrap_or_default()
    }

    pub fn verdict(&self, id: &str) -> Verdict {
        self.get(id).map(|r| r.verdict).unwrap_or_default()
    }

    /// Stage an edit. `NotYetUpdated` stages a revert.
    pub fn stage(&mut self, id: impl Into<String>, review: Review) {
        self.pending.insert(id.into(), review);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Fold pending edits into the persisted layer. Returns the edit count.
    pub fn commit(&mut self) -> usize {
        let count = self.pending.len();
        self.persisted.append(&mut self.pending);
        count
    }

    pub fn discard(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Insert into the persisted layer only when nothing is recorded for
    /// `id` in either layer, reverts included. Returns whether the seed was
    /// taken.
    pub fn seed(&mut self, id: &str, review: Review) -> bool {
        if review.verdict == Verdict::NotYetUpdated
            || self.persisted.contains_key(id)
            || self.pending.contains_key(id)
        {
            return false;
        }
        self.persisted.insert(id.to_string(), review);
        true
    }
}
