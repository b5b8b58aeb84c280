//! Review session: one upload, its verdicts, and the reviewer's position.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Record, PROJECT_ID, DEFAULT_REQUIRED_COLUMNS};
use crate::error::ReviewError;
use crate::export::{self, ExportPlan, ExportScope, COMMENTS_COLUMN, QUALITY_COLUMN};
use crate::filter::{self, FilterSet, OptionEntry, Selection, DEFAULT_FILTER_COLUMNS};
use crate::paging::{PageWindow, Paginator, DEFAULT_PAGE_SIZE};
use crate::summary::{self, ReviewSummary};
use crate::verdict::{ReasonCatalog, Review, Verdict, VerdictBook};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub id_column: String,
    pub required_columns: Vec<String>,
    pub filter_columns: Vec<String>,
    pub page_size: usize,
    pub reasons: ReasonCatalog,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            id_column: PROJECT_ID.to_string(),
            required_columns: DEFAULT_REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            filter_columns: DEFAULT_FILTER_COLUMNS.iter().map(|s| s.to_string()).collect(),
            page_size: DEFAULT_PAGE_SIZE,
            reasons: ReasonCatalog::default(),
        }
    }
}

/// Where a reviewer left off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCursor {
    pub page: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Selection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub seeded: usize,
    pub invalid: usize,
}

/// A row on the current page with its effective review.
#[derive(Debug, Clone)]
pub struct PageEntry<'a> {
    /// 1-based position within the filtered collection.
    pub ordinal: usize,
    pub record: &'a Record,
    pub review: Review,
}

#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub window: PageWindow,
    pub entries: Vec<PageEntry<'a>>,
}

pub struct ReviewSession {
    dataset: Dataset,
    book: VerdictBook,
    reasons: ReasonCatalog,
    filters: FilterSet,
    visible: Vec<usize>,
    pager: Paginator,
}

impl ReviewSession {
    pub fn new(
        dataset: Dataset,
        persisted: BTreeMap<String, Review>,
        options: &SessionOptions,
    ) -> Result<Self, ReviewError> {
        let filters = FilterSet::new(&options.filter_columns)?;
        let mut pager = Paginator::new(options.page_size)?;
        let visible = filters.apply(&dataset);
        pager.reset(visible.len());

        let session = Self {
            dataset,
            book: VerdictBook::new(persisted),
            reasons: options.reasons.clone(),
            filters,
            visible,
            pager,
        };
        let orphans = session.orphaned_ids().len();
        if orphans > 0 {
            log::debug!("{orphans} stored verdict(s) have no row in this upload; kept");
        }
        for (id, e) in session.invalid_entries() {
            log::warn!("stored verdict for '{id}': {e}");
        }
        Ok(session)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn book(&self) -> &VerdictBook {
        &self.book
    }

    pub fn reasons(&self) -> &ReasonCatalog {
        &self.reasons
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn paginator(&self) -> &Paginator {
        &self.pager
    }

    /// Indices of rows passing the current filter.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn into_persisted(self) -> BTreeMap<String, Review> {
        self.book.into_persisted()
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Take verdicts from `Quality`/`Comments` columns of a re-uploaded
    /// export for identifiers with nothing stored yet.
    pub fn seed_from_upload(&mut self) -> SeedReport {
        let mut report = SeedReport::default();
        let Some(quality) = self.dataset.column_index(QUALITY_COLUMN) else {
            return report;
        };
        let comments = self.dataset.column_index(COMMENTS_COLUMN);

        for record in self.dataset.records() {
            let text = record.cell(quality).trim();
            if text.is_empty() {
                continue;
            }
            let verdict = match text.parse::<Verdict>() {
                Ok(Verdict::NotYetUpdated) => continue,
                Ok(v) => v,
                Err(_) => {
                    log::warn!("row {}: unrecognized {} '{}', not seeded", record.source_row, QUALITY_COLUMN, text);
                    report.invalid += 1;
                    continue;
                }
            };
            // A stray comment on a non-Incorrect row is dropped, not fatal
            let comment = comments.map(|c| record.cell(c)).filter(|_| verdict.requires_reason());
            let reason = match self.reasons.check(&record.id, verdict, comment) {
                Ok(reason) => reason,
                Err(e) => {
                    log::warn!("row {}: {e}, not seeded", record.source_row);
                    report.invalid += 1;
                    continue;
                }
            };
            let review = Review {
                verdict,
                reason,
                updated_at: None,
            };
            if self.book.seed(&record.id, review) {
                report.seeded += 1;
            }
        }

        if report.seeded > 0 {
            log::debug!("seeded {} verdict(s) from upload", report.seeded);
        }
        report
    }

    // -------------------------------------------------------------------------
    // Filtering + paging
    // -------------------------------------------------------------------------

    pub fn filter_options(&self, column: &str) -> Vec<OptionEntry> {
        filter::options(&self.dataset, column)
    }

    /// Change one filter column. The page resets to the first page when the
    /// selection actually changes.
    pub fn set_filter(&mut self, column: &str, selection: Selection) -> Result<(), ReviewError> {
        let mut next = self.filters.clone();
        next.select(column, selection)?;
        self.replace_filters(next);
        Ok(())
    }

    /// Replace all selections at once; columns not named go back to `All`.
    pub fn set_filters<I>(&mut self, selections: I) -> Result<(), ReviewError>
    where
        I: IntoIterator<Item = (String, Selection)>,
    {
        let mut next = self.filters.clone();
        next.clear();
        for (column, selection) in selections {
            next.select(&column, selection)?;
        }
        self.replace_filters(next);
        Ok(())
    }

    fn replace_filters(&mut self, next: FilterSet) {
        if next == self.filters {
            return;
        }
        self.filters = next;
        self.visible = self.filters.apply(&self.dataset);
        self.pager.reset(self.visible.len());
    }

    pub fn goto_page(&mut self, page: usize) -> usize {
        self.pager.goto(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    /// Rows of the current page, reviews resolved through pending edits.
    pub fn page(&self) -> Page<'_> {
        let range = self.pager.range();
        let entries = self.visible[range.clone()]
            .iter()
            .zip(range.start..)
            .filter_map(|(&i, pos)| {
                let record = self.dataset.record(i)?;
                Some(PageEntry {
                    ordinal: pos + 1,
                    record,
                    review: self.book.resolve(&record.id),
                })
            })
            .collect();
        Page {
            window: self.pager.window(),
            entries,
        }
    }

    // -------------------------------------------------------------------------
    // Verdicts
    // -------------------------------------------------------------------------

    pub fn mark(&mut self, id: &str, verdict: Verdict, reason: Option<&str>) -> Result<Review, ReviewError> {
        self.mark_at(id, verdict, reason, Utc::now())
    }

    /// Stage a verdict for `id`. The id must be present in this upload.
    pub fn mark_at(
        &mut self,
        id: &str,
        verdict: Verdict,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Review, ReviewError> {
        let id = id.trim();
        if !self.dataset.contains_id(id) {
            return Err(ReviewError::UnknownRecord { id: id.to_string() });
        }
        let reason = self.reasons.check(id, verdict, reason)?;
        let review = Review::new(verdict, reason, at);
        log::debug!("stage {id}: {}", verdict.name());
        self.book.stage(id, review.clone());
        Ok(review)
    }

    pub fn pending_edits(&self) -> usize {
        self.book.pending_len()
    }

    pub fn commit(&mut self) -> usize {
        self.book.commit()
    }

    pub fn discard(&mut self) -> usize {
        self.book.discard()
    }

    /// Stored identifiers with no row in this upload. Cleared entries are
    /// not counted.
    pub fn orphaned_ids(&self) -> Vec<&str> {
        self.book
            .persisted()
            .iter()
            .filter(|(id, review)| review.verdict != Verdict::NotYetUpdated && !self.dataset.contains_id(id))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Stored entries that break the reason rules, e.g. `Incorrect` with no
    /// reason after the reason list was edited. They load as-is.
    pub fn invalid_entries(&self) -> Vec<(&str, ReviewError)> {
        self.book
            .persisted()
            .iter()
            .filter_map(|(id, review)| {
                self.reasons
                    .check(id, review.verdict, Some(&review.reason))
                    .err()
                    .map(|e| (id.as_str(), e))
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Summary + export
    // -------------------------------------------------------------------------

    /// Tally over the whole filtered collection, not just the current page.
    pub fn summary(&self) -> ReviewSummary {
        summary::summarize(&self.dataset, &self.visible, &self.book)
    }

    /// Build the export rows. Fails while edits are uncommitted.
    pub fn export_plan<S: AsRef<str>>(
        &self,
        columns: &[S],
        scope: ExportScope,
    ) -> Result<ExportPlan, ReviewError> {
        if self.book.has_pending() {
            return Err(ReviewError::PendingEdits {
                count: self.book.pending_len(),
            });
        }
        let all: Vec<usize>;
        let indices = match scope {
            ExportScope::All => {
                all = (0..self.dataset.len()).collect();
                &all
            }
            ExportScope::Filtered => &self.visible,
        };
        Ok(export::build_plan(&self.dataset, indices, &self.book, columns))
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    pub fn cursor(&self) -> ReviewCursor {
        ReviewCursor {
            page: self.pager.page(),
            filters: self
                .filters
                .to_map()
                .into_iter()
                .filter(|(_, s)| !s.is_all())
                .collect(),
        }
    }

    /// Re-apply a saved cursor. Filter columns no longer configured are
    /// ignored; the page is clamped to the filtered collection.
    pub fn restore_cursor(&mut self, cursor: &ReviewCursor) {
        let mut next = self.filters.clone();
        next.clear();
        for (column, selection) in &cursor.filters {
            if let Err(e) = next.select(column, selection.clone()) {
                log::warn!("saved filter ignored: {e}");
            }
        }
        self.replace_filters(next);
        self.pager.goto(cursor.page);
    }
}
