//! `fieldcheck-engine`: review-state reconciliation for before/after
//! work-verification records.
//!
//! Pure engine crate: receives pre-parsed tables and persisted verdicts,
//! returns filtered pages, summaries and export plans. No file IO.

pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod paging;
pub mod session;
pub mod summary;
pub mod verdict;

pub use dataset::{Dataset, LoadReport, RawTable, Record};
pub use error::ReviewError;
pub use export::{ExportPlan, ExportRow, ExportScope, FillScope};
pub use filter::{FilterSet, Selection};
pub use paging::{PageWindow, Paginator};
pub use session::{ReviewCursor, ReviewSession, SessionOptions};
pub use summary::ReviewSummary;
pub use verdict::{ReasonCatalog, Review, Verdict, VerdictBook};
