use std::ops::Range;

use serde::Serialize;

use crate::error::ReviewError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// `ceil(total / page_size)`; zero rows means zero pages.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Fixed-size pages over a row collection whose length may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    total: usize,
    page: usize,
}

/// What a page shows, 1-based row ordinals for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// 0-based page index.
    pub page: usize,
    pub page_count: usize,
    /// First row ordinal on the page (0 when there are no rows).
    pub start: usize,
    /// Last row ordinal on the page (0 when there are no rows).
    pub end: usize,
    pub total: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self, ReviewError> {
        if page_size == 0 {
            return Err(ReviewError::InvalidPageSize);
        }
        Ok(Self {
            page_size,
            total: 0,
            page: 0,
        })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    /// Clamp `page` into `0..page_count` (0 when there are no pages).
    pub fn clamp(&self, page: usize) -> usize {
        match self.page_count() {
            0 => 0,
            n => page.min(n - 1),
        }
    }

    /// Row count changed without a filter change: keep the page if it is still valid.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.page = self.clamp(self.page);
    }

    /// Row collection replaced (filter changed): back to the first page.
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.page = 0;
    }

    /// Jump to `page`, clamped. Returns the page actually selected.
    pub fn goto(&mut self, page: usize) -> usize {
        self.page = self.clamp(page);
        self.page
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    /// Advance one page; false at the last page.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page += 1;
        true
    }

    /// Go back one page; false at the first page.
    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Index range of the current page within the row collection.
    pub fn range(&self) -> Range<usize> {
        let start = (self.page * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn window(&self) -> PageWindow {
        let range = self.range();
        let (start, end) = if range.is_empty() {
            (0, 0)
        } else {
            (range.start + 1, range.end)
        };
        PageWindow {
            page: self.page,
            page_count: self.page_count(),
            start,
            end,
            total: self.total,
        }
    }
}
