use std::time::Duration;

use serde::Serialize;

use crate::error::SqlPagerError;
use crate::projector::Projected;
use crate::types::{RowValues, render_params};

const DEFAULT_PAGE_SIZE: usize = 10;

/// One page to fetch: a count query, a data query, and the parameters both share.
///
/// Page numbers are one-based; `0` is treated as the first page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page_number: usize,
    pub page_size: usize,
    pub count_sql: String,
    pub data_sql: String,
    pub params: Option<Vec<RowValues>>,
}

impl PageRequest {
    /// First page of ten rows with no parameters.
    pub fn new(count_sql: impl Into<String>, data_sql: impl Into<String>) -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            count_sql: count_sql.into(),
            data_sql: data_sql.into(),
            params: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page_number: usize) -> Self {
        self.page_number = page_number;
        self
    }

    #[must_use]
    pub fn with_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<RowValues>) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn params(&self) -> Option<&[RowValues]> {
        self.params.as_deref()
    }

    /// The page number actually served.
    #[must_use]
    pub fn effective_page(&self) -> usize {
        self.page_number.max(1)
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn start(&self) -> usize {
        (self.effective_page() - 1).saturating_mul(self.page_size)
    }

    pub(crate) fn failed(&self, source: SqlPagerError) -> SqlPagerError {
        SqlPagerError::PaginationFailed {
            count_sql: self.count_sql.clone(),
            data_sql: self.data_sql.clone(),
            params: render_params(self.params()),
            source: Box::new(source),
        }
    }
}

/// A page of rows plus the totals needed to navigate between pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<R> {
    pub rows: Vec<R>,
    pub total_rows: u64,
    pub total_pages: u64,
    pub current_page: usize,
    pub page_size: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub elapsed: Duration,
}

impl<R> PageResult<R> {
    #[must_use]
    pub fn new(
        current_page: usize,
        page_size: usize,
        total_rows: u64,
        rows: Vec<R>,
        elapsed: Duration,
    ) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_rows.div_ceil(page_size as u64)
        };
        Self {
            rows,
            total_rows,
            total_pages,
            current_page,
            page_size,
            has_next_page: (current_page as u64) < total_pages,
            has_previous_page: current_page > 1,
            elapsed,
        }
    }

    /// Rows on this page, which can be fewer than `page_size` on the last one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Transform every row, keeping the totals.
    pub fn map_rows<U>(self, f: impl FnMut(R) -> U) -> PageResult<U> {
        PageResult {
            rows: self.rows.into_iter().map(f).collect(),
            total_rows: self.total_rows,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
            elapsed: self.elapsed,
        }
    }
}

impl<T> PageResult<Projected<T>> {
    /// Keep only the record rows.
    #[must_use]
    pub fn into_records(self) -> PageResult<T> {
        let PageResult {
            rows,
            total_rows,
            total_pages,
            current_page,
            page_size,
            has_next_page,
            has_previous_page,
            elapsed,
        } = self;
        PageResult {
            rows: rows.into_iter().filter_map(Projected::into_record).collect(),
            total_rows,
            total_pages,
            current_page,
            page_size,
            has_next_page,
            has_previous_page,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current: usize, size: usize, total: u64) -> PageResult<()> {
        PageResult::new(current, size, total, Vec::new(), Duration::ZERO)
    }

    #[test]
    fn totals_and_navigation() {
        let p = page(2, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_previous_page);

        let last = page(3, 10, 25);
        assert!(!last.has_next_page);

        let exact = page(1, 10, 20);
        assert_eq!(exact.total_pages, 2);
        assert!(!exact.has_previous_page);

        let empty = page(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn zero_page_size_has_no_pages() {
        let p = page(1, 0, 25);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
    }

    #[test]
    fn page_zero_is_first_page() {
        let req = PageRequest::new("select count(*) from t", "select * from t").with_page(0);
        assert_eq!(req.effective_page(), 1);
        assert_eq!(req.start(), 0);
        assert_eq!(req.clone().with_page(3).with_size(7).start(), 14);
    }

    #[test]
    fn failure_carries_both_queries() {
        let req = PageRequest::new("select count(*) from t where a = ?", "select * from t where a = ?")
            .with_params(vec![RowValues::Int(4)]);
        let err = req.failed(SqlPagerError::ExecutionError("boom".into()));
        let text = err.to_string();
        assert!(text.contains("select count(*) from t where a = ?"));
        assert!(text.contains("select * from t where a = ?"));
        assert!(text.contains("[4]"));
        assert!(matches!(err.root_cause(), SqlPagerError::ExecutionError(_)));
    }

    #[test]
    fn map_rows_keeps_totals() {
        let p = PageResult::new(1, 2, 3, vec![1, 2], Duration::ZERO).map_rows(|n| n * 10);
        assert_eq!(p.rows, vec![10, 20]);
        assert_eq!(p.total_pages, 2);
    }
}
