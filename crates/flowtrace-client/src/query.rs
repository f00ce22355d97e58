//! Listing query parameters
//!
//! Pagination, free-text search, and inclusive date-range filtering shared by
//! every family listing. Parameters are validated locally before any request
//! is issued, and serialize to a stable query-string order so a request is
//! reproducible (and cacheable by URL) from its parameters alone.

use chrono::NaiveDate;

use crate::{GatewayError, GatewayResult};

/// Default page number
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size. The upper bound on `limit` is server-controlled and
/// deliberately not assumed here.
pub const DEFAULT_LIMIT: u32 = 10;

/// Parameters for one listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: u32,
    limit: u32,
    search: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Free-text search. Leading/trailing whitespace is trimmed; an empty or
    /// whitespace-only search is equivalent to no search at all.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Inclusive lower bound on the order creation date
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Inclusive upper bound on the order creation date
    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Validates the parameters locally.
    ///
    /// A zero page or limit, or an end date before the start date, is a
    /// caller error: the query is rejected here and never sent upstream —
    /// a reversed range is never silently swapped.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.page == 0 {
            return Err(GatewayError::Validation(
                "page must be a positive integer".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(GatewayError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(GatewayError::Validation(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        Ok(())
    }

    /// Query-string pairs in a stable, reproducible order:
    /// `page`, `limit`, `search`, `start_date`, `end_date`.
    /// Omitted optionals contribute no pair.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}
