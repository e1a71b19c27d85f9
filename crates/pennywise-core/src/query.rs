//! Filtering, sorting and pagination of the operation list
//!
//! The pipeline runs in a fixed order: type, search, category, date range,
//! sort, page. Sorting is stable in both directions, so operations with
//! equal keys keep their snapshot order.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::models::{Category, CategoryIndex, Operation};
use crate::time::Calendar;
use crate::types::{CategoryFilter, SortDirection, SortField, TypeFilter};

/// Rows per page when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One immutable set of list parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub type_filter: TypeFilter,
    /// Case-insensitive substring of description or category name
    pub search: String,
    pub category: CategoryFilter,
    /// Inclusive, from the start of the day
    pub date_from: Option<NaiveDate>,
    /// Inclusive, until the end of the day
    pub date_to: Option<NaiveDate>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// 1-indexed
    pub page: usize,
    pub page_size: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl QueryParams {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            type_filter: TypeFilter::All,
            search: String::new(),
            category: CategoryFilter::All,
            date_from: None,
            date_to: None,
            sort_field: SortField::Timestamp,
            sort_direction: SortDirection::Desc,
            page: 1,
            page_size,
        }
    }
}

/// One page of matching operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Operations matching the filters, over all pages
    pub matched_count: usize,
    pub total_pages: usize,
    /// Page actually returned after clamping
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<Operation>,
}

/// Comparison key of one operation; a single sort only ever holds one variant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Timestamp(DateTime<Utc>),
    Amount(Decimal),
    Text(String),
}

/// Runs list queries over one user's snapshots
#[derive(Debug, Clone)]
pub struct QueryEngine<'a> {
    operations: &'a [Operation],
    categories: CategoryIndex,
    calendar: Calendar,
}

impl<'a> QueryEngine<'a> {
    pub fn new(operations: &'a [Operation], categories: &[Category]) -> Self {
        Self {
            operations,
            categories: CategoryIndex::new(categories),
            calendar: Calendar::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    fn matches_search(&self, op: &Operation, needle: &str) -> bool {
        if op.description.to_lowercase().contains(needle) {
            return true;
        }
        self.categories
            .name(&op.category_id)
            .map_or(false, |name| name.to_lowercase().contains(needle))
    }

    /// Operations passing every filter, in snapshot order
    pub fn filter(&self, params: &QueryParams) -> Vec<&'a Operation> {
        let needle = params.search.to_lowercase();

        self.operations
            .iter()
            .filter(|op| params.type_filter.matches(op.kind))
            .filter(|op| needle.is_empty() || self.matches_search(op, &needle))
            .filter(|op| match &params.category {
                CategoryFilter::All => true,
                CategoryFilter::Id(id) => &op.category_id == id,
            })
            .filter(|op| {
                self.calendar
                    .within_dates(op.timestamp, params.date_from, params.date_to)
            })
            .collect()
    }

    fn sort_key(&self, field: SortField, op: &Operation) -> SortKey {
        match field {
            SortField::Timestamp => SortKey::Timestamp(op.timestamp),
            SortField::Amount => SortKey::Amount(op.amount),
            SortField::Description => SortKey::Text(op.description.to_lowercase()),
            SortField::CategoryId => {
                SortKey::Text(self.categories.label(&op.category_id).to_lowercase())
            }
        }
    }

    /// Filtered and sorted operations, before pagination
    pub fn sorted(&self, params: &QueryParams) -> Vec<&'a Operation> {
        let mut matched = self.filter(params);
        let field = params.sort_field;
        match params.sort_direction {
            SortDirection::Asc => matched.sort_by_cached_key(|op| self.sort_key(field, op)),
            SortDirection::Desc => {
                matched.sort_by_cached_key(|op| Reverse(self.sort_key(field, op)))
            }
        }
        matched
    }

    pub fn run(&self, params: &QueryParams) -> QueryResult {
        let matched = self.sorted(params);
        let page_size = params.page_size.max(1);
        let matched_count = matched.len();
        let total_pages = matched_count.div_ceil(page_size);
        let page = params.page.clamp(1, total_pages.max(1));

        let items = matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        QueryResult {
            matched_count,
            total_pages,
            page,
            page_size,
            items,
        }
    }
}

/// Distinct non-empty category ids of the unfiltered snapshot, sorted
pub fn available_category_ids(operations: &[Operation]) -> Vec<String> {
    operations
        .iter()
        .filter(|op| op.has_category())
        .map(|op| op.category_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Mutable list state owned by one caller
///
/// Changing any filter returns to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    params: QueryParams,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Selection {
    pub fn new(page_size: usize) -> Self {
        Self {
            params: QueryParams::with_page_size(page_size),
        }
    }

    /// Snapshot of the current parameters
    pub fn params(&self) -> QueryParams {
        self.params.clone()
    }

    pub fn page(&self) -> usize {
        self.params.page
    }

    pub fn set_type_filter(&mut self, type_filter: TypeFilter) {
        self.params.type_filter = type_filter;
        self.params.page = 1;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.params.search = search.into();
        self.params.page = 1;
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.params.category = category;
        self.params.page = 1;
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.params.date_from = from;
        self.params.date_to = to;
        self.params.page = 1;
    }

    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.params.sort_field = field;
        self.params.sort_direction = direction;
    }

    /// Same field flips the direction; a new field starts descending
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.params.sort_field == field {
            self.params.sort_direction = self.params.sort_direction.reversed();
        } else {
            self.params.sort_field = field;
            self.params.sort_direction = SortDirection::Desc;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.params.page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.params.page = (self.params.page + 1).min(total_pages.max(1));
    }

    pub fn previous_page(&mut self) {
        self.params.page = self.params.page.saturating_sub(1).max(1);
    }

    /// Back to defaults, keeping the page size
    pub fn reset(&mut self) {
        self.params = QueryParams::with_page_size(self.params.page_size);
    }
}
