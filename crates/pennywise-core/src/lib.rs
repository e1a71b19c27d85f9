//! Operation records, live statistics and list queries
//!
//! - [`projector`]: period totals, daily trend, category breakdown, monthly balance
//! - [`query`]: filtering, sorting and pagination of the operation list
//! - [`store`]: per-user document store with change listeners
//! - [`feed`]: latest snapshots of one user, kept current by the store

pub mod error;
pub mod feed;
pub mod models;
pub mod projector;
pub mod query;
pub mod reports;
pub mod store;
pub mod time;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use feed::LiveFeed;
pub use models::{Category, CategoryDraft, CategoryIndex, Operation, OperationDraft, UNCATEGORIZED};
pub use projector::FeedProjector;
pub use query::{available_category_ids, QueryEngine, QueryParams, QueryResult, Selection};
pub use reports::{
    AmountFormatter, CategoryBreakdown, CategoryTotal, MonthlyBalancePoint, PeriodTotals,
    StatsOverview, TrendPoint,
};
pub use store::{DocumentStore, MemoryStore, SnapshotListener, Subscription};
pub use time::{Calendar, TimeFilter, Window};
pub use types::{CategoryFilter, OperationType, SortDirection, SortField, TypeFilter};
pub use validation::{validate_category, validate_operation};
