//! Latest snapshots of one user, kept current by store listeners

use chrono::{DateTime, Utc};
use pennywise_config::Period;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{Category, Operation};
use crate::projector::FeedProjector;
use crate::query::{available_category_ids, QueryEngine, QueryParams, QueryResult};
use crate::reports::{
    AmountFormatter, CategoryBreakdown, MonthlyBalancePoint, PeriodTotals, StatsOverview, TrendPoint,
};
use crate::store::{DocumentStore, Subscription};
use crate::time::Calendar;

type Shared<T> = Arc<RwLock<Vec<T>>>;

fn snapshot<T: Clone>(shared: &Shared<T>) -> Vec<T> {
    shared.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn replace<T: Clone>(shared: &Shared<T>, items: &[T]) {
    *shared.write().unwrap_or_else(PoisonError::into_inner) = items.to_vec();
}

/// Live view of a user's operations and categories
///
/// Dropping the feed unsubscribes from the store.
pub struct LiveFeed {
    user: String,
    operations: Shared<Operation>,
    categories: Shared<Category>,
    calendar: Calendar,
    _subscriptions: [Subscription; 2],
}

impl LiveFeed {
    pub fn attach(store: &dyn DocumentStore, user: &str) -> Self {
        let operations: Shared<Operation> = Arc::default();
        let categories: Shared<Category> = Arc::default();

        let sink = operations.clone();
        let operation_sub = store.subscribe_operations(
            user,
            Box::new(move |ops: &[Operation]| replace(&sink, ops)),
        );
        let sink = categories.clone();
        let category_sub = store.subscribe_categories(
            user,
            Box::new(move |cats: &[Category]| replace(&sink, cats)),
        );
        log::debug!("Live feed attached for {}", user);

        Self {
            user: user.to_string(),
            operations,
            categories,
            calendar: Calendar::default(),
            _subscriptions: [operation_sub, category_sub],
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn operations(&self) -> Vec<Operation> {
        snapshot(&self.operations)
    }

    pub fn categories(&self) -> Vec<Category> {
        snapshot(&self.categories)
    }

    /// Run `f` against a projector over the current snapshots
    pub fn project<R>(&self, f: impl FnOnce(&FeedProjector<'_>) -> R) -> R {
        let operations = self.operations();
        let categories = self.categories();
        let projector = FeedProjector::new(&operations, &categories).with_calendar(self.calendar);
        f(&projector)
    }

    pub fn query(&self, params: &QueryParams) -> QueryResult {
        let operations = self.operations();
        let categories = self.categories();
        QueryEngine::new(&operations, &categories)
            .with_calendar(self.calendar)
            .run(params)
    }

    pub fn category_ids(&self) -> Vec<String> {
        available_category_ids(&self.operations())
    }

    pub fn period_totals(&self, period: Period, now: DateTime<Utc>) -> PeriodTotals {
        self.project(|p| p.period_totals(period, now))
    }

    pub fn trend(&self, days: usize, now: DateTime<Utc>) -> Vec<TrendPoint> {
        self.project(|p| p.trend(days, now))
    }

    pub fn category_breakdown(&self, period: Period, now: DateTime<Utc>) -> CategoryBreakdown {
        self.project(|p| p.category_breakdown(period, now))
    }

    pub fn monthly_balance(&self, months: usize, now: DateTime<Utc>) -> Vec<MonthlyBalancePoint> {
        self.project(|p| p.monthly_balance(months, now))
    }

    pub fn overview(
        &self,
        period: Period,
        now: DateTime<Utc>,
        formatter: &AmountFormatter,
    ) -> StatsOverview {
        self.project(|p| p.overview(period, now, formatter))
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        log::debug!("Live feed detached for {}", self.user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryDraft, OperationDraft};
    use crate::store::MemoryStore;
    use crate::types::OperationType;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn draft(kind: OperationType, amount: i64, category: Option<&str>, day: u32) -> OperationDraft {
        OperationDraft {
            kind,
            amount: Decimal::new(amount, 0),
            description: "entry".to_string(),
            category_id: category.map(str::to_string),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_feed_follows_store_changes() {
        let store = MemoryStore::new();
        store
            .create_operation("u1", draft(OperationType::Income, 1000, None, 1))
            .await
            .unwrap();

        let feed = LiveFeed::attach(&store, "u1");
        assert_eq!(feed.operations().len(), 1);

        let groceries = store
            .create_category(
                "u1",
                CategoryDraft {
                    name: "Groceries".to_string(),
                    kind: OperationType::Expense,
                },
            )
            .await
            .unwrap();
        store
            .create_operation("u1", draft(OperationType::Expense, 50, Some(&groceries.id), 5))
            .await
            .unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
        let totals = feed.period_totals(Period::Monthly, now);
        assert_eq!(totals.balance, Decimal::new(950, 0));
        assert_eq!(feed.categories().len(), 1);
        assert_eq!(feed.category_ids(), vec![groceries.id.clone()]);
        assert!(feed.category_breakdown(Period::Monthly, now).get("Groceries").is_some());
        assert_eq!(feed.query(&QueryParams::default()).matched_count, 2);
    }

    #[tokio::test]
    async fn test_feed_ignores_other_users_and_detaches() {
        let store = MemoryStore::new();
        let feed = LiveFeed::attach(&store, "u1");
        assert_eq!(feed.user(), "u1");
        store
            .create_operation("u2", draft(OperationType::Expense, 5, None, 2))
            .await
            .unwrap();
        assert!(feed.operations().is_empty());

        drop(feed);
        store
            .create_operation("u1", draft(OperationType::Expense, 5, None, 2))
            .await
            .unwrap();
        assert_eq!(store.operations("u1").await.unwrap().len(), 1);
    }
}
