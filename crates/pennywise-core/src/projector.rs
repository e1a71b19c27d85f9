//! Aggregates an operation snapshot into dashboard statistics
//!
//! Every method is a pure function of the snapshots held by the projector
//! and the `now` it is given. Empty snapshots produce zero aggregates.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use pennywise_config::Period;
use std::collections::HashMap;

use crate::models::{Category, CategoryIndex, Operation};
use crate::reports::{
    AmountFormatter, CategoryBreakdown, CategoryTotal, DisplayTotals, MonthlyBalancePoint,
    PeriodTotals, StatsOverview, Sums, TrendPoint,
};
use crate::time::{Calendar, TimeFilter, Window};

/// Number of operations listed in the overview
pub const RECENT_COUNT: usize = 5;

/// Statistics over one user's snapshots
#[derive(Debug, Clone)]
pub struct FeedProjector<'a> {
    operations: &'a [Operation],
    categories: CategoryIndex,
    calendar: Calendar,
}

impl<'a> FeedProjector<'a> {
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

    /// Display label of an operation's category
    pub fn category_label(&self, op: &Operation) -> &str {
        self.categories.label(&op.category_id)
    }

    fn in_window<'s>(&'s self, window: &'s Window) -> impl Iterator<Item = &'a Operation> + 's {
        self.operations
            .iter()
            .filter(move |op| op.within(&self.calendar, window))
    }

    /// Income, expense and balance of the current `period`
    pub fn period_totals(&self, period: Period, now: DateTime<Utc>) -> PeriodTotals {
        let window = self.calendar.period_window(period, now);
        let operations: Vec<Operation> = self.in_window(&window).cloned().collect();
        let sums: Sums = operations.iter().collect();

        PeriodTotals {
            period,
            window,
            income: sums.income,
            expense: sums.expense,
            balance: sums.balance(),
            operations,
        }
    }

    /// Daily sums for the last `days` days, oldest first, ending today
    pub fn trend(&self, days: usize, now: DateTime<Utc>) -> Vec<TrendPoint> {
        let dates = self.calendar.days_ending(now, days);
        let (first, last) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };

        let mut by_day: HashMap<NaiveDate, Sums> = HashMap::new();
        for op in self.in_window(&Window::days(first, last.succ_opt())) {
            let day = self.calendar.local(op.timestamp).date();
            by_day.entry(day).or_default().add(op);
        }

        dates
            .into_iter()
            .map(|date| {
                let sums = by_day.get(&date).copied().unwrap_or_default();
                TrendPoint {
                    date,
                    label: date.format("%d/%m").to_string(),
                    income: sums.income,
                    expense: sums.expense,
                    balance: sums.balance(),
                }
            })
            .collect()
    }

    /// Per-category totals of the operations in the current `period`
    pub fn category_breakdown(&self, period: Period, now: DateTime<Utc>) -> CategoryBreakdown {
        let window = self.calendar.period_window(period, now);

        let mut by_label: HashMap<&str, Sums> = HashMap::new();
        for op in self.in_window(&window) {
            by_label.entry(self.category_label(op)).or_default().add(op);
        }

        let mut entries: Vec<CategoryTotal> = by_label
            .into_iter()
            .map(|(label, sums)| CategoryTotal {
                label: label.to_string(),
                income: sums.income,
                expense: sums.expense,
                total: sums.income + sums.expense,
            })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));

        CategoryBreakdown { period, entries }
    }

    /// Monthly sums for the last `months` calendar months, oldest first
    pub fn monthly_balance(&self, months: usize, now: DateTime<Utc>) -> Vec<MonthlyBalancePoint> {
        let firsts = self.calendar.months_ending(now, months);
        let (first, last) = match (firsts.first(), firsts.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };
        let span = Window {
            start: Window::month(first).start,
            end: Window::month(last).end,
        };

        let mut by_month: HashMap<(i32, u32), Sums> = HashMap::new();
        for op in self.in_window(&span) {
            let day = self.calendar.local(op.timestamp).date();
            by_month.entry((day.year(), day.month())).or_default().add(op);
        }

        firsts
            .into_iter()
            .map(|month| {
                let sums = by_month
                    .get(&(month.year(), month.month()))
                    .copied()
                    .unwrap_or_default();
                MonthlyBalancePoint {
                    month,
                    label: month.format("%b %Y").to_string(),
                    income: sums.income,
                    expense: sums.expense,
                    balance: sums.balance(),
                }
            })
            .collect()
    }

    /// Latest `count` operations by timestamp
    pub fn recent(&self, count: usize) -> Vec<Operation> {
        let mut operations = self.operations.to_vec();
        operations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        operations.truncate(count);
        operations
    }

    /// Totals, category breakdown and recent operations of one period
    pub fn overview(
        &self,
        period: Period,
        now: DateTime<Utc>,
        formatter: &AmountFormatter,
    ) -> StatsOverview {
        let totals = self.period_totals(period, now);
        let display = DisplayTotals {
            income: formatter.format(totals.income),
            expense: formatter.format(totals.expense),
            balance: formatter.format(totals.balance),
        };

        StatsOverview {
            period,
            window: totals.window,
            income: totals.income,
            expense: totals.expense,
            balance: totals.balance,
            operation_count: totals.operation_count(),
            display,
            categories: self.category_breakdown(period, now),
            recent: self.recent(RECENT_COUNT),
        }
    }
}
