//! Report structures produced by the projector

use chrono::NaiveDate;
use pennywise_config::{CurrencyConfig, Period, SymbolPosition};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Operation;
use crate::time::Window;

/// Income and expense sums of one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sums {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Sums {
    pub fn add(&mut self, op: &Operation) {
        if op.is_income() {
            self.income += op.amount;
        } else {
            self.expense += op.amount;
        }
    }

    pub fn balance(&self) -> Decimal {
        self.income - self.expense
    }
}

impl<'a> FromIterator<&'a Operation> for Sums {
    fn from_iter<I: IntoIterator<Item = &'a Operation>>(iter: I) -> Self {
        let mut sums = Sums::default();
        for op in iter {
            sums.add(op);
        }
        sums
    }
}

/// Totals of the current period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub period: Period,
    pub window: Window,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    /// Operations inside the window, in snapshot order
    pub operations: Vec<Operation>,
}

impl PeriodTotals {
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

/// One day of the trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Short axis label, `dd/mm`
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// One calendar month of the balance history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBalancePoint {
    /// First day of the month
    pub month: NaiveDate,
    /// Axis label, e.g. `Jan 2024`
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Per-category totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
    /// income + expense (volume, not net)
    pub total: Decimal,
}

/// Category report for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub period: Period,
    /// Largest total first, ties by label
    pub entries: Vec<CategoryTotal>,
}

impl CategoryBreakdown {
    pub fn get(&self, label: &str) -> Option<&CategoryTotal> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|e| e.total).sum()
    }
}

/// Amounts rendered for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTotals {
    pub income: String,
    pub expense: String,
    pub balance: String,
}

/// Everything the dashboard shows for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub period: Period,
    pub window: Window,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub operation_count: usize,
    pub display: DisplayTotals,
    pub categories: CategoryBreakdown,
    pub recent: Vec<Operation>,
}

/// Renders amounts with the configured currency settings
#[derive(Debug, Clone, Default)]
pub struct AmountFormatter {
    currency: CurrencyConfig,
}

impl AmountFormatter {
    pub fn new(currency: CurrencyConfig) -> Self {
        Self { currency }
    }

    pub fn format(&self, amount: Decimal) -> String {
        let places = self.currency.decimal_places;
        let mut magnitude = amount.abs().round_dp(places);
        magnitude.rescale(places);
        let text = magnitude.to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (text.as_str(), None),
        };

        let mut number = pennywise_utils::group_digits(int_part, &self.currency.thousands_separator);
        if let Some(frac) = frac_part {
            number.push_str(&self.currency.decimal_separator);
            number.push_str(frac);
        }

        let sign = if amount.is_sign_negative() && !magnitude.is_zero() { "-" } else { "" };
        match self.currency.symbol_position {
            SymbolPosition::Before => format!("{}{}{}", sign, self.currency.symbol, number),
            SymbolPosition::After => format!("{}{}{}", sign, number, self.currency.symbol),
        }
    }
}
