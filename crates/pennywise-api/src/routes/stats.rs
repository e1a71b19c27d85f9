//! Statistics endpoints
//!
//! All endpoints accept an optional `at` parameter (RFC 3339 instant) that
//! replaces the current time, so past dashboards can be reproduced.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use pennywise_config::Period;
use pennywise_core::{
    AmountFormatter, CategoryBreakdown, MonthlyBalancePoint, PeriodTotals, StatsOverview,
    TrendPoint,
};

use super::{parse_count, parse_param, Params};
use crate::{ApiError, AppState};

const MAX_TREND_DAYS: usize = 366;
const MAX_BALANCE_MONTHS: usize = 120;

fn requested_period(params: &Params, state: &AppState) -> Result<Period, ApiError> {
    Ok(parse_param::<Period>(params, "period")?.unwrap_or(state.config.stats.default_period))
}

fn requested_now(params: &Params) -> Result<DateTime<Utc>, ApiError> {
    Ok(parse_param::<DateTime<Utc>>(params, "at")?.unwrap_or_else(Utc::now))
}

/// Totals of the current period
pub async fn totals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<PeriodTotals>, ApiError> {
    let period = requested_period(&params, &state)?;
    let now = requested_now(&params)?;
    let feed = state.feed(&user_id);
    Ok(Json(feed.period_totals(period, now)))
}

/// Daily sums, oldest first
pub async fn trend(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let days = parse_count(&params, "days", state.config.stats.trend_days, MAX_TREND_DAYS)?;
    let now = requested_now(&params)?;
    let feed = state.feed(&user_id);
    Ok(Json(feed.trend(days, now)))
}

pub async fn categories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<CategoryBreakdown>, ApiError> {
    let period = requested_period(&params, &state)?;
    let now = requested_now(&params)?;
    let feed = state.feed(&user_id);
    Ok(Json(feed.category_breakdown(period, now)))
}

/// Monthly sums, oldest first
pub async fn balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<MonthlyBalancePoint>>, ApiError> {
    let months = parse_count(
        &params,
        "months",
        state.config.stats.balance_months,
        MAX_BALANCE_MONTHS,
    )?;
    let now = requested_now(&params)?;
    let feed = state.feed(&user_id);
    Ok(Json(feed.monthly_balance(months, now)))
}

/// Dashboard summary with formatted amounts
pub async fn overview(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<StatsOverview>, ApiError> {
    let period = requested_period(&params, &state)?;
    let now = requested_now(&params)?;
    let formatter = AmountFormatter::new(state.config.currency.clone());
    let feed = state.feed(&user_id);
    Ok(Json(feed.overview(period, now, &formatter)))
}
