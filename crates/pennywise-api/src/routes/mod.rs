//! Route modules for the API server
//!
//! - operations: operation list query and CRUD
//! - categories: category list and CRUD
//! - stats: totals, trend, category breakdown, monthly balance, overview
//!
//! Every route is scoped to one user under `/api/users/:user_id`.

pub mod categories;
pub mod operations;
pub mod stats;

use crate::ApiError;
use std::collections::HashMap;
use std::str::FromStr;

/// Query string as handed to the handlers
pub type Params = HashMap<String, String>;

/// Parse an optional query parameter; blank values count as absent
pub(crate) fn parse_param<T>(params: &Params, key: &str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match params.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ApiError::bad_request(format!("invalid {} '{}': {}", key, raw, e))),
    }
}

/// Parse a count parameter and check it against `min..=max`
pub(crate) fn parse_count(
    params: &Params,
    key: &str,
    default: usize,
    max: usize,
) -> Result<usize, ApiError> {
    let value = parse_param::<usize>(params, key)?.unwrap_or(default);
    if value == 0 || value > max {
        return Err(ApiError::bad_request(format!(
            "{} must be between 1 and {}",
            key, max
        )));
    }
    Ok(value)
}
