//! Operation endpoints - list query and CRUD (JSON API)
//!
//! Endpoints:
//! - list_operations: filtered, sorted, paginated list plus category ids
//! - create_operation / update_operation: validated against the user's categories
//! - delete_operation

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use pennywise_core::{
    validate_operation, CategoryFilter, Operation, OperationDraft, QueryParams, QueryResult,
    SortDirection, SortField, TypeFilter,
};
use serde::{Deserialize, Serialize};

use super::{parse_param, Params};
use crate::{ApiError, AppState};

/// One page of the operation list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationListResponse {
    #[serde(flatten)]
    pub result: QueryResult,
    /// Category ids present in the unfiltered list, for the category filter
    pub category_ids: Vec<String>,
}

/// Build list parameters from the query string
///
/// Recognised keys: `type`, `q`, `category`, `from`, `to`, `sort`, `dir`,
/// `page`, `pageSize`.
pub fn query_params(params: &Params, default_page_size: usize) -> Result<QueryParams, ApiError> {
    let mut query = QueryParams::with_page_size(default_page_size);

    if let Some(type_filter) = parse_param::<TypeFilter>(params, "type")? {
        query.type_filter = type_filter;
    }
    if let Some(search) = params.get("q") {
        query.search = search.trim().to_string();
    }
    if let Some(category) = params.get("category") {
        query.category = CategoryFilter::parse(category.trim());
    }
    query.date_from = parse_param::<NaiveDate>(params, "from")?;
    query.date_to = parse_param::<NaiveDate>(params, "to")?;
    if let Some(field) = parse_param::<SortField>(params, "sort")? {
        query.sort_field = field;
    }
    if let Some(direction) = parse_param::<SortDirection>(params, "dir")? {
        query.sort_direction = direction;
    }
    if let Some(page) = parse_param::<usize>(params, "page")? {
        query.page = page;
    }
    if let Some(page_size) = parse_param::<usize>(params, "pageSize")? {
        if page_size == 0 {
            return Err(ApiError::bad_request("pageSize must be at least 1"));
        }
        query.page_size = page_size;
    }

    Ok(query)
}

/// List operations (JSON API)
pub async fn list_operations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<OperationListResponse>, ApiError> {
    let query = query_params(&params, state.config.pagination.records_per_page)?;
    let feed = state.feed(&user_id);

    Ok(Json(OperationListResponse {
        result: feed.query(&query),
        category_ids: feed.category_ids(),
    }))
}

/// Create an operation (JSON API)
pub async fn create_operation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<OperationDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Operation>), ApiError> {
    let Json(draft) = payload?;
    let categories = state.store.categories(&user_id).await?;
    let draft = validate_operation(draft, &categories)?;

    let operation = state.store.create_operation(&user_id, draft).await?;
    log::info!("Operation {} created for {}", operation.id, user_id);
    Ok((StatusCode::CREATED, Json(operation)))
}

/// Replace an operation's fields (JSON API)
pub async fn update_operation(
    State(state): State<AppState>,
    Path((user_id, operation_id)): Path<(String, String)>,
    payload: Result<Json<OperationDraft>, JsonRejection>,
) -> Result<Json<Operation>, ApiError> {
    let Json(draft) = payload?;
    let categories = state.store.categories(&user_id).await?;
    let draft = validate_operation(draft, &categories)?;

    let operation = state
        .store
        .update_operation(&user_id, &operation_id, draft)
        .await?;
    log::info!("Operation {} updated for {}", operation.id, user_id);
    Ok(Json(operation))
}

/// Delete an operation (JSON API)
pub async fn delete_operation(
    State(state): State<AppState>,
    Path((user_id, operation_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_operation(&user_id, &operation_id).await?;
    log::info!("Operation {} deleted for {}", operation_id, user_id);
    Ok(StatusCode::NO_CONTENT)
}
