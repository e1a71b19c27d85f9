//! Category endpoints (JSON API)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pennywise_core::{validate_category, Category, CategoryDraft, TypeFilter};

use super::{parse_param, Params};
use crate::{ApiError, AppState};

/// List categories, optionally only those of one `type`
pub async fn list_categories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let type_filter = parse_param::<TypeFilter>(&params, "type")?.unwrap_or_default();
    let categories: Vec<Category> = state
        .store
        .categories(&user_id)
        .await?
        .into_iter()
        .filter(|c| type_filter.matches(c.kind))
        .collect();
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<CategoryDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(draft) = payload?;
    let draft = validate_category(draft)?;
    let category = state.store.create_category(&user_id, draft).await?;
    log::info!("Category '{}' created for {}", category.name, user_id);
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path((user_id, category_id)): Path<(String, String)>,
    payload: Result<Json<CategoryDraft>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let Json(draft) = payload?;
    let draft = validate_category(draft)?;
    let category = state
        .store
        .update_category(&user_id, &category_id, draft)
        .await?;
    log::info!("Category {} updated for {}", category.id, user_id);
    Ok(Json(category))
}

/// Delete a category; its operations fall back to "Uncategorized"
pub async fn delete_category(
    State(state): State<AppState>,
    Path((user_id, category_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_category(&user_id, &category_id).await?;
    log::info!("Category {} deleted for {}", category_id, user_id);
    Ok(StatusCode::NO_CONTENT)
}
