//! State Query Handlers
//!
//! 表单快照与语音目录

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::queries::{CatalogSnapshot, SelectionSnapshot};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 获取当前表单状态
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SelectionSnapshot>>, ApiError> {
    let snapshot = state.controller.snapshot().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 获取按语言分组的语音目录
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CatalogSnapshot>>, ApiError> {
    let catalog = state.controller.catalog().await?;
    Ok(Json(ApiResponse::success(catalog)))
}
