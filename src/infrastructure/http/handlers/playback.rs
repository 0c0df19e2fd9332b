//! Playback Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::commands::Command;
use crate::application::queries::SelectionSnapshot;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 朗读当前文本（正在朗读时先取消再重新开始）
pub async fn speak(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SelectionSnapshot>>, ApiError> {
    let snapshot = state.controller.speak().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 停止朗读
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SelectionSnapshot>>, ApiError> {
    let snapshot = state.controller.stop().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 关闭错误提示
pub async fn dismiss_error(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SelectionSnapshot>>, ApiError> {
    let snapshot = state.controller.execute(Command::DismissError).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}
