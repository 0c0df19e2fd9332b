//! Selection Handlers
//!
//! 语言、语音、语速、音调、文本

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::commands::Command;
use crate::application::queries::SelectionSnapshot;
use crate::infrastructure::http::dto::{
    ApiResponse, ProsodyRequest, SelectLanguageRequest, SelectVoiceRequest, SetTextRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type SnapshotResult = Result<Json<ApiResponse<SelectionSnapshot>>, ApiError>;

async fn run(state: &AppState, command: Command) -> SnapshotResult {
    let snapshot = state.controller.execute(command).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 切换语言分组（语音重置为该组第一个）
pub async fn select_language(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectLanguageRequest>,
) -> SnapshotResult {
    let snapshot = state.controller.select_language(req.key).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 在当前语言分组内切换语音
pub async fn select_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectVoiceRequest>,
) -> SnapshotResult {
    let snapshot = state.controller.select_voice(req.name).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProsodyRequest>,
) -> SnapshotResult {
    run(&state, Command::SetRate(req.value)).await
}

pub async fn set_pitch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProsodyRequest>,
) -> SnapshotResult {
    run(&state, Command::SetPitch(req.value)).await
}

pub async fn set_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetTextRequest>,
) -> SnapshotResult {
    run(&state, Command::SetText(req.text)).await
}
