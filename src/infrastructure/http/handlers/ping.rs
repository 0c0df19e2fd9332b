//! Ping Handler
//!
//! 健康检查，附带语音能力概况

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 控制器是否仍在运行
    pub controller: bool,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let controller = state.controller.snapshot().await.is_ok();
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        controller,
    })
}
