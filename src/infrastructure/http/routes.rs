//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/state                GET   当前表单状态
//! - /api/voices               GET   按语言分组的语音目录
//! - /api/selection/language   POST  切换语言分组
//! - /api/selection/voice      POST  切换语音
//! - /api/selection/rate       POST  设置语速
//! - /api/selection/pitch      POST  设置音调
//! - /api/selection/text       POST  设置朗读文本
//! - /api/playback/speak       POST  朗读
//! - /api/playback/stop        POST  停止朗读
//! - /api/error/dismiss        POST  关闭错误提示
//! - /ws/events                WS    状态 / 目录变更推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/state", get(handlers::get_state))
        .route("/voices", get(handlers::list_voices))
        .nest("/selection", selection_routes())
        .nest("/playback", playback_routes())
        .route("/error/dismiss", post(handlers::dismiss_error))
}

/// Selection 路由
fn selection_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/language", post(handlers::select_language))
        .route("/voice", post(handlers::select_voice))
        .route("/rate", post(handlers::set_rate))
        .route("/pitch", post(handlers::set_pitch))
        .route("/text", post(handlers::set_text))
}

/// Playback 路由
fn playback_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/speak", post(handlers::speak))
        .route("/stop", post(handlers::stop))
}
