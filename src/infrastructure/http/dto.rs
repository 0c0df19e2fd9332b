//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Selection DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectLanguageRequest {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectVoiceRequest {
    pub name: String,
}

/// 语速 / 音调请求（越界值由控制器钳位）
#[derive(Debug, Deserialize)]
pub struct ProsodyRequest {
    pub value: f32,
}

#[derive(Debug, Deserialize)]
pub struct SetTextRequest {
    pub text: String,
}
