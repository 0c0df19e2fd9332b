//! 应用层错误定义
//!
//! 控制器错误分类：
//! - CapabilityUnavailable: 语音功能整体不可用（终态）
//! - NoVoicesFound: 超时后仍无语音（非致命）
//! - SpeakFailed: 单次朗读失败（非致命）
//! - InvalidSelection: 调用方错误，拒绝且不改变状态

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::voice::SelectionError;

/// 无语音时展示给用户的提示
pub const NO_VOICES_MESSAGE: &str =
    "No voices detected. Speech synthesis voices may not be supported on this platform.";

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 语音能力不可用
    #[error("Speech synthesis is not available: {0}")]
    CapabilityUnavailable(String),

    /// 朗读失败
    #[error("Speech failed: {0}")]
    SpeakFailed(String),

    /// 无效选择
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),

    /// 当前状态不允许朗读
    #[error("Speak is disabled: {0}")]
    SpeakDisabled(&'static str),

    /// 控制器已停止
    #[error("Voice controller has stopped")]
    ControllerStopped,
}

impl ApplicationError {
    /// 创建朗读失败错误
    pub fn speak_failed(reason: impl Into<String>) -> Self {
        Self::SpeakFailed(reason.into())
    }

    /// 创建能力不可用错误
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::CapabilityUnavailable(reason.into())
    }
}

/// 横幅错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CapabilityUnavailable,
    NoVoicesFound,
    SpeakFailed,
}

/// 最近一次错误（新错误覆盖旧错误，不堆叠）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub kind: ErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl LastError {
    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            occurred_at: Utc::now(),
        }
    }

    pub fn capability_unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::CapabilityUnavailable,
            ApplicationError::unavailable(reason).to_string(),
        )
    }

    pub fn no_voices() -> Self {
        Self::new(ErrorKind::NoVoicesFound, NO_VOICES_MESSAGE.to_string())
    }

    pub fn speak_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::SpeakFailed, reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_voices_message() {
        let error = LastError::no_voices();
        assert_eq!(error.kind, ErrorKind::NoVoicesFound);
        assert!(error.message.starts_with("No voices detected"));
    }

    #[test]
    fn test_selection_error_converts() {
        let err: ApplicationError = SelectionError::NoLanguageSelected.into();
        assert!(matches!(err, ApplicationError::InvalidSelection(_)));
    }

    #[test]
    fn test_last_error_serializes() {
        let json = serde_json::to_value(LastError::speak_failed("synthesis-failed")).unwrap();
        assert_eq!(json["kind"], "speak_failed");
        assert_eq!(json["message"], "synthesis-failed");
        assert!(json["occurredAt"].is_string());
    }
}
