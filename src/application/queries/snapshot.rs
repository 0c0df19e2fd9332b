//! Selection Snapshot - 表单状态读模型
//!
//! 前端渲染所需的全部状态，经 HTTP / WebSocket 序列化为 JSON。

use serde::Serialize;

use crate::application::error::LastError;
use crate::domain::selection::PlaybackStatus;
use crate::domain::voice::VoiceCatalog;

/// 选择状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    pub selected_language: Option<String>,
    pub selected_voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub text: String,
    pub playback_status: PlaybackStatus,
    pub loading: bool,
    pub last_error: Option<LastError>,
    /// 是否允许朗读（有文本、有语音、加载完成、能力可用）
    pub can_speak: bool,
    /// 平台语音能力是否可用
    pub available: bool,
    /// 目录版本号，每次整体替换递增
    pub catalog_revision: u64,
}

/// 语音目录及其版本号（同一次读取，保证一致）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub revision: u64,
    pub groups: VoiceCatalog,
}
