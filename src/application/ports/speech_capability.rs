//! Speech Capability Port - 平台语音合成能力抽象
//!
//! 语音能力是外部的、异步的、由平台拥有的服务。应用只负责发现、分组与驱动它；
//! 具体实现在 infrastructure/adapters 层。
//!
//! 所有回调都表示为 [`ControllerEvent`]，经由 [`EventSender`] 投递到控制器的事件队列，
//! 而不是隐藏的控制流。

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::selection::UtteranceId;
use crate::domain::voice::{Prosody, VoiceDescriptor};

/// 语音能力错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech capability unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// 投递给控制器的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// 语音列表可能已变化，应重新读取
    VoicesChanged,
    /// 朗读开始
    UtteranceStarted(UtteranceId),
    /// 朗读结束
    UtteranceEnded(UtteranceId),
    /// 朗读失败
    UtteranceFailed { id: UtteranceId, reason: String },
    /// 语音发现的兜底超时
    DiscoveryTimeout,
}

pub type EventSender = mpsc::UnboundedSender<ControllerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ControllerEvent>;

/// 创建控制器事件通道
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// 一次朗读请求
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
    pub id: UtteranceId,
    /// 要朗读的文本
    pub text: String,
    /// 解析后的语音；None 表示使用平台默认语音
    pub voice: Option<VoiceDescriptor>,
    /// 语速倍率 (0.5 - 2.0)
    pub rate: Prosody,
    /// 音调倍率 (0.5 - 2.0)
    pub pitch: Prosody,
}

/// Speech Capability Port
///
/// 进度通过事件报告，顺序为 start → (end | error)，每个请求至多一次 start。
pub trait SpeechCapabilityPort: Send + Sync {
    /// 平台是否提供语音合成能力
    fn is_available(&self) -> bool {
        true
    }

    /// 当前语音列表的同步快照，可能为空
    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError>;

    /// 订阅 "语音列表已变化" 通知，可能触发零次或多次
    fn on_voices_changed(&self, events: EventSender) -> Result<(), SpeechError>;

    /// 提交朗读请求（fire-and-forget）
    fn speak(&self, request: UtteranceRequest, events: EventSender) -> Result<(), SpeechError>;

    /// 取消当前朗读，幂等
    fn cancel_speaking(&self);

    /// 尽力而为的发声状态检查
    fn is_speaking(&self) -> bool;
}
