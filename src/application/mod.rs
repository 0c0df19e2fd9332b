//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 语音能力端口及回调事件
//! - commands: 控制器命令
//! - queries: 状态快照读模型
//! - controller: 语音选择控制器（发现、选择、朗读状态机）
//! - error: 应用层错误及错误横幅

pub mod commands;
pub mod controller;
pub mod error;
pub mod ports;
pub mod queries;

pub use commands::Command;
pub use controller::{ControllerSettings, VoiceSelectionController};
pub use error::{ApplicationError, ErrorKind, LastError, NO_VOICES_MESSAGE};
pub use ports::{
    event_channel, ControllerEvent, EventReceiver, EventSender, SpeechCapabilityPort,
    SpeechError, UtteranceRequest,
};
pub use queries::{CatalogSnapshot, SelectionSnapshot};
