//! 领域层
//!
//! - voice: 语音描述、语言分组目录、语速 / 音调
//! - selection: 表单选择状态与朗读状态

pub mod selection;
pub mod voice;
