//! Voice Context - 语音限界上下文
//!
//! 职责:
//! - 平台语音描述
//! - 按语言分组的语音目录
//! - 语速 / 音调的取值约束

mod catalog;
mod errors;
mod language;
mod value_objects;

pub use catalog::{group_voices, group_voices_with, VoiceCatalog, VoiceGroup};
pub use errors::SelectionError;
pub use language::{builtin_display_name, DisplayNameResolver};
pub use value_objects::{primary_subtag, LanguageGroupKey, Prosody, VoiceDescriptor};
