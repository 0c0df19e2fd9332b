//! Voice Context - Errors

use thiserror::Error;

use super::LanguageGroupKey;

/// 选择错误（调用方错误，拒绝且不改变状态）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("Unknown language group: {0}")]
    UnknownLanguage(LanguageGroupKey),

    #[error("Voice {voice} is not in language group {language}")]
    UnknownVoice {
        language: LanguageGroupKey,
        voice: String,
    },

    #[error("No language group is selected")]
    NoLanguageSelected,
}
