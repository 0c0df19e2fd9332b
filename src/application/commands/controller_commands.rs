//! Controller Commands - 表单操作命令
//!
//! 用户在表单上的每个操作对应一条命令，由控制器按到达顺序串行执行。

use crate::domain::voice::LanguageGroupKey;

/// 控制器命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 切换语言分组（语音重置为组内第一个）
    SelectLanguage(LanguageGroupKey),
    /// 切换当前语言组内的语音
    SelectVoice(String),
    /// 设置语速（钳位到 0.5 - 2.0）
    SetRate(f32),
    /// 设置音调（钳位到 0.5 - 2.0）
    SetPitch(f32),
    /// 设置朗读文本
    SetText(String),
    /// 朗读（正在朗读时为重新开始）
    Speak,
    /// 停止朗读
    Stop,
    /// 关闭错误横幅
    DismissError,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectLanguage(_) => "select_language",
            Self::SelectVoice(_) => "select_voice",
            Self::SetRate(_) => "set_rate",
            Self::SetPitch(_) => "set_pitch",
            Self::SetText(_) => "set_text",
            Self::Speak => "speak",
            Self::Stop => "stop",
            Self::DismissError => "dismiss_error",
        }
    }
}
