//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 平台语音描述
///
/// 语音能力枚举出的只读快照，应用从不修改它。
/// `name` 在同一次枚举结果中唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    name: String,
    language_tag: String,
    is_local: bool,
    is_default: bool,
    uri: String,
}

impl VoiceDescriptor {
    pub fn new(
        name: impl Into<String>,
        language_tag: impl Into<String>,
        is_local: bool,
        is_default: bool,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            language_tag: language_tag.into(),
            is_local,
            is_default,
            uri: uri.into(),
        }
    }

    /// 本地语音的简便构造，uri 与名称相同
    pub fn local(name: impl Into<String>, language_tag: impl Into<String>) -> Self {
        let name = name.into();
        let uri = name.clone();
        Self::new(name, language_tag, true, false, uri)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language_tag(&self) -> &str {
        &self.language_tag
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 主语言子标签（第一个 `-` 之前的部分，保留原始大小写）
    pub fn primary_subtag(&self) -> &str {
        primary_subtag(&self.language_tag)
    }
}

/// 提取语言标签的主子标签
pub fn primary_subtag(language_tag: &str) -> &str {
    language_tag
        .split_once('-')
        .map(|(subtag, _)| subtag)
        .unwrap_or(language_tag)
}

/// 语言分组键 - `"{显示名} ({子标签})"`
///
/// 仅用于分组与展示，不是跨平台稳定的标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageGroupKey(String);

impl LanguageGroupKey {
    pub fn new(display_name: &str, subtag: &str) -> Self {
        Self(format!("{} ({})", display_name, subtag))
    }

    /// 从已有的键字符串构造（例如前端回传的选择）
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageGroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 语速 / 音调倍率 (0.5 - 2.0)
///
/// 构造时钳位，越界输入永远不会报错。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prosody(f32);

impl Prosody {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;
    pub const NORMAL: f32 = 1.0;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(Self::NORMAL);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Prosody {
    fn default() -> Self {
        Self(Self::NORMAL)
    }
}

impl From<f32> for Prosody {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}
