//! Voice Context - 语音目录与分组

use serde::Serialize;

use super::language::{builtin_display_name, DisplayNameResolver};
use super::{LanguageGroupKey, VoiceDescriptor};

/// 一个语言分组：键 + 按枚举顺序排列的语音
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceGroup {
    pub key: LanguageGroupKey,
    pub voices: Vec<VoiceDescriptor>,
}

/// 语音目录 - LanguageGroupKey → 语音序列
///
/// 不变量:
/// - 分组顺序为各子标签首次出现的顺序
/// - 组内顺序与源列表一致
/// - 每次整体重建，从不增量修补
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VoiceCatalog {
    groups: Vec<VoiceGroup>,
}

impl VoiceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 分组数量
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// 所有分组中的语音总数
    pub fn voice_count(&self) -> usize {
        self.groups.iter().map(|g| g.voices.len()).sum()
    }

    pub fn groups(&self) -> &[VoiceGroup] {
        &self.groups
    }

    pub fn keys(&self) -> impl Iterator<Item = &LanguageGroupKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn first_key(&self) -> Option<&LanguageGroupKey> {
        self.groups.first().map(|g| &g.key)
    }

    pub fn contains_key(&self, key: &LanguageGroupKey) -> bool {
        self.group(key).is_some()
    }

    /// 指定分组的语音，分组不存在时返回 None
    pub fn group(&self, key: &LanguageGroupKey) -> Option<&[VoiceDescriptor]> {
        self.groups
            .iter()
            .find(|g| &g.key == key)
            .map(|g| g.voices.as_slice())
    }

    /// 在指定分组中按名称查找语音
    pub fn find_voice(&self, key: &LanguageGroupKey, name: &str) -> Option<&VoiceDescriptor> {
        self.group(key)?.iter().find(|v| v.name() == name)
    }

    fn push(&mut self, key: LanguageGroupKey, voice: VoiceDescriptor) {
        match self.groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.voices.push(voice),
            None => self.groups.push(VoiceGroup {
                key,
                voices: vec![voice],
            }),
        }
    }
}

/// 按主语言子标签分组（使用内置显示名表）
pub fn group_voices(voices: &[VoiceDescriptor]) -> VoiceCatalog {
    group_voices_with(voices, builtin_display_name)
}

/// 按主语言子标签分组，显示名由 `resolve` 提供；无法解析时回退到子标签本身
pub fn group_voices_with(voices: &[VoiceDescriptor], resolve: DisplayNameResolver) -> VoiceCatalog {
    let mut catalog = VoiceCatalog::empty();
    for voice in voices {
        let subtag = voice.primary_subtag();
        let display_name = resolve(subtag).unwrap_or_else(|| subtag.to_string());
        catalog.push(LanguageGroupKey::new(&display_name, subtag), voice.clone());
    }
    catalog
}
