//! Selection Context - Aggregate Root

use crate::domain::voice::{LanguageGroupKey, Prosody, SelectionError, VoiceCatalog, VoiceDescriptor};

/// 目录替换后选择的变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// 原语言与语音都仍然有效
    Preserved,
    /// 原语言仍存在，但语音已不在组内，重置为组内第一个语音
    VoiceReset,
    /// 首次填充或原语言已消失，重置为第一个分组
    LanguageReset,
}

/// 选择聚合根
///
/// 不变量:
/// - `voice` 若存在，必须是 `catalog[language]` 中的语音
/// - `language` 若存在，必须是 `catalog` 中的键
/// - rate / pitch 始终在 [0.5, 2.0] 内
#[derive(Debug, Clone, Default)]
pub struct Selection {
    catalog: VoiceCatalog,
    language: Option<LanguageGroupKey>,
    voice: Option<String>,
    rate: Prosody,
    pitch: Prosody,
    text: String,
}

impl Selection {
    pub fn new(rate: Prosody, pitch: Prosody) -> Self {
        Self {
            rate,
            pitch,
            ..Default::default()
        }
    }

    /// 整体替换语音目录并校正选择
    pub fn replace_catalog(&mut self, catalog: VoiceCatalog) -> Reconciliation {
        self.catalog = catalog;

        let kept_language = self
            .language
            .as_ref()
            .is_some_and(|key| self.catalog.contains_key(key));

        if !kept_language {
            self.language = self.catalog.first_key().cloned();
            self.voice = self.first_voice_of_selected();
            return Reconciliation::LanguageReset;
        }

        let kept_voice = match (&self.language, &self.voice) {
            (Some(key), Some(name)) => self.catalog.find_voice(key, name).is_some(),
            _ => false,
        };
        if kept_voice {
            Reconciliation::Preserved
        } else {
            self.voice = self.first_voice_of_selected();
            Reconciliation::VoiceReset
        }
    }

    /// 清空目录与选择（拆除时调用）
    pub fn clear_catalog(&mut self) {
        self.catalog = VoiceCatalog::empty();
        self.language = None;
        self.voice = None;
    }

    /// 切换语言，语音重置为该组第一个
    pub fn select_language(&mut self, key: &LanguageGroupKey) -> Result<(), SelectionError> {
        if !self.catalog.contains_key(key) {
            return Err(SelectionError::UnknownLanguage(key.clone()));
        }
        self.language = Some(key.clone());
        self.voice = self.first_voice_of_selected();
        Ok(())
    }

    /// 切换语音，必须属于当前选中的语言组
    pub fn select_voice(&mut self, name: &str) -> Result<(), SelectionError> {
        let key = self
            .language
            .as_ref()
            .ok_or(SelectionError::NoLanguageSelected)?;
        if self.catalog.find_voice(key, name).is_none() {
            return Err(SelectionError::UnknownVoice {
                language: key.clone(),
                voice: name.to_string(),
            });
        }
        self.voice = Some(name.to_string());
        Ok(())
    }

    pub fn set_rate(&mut self, value: f32) -> Prosody {
        self.rate = Prosody::new(value);
        self.rate
    }

    pub fn set_pitch(&mut self, value: f32) -> Prosody {
        self.pitch = Prosody::new(value);
        self.pitch
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// 当前选中语音的完整描述
    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        let key = self.language.as_ref()?;
        let name = self.voice.as_deref()?;
        self.catalog.find_voice(key, name)
    }

    /// 文本是否可朗读（仅空白视为空）
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    fn first_voice_of_selected(&self) -> Option<String> {
        let key = self.language.as_ref()?;
        self.catalog
            .group(key)?
            .first()
            .map(|v| v.name().to_string())
    }

    // Getters
    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn language(&self) -> Option<&LanguageGroupKey> {
        self.language.as_ref()
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn rate(&self) -> Prosody {
        self.rate
    }

    pub fn pitch(&self) -> Prosody {
        self.pitch
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
