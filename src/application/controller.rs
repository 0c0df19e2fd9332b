//! Voice Selection Controller - 语音发现 / 选择 / 播放状态机
//!
//! 控制器拥有全部表单状态，只与一个外部协作者（语音能力）交互。
//! 所有输入（用户命令、能力回调、兜底定时器）都在同一个事件处理任务中串行处理，
//! 因此这里不需要任何锁。
//!
//! 发现流程:
//! 1. 初始化时立即读取一次语音列表
//! 2. 订阅 "语音列表已变化"，每次触发都重新读取
//! 3. 启动兜底定时器，超时后仍为空则结束加载并给出提示
//!
//! 播放状态机: Idle ⇄ Speaking，同一时刻至多一个活动朗读。

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::application::commands::Command;
use crate::application::error::{ApplicationError, ErrorKind, LastError};
use crate::application::ports::{
    ControllerEvent, EventSender, SpeechCapabilityPort, SpeechError, UtteranceRequest,
};
use crate::application::queries::{CatalogSnapshot, SelectionSnapshot};
use crate::domain::selection::{PlaybackStatus, Reconciliation, Selection, UtteranceId};
use crate::domain::voice::{group_voices, LanguageGroupKey, Prosody, VoiceCatalog};

/// 控制器配置
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// 语音发现兜底超时
    pub discovery_timeout: Duration,
    /// 初始语速
    pub default_rate: Prosody,
    /// 初始音调
    pub default_pitch: Prosody,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            discovery_timeout: Duration::from_millis(3000),
            default_rate: Prosody::default(),
            default_pitch: Prosody::default(),
        }
    }
}

/// 语音选择控制器
pub struct VoiceSelectionController {
    capability: Arc<dyn SpeechCapabilityPort>,
    events: EventSender,
    settings: ControllerSettings,
    selection: Selection,
    playback: PlaybackStatus,
    /// 当前被认可的朗读；其他 id 的回调一律忽略
    current_utterance: Option<UtteranceId>,
    loading: bool,
    available: bool,
    torn_down: bool,
    last_error: Option<LastError>,
    catalog_revision: u64,
    discovery_timer: Option<JoinHandle<()>>,
}

impl VoiceSelectionController {
    pub fn new(
        capability: Arc<dyn SpeechCapabilityPort>,
        events: EventSender,
        settings: ControllerSettings,
    ) -> Self {
        let selection = Selection::new(settings.default_rate, settings.default_pitch);
        Self {
            capability,
            events,
            settings,
            selection,
            playback: PlaybackStatus::Idle,
            current_utterance: None,
            loading: true,
            available: true,
            torn_down: false,
            last_error: None,
            catalog_revision: 0,
            discovery_timer: None,
        }
    }

    // ========== 语音发现 ==========

    /// 初始化：检查能力、订阅变化、立即读取、必要时启动兜底定时器
    pub fn initialize(&mut self) {
        if self.torn_down {
            return;
        }

        if !self.capability.is_available() {
            self.mark_unavailable("the platform does not provide speech synthesis");
            return;
        }

        match self.capability.on_voices_changed(self.events.clone()) {
            Ok(()) => {}
            Err(SpeechError::Unavailable(reason)) => {
                self.mark_unavailable(reason);
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to subscribe to voice changes");
            }
        }

        self.refresh_voices();

        if self.loading {
            self.schedule_discovery_timeout();
        }
    }

    /// 重新读取语音列表；只有非空结果会替换目录
    pub fn refresh_voices(&mut self) {
        if self.torn_down || !self.available {
            return;
        }

        let voices = match self.capability.list_voices() {
            Ok(voices) => voices,
            Err(SpeechError::Unavailable(reason)) => {
                self.mark_unavailable(reason);
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list voices");
                return;
            }
        };

        if voices.is_empty() {
            tracing::debug!(loading = self.loading, "Voice list is empty, keeping current catalog");
            return;
        }

        self.apply_catalog(group_voices(&voices));
    }

    fn apply_catalog(&mut self, catalog: VoiceCatalog) {
        let groups = catalog.len();
        let voices = catalog.voice_count();
        let outcome = self.selection.replace_catalog(catalog);

        self.catalog_revision += 1;
        self.loading = false;
        self.cancel_discovery_timer();

        if self
            .last_error
            .as_ref()
            .is_some_and(|e| e.kind == ErrorKind::NoVoicesFound)
        {
            self.last_error = None;
        }

        tracing::info!(
            groups = groups,
            voices = voices,
            revision = self.catalog_revision,
            language = ?self.selection.language().map(|k| k.as_str()),
            voice = ?self.selection.voice(),
            "Voice catalog replaced"
        );
        if outcome != Reconciliation::Preserved {
            tracing::debug!(outcome = ?outcome, "Selection reconciled against new catalog");
        }
    }

    fn schedule_discovery_timeout(&mut self) {
        self.cancel_discovery_timer();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, voice discovery timeout not scheduled");
            return;
        };

        let events = self.events.clone();
        let timeout = self.settings.discovery_timeout;
        tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Voice discovery timeout scheduled");

        self.discovery_timer = Some(runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(ControllerEvent::DiscoveryTimeout);
        }));
    }

    fn cancel_discovery_timer(&mut self) {
        if let Some(timer) = self.discovery_timer.take() {
            timer.abort();
        }
    }

    fn on_discovery_timeout(&mut self) {
        self.discovery_timer = None;
        if !self.selection.catalog().is_empty() || !self.available {
            return;
        }
        self.loading = false;
        tracing::warn!(
            timeout_ms = self.settings.discovery_timeout.as_millis() as u64,
            "No voices detected before discovery timeout"
        );
        self.record_error(LastError::no_voices());
    }

    fn mark_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(reason = %reason, "Speech capability unavailable");
        self.available = false;
        self.loading = false;
        self.cancel_discovery_timer();
        self.record_error(LastError::capability_unavailable(reason));
    }

    // ========== 事件 ==========

    /// 处理能力回调与定时器事件
    pub fn handle_event(&mut self, event: ControllerEvent) {
        if self.torn_down {
            tracing::debug!(event = ?event, "Controller torn down, ignoring event");
            return;
        }

        match event {
            ControllerEvent::VoicesChanged => self.refresh_voices(),
            ControllerEvent::DiscoveryTimeout => self.on_discovery_timeout(),
            ControllerEvent::UtteranceStarted(id) => {
                if self.is_current(id) {
                    self.playback = PlaybackStatus::Speaking;
                    tracing::debug!(utterance_id = %id, "Utterance started");
                }
            }
            ControllerEvent::UtteranceEnded(id) => {
                if self.is_current(id) {
                    self.finish_utterance();
                    tracing::debug!(utterance_id = %id, "Utterance ended");
                }
            }
            ControllerEvent::UtteranceFailed { id, reason } => {
                if self.is_current(id) {
                    self.finish_utterance();
                    tracing::warn!(utterance_id = %id, reason = %reason, "Utterance failed");
                    self.record_error(LastError::speak_failed(reason));
                }
            }
        }
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        let current = self.current_utterance == Some(id);
        if !current {
            tracing::debug!(utterance_id = %id, "Ignoring callback from superseded utterance");
        }
        current
    }

    fn finish_utterance(&mut self) {
        self.current_utterance = None;
        self.playback = PlaybackStatus::Idle;
    }

    // ========== 命令 ==========

    /// 执行一条表单命令
    pub fn execute(&mut self, command: Command) -> Result<(), ApplicationError> {
        self.ensure_running()?;
        match command {
            Command::SelectLanguage(key) => self.select_language(&key),
            Command::SelectVoice(name) => self.select_voice(&name),
            Command::SetRate(value) => {
                self.set_rate(value);
                Ok(())
            }
            Command::SetPitch(value) => {
                self.set_pitch(value);
                Ok(())
            }
            Command::SetText(text) => {
                self.set_text(text);
                Ok(())
            }
            Command::Speak => self.speak().map(|_| ()),
            Command::Stop => {
                self.stop_speaking();
                Ok(())
            }
            Command::DismissError => {
                self.dismiss_error();
                Ok(())
            }
        }
    }

    pub fn select_language(&mut self, key: &LanguageGroupKey) -> Result<(), ApplicationError> {
        self.ensure_running()?;
        self.selection.select_language(key).map_err(|e| {
            tracing::debug!(error = %e, "Language selection rejected");
            ApplicationError::from(e)
        })?;
        tracing::debug!(language = %key, voice = ?self.selection.voice(), "Language selected");
        Ok(())
    }

    pub fn select_voice(&mut self, name: &str) -> Result<(), ApplicationError> {
        self.ensure_running()?;
        self.selection.select_voice(name).map_err(|e| {
            tracing::debug!(error = %e, "Voice selection rejected");
            ApplicationError::from(e)
        })?;
        tracing::debug!(voice = %name, "Voice selected");
        Ok(())
    }

    pub fn set_rate(&mut self, value: f32) -> Prosody {
        self.selection.set_rate(value)
    }

    pub fn set_pitch(&mut self, value: f32) -> Prosody {
        self.selection.set_pitch(value)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.selection.set_text(text);
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// 朗读当前文本
    ///
    /// 已有活动朗读时先取消再提交（重新开始），状态保持 Speaking 直到新的 start 回调。
    pub fn speak(&mut self) -> Result<UtteranceId, ApplicationError> {
        self.ensure_running()?;
        if let Some(reason) = self.speak_blocker() {
            return Err(ApplicationError::SpeakDisabled(reason));
        }

        if self.current_utterance.is_some() || self.capability.is_speaking() {
            tracing::debug!(
                superseded = ?self.current_utterance,
                "Cancelling active utterance before submitting a new one"
            );
            self.capability.cancel_speaking();
        }

        let id = UtteranceId::new();
        let request = UtteranceRequest {
            id,
            text: self.selection.text().to_string(),
            voice: self.selection.selected_voice().cloned(),
            rate: self.selection.rate(),
            pitch: self.selection.pitch(),
        };
        let voice_name = request.voice.as_ref().map(|v| v.name().to_string());
        let text_len = request.text.chars().count();

        self.current_utterance = Some(id);
        if let Err(e) = self.capability.speak(request, self.events.clone()) {
            tracing::warn!(utterance_id = %id, error = %e, "Failed to submit utterance");
            self.finish_utterance();
            self.record_error(LastError::speak_failed(e.to_string()));
            return Err(ApplicationError::speak_failed(e.to_string()));
        }

        tracing::info!(
            utterance_id = %id,
            voice = ?voice_name,
            text_len = text_len,
            rate = self.selection.rate().value(),
            pitch = self.selection.pitch().value(),
            "Utterance submitted"
        );
        Ok(id)
    }

    /// 停止朗读，立即回到 Idle（不等待 end 回调）
    pub fn stop_speaking(&mut self) {
        self.capability.cancel_speaking();
        if let Some(id) = self.current_utterance {
            tracing::info!(utterance_id = %id, "Utterance stopped");
        }
        self.finish_utterance();
    }

    /// 拆除：取消定时器与朗读，丢弃目录；之后忽略所有事件
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.cancel_discovery_timer();
        self.capability.cancel_speaking();
        self.finish_utterance();
        self.selection.clear_catalog();
        self.torn_down = true;
        tracing::info!("Voice selection controller torn down");
    }

    fn ensure_running(&self) -> Result<(), ApplicationError> {
        if self.torn_down {
            Err(ApplicationError::ControllerStopped)
        } else {
            Ok(())
        }
    }

    /// 朗读被禁用的原因
    fn speak_blocker(&self) -> Option<&'static str> {
        if !self.available {
            Some("speech synthesis is unavailable")
        } else if self.loading {
            Some("voices are still loading")
        } else if self.selection.voice().is_none() {
            Some("no voice selected")
        } else if !self.selection.has_text() {
            Some("text is empty")
        } else {
            None
        }
    }

    fn record_error(&mut self, error: LastError) {
        tracing::debug!(kind = ?error.kind, message = %error.message, "Recording error");
        self.last_error = Some(error);
    }

    // ========== 查询 ==========

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selected_language: self.selection.language().map(|k| k.as_str().to_string()),
            selected_voice: self.selection.voice().map(str::to_string),
            rate: self.selection.rate().value(),
            pitch: self.selection.pitch().value(),
            text: self.selection.text().to_string(),
            playback_status: self.playback,
            loading: self.loading,
            last_error: self.last_error.clone(),
            can_speak: !self.torn_down && self.speak_blocker().is_none(),
            available: self.available,
            catalog_revision: self.catalog_revision,
        }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        self.selection.catalog()
    }

    /// 目录与版本号
    pub fn catalog_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            revision: self.catalog_revision,
            groups: self.selection.catalog().clone(),
        }
    }

    pub fn catalog_revision(&self) -> u64 {
        self.catalog_revision
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.playback
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for VoiceSelectionController {
    fn drop(&mut self) {
        self.cancel_discovery_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{event_channel, EventReceiver};
    use crate::domain::voice::VoiceDescriptor;
    use crate::infrastructure::adapters::FakeSpeechCapability;

    fn sample_voices() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::local("Alice", "en-US"),
            VoiceDescriptor::local("Bob", "en-GB"),
            VoiceDescriptor::local("Claire", "fr-FR"),
        ]
    }

    fn setup(
        fake: FakeSpeechCapability,
    ) -> (VoiceSelectionController, Arc<FakeSpeechCapability>, EventReceiver) {
        let fake = Arc::new(fake);
        let (tx, rx) = event_channel();
        let controller = VoiceSelectionController::new(fake.clone(), tx, ControllerSettings::default());
        (controller, fake, rx)
    }

    fn ready() -> (VoiceSelectionController, Arc<FakeSpeechCapability>, EventReceiver) {
        let (mut controller, fake, rx) = setup(FakeSpeechCapability::manual(sample_voices()));
        controller.initialize();
        (controller, fake, rx)
    }

    fn drain(controller: &mut VoiceSelectionController, rx: &mut EventReceiver) {
        while let Ok(event) = rx.try_recv() {
            controller.handle_event(event);
        }
    }

    #[tokio::test]
    async fn test_initial_selection_uses_first_language_and_voice() {
        let (controller, _fake, _rx) = ready();
        let snapshot = controller.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.selected_language.as_deref(), Some("English (en)"));
        assert_eq!(snapshot.selected_voice.as_deref(), Some("Alice"));
        assert_eq!(snapshot.catalog_revision, 1);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_switch_language_speak_and_stop() {
        let (mut controller, fake, _rx) = ready();

        controller
            .select_language(&LanguageGroupKey::from_raw("French (fr)"))
            .unwrap();
        assert_eq!(controller.selection().voice(), Some("Claire"));

        controller.set_rate(1.2);
        controller.set_pitch(0.8);
        controller.set_text("Bonjour tout le monde");
        let id = controller.speak().unwrap();

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.id, id);
        assert_eq!(request.voice.as_ref().unwrap().name(), "Claire");
        assert_eq!(request.rate.value(), 1.2);
        assert_eq!(request.pitch.value(), 0.8);

        controller.handle_event(ControllerEvent::UtteranceStarted(id));
        assert_eq!(controller.playback_status(), PlaybackStatus::Speaking);

        controller.stop_speaking();
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);
        assert!(controller.last_error().is_none());
        assert_eq!(fake.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_selections_leave_state_unchanged() {
        let (mut controller, _fake, _rx) = ready();
        let before = controller.snapshot();

        let err = controller
            .select_language(&LanguageGroupKey::from_raw("Klingon (tlh)"))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidSelection(_)));

        let err = controller.select_voice("Claire").unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidSelection(_)));

        assert_eq!(controller.snapshot(), before);
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_rate_and_pitch_are_clamped() {
        let (mut controller, _fake, _rx) = ready();
        assert_eq!(controller.set_rate(3.5).value(), 2.0);
        assert_eq!(controller.set_pitch(0.1).value(), 0.5);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.rate, 2.0);
        assert_eq!(snapshot.pitch, 0.5);
    }

    #[tokio::test]
    async fn test_speak_twice_honors_only_latest_start() {
        let (mut controller, fake, _rx) = ready();
        controller.set_text("Hello");

        let first = controller.speak().unwrap();
        let second = controller.speak().unwrap();
        assert_ne!(first, second);
        assert_eq!(fake.requests().len(), 2);
        assert_eq!(fake.cancel_count(), 1);

        controller.handle_event(ControllerEvent::UtteranceStarted(first));
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);

        controller.handle_event(ControllerEvent::UtteranceStarted(second));
        assert_eq!(controller.playback_status(), PlaybackStatus::Speaking);

        // 被取代的请求的 end 回调不影响当前朗读
        controller.handle_event(ControllerEvent::UtteranceEnded(first));
        assert_eq!(controller.playback_status(), PlaybackStatus::Speaking);

        controller.handle_event(ControllerEvent::UtteranceEnded(second));
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn test_restart_while_speaking_stays_speaking() {
        let (mut controller, fake, _rx) = ready();
        controller.set_text("Hello");
        let first = controller.speak().unwrap();
        controller.handle_event(ControllerEvent::UtteranceStarted(first));

        let second = controller.speak().unwrap();
        assert_eq!(controller.playback_status(), PlaybackStatus::Speaking);
        assert_eq!(fake.cancel_count(), 1);

        // 取消导致的旧请求错误不会显示给用户
        controller.handle_event(ControllerEvent::UtteranceFailed {
            id: first,
            reason: "interrupted".to_string(),
        });
        assert!(controller.last_error().is_none());

        controller.handle_event(ControllerEvent::UtteranceStarted(second));
        assert_eq!(controller.playback_status(), PlaybackStatus::Speaking);
    }

    #[tokio::test]
    async fn test_error_callback_returns_to_idle_and_records_reason() {
        let (mut controller, _fake, _rx) = ready();
        controller.set_text("Hello");
        let id = controller.speak().unwrap();
        controller.handle_event(ControllerEvent::UtteranceStarted(id));
        controller.handle_event(ControllerEvent::UtteranceFailed {
            id,
            reason: "synthesis-failed".to_string(),
        });

        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);
        let error = controller.last_error().unwrap();
        assert_eq!(error.kind, ErrorKind::SpeakFailed);
        assert_eq!(error.message, "synthesis-failed");

        // 控制器仍然可用
        assert!(controller.speak().is_ok());
    }

    #[tokio::test]
    async fn test_end_before_start_is_tolerated() {
        let (mut controller, _fake, _rx) = ready();
        controller.set_text("Hello");
        let id = controller.speak().unwrap();

        controller.handle_event(ControllerEvent::UtteranceEnded(id));
        controller.handle_event(ControllerEvent::UtteranceStarted(id));
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn test_stop_without_active_utterance() {
        let (mut controller, fake, _rx) = ready();
        controller.stop_speaking();
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);
        assert_eq!(fake.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_speak_disabled_cases() {
        let (mut controller, fake, _rx) = ready();

        let err = controller.speak().unwrap_err();
        assert!(matches!(err, ApplicationError::SpeakDisabled("text is empty")));

        controller.set_text("   ");
        assert!(controller.speak().is_err());
        assert!(!controller.snapshot().can_speak);

        controller.set_text("Hello");
        assert!(controller.snapshot().can_speak);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_speak_disabled_while_loading() {
        let (mut controller, fake, _rx) = setup(FakeSpeechCapability::manual(vec![]));
        controller.initialize();
        controller.set_text("Hello");

        let err = controller.speak().unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::SpeakDisabled("voices are still loading")
        ));
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_late_voices_via_change_notification() {
        let (mut controller, fake, mut rx) = setup(FakeSpeechCapability::manual(vec![]));
        controller.initialize();
        assert!(controller.is_loading());

        fake.set_voices(sample_voices());
        assert_eq!(fake.announce_voices_changed(), 1);
        drain(&mut controller, &mut rx);

        assert!(!controller.is_loading());
        assert_eq!(controller.selection().voice(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_latest_catalog_wins_and_preserves_selection() {
        let (mut controller, fake, mut rx) = ready();
        controller
            .select_language(&LanguageGroupKey::from_raw("French (fr)"))
            .unwrap();

        fake.set_voices(vec![
            VoiceDescriptor::local("Dieter", "de-DE"),
            VoiceDescriptor::local("Claire", "fr-FR"),
        ]);
        fake.announce_voices_changed();
        fake.set_voices(vec![
            VoiceDescriptor::local("Dieter", "de-DE"),
            VoiceDescriptor::local("Amélie", "fr-CA"),
            VoiceDescriptor::local("Claire", "fr-FR"),
        ]);
        fake.announce_voices_changed();
        drain(&mut controller, &mut rx);

        assert_eq!(controller.catalog_revision(), 3);
        assert_eq!(controller.catalog().len(), 2);
        assert_eq!(
            controller.selection().language().unwrap().as_str(),
            "French (fr)"
        );
        assert_eq!(controller.selection().voice(), Some("Claire"));
    }

    #[tokio::test]
    async fn test_empty_notification_keeps_catalog() {
        let (mut controller, fake, mut rx) = ready();
        fake.set_voices(vec![]);
        fake.announce_voices_changed();
        drain(&mut controller, &mut rx);

        assert_eq!(controller.catalog().voice_count(), 3);
        assert_eq!(controller.catalog_revision(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_timeout_surfaces_no_voices() {
        let (mut controller, fake, mut rx) = setup(FakeSpeechCapability::manual(vec![]));
        controller.initialize();
        assert!(controller.is_loading());

        tokio::time::sleep(Duration::from_millis(3100)).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event, ControllerEvent::DiscoveryTimeout);
        controller.handle_event(event);

        let snapshot = controller.snapshot();
        assert!(!snapshot.loading);
        let error = snapshot.last_error.unwrap();
        assert_eq!(error.kind, ErrorKind::NoVoicesFound);
        assert!(error.message.starts_with("No voices detected"));
        assert!(!snapshot.can_speak);

        controller.set_text("Hello");
        assert!(controller.speak().is_err());
        assert!(fake.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_voices_after_timeout_clear_error() {
        let (mut controller, fake, mut rx) = setup(FakeSpeechCapability::manual(vec![]));
        controller.initialize();
        controller.handle_event(ControllerEvent::DiscoveryTimeout);
        assert!(controller.last_error().is_some());

        fake.set_voices(sample_voices());
        fake.announce_voices_changed();
        drain(&mut controller, &mut rx);

        assert!(controller.last_error().is_none());
        assert!(!controller.is_loading());
        assert_eq!(controller.selection().voice(), Some("Alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_population_cancels_discovery_timer() {
        let (mut controller, fake, mut rx) = setup(FakeSpeechCapability::manual(vec![]));
        controller.initialize();

        fake.set_voices(sample_voices());
        fake.announce_voices_changed();
        drain(&mut controller, &mut rx);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_capability_is_terminal() {
        let (mut controller, fake, _rx) = setup(FakeSpeechCapability::unavailable());
        controller.initialize();

        let snapshot = controller.snapshot();
        assert!(!snapshot.loading);
        assert!(!snapshot.available);
        assert!(!snapshot.can_speak);
        assert_eq!(
            snapshot.last_error.unwrap().kind,
            ErrorKind::CapabilityUnavailable
        );
        assert!(controller.catalog().is_empty());

        controller.set_text("Hello");
        assert!(controller.speak().is_err());
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_error() {
        let (mut controller, _fake, _rx) = ready();
        controller.set_text("Hello");
        let id = controller.speak().unwrap();
        controller.handle_event(ControllerEvent::UtteranceFailed {
            id,
            reason: "network".to_string(),
        });
        assert!(controller.last_error().is_some());

        controller.execute(Command::DismissError).unwrap();
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_teardown_cancels_and_ignores_events() {
        let (mut controller, fake, _rx) = ready();
        controller.set_text("Hello");
        let id = controller.speak().unwrap();

        controller.teardown();
        assert!(controller.is_torn_down());
        assert_eq!(fake.cancel_count(), 1);
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);
        assert!(controller.catalog().is_empty());

        controller.handle_event(ControllerEvent::UtteranceStarted(id));
        assert_eq!(controller.playback_status(), PlaybackStatus::Idle);

        let err = controller.execute(Command::Speak).unwrap_err();
        assert!(matches!(err, ApplicationError::ControllerStopped));

        // 重复拆除是无害的
        controller.teardown();
        assert_eq!(fake.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_dispatches_commands() {
        let (mut controller, _fake, _rx) = ready();
        controller
            .execute(Command::SelectLanguage(LanguageGroupKey::from_raw("English (en)")))
            .unwrap();
        controller
            .execute(Command::SelectVoice("Bob".to_string()))
            .unwrap();
        controller.execute(Command::SetRate(0.2)).unwrap();
        controller
            .execute(Command::SetText("Hi".to_string()))
            .unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.selected_voice.as_deref(), Some("Bob"));
        assert_eq!(snapshot.rate, 0.5);
        assert_eq!(snapshot.text, "Hi");
    }
}
