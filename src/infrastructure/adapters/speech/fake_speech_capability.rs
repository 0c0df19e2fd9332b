//! Fake Speech Capability - 确定性的语音能力实现
//!
//! 不调用任何平台服务：语音列表来自配置，朗读请求只被记录。
//! - 手动模式：测试自行投递 start / end / error 事件
//! - 模拟播放模式：提交后立即 start，经过配置的时长后 end

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::application::ports::{
    ControllerEvent, EventSender, SpeechCapabilityPort, SpeechError, UtteranceRequest,
};
use crate::domain::selection::UtteranceId;
use crate::domain::voice::VoiceDescriptor;

/// Fake Speech Capability 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechCapabilityConfig {
    /// 枚举返回的语音
    pub voices: Vec<VoiceDescriptor>,
    /// 是否模拟 "平台不支持语音合成"
    pub available: bool,
    /// 模拟播放时长；None 为手动模式
    pub playback: Option<Duration>,
}

impl Default for FakeSpeechCapabilityConfig {
    fn default() -> Self {
        Self {
            voices: default_voices(),
            available: true,
            playback: Some(Duration::from_millis(1500)),
        }
    }
}

/// 默认的演示语音
pub fn default_voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("Alice", "en-US", true, true, "fake:alice"),
        VoiceDescriptor::new("Bob", "en-GB", true, false, "fake:bob"),
        VoiceDescriptor::new("Claire", "fr-FR", true, false, "fake:claire"),
        VoiceDescriptor::new("Hans", "de-DE", false, false, "fake:hans"),
    ]
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fake Speech Capability
pub struct FakeSpeechCapability {
    available: bool,
    playback: Option<Duration>,
    voices: Mutex<Vec<VoiceDescriptor>>,
    listeners: Mutex<Vec<EventSender>>,
    requests: Mutex<Vec<UtteranceRequest>>,
    active: Arc<Mutex<Option<UtteranceId>>>,
    cancel_count: AtomicUsize,
}

impl FakeSpeechCapability {
    pub fn new(config: FakeSpeechCapabilityConfig) -> Self {
        tracing::info!(
            voices = config.voices.len(),
            available = config.available,
            playback_ms = ?config.playback.map(|d| d.as_millis() as u64),
            "FakeSpeechCapability initialized"
        );
        Self {
            available: config.available,
            playback: config.playback,
            voices: Mutex::new(config.voices),
            listeners: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            active: Arc::new(Mutex::new(None)),
            cancel_count: AtomicUsize::new(0),
        }
    }

    /// 手动模式：不自动产生回调
    pub fn manual(voices: Vec<VoiceDescriptor>) -> Self {
        Self::new(FakeSpeechCapabilityConfig {
            voices,
            available: true,
            playback: None,
        })
    }

    /// 模拟平台不提供语音合成
    pub fn unavailable() -> Self {
        Self::new(FakeSpeechCapabilityConfig {
            voices: Vec::new(),
            available: false,
            playback: None,
        })
    }

    /// 替换语音列表（不会自动通知）
    pub fn set_voices(&self, voices: Vec<VoiceDescriptor>) {
        *lock(&self.voices) = voices;
    }

    /// 向所有订阅者发送 VoicesChanged，返回送达数量
    pub fn announce_voices_changed(&self) -> usize {
        let mut listeners = lock(&self.listeners);
        listeners.retain(|tx| tx.send(ControllerEvent::VoicesChanged).is_ok());
        listeners.len()
    }

    /// 已提交的请求（按提交顺序）
    pub fn requests(&self) -> Vec<UtteranceRequest> {
        lock(&self.requests).clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    fn simulate_playback(&self, id: UtteranceId, duration: Duration, events: EventSender) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, playback simulation skipped");
            return;
        };
        let active = self.active.clone();
        runtime.spawn(async move {
            let _ = events.send(ControllerEvent::UtteranceStarted(id));
            tokio::time::sleep(duration).await;

            let finished = {
                let mut active = lock(&active);
                if *active == Some(id) {
                    *active = None;
                    true
                } else {
                    false
                }
            };
            if finished {
                let _ = events.send(ControllerEvent::UtteranceEnded(id));
            }
        });
    }
}

impl Default for FakeSpeechCapability {
    fn default() -> Self {
        Self::new(FakeSpeechCapabilityConfig::default())
    }
}

impl SpeechCapabilityPort for FakeSpeechCapability {
    fn is_available(&self) -> bool {
        self.available
    }

    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable("fake capability disabled".to_string()));
        }
        Ok(lock(&self.voices).clone())
    }

    fn on_voices_changed(&self, events: EventSender) -> Result<(), SpeechError> {
        lock(&self.listeners).push(events);
        Ok(())
    }

    fn speak(&self, request: UtteranceRequest, events: EventSender) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable("fake capability disabled".to_string()));
        }

        tracing::debug!(
            utterance_id = %request.id,
            text_len = request.text.len(),
            voice = ?request.voice.as_ref().map(|v| v.name()),
            "FakeSpeechCapability: utterance accepted"
        );

        let id = request.id;
        *lock(&self.active) = Some(id);
        lock(&self.requests).push(request);

        if let Some(duration) = self.playback {
            self.simulate_playback(id, duration, events);
        }
        Ok(())
    }

    fn cancel_speaking(&self) {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        *lock(&self.active) = None;
    }

    fn is_speaking(&self) -> bool {
        lock(&self.active).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::event_channel;
    use crate::domain::voice::Prosody;

    fn request(text: &str) -> UtteranceRequest {
        UtteranceRequest {
            id: UtteranceId::new(),
            text: text.to_string(),
            voice: None,
            rate: Prosody::default(),
            pitch: Prosody::default(),
        }
    }

    #[test]
    fn test_manual_mode_records_requests() {
        let fake = FakeSpeechCapability::manual(default_voices());
        let (tx, mut rx) = event_channel();

        fake.speak(request("hello"), tx).unwrap();
        assert!(fake.is_speaking());
        assert_eq!(fake.requests().len(), 1);
        assert!(rx.try_recv().is_err());

        fake.cancel_speaking();
        fake.cancel_speaking();
        assert!(!fake.is_speaking());
        assert_eq!(fake.cancel_count(), 2);
    }

    #[test]
    fn test_unavailable() {
        let fake = FakeSpeechCapability::unavailable();
        let (tx, _rx) = event_channel();
        assert!(!fake.is_available());
        assert!(fake.list_voices().is_err());
        assert!(fake.speak(request("hello"), tx).is_err());
    }

    #[test]
    fn test_announce_drops_closed_listeners() {
        let fake = FakeSpeechCapability::manual(vec![]);
        let (tx1, mut rx1) = event_channel();
        let (tx2, rx2) = event_channel();
        fake.on_voices_changed(tx1).unwrap();
        fake.on_voices_changed(tx2).unwrap();
        drop(rx2);

        assert_eq!(fake.announce_voices_changed(), 1);
        assert_eq!(rx1.try_recv().unwrap(), ControllerEvent::VoicesChanged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_playback_emits_start_then_end() {
        let fake = FakeSpeechCapability::new(FakeSpeechCapabilityConfig {
            voices: default_voices(),
            available: true,
            playback: Some(Duration::from_millis(500)),
        });
        let (tx, mut rx) = event_channel();
        let req = request("hello");
        let id = req.id;
        fake.speak(req, tx).unwrap();

        assert_eq!(rx.recv().await.unwrap(), ControllerEvent::UtteranceStarted(id));
        assert_eq!(rx.recv().await.unwrap(), ControllerEvent::UtteranceEnded(id));
        assert!(!fake.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_playback_emits_no_end() {
        let fake = FakeSpeechCapability::new(FakeSpeechCapabilityConfig {
            voices: default_voices(),
            available: true,
            playback: Some(Duration::from_millis(500)),
        });
        let (tx, mut rx) = event_channel();
        let req = request("hello");
        let id = req.id;
        fake.speak(req, tx).unwrap();
        fake.cancel_speaking();

        assert_eq!(rx.recv().await.unwrap(), ControllerEvent::UtteranceStarted(id));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
