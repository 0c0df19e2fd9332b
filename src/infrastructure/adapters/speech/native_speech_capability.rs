//! Native Speech Capability - 平台语音合成（基于 `tts` crate）
//!
//! - Windows: WinRT / SAPI
//! - macOS / iOS: AVFoundation
//! - Linux: speech-dispatcher
//!
//! 平台不提供 "语音列表已变化" 通知，订阅永远不会触发，由控制器的兜底定时器处理空列表。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tts::{Features, Tts, UtteranceId as NativeUtteranceId};

use super::utterance_slot::{Callback, UtteranceSlot};
use crate::application::ports::{EventSender, SpeechCapabilityPort, SpeechError, UtteranceRequest};
use crate::domain::voice::{Prosody, VoiceDescriptor};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl From<tts::Error> for SpeechError {
    fn from(err: tts::Error) -> Self {
        match err {
            tts::Error::UnsupportedFeature => SpeechError::UnsupportedFeature("native"),
            other => SpeechError::Backend(other.to_string()),
        }
    }
}

type Slot = Arc<UtteranceSlot<NativeUtteranceId>>;

/// Native Speech Capability
pub struct NativeSpeechCapability {
    tts: Option<Mutex<Tts>>,
    features: Option<Features>,
    slot: Slot,
}

impl NativeSpeechCapability {
    /// 初始化平台语音；失败时能力标记为不可用而不是报错
    pub fn new() -> Self {
        let slot: Slot = Arc::new(UtteranceSlot::new());
        match Tts::default() {
            Ok(tts) => {
                let features = tts.supported_features();
                if features.utterance_callbacks {
                    if let Err(err) = install_callbacks(&tts, &slot) {
                        tracing::warn!(error = %err, "Failed to register utterance callbacks");
                    }
                } else {
                    tracing::warn!("Platform speech does not report utterance progress");
                }
                tracing::info!(
                    rate = features.rate,
                    pitch = features.pitch,
                    voice = features.voice,
                    "Initialized native speech synthesis"
                );
                Self {
                    tts: Some(Mutex::new(tts)),
                    features: Some(features),
                    slot,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load native speech synthesis");
                Self {
                    tts: None,
                    features: None,
                    slot,
                }
            }
        }
    }

    fn tts(&self) -> Result<MutexGuard<'_, Tts>, SpeechError> {
        self.tts
            .as_ref()
            .map(lock)
            .ok_or_else(|| SpeechError::Unavailable("native speech synthesis failed to load".to_string()))
    }

    fn apply_request(&self, tts: &mut Tts, request: &UtteranceRequest) -> Result<(), SpeechError> {
        let Some(features) = self.features.as_ref() else {
            return Ok(());
        };

        if features.rate {
            let rate = scale_prosody(request.rate, tts.min_rate(), tts.normal_rate(), tts.max_rate());
            tts.set_rate(rate)?;
        }
        if features.pitch {
            let pitch =
                scale_prosody(request.pitch, tts.min_pitch(), tts.normal_pitch(), tts.max_pitch());
            tts.set_pitch(pitch)?;
        }
        if let (true, Some(wanted)) = (features.voice, request.voice.as_ref()) {
            let native = tts
                .voices()?
                .into_iter()
                .find(|v| v.id() == wanted.uri() || v.name() == wanted.name());
            match native {
                Some(voice) => tts.set_voice(&voice)?,
                None => tracing::warn!(voice = %wanted.name(), "Voice no longer offered by platform"),
            }
        }
        Ok(())
    }
}

impl Default for NativeSpeechCapability {
    fn default() -> Self {
        Self::new()
    }
}

fn install_callbacks(tts: &Tts, slot: &Slot) -> Result<(), tts::Error> {
    let begin = slot.clone();
    tts.on_utterance_begin(Some(Box::new(move |native| {
        begin.dispatch(native, Callback::Begin);
    })))?;

    let end = slot.clone();
    tts.on_utterance_end(Some(Box::new(move |native| {
        end.dispatch(native, Callback::End);
    })))?;

    let stop = slot.clone();
    tts.on_utterance_stop(Some(Box::new(move |native| {
        stop.dispatch(native, Callback::Stop);
    })))?;

    Ok(())
}

/// 把 0.5 - 2.0 的倍率映射到平台的 [min, max] 区间，1.0 对应平台默认值
pub(crate) fn scale_prosody(value: Prosody, min: f32, normal: f32, max: f32) -> f32 {
    let m = value.value();
    let scaled = if m >= Prosody::NORMAL {
        normal + (max - normal) * (m - Prosody::NORMAL) / (Prosody::MAX - Prosody::NORMAL)
    } else {
        normal - (normal - min) * (Prosody::NORMAL - m) / (Prosody::NORMAL - Prosody::MIN)
    };
    scaled.clamp(min.min(max), max.max(min))
}

impl SpeechCapabilityPort for NativeSpeechCapability {
    fn is_available(&self) -> bool {
        self.tts.is_some()
    }

    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        let tts = self.tts()?;
        let voices = match tts.voices() {
            Ok(voices) => voices,
            Err(tts::Error::UnsupportedFeature) => {
                tracing::debug!("Platform speech does not enumerate voices");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        Ok(voices
            .into_iter()
            .map(|v| VoiceDescriptor::new(v.name(), v.language().to_string(), true, false, v.id()))
            .collect())
    }

    fn on_voices_changed(&self, _events: EventSender) -> Result<(), SpeechError> {
        if self.tts.is_none() {
            return Err(SpeechError::Unavailable(
                "native speech synthesis failed to load".to_string(),
            ));
        }
        Ok(())
    }

    fn speak(&self, request: UtteranceRequest, events: EventSender) -> Result<(), SpeechError> {
        let mut tts = self.tts()?;
        self.apply_request(&mut tts, &request)?;

        self.slot.begin(request.id, events);
        match tts.speak(request.text.as_str(), true) {
            Ok(native) => {
                self.slot.bind(request.id, native);
                Ok(())
            }
            Err(err) => {
                self.slot.abandon(request.id);
                Err(err.into())
            }
        }
    }

    fn cancel_speaking(&self) {
        self.slot.clear();
        if let Ok(mut tts) = self.tts() {
            if let Err(err) = tts.stop() {
                tracing::debug!(error = %err, "Failed to stop native speech");
            }
        }
    }

    fn is_speaking(&self) -> bool {
        self.tts()
            .ok()
            .and_then(|tts| tts.is_speaking().ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_prosody_maps_range() {
        assert_eq!(scale_prosody(Prosody::new(1.0), 0.1, 1.0, 10.0), 1.0);
        assert_eq!(scale_prosody(Prosody::new(2.0), 0.1, 1.0, 10.0), 10.0);
        assert_eq!(scale_prosody(Prosody::new(0.5), 0.1, 1.0, 10.0), 0.1);
        assert_eq!(scale_prosody(Prosody::new(1.5), 0.0, 50.0, 100.0), 75.0);
        assert_eq!(scale_prosody(Prosody::new(0.75), 0.0, 50.0, 100.0), 25.0);
    }
}
