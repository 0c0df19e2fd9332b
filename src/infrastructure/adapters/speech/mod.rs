//! Speech Adapter - 语音能力实现

mod fake_speech_capability;
#[cfg(feature = "native")]
mod native_speech_capability;
#[cfg_attr(not(feature = "native"), allow(dead_code))]
mod utterance_slot;

pub use fake_speech_capability::{default_voices, FakeSpeechCapability, FakeSpeechCapabilityConfig};
#[cfg(feature = "native")]
pub use native_speech_capability::NativeSpeechCapability;
