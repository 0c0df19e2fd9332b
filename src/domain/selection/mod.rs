//! Selection Context - 选择限界上下文
//!
//! 职责:
//! - 语言 → 语音 两级选择及其不变量
//! - 目录替换后的选择校正
//! - 播放状态与朗读请求标识

mod aggregate;
mod value_objects;

pub use aggregate::{Reconciliation, Selection};
pub use value_objects::{PlaybackStatus, UtteranceId};
