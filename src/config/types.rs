//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::controller::ControllerSettings;
use crate::domain::voice::Prosody;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音能力与控制器配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default)]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音能力后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// 内置的确定性实现，不发声
    #[default]
    Fake,
    /// 平台语音合成（需要 `native` feature）
    Native,
}

impl SpeechBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechBackend::Fake => "fake",
            SpeechBackend::Native => "native",
        }
    }
}

/// 语音配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub backend: SpeechBackend,

    /// 语音发现兜底超时（毫秒）
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// 初始语速，越界会被钳位到 [0.5, 2.0]
    #[serde(default = "default_prosody")]
    pub default_rate: f32,

    /// 初始音调，越界会被钳位到 [0.5, 2.0]
    #[serde(default = "default_prosody")]
    pub default_pitch: f32,

    /// 控制器命令队列容量
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,

    #[serde(default)]
    pub fake: FakeSpeechConfig,
}

fn default_discovery_timeout_ms() -> u64 {
    3000
}

fn default_prosody() -> f32 {
    1.0
}

fn default_command_capacity() -> usize {
    64
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackend::default(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
            default_rate: default_prosody(),
            default_pitch: default_prosody(),
            command_capacity: default_command_capacity(),
            fake: FakeSpeechConfig::default(),
        }
    }
}

impl SpeechConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    /// 转换为控制器配置
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            discovery_timeout: self.discovery_timeout(),
            default_rate: Prosody::new(self.default_rate),
            default_pitch: Prosody::new(self.default_pitch),
        }
    }
}

/// Fake 后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct FakeSpeechConfig {
    /// 模拟播放时长（毫秒），0 表示手动模式
    #[serde(default = "default_playback_ms")]
    pub playback_ms: u64,

    /// 模拟平台不支持语音合成
    #[serde(default = "default_fake_available")]
    pub available: bool,

    /// 语音列表；为空时使用内置演示语音
    #[serde(default)]
    pub voices: Vec<FakeVoiceConfig>,
}

fn default_playback_ms() -> u64 {
    1500
}

fn default_fake_available() -> bool {
    true
}

impl Default for FakeSpeechConfig {
    fn default() -> Self {
        Self {
            playback_ms: default_playback_ms(),
            available: default_fake_available(),
            voices: Vec::new(),
        }
    }
}

impl FakeSpeechConfig {
    pub fn playback(&self) -> Option<Duration> {
        (self.playback_ms > 0).then(|| Duration::from_millis(self.playback_ms))
    }
}

/// Fake 后端的一条语音
#[derive(Debug, Clone, Deserialize)]
pub struct FakeVoiceConfig {
    pub name: String,
    /// BCP-47 语言标签，如 "en-US"
    pub lang: String,
    #[serde(default)]
    pub default: bool,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
