//! Configuration Loader
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, SpeechBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXFORM_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXFORM_SERVER__PORT=8080`
/// - `VOXFORM_SPEECH__BACKEND=native`
/// - `VOXFORM_SPEECH__DISCOVERY_TIMEOUT_MS=5000`
/// - `VOXFORM_LOG__JSON=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("server.static_files.enabled", false)?
        .set_default("server.static_files.dir", "web")?
        .set_default("server.static_files.path", "/")?
        .set_default("speech.backend", "fake")?
        .set_default("speech.discovery_timeout_ms", 3000)?
        .set_default("speech.default_rate", 1.0)?
        .set_default("speech.default_pitch", 1.0)?
        .set_default("speech.command_capacity", 64)?
        .set_default("speech.fake.playback_ms", 1500)?
        .set_default("speech.fake.available", true)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VOXFORM_SPEECH__BACKEND=native
    builder = builder.add_source(
        Environment::with_prefix("VOXFORM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.speech.discovery_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Discovery timeout cannot be 0".to_string(),
        ));
    }

    if !config.speech.default_rate.is_finite() || !config.speech.default_pitch.is_finite() {
        return Err(ConfigError::ValidationError(
            "Default rate and pitch must be finite numbers".to_string(),
        ));
    }

    if config.speech.command_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Command capacity cannot be 0".to_string(),
        ));
    }

    if config.speech.backend == SpeechBackend::Fake {
        if let Some(voice) = config
            .speech
            .fake
            .voices
            .iter()
            .find(|v| v.name.trim().is_empty() || v.lang.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(format!(
                "Fake voice entries need a name and a language tag: {:?}",
                voice
            )));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.server.static_files.enabled {
        tracing::info!(
            "Static Files: {:?} at {}",
            config.server.static_files.dir,
            config.server.static_files.path
        );
    }
    tracing::info!("Speech Backend: {}", config.speech.backend.as_str());
    tracing::info!("Discovery Timeout: {}ms", config.speech.discovery_timeout_ms);
    tracing::info!(
        "Default Rate / Pitch: {} / {}",
        config.speech.default_rate,
        config.speech.default_pitch
    );
    if config.speech.backend == SpeechBackend::Fake {
        tracing::info!("Fake Playback: {}ms", config.speech.fake.playback_ms);
        tracing::info!("Fake Voices: {}", config.speech.fake.voices.len());
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::FakeVoiceConfig;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_timeout() {
        let mut config = AppConfig::default();
        config.speech.discovery_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_nan_rate() {
        let mut config = AppConfig::default();
        config.speech.default_rate = f32::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_nameless_fake_voice() {
        let mut config = AppConfig::default();
        config.speech.fake.voices.push(FakeVoiceConfig {
            name: " ".to_string(),
            lang: "en-US".to_string(),
            default: false,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[speech]
discovery_timeout_ms = 500
default_rate = 1.5

[speech.fake]
playback_ms = 0

[[speech.fake.voices]]
name = "Yuki"
lang = "ja-JP"
default = true

[[speech.fake.voices]]
name = "Ana"
lang = "es-ES"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.speech.backend, SpeechBackend::Fake);
        assert_eq!(config.speech.discovery_timeout_ms, 500);
        assert_eq!(config.speech.default_rate, 1.5);
        assert_eq!(config.speech.default_pitch, 1.0);
        assert!(config.speech.fake.playback().is_none());
        assert_eq!(config.speech.fake.voices.len(), 2);
        assert!(config.speech.fake.voices[0].default);
        assert_eq!(config.speech.fake.voices[1].lang, "es-ES");
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from_path(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_backend_is_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[speech]\nbackend = \"espeak\"").unwrap();

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
