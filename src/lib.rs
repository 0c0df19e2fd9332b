//! Voxform - 文本朗读表单控制器
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice: 语音描述、按语言分组的目录、语速 / 音调
//! - Selection: 语言 / 语音 / 文本选择与朗读状态
//!
//! 应用层 (application/):
//! - Ports: 语音能力端口（枚举语音、朗读、取消）
//! - Controller: 语音发现、选择一致性、朗读生命周期
//! - Commands / Queries: 控制器命令与状态快照
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: Fake / 平台语音能力
//! - Worker: 独占控制器的事件循环
//! - HTTP: RESTful API + WebSocket
//! - Events: 状态推送

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
