//! Infrastructure Layer - 基础设施层
//!
//! 提供端口的具体实现与对外接口

pub mod adapters;
pub mod events;
pub mod http;
pub mod worker;

pub use events::EventPublisher;
pub use worker::{ControllerHandle, ControllerWorker, ControllerWorkerConfig};
