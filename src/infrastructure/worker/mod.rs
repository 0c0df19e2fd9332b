//! Worker - 后台任务

mod controller_worker;

pub use controller_worker::{ControllerHandle, ControllerWorker, ControllerWorkerConfig};
