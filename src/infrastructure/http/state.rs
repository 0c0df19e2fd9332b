//! Application State
//!
//! HTTP 处理器共享的状态：控制器句柄 + 事件发布器

use std::sync::Arc;

use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::worker::ControllerHandle;

/// 应用状态
///
/// 控制器状态只存在于 Worker 任务中，这里只持有访问它的句柄
pub struct AppState {
    pub controller: ControllerHandle,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(controller: ControllerHandle, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            controller,
            event_publisher,
        }
    }
}
