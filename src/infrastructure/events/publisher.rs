//! Event Publisher Implementation
//!
//! 向前端（WebSocket）推送表单状态变更

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::queries::SelectionSnapshot;
use crate::domain::voice::VoiceCatalog;

/// 广播通道容量
const CHANNEL_CAPACITY: usize = 100;

/// 推送给前端的事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum UiEvent {
    /// 表单状态变更
    StateChanged(SelectionSnapshot),
    /// 语音目录整体替换
    CatalogChanged {
        revision: u64,
        groups: VoiceCatalog,
    },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<UiEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅所有 UI 事件
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.channel.subscribe()
    }

    /// 发布状态快照
    pub fn publish_state(&self, snapshot: SelectionSnapshot) {
        self.publish(UiEvent::StateChanged(snapshot));
    }

    /// 发布目录变更
    pub fn publish_catalog(&self, revision: u64, catalog: VoiceCatalog) {
        self.publish(UiEvent::CatalogChanged {
            revision,
            groups: catalog,
        });
    }

    fn publish(&self, event: UiEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish UI event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
