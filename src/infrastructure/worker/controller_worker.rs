//! Controller Worker - 控制器事件循环
//!
//! 单个任务独占 `VoiceSelectionController`，串行处理：
//! - HTTP 层经 `ControllerHandle` 发来的命令 / 查询
//! - 语音能力回调与兜底定时器产生的事件
//!
//! 每轮处理后比较快照，有变化时通过 `EventPublisher` 推送给前端。

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::application::commands::Command;
use crate::application::controller::{ControllerSettings, VoiceSelectionController};
use crate::application::error::ApplicationError;
use crate::application::ports::{event_channel, EventReceiver, SpeechCapabilityPort};
use crate::application::queries::{CatalogSnapshot, SelectionSnapshot};
use crate::domain::voice::LanguageGroupKey;
use crate::infrastructure::events::EventPublisher;

type Reply<T> = oneshot::Sender<T>;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct ControllerWorkerConfig {
    /// 命令队列容量
    pub command_capacity: usize,
    pub settings: ControllerSettings,
}

impl Default for ControllerWorkerConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            settings: ControllerSettings::default(),
        }
    }
}

/// 发给 Worker 的消息
enum WorkerMessage {
    Execute {
        command: Command,
        reply: Reply<Result<SelectionSnapshot, ApplicationError>>,
    },
    Snapshot {
        reply: Reply<SelectionSnapshot>,
    },
    Catalog {
        reply: Reply<CatalogSnapshot>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// 控制器 Worker
pub struct ControllerWorker {
    controller: VoiceSelectionController,
    commands: mpsc::Receiver<WorkerMessage>,
    events: EventReceiver,
    publisher: Arc<EventPublisher>,
    published_state: Option<SelectionSnapshot>,
    published_revision: u64,
}

impl ControllerWorker {
    /// 创建 Worker 及其句柄
    pub fn new(
        config: ControllerWorkerConfig,
        capability: Arc<dyn SpeechCapabilityPort>,
        publisher: Arc<EventPublisher>,
    ) -> (Self, ControllerHandle) {
        let (event_tx, event_rx) = event_channel();
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let controller = VoiceSelectionController::new(capability, event_tx, config.settings);

        let worker = Self {
            controller,
            commands: command_rx,
            events: event_rx,
            publisher,
            published_state: None,
            published_revision: 0,
        };
        (worker, ControllerHandle { sender: command_tx })
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!("ControllerWorker started");

        self.controller.initialize();
        self.publish_changes();

        loop {
            tokio::select! {
                message = self.commands.recv() => {
                    let Some(message) = message else {
                        tracing::info!("All controller handles dropped");
                        break;
                    };
                    if !self.handle_message(message) {
                        break;
                    }
                }
                Some(event) = self.events.recv() => {
                    self.controller.handle_event(event);
                }
            }
            self.publish_changes();
        }

        self.controller.teardown();
        self.publish_changes();
        tracing::info!("ControllerWorker stopped");
    }

    /// 处理一条消息，返回 false 表示退出循环
    fn handle_message(&mut self, message: WorkerMessage) -> bool {
        match message {
            WorkerMessage::Execute { command, reply } => {
                let name = command.name();
                let result = self
                    .controller
                    .execute(command)
                    .map(|()| self.controller.snapshot());
                if let Err(e) = &result {
                    tracing::debug!(command = name, error = %e, "Command rejected");
                }
                let _ = reply.send(result);
                true
            }
            WorkerMessage::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
                true
            }
            WorkerMessage::Catalog { reply } => {
                let _ = reply.send(self.controller.catalog_snapshot());
                true
            }
            WorkerMessage::Shutdown { reply } => {
                tracing::info!("ControllerWorker shutting down");
                self.controller.teardown();
                let _ = reply.send(());
                false
            }
        }
    }

    fn publish_changes(&mut self) {
        let revision = self.controller.catalog_revision();
        if revision != self.published_revision {
            self.published_revision = revision;
            self.publisher
                .publish_catalog(revision, self.controller.catalog().clone());
        }

        let snapshot = self.controller.snapshot();
        if self.published_state.as_ref() != Some(&snapshot) {
            self.publisher.publish_state(snapshot.clone());
            self.published_state = Some(snapshot);
        }
    }
}

/// 控制器句柄 - HTTP 层访问控制器的唯一入口
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<WorkerMessage>,
}

impl ControllerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> WorkerMessage,
    ) -> Result<T, ApplicationError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| ApplicationError::ControllerStopped)?;
        rx.await.map_err(|_| ApplicationError::ControllerStopped)
    }

    /// 执行命令，成功后返回最新快照
    pub async fn execute(&self, command: Command) -> Result<SelectionSnapshot, ApplicationError> {
        self.request(|reply| WorkerMessage::Execute { command, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<SelectionSnapshot, ApplicationError> {
        self.request(|reply| WorkerMessage::Snapshot { reply }).await
    }

    /// 目录及其版本号，来自同一次读取
    pub async fn catalog(&self) -> Result<CatalogSnapshot, ApplicationError> {
        self.request(|reply| WorkerMessage::Catalog { reply }).await
    }

    pub async fn select_language(
        &self,
        key: impl Into<String>,
    ) -> Result<SelectionSnapshot, ApplicationError> {
        self.execute(Command::SelectLanguage(LanguageGroupKey::from_raw(key)))
            .await
    }

    pub async fn select_voice(
        &self,
        name: impl Into<String>,
    ) -> Result<SelectionSnapshot, ApplicationError> {
        self.execute(Command::SelectVoice(name.into())).await
    }

    pub async fn speak(&self) -> Result<SelectionSnapshot, ApplicationError> {
        self.execute(Command::Speak).await
    }

    pub async fn stop(&self) -> Result<SelectionSnapshot, ApplicationError> {
        self.execute(Command::Stop).await
    }

    /// 拆除控制器并结束事件循环；已停止时直接返回
    pub async fn shutdown(&self) {
        if self
            .request(|reply| WorkerMessage::Shutdown { reply })
            .await
            .is_err()
        {
            tracing::debug!("ControllerWorker already stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::selection::PlaybackStatus;
    use crate::domain::voice::VoiceDescriptor;
    use crate::infrastructure::adapters::{FakeSpeechCapability, FakeSpeechCapabilityConfig};
    use crate::infrastructure::events::UiEvent;
    use std::time::Duration;

    fn spawn_worker(
        fake: FakeSpeechCapability,
    ) -> (ControllerHandle, Arc<EventPublisher>, tokio::task::JoinHandle<()>) {
        let publisher = EventPublisher::new().arc();
        let (worker, handle) = ControllerWorker::new(
            ControllerWorkerConfig::default(),
            Arc::new(fake),
            publisher.clone(),
        );
        let join = tokio::spawn(worker.run());
        (handle, publisher, join)
    }

    #[tokio::test]
    async fn test_commands_round_trip_through_worker() {
        let (handle, _publisher, _join) = spawn_worker(FakeSpeechCapability::manual(vec![
            VoiceDescriptor::local("Alice", "en-US"),
            VoiceDescriptor::local("Claire", "fr-FR"),
        ]));

        let snapshot = handle.select_language("French (fr)").await.unwrap();
        assert_eq!(snapshot.selected_voice.as_deref(), Some("Claire"));

        let err = handle.select_voice("Alice").await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidSelection(_)));

        let catalog = handle.catalog().await.unwrap();
        assert_eq!(catalog.revision, 1);
        assert_eq!(catalog.groups.len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_read_carries_matching_revision() {
        let fake = Arc::new(FakeSpeechCapability::manual(vec![VoiceDescriptor::local(
            "Alice", "en-US",
        )]));
        let (worker, handle) = ControllerWorker::new(
            ControllerWorkerConfig::default(),
            fake.clone(),
            EventPublisher::new().arc(),
        );
        tokio::spawn(worker.run());

        let first = handle.catalog().await.unwrap();
        assert_eq!(first.revision, 1);
        assert_eq!(first.groups.voice_count(), 1);

        fake.set_voices(vec![
            VoiceDescriptor::local("Alice", "en-US"),
            VoiceDescriptor::local("Claire", "fr-FR"),
        ]);
        fake.announce_voices_changed();

        let mut latest = handle.catalog().await.unwrap();
        for _ in 0..100 {
            if latest.revision == 2 {
                break;
            }
            tokio::task::yield_now().await;
            latest = handle.catalog().await.unwrap();
        }
        assert_eq!(latest.revision, 2);
        assert_eq!(latest.groups.voice_count(), 2);
        assert_eq!(latest.groups.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_playback_reaches_idle() {
        let (handle, _publisher, _join) = spawn_worker(FakeSpeechCapability::new(
            FakeSpeechCapabilityConfig {
                playback: Some(Duration::from_millis(200)),
                ..Default::default()
            },
        ));

        handle
            .execute(Command::SetText("Hello there".to_string()))
            .await
            .unwrap();
        handle.speak().await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            handle.snapshot().await.unwrap().playback_status,
            PlaybackStatus::Speaking
        );

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            handle.snapshot().await.unwrap().playback_status,
            PlaybackStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_publishes_catalog_and_state() {
        let publisher = EventPublisher::new().arc();
        let mut rx = publisher.subscribe();
        let (worker, handle) = ControllerWorker::new(
            ControllerWorkerConfig::default(),
            Arc::new(FakeSpeechCapability::manual(vec![VoiceDescriptor::local(
                "Alice", "en-US",
            )])),
            publisher.clone(),
        );
        tokio::spawn(worker.run());

        match rx.recv().await.unwrap() {
            UiEvent::CatalogChanged { revision, groups } => {
                assert_eq!(revision, 1);
                assert_eq!(groups.voice_count(), 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            UiEvent::StateChanged(snapshot) => {
                assert_eq!(snapshot.selected_voice.as_deref(), Some("Alice"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        handle.execute(Command::SetRate(3.5)).await.unwrap();
        match rx.recv().await.unwrap() {
            UiEvent::StateChanged(snapshot) => assert_eq!(snapshot.rate, 2.0),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let (handle, _publisher, join) = spawn_worker(FakeSpeechCapability::manual(vec![
            VoiceDescriptor::local("Alice", "en-US"),
        ]));

        handle.shutdown().await;
        join.await.unwrap();

        let err = handle.snapshot().await.unwrap_err();
        assert!(matches!(err, ApplicationError::ControllerStopped));
        // 已停止时再次关闭不会报错
        handle.shutdown().await;
    }
}
