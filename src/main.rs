//! Voxform - 文本朗读表单服务
//!
//! - Domain: voice/, selection/
//! - Application: controller, commands, queries, ports
//! - Infrastructure: http, worker, adapters, events

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use voxform::application::ports::SpeechCapabilityPort;
use voxform::config::{load_config, print_config, AppConfig, FakeSpeechConfig, SpeechBackend};
use voxform::domain::voice::VoiceDescriptor;
use voxform::infrastructure::adapters::{
    default_voices, FakeSpeechCapability, FakeSpeechCapabilityConfig,
};
use voxform::infrastructure::events::EventPublisher;
use voxform::infrastructure::http::{AppState, HttpServer, ServerConfig};
use voxform::infrastructure::worker::{ControllerHandle, ControllerWorker, ControllerWorkerConfig};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxform={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn fake_capability(config: &FakeSpeechConfig) -> FakeSpeechCapability {
    let voices = if config.voices.is_empty() {
        default_voices()
    } else {
        config
            .voices
            .iter()
            .map(|v| {
                VoiceDescriptor::new(
                    v.name.clone(),
                    v.lang.clone(),
                    true,
                    v.default,
                    format!("fake:{}", v.name),
                )
            })
            .collect()
    };

    FakeSpeechCapability::new(FakeSpeechCapabilityConfig {
        voices,
        available: config.available,
        playback: config.playback(),
    })
}

fn create_capability(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechCapabilityPort>> {
    match config.speech.backend {
        SpeechBackend::Fake => Ok(Arc::new(fake_capability(&config.speech.fake))),
        #[cfg(feature = "native")]
        SpeechBackend::Native => Ok(Arc::new(
            voxform::infrastructure::adapters::NativeSpeechCapability::new(),
        )),
        #[cfg(not(feature = "native"))]
        SpeechBackend::Native => Err(anyhow::anyhow!(
            "speech.backend = \"native\" requires building with `--features native`"
        )),
    }
}

/// 运行 HTTP 服务；无论服务如何结束，都先拆除控制器（取消朗读与兜底定时器）再返回
async fn serve_then_teardown<F>(
    serving: F,
    controller: ControllerHandle,
    worker_task: JoinHandle<()>,
) -> anyhow::Result<()>
where
    F: Future<Output = Result<(), std::io::Error>>,
{
    let served = serving.await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "HTTP server stopped with error");
    }

    controller.shutdown().await;
    if let Err(e) = worker_task.await {
        tracing::warn!(error = %e, "ControllerWorker task failed");
    }

    served.map_err(anyhow::Error::from)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Voxform - 文本朗读表单服务");
    print_config(&config);

    let capability = create_capability(&config)?;

    // 创建事件发布器
    let event_publisher = Arc::new(EventPublisher::new());

    // 创建并启动控制器 Worker
    let worker_config = ControllerWorkerConfig {
        command_capacity: config.speech.command_capacity,
        settings: config.speech.controller_settings(),
    };
    let (worker, controller) =
        ControllerWorker::new(worker_config, capability, event_publisher.clone());
    let worker_task = tokio::spawn(worker.run());

    // 创建 HTTP 服务器
    let mut server_config = ServerConfig::new(&config.server.host, config.server.port);
    if config.server.static_files.enabled {
        server_config = server_config.with_static_files(
            &config.server.static_files.dir,
            &config.server.static_files.path,
        );
    }
    let state = AppState::new(controller.clone(), event_publisher);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    let serving = server.run_with_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
        tracing::info!("Received shutdown signal");
    });
    serve_then_teardown(serving, controller, worker_task).await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxform::application::ApplicationError;

    #[tokio::test]
    async fn test_bind_failure_still_tears_down_controller() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let fake = Arc::new(FakeSpeechCapability::manual(default_voices()));
        let publisher = Arc::new(EventPublisher::new());
        let (worker, controller) =
            ControllerWorker::new(ControllerWorkerConfig::default(), fake.clone(), publisher.clone());
        let worker_task = tokio::spawn(worker.run());

        let server = HttpServer::new(
            ServerConfig::new("127.0.0.1", port),
            AppState::new(controller.clone(), publisher),
        );
        let result = serve_then_teardown(
            server.run_with_shutdown(std::future::pending()),
            controller.clone(),
            worker_task,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(fake.cancel_count(), 1);
        let err = controller.snapshot().await.unwrap_err();
        assert!(matches!(err, ApplicationError::ControllerStopped));
    }
}
