//! WebSocket Handler
//!
//! 连接后先推送当前目录和快照，之后转发 `UiEvent`

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::events::UiEvent;
use crate::infrastructure::http::state::AppState;

/// UI 事件 WebSocket
pub async fn events_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_events_socket(socket, state))
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &UiEvent,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            return Ok(());
        }
    };
    sender.send(Message::Text(json)).await
}

async fn handle_events_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 先订阅再读取初始状态，避免漏掉中间的变更
    let mut event_rx = state.event_publisher.subscribe();

    tracing::info!("Events WebSocket connected");

    let initial = match (
        state.controller.catalog().await,
        state.controller.snapshot().await,
    ) {
        (Ok(catalog), Ok(snapshot)) => Some((
            UiEvent::CatalogChanged {
                revision: catalog.revision,
                groups: catalog.groups,
            },
            UiEvent::StateChanged(snapshot),
        )),
        _ => None,
    };

    let mut forward_task = tokio::spawn(async move {
        if let Some((catalog, snapshot)) = initial {
            if send_event(&mut sender, &catalog).await.is_err()
                || send_event(&mut sender, &snapshot).await.is_err()
            {
                return;
            }
        }

        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Events WebSocket lagged behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if let Err(e) = send_event(&mut sender, &event).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Events WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Events WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!("Events WebSocket disconnected");
}
