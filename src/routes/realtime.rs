use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::response::AppError;
use crate::sessions::SessionEvent;
use crate::state::AppState;

use super::sessions::parse_session_id;

fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::Summary(_) => "summary",
        SessionEvent::Alert { .. } => "alert",
    }
}

/// 会话事件流：每帧一个 `summary`，报警上升沿额外一个 `alert`
///
/// 会话被删除或服务关闭时流结束。
pub async fn session_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let id = parse_session_id(&id)?;
    let mut events = state.sessions().subscribe(id).await?;

    let slot = state
        .acquire_sse_slot()
        .ok_or_else(|| AppError::too_many_requests("Too many SSE connections"))?;

    let mut shutdown_rx = state.shutdown_rx();

    let stream = async_stream::stream! {
        let _slot = slot;

        loop {
            tokio::select! {
                received = events.recv() => {
                    match received {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                yield Ok(Event::default()
                                    .event(event_name(&event))
                                    .data(json));
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(session_id = %id, skipped, "SSE subscriber lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}
