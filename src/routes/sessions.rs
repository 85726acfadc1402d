use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::sessions::{FrameInput, MonitorOverrides};
use crate::state::AppState;

use super::realtime;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/frames", post(submit_frame))
        .route("/:id/events", get(realtime::session_events))
}

pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("INVALID_SESSION_ID", "会话 ID 格式无效"))
}

/// 请求体可为空，空体表示全部使用服务默认参数
async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let overrides = if body.iter().all(u8::is_ascii_whitespace) {
        MonitorOverrides::default()
    } else {
        serde_json::from_slice::<MonitorOverrides>(&body).map_err(|e| {
            tracing::warn!(error = %e, "Invalid session config body");
            AppError::bad_request("INVALID_REQUEST_BODY", "请求体格式无效")
        })?
    };

    let info = state.sessions().create(&overrides).await?;
    Ok(created(info))
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions().list().await;
    ok(serde_json::json!({
        "count": sessions.len(),
        "items": sessions,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_session_id(&id)?;
    let info = state.sessions().get(id).await?;
    Ok(ok(info))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_session_id(&id)?;
    state.sessions().remove(id).await?;
    Ok(ok(serde_json::json!({ "deleted": true })))
}

async fn submit_frame(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(frame): JsonBody<FrameInput>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_session_id(&id)?;
    let summary = state.sessions().submit_frame(id, frame).await?;
    Ok(ok(summary))
}
