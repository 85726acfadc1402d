use crate::sessions::SessionRegistry;

/// 清理长时间未收到帧的会话
///
/// 超时时长超出 chrono 可表示范围时视为没有会话空闲。
pub async fn run(registry: &SessionRegistry, idle_timeout_secs: u64) {
    tracing::debug!("session_cleanup: start");
    let Some(max_idle) = i64::try_from(idle_timeout_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
    else {
        tracing::debug!(idle_timeout_secs, "session_cleanup: timeout out of range, skipping");
        return;
    };

    let evicted = registry.evict_idle(max_idle).await;
    if evicted > 0 {
        let remaining = registry.len().await;
        tracing::info!(evicted, remaining, "session_cleanup: done");
    } else {
        tracing::debug!("session_cleanup: nothing to evict");
    }
}
