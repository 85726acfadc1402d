//! 监测会话注册表
//!
//! 每个会话独占一个 `FrameProcessor`，会话之间不共享任何可变状态。
//! 同一会话的帧在会话锁内串行处理，保证每帧更新完整结束后才开始下一帧。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use drowsiness_core::{
    DrowsinessState, FrameProcessor, FrameSummary, IndexLayout, MonitorConfig, Point,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

/// 每个会话事件通道的缓冲帧数，慢速订阅者会丢弃更早的事件
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("会话不存在: {0}")]
    NotFound(Uuid),
    #[error("会话数已达上限 ({0})")]
    LimitReached(usize),
    #[error("监测参数无效: {0}")]
    InvalidConfig(String),
    #[error("帧数据无效: {0}")]
    InvalidFrame(String),
}

/// 创建会话时可覆盖的参数，未给出的字段使用服务默认值
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOverrides {
    pub ear_threshold: Option<f64>,
    pub mar_threshold: Option<f64>,
    pub alert_duration_secs: Option<f64>,
    pub rolling_window_capacity: Option<usize>,
    pub layout: Option<IndexLayout>,
}

impl MonitorOverrides {
    pub fn apply(&self, defaults: &MonitorConfig) -> MonitorConfig {
        MonitorConfig {
            ear_threshold: self.ear_threshold.unwrap_or(defaults.ear_threshold),
            mar_threshold: self.mar_threshold.unwrap_or(defaults.mar_threshold),
            alert_duration_secs: self
                .alert_duration_secs
                .unwrap_or(defaults.alert_duration_secs),
            rolling_window_capacity: self
                .rolling_window_capacity
                .unwrap_or(defaults.rolling_window_capacity),
            layout: self.layout.unwrap_or(defaults.layout),
        }
    }
}

/// 一帧输入
///
/// `landmarks` 缺省或为 `null` 表示本帧未检测到人脸。
/// `timestamp` 为会话开始以来的秒数；缺省时使用服务端单调时钟。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInput {
    #[serde(default)]
    pub landmarks: Option<Vec<Point>>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    Summary(FrameSummary),
    /// 持续闭眼达到报警时长（上升沿）
    Alert { closed_duration: f64 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub frames_processed: u64,
    pub frames_without_face: u64,
    pub state: DrowsinessState,
    pub config: MonitorConfig,
    pub last_summary: FrameSummary,
}

pub struct Session {
    id: Uuid,
    processor: FrameProcessor,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    epoch: Instant,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    fn new(id: Uuid, config: MonitorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let now = Utc::now();
        Self {
            id,
            processor: FrameProcessor::new(config, 0.0),
            created_at: now,
            last_activity: now,
            epoch: Instant::now(),
            events,
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            created_at: self.created_at,
            last_activity: self.last_activity,
            frames_processed: self.processor.frames_processed(),
            frames_without_face: self.processor.frames_without_face(),
            state: self.processor.state_machine().state(),
            config: self.processor.config().clone(),
            last_summary: self.processor.last_summary().clone(),
        }
    }

    fn process(&mut self, frame: FrameInput) -> FrameSummary {
        let now = frame
            .timestamp
            .unwrap_or_else(|| self.epoch.elapsed().as_secs_f64());
        let was_alert = self.processor.last_summary().alert;

        let summary = self.processor.process(frame.landmarks.as_deref(), now);
        self.last_activity = Utc::now();

        // 没有订阅者时 send 返回错误，忽略即可
        let _ = self.events.send(SessionEvent::Summary(summary.clone()));
        if summary.alert && !was_alert {
            tracing::warn!(
                session_id = %self.id,
                closed_duration = summary.closed_duration,
                "Drowsiness alert raised"
            );
            let _ = self.events.send(SessionEvent::Alert {
                closed_duration: summary.closed_duration,
            });
        }

        summary
    }
}

pub struct SessionRegistry {
    defaults: MonitorConfig,
    max_sessions: usize,
    max_landmarks: usize,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new(defaults: MonitorConfig, max_sessions: usize, max_landmarks: usize) -> Self {
        Self {
            defaults,
            max_sessions,
            max_landmarks,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &MonitorConfig {
        &self.defaults
    }

    pub async fn create(&self, overrides: &MonitorOverrides) -> Result<SessionInfo, SessionError> {
        let config = overrides.apply(&self.defaults);
        config
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(SessionError::LimitReached(self.max_sessions));
        }

        let id = Uuid::new_v4();
        let session = Session::new(id, config);
        let info = session.info();
        sessions.insert(id, Arc::new(Mutex::new(session)));

        tracing::info!(session_id = %id, active = sessions.len(), "Session created");
        Ok(info)
    }

    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionInfo, SessionError> {
        let session = self.session(id).await?;
        let info = session.lock().await.info();
        Ok(info)
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        let handles: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            infos.push(handle.lock().await.info());
        }
        infos.sort_by_key(|info| info.created_at);
        infos
    }

    /// 删除会话；事件通道随会话一起释放，订阅者会收到关闭信号
    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(session_id = %id, "Session removed");
                Ok(())
            }
            None => Err(SessionError::NotFound(id)),
        }
    }

    pub async fn submit_frame(
        &self,
        id: Uuid,
        frame: FrameInput,
    ) -> Result<FrameSummary, SessionError> {
        self.validate_frame(&frame)?;
        let session = self.session(id).await?;
        let summary = session.lock().await.process(frame);
        Ok(summary)
    }

    pub async fn subscribe(
        &self,
        id: Uuid,
    ) -> Result<broadcast::Receiver<SessionEvent>, SessionError> {
        let session = self.session(id).await?;
        let rx = session.lock().await.events.subscribe();
        Ok(rx)
    }

    /// 清理超过 `max_idle` 未收到帧的会话，返回清理数量
    ///
    /// `max_idle` 大到截止时间溢出时视为没有会话空闲。
    pub async fn evict_idle(&self, max_idle: chrono::Duration) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(max_idle) else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, handle) in sessions.iter() {
            // 正在处理帧的会话视为活跃
            if let Ok(session) = handle.try_lock() {
                if session.last_activity < cutoff {
                    expired.push(*id);
                }
            }
        }

        for id in &expired {
            sessions.remove(id);
            tracing::debug!(session_id = %id, "Evicted idle session");
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn validate_frame(&self, frame: &FrameInput) -> Result<(), SessionError> {
        if let Some(ts) = frame.timestamp {
            if !ts.is_finite() || ts < 0.0 {
                return Err(SessionError::InvalidFrame(
                    "timestamp 必须是非负有限数".to_string(),
                ));
            }
        }
        if let Some(landmarks) = &frame.landmarks {
            if landmarks.len() > self.max_landmarks {
                return Err(SessionError::InvalidFrame(format!(
                    "关键点数量 {} 超过上限 {}",
                    landmarks.len(),
                    self.max_landmarks
                )));
            }
        }
        Ok(())
    }
}
