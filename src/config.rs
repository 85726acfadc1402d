use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use drowsiness_core::config::{
    DEFAULT_ALERT_DURATION_SECS, DEFAULT_EAR_THRESHOLD, DEFAULT_MAR_THRESHOLD,
    DEFAULT_ROLLING_WINDOW_CAPACITY,
};
use drowsiness_core::{EyeIndices, IndexLayout, MonitorConfig, MouthIndices};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    /// 新建会话时的默认监测参数，请求可覆盖
    pub monitor: MonitorConfig,
    pub limits: LimitsConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_sessions: usize,
    pub max_sse_connections: usize,
    pub max_landmarks_per_frame: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions: 64,
            max_sse_connections: 128,
            max_landmarks_per_frame: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enable_session_reaper: bool,
    pub session_idle_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enable_session_reaper: true,
            session_idle_timeout_secs: 300,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let face_mesh = IndexLayout::face_mesh();
        let limits = LimitsConfig::default();
        let worker = WorkerConfig::default();

        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            monitor: MonitorConfig {
                ear_threshold: env_or_parse("EAR_THRESHOLD", DEFAULT_EAR_THRESHOLD),
                mar_threshold: env_or_parse("MAR_THRESHOLD", DEFAULT_MAR_THRESHOLD),
                alert_duration_secs: env_or_parse(
                    "ALERT_DURATION_SECS",
                    DEFAULT_ALERT_DURATION_SECS,
                ),
                rolling_window_capacity: env_or_parse(
                    "ROLLING_WINDOW_CAPACITY",
                    DEFAULT_ROLLING_WINDOW_CAPACITY,
                ),
                layout: IndexLayout {
                    left_eye: EyeIndices(env_or_indices("LEFT_EYE_INDICES", face_mesh.left_eye.0)),
                    right_eye: EyeIndices(env_or_indices(
                        "RIGHT_EYE_INDICES",
                        face_mesh.right_eye.0,
                    )),
                    mouth: MouthIndices(env_or_indices("MOUTH_INDICES", face_mesh.mouth.0)),
                },
            },
            limits: LimitsConfig {
                max_sessions: env_or_parse("MAX_SESSIONS", limits.max_sessions),
                max_sse_connections: env_or_parse(
                    "MAX_SSE_CONNECTIONS",
                    limits.max_sse_connections,
                ),
                max_landmarks_per_frame: env_or_parse(
                    "MAX_LANDMARKS_PER_FRAME",
                    limits.max_landmarks_per_frame,
                ),
            },
            worker: WorkerConfig {
                enable_session_reaper: env_or_bool(
                    "ENABLE_SESSION_REAPER",
                    worker.enable_session_reaper,
                ),
                session_idle_timeout_secs: env_or_parse(
                    "SESSION_IDLE_TIMEOUT_SECS",
                    worker.session_idle_timeout_secs,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// 逗号分隔的关键点索引，个数必须与布局一致
pub fn env_or_indices<const N: usize>(key: &str, default: [usize; N]) -> [usize; N] {
    match env::var(key) {
        Ok(raw) => match parse_indices::<N>(&raw) {
            Some(v) => v,
            None => {
                tracing::warn!(
                    key,
                    value = %raw,
                    expected = N,
                    "Failed to parse landmark indices, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn parse_indices<const N: usize>(raw: &str) -> Option<[usize; N]> {
    let parsed = raw
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;
    parsed.try_into().ok()
}
