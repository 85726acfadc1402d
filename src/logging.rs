use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// 每日滚动的 JSON 日志文件，保留 30 天
pub fn file_appender(log_dir: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("drowsiness-monitor")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)
}

pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);

    let registry = Registry::default().with(env_filter).with(stdout_layer);

    // 日志目录不可写时退回仅 stdout，订阅者装好后再报告原因
    let (file_layer, file_error) = if config.enable_file_logs {
        match file_appender(&config.log_dir) {
            Ok(appender) => (
                Some(fmt::layer().with_writer(appender).with_ansi(false).json()),
                None,
            ),
            Err(e) => (None, Some(e)),
        }
    } else {
        (None, None)
    };

    // try_init 在全局 subscriber 已设置时返回错误，属于正常情况（如测试环境）
    if let Err(e) = registry.with(file_layer).try_init() {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }

    if let Some(e) = file_error {
        tracing::error!(log_dir = %config.log_dir, error = %e, "File logging disabled, falling back to stdout");
    }
}
