use axum::Router;
use drowsiness_core::MonitorConfig;
use tokio::sync::broadcast;

use drowsiness_monitor::config::{Config, LimitsConfig, WorkerConfig};
use drowsiness_monitor::routes::build_router;
use drowsiness_monitor::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub shutdown_tx: broadcast::Sender<()>,
}

pub fn test_config(limits: LimitsConfig) -> Config {
    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        monitor: MonitorConfig::default(),
        limits,
        worker: WorkerConfig {
            enable_session_reaper: false,
            session_idle_timeout_secs: 300,
        },
    }
}

pub fn spawn_with_limits(limits: LimitsConfig) -> TestApp {
    let config = test_config(limits);
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(&config, shutdown_tx.clone());
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        shutdown_tx,
    }
}

pub fn spawn_test_app() -> TestApp {
    spawn_with_limits(LimitsConfig::default())
}
