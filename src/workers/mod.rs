pub mod session_cleanup;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::WorkerConfig;
use crate::sessions::SessionRegistry;

/// Timeout for individual worker invocations.
const WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Drain period before scheduler shutdown to let in-flight tasks complete.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    SessionCleanup,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionCleanup => "session_cleanup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    pub cron: &'static str,
    pub enabled: bool,
}

pub struct WorkerManager {
    sessions: Arc<SessionRegistry>,
    shutdown_rx: broadcast::Receiver<()>,
    config: WorkerConfig,
}

impl WorkerManager {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            sessions,
            shutdown_rx,
            config: config.clone(),
        }
    }

    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        vec![JobSpec {
            name: WorkerName::SessionCleanup,
            cron: "0 * * * * *",
            enabled: self.config.enable_session_reaper,
        }]
    }

    /// Start the scheduler and block until shutdown. Returns immediately when no job is enabled.
    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.planned_jobs().iter().all(|spec| !spec.enabled) {
            tracing::info!("No workers enabled; skipping worker startup");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;

        self.register_jobs(&scheduler).await;

        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            "Worker manager shutting down, draining for {}s",
            DRAIN_TIMEOUT.as_secs()
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler) {
        for spec in &self.planned_jobs() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let name_str = spec.name.as_str();

            match spec.name {
                WorkerName::SessionCleanup => {
                    let sessions = self.sessions.clone();
                    let idle_secs = self.config.session_idle_timeout_secs;
                    add_job(scheduler, spec.cron, name_str, move || {
                        let sessions = sessions.clone();
                        async move {
                            session_cleanup::run(&sessions, idle_secs).await;
                        }
                    })
                    .await;
                }
            }
            tracing::info!(name = name_str, cron = spec.cron, "Registered worker");
        }
    }
}

/// Clears a job's running flag when dropped, so a panicking run does not block later ticks.
struct RunningGuard(Arc<AtomicBool>);

impl RunningGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Add a job to the scheduler with an overlap guard and timeout wrapper.
async fn add_job<Fut, F>(scheduler: &JobScheduler, cron: &str, name: &'static str, mut run: F)
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let Some(guard) = RunningGuard::try_acquire(&running) else {
            tracing::warn!(
                worker = name,
                "Skipping worker invocation: previous run still in progress"
            );
            return Box::pin(async {});
        };

        let fut = run();
        Box::pin(async move {
            let _guard = guard;
            if tokio::time::timeout(WORKER_TIMEOUT, fut).await.is_err() {
                tracing::error!(
                    worker = name,
                    timeout_secs = WORKER_TIMEOUT.as_secs(),
                    "Worker timed out"
                );
            }
        })
    });

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error=%err, cron, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => tracing::error!(error=%err, cron, worker = name, "Failed to create worker job"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use drowsiness_core::MonitorConfig;
    use tokio::sync::broadcast;

    use super::*;

    fn registry() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(MonitorConfig::default(), 4, 1024))
    }

    #[test]
    fn running_guard_blocks_overlap() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = RunningGuard::try_acquire(&flag).expect("first run");
        assert!(RunningGuard::try_acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(RunningGuard::try_acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn running_guard_released_when_run_panics() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = RunningGuard::try_acquire(&flag).expect("first run");

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("session cleanup blew up");
        });
        assert!(handle.await.is_err());

        assert!(!flag.load(Ordering::SeqCst));
        assert!(RunningGuard::try_acquire(&flag).is_some());
    }

    #[test]
    fn reaper_switch_controls_job() {
        let (tx, _) = broadcast::channel(2);
        let cfg = WorkerConfig {
            enable_session_reaper: false,
            session_idle_timeout_secs: 60,
        };

        let manager = WorkerManager::new(registry(), tx.subscribe(), &cfg);
        let jobs = manager.planned_jobs();
        assert_eq!(jobs.len(), 1);
        assert!(!jobs[0].enabled);
        assert_eq!(jobs[0].name.as_str(), "session_cleanup");
    }

    #[tokio::test]
    async fn disabled_manager_returns_immediately() {
        let (tx, _) = broadcast::channel(2);
        let cfg = WorkerConfig {
            enable_session_reaper: false,
            session_idle_timeout_secs: 60,
        };

        let manager = WorkerManager::new(registry(), tx.subscribe(), &cfg);
        manager
            .start()
            .await
            .expect("start with no enabled workers should succeed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn enabled_manager_stops_on_shutdown() {
        let (tx, _) = broadcast::channel(2);
        let cfg = WorkerConfig::default();

        let manager = WorkerManager::new(registry(), tx.subscribe(), &cfg);
        let handle = tokio::spawn(manager.start());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(());

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker manager should stop")
            .expect("task should not panic");
        tokio_test::assert_ok!(result);
    }
}
