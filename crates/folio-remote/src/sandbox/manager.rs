use std::sync::Arc;

use folio_core::SandboxConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::error::SandboxError;
use super::provider::SandboxProvider;
use super::registry::SandboxSession;
use super::registry::SessionRegistry;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxManagerOptions {
    pub sweep_interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for SandboxManagerOptions {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl From<&SandboxConfig> for SandboxManagerOptions {
    fn from(config: &SandboxConfig) -> Self {
        Self {
            sweep_interval: config.sweep_interval(),
            idle_timeout: config.idle_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

impl StopOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Stopped => "Sandbox session stopped.",
            Self::AlreadyStopped => "Sandbox session already stopped.",
        }
    }
}

/// Owns the sandbox session lifecycle: provisioning, execution, explicit
/// stop, and the idle sweep.
///
/// Must be created inside a tokio runtime; the idle sweep starts right away
/// and runs until [`SandboxManager::shutdown`] or drop.
pub struct SandboxManager {
    provider: Arc<dyn SandboxProvider>,
    registry: Arc<SessionRegistry>,
    cancel: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SandboxManager {
    pub fn new(
        provider: Arc<dyn SandboxProvider>,
        registry: Arc<SessionRegistry>,
        options: SandboxManagerOptions,
    ) -> Self {
        let cancel = CancellationToken::new();
        let sweeper = tokio::spawn(run_idle_sweep(
            Arc::clone(&registry),
            options,
            cancel.clone(),
        ));
        Self {
            provider,
            registry,
            cancel,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub async fn start(&self) -> Result<String, SandboxError> {
        let handle = self.provider.provision().await?;
        let session_id = Uuid::new_v4().to_string();
        let session = Arc::new(SandboxSession::new(session_id.clone(), handle));
        self.registry.insert(session, Instant::now()).await;
        info!(%session_id, "sandbox session started");
        Ok(session_id)
    }

    pub async fn execute(&self, session_id: &str, command: &str) -> Result<String, SandboxError> {
        let Some(session) = self.registry.touch(session_id, Instant::now()).await else {
            return Err(SandboxError::session_not_found(session_id));
        };
        debug!(%session_id, %command, "executing sandbox command");
        let result = session.run(command).await;
        // Long-running commands count as activity until they finish.
        self.registry.touch(session_id, Instant::now()).await;
        result
    }

    /// Idempotent: an unknown id acknowledges instead of failing. Close
    /// failures are logged and the session is still considered stopped.
    pub async fn stop(&self, session_id: &str) -> StopOutcome {
        let Some(session) = self.registry.remove(session_id).await else {
            debug!(%session_id, "stop for unknown sandbox session");
            return StopOutcome::AlreadyStopped;
        };
        close_session(&session, "stopped").await;
        StopOutcome::Stopped
    }

    /// Evicts idle sessions immediately instead of waiting for the next tick.
    pub async fn sweep_now(&self, idle_timeout: Duration) -> usize {
        evict_idle(&self.registry, idle_timeout).await
    }

    /// Stops the idle sweep and closes every remaining session.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            if let Err(err) = sweeper.await {
                warn!(error = %err, "idle sweep task ended abnormally");
            }
        }
        let remaining = self.registry.drain().await;
        if !remaining.is_empty() {
            info!(count = remaining.len(), "closing sandbox sessions on shutdown");
        }
        for session in remaining {
            close_session(&session, "shutdown").await;
        }
    }
}

impl Drop for SandboxManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_idle_sweep(
    registry: Arc<SessionRegistry>,
    options: SandboxManagerOptions,
    cancel: CancellationToken,
) {
    let start = Instant::now() + options.sweep_interval;
    let mut ticker = tokio::time::interval_at(start, options.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                evict_idle(&registry, options.idle_timeout).await;
            }
        }
    }
    debug!("idle sweep stopped");
}

async fn evict_idle(registry: &SessionRegistry, idle_timeout: Duration) -> usize {
    let expired = registry.take_idle(Instant::now(), idle_timeout).await;
    for session in &expired {
        close_session(session, "idle").await;
    }
    expired.len()
}

async fn close_session(session: &SandboxSession, reason: &str) {
    match session.close().await {
        Ok(()) => info!(session_id = session.id(), reason, "sandbox session closed"),
        Err(err) => warn!(
            session_id = session.id(),
            reason,
            error = %err,
            "failed to close sandbox session"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::testing::FakeProvider;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    fn manager(provider: FakeProvider) -> SandboxManager {
        SandboxManager::new(
            Arc::new(provider),
            Arc::new(SessionRegistry::new()),
            SandboxManagerOptions::default(),
        )
    }

    #[tokio::test]
    async fn execute_unknown_session_leaves_registry_untouched() {
        let manager = manager(FakeProvider::default());
        let session_id = manager.start().await.expect("start");

        let err = manager.execute("missing", "1+1").await.expect_err("unknown id");
        assert!(matches!(err, SandboxError::SessionNotFound { ref session_id } if session_id == "missing"));
        assert_eq!(manager.registry().len().await, 1);
        assert!(manager.registry().contains(&session_id).await);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn execute_returns_output_or_evaluation_error() {
        let manager = manager(FakeProvider::default());
        let session_id = manager.start().await.expect("start");

        assert_eq!(manager.execute(&session_id, "1+1").await.expect("run"), "ran 1+1");
        let err = manager.execute(&session_id, "fail").await.expect_err("eval error");
        assert_eq!(err.to_string(), "ReferenceError: fail");
        assert!(manager.registry().contains(&session_id).await);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let provider = FakeProvider::default();
        let closed = Arc::clone(&provider.closed);
        let manager = manager(provider);
        let session_id = manager.start().await.expect("start");

        assert_eq!(manager.stop(&session_id).await, StopOutcome::Stopped);
        assert_eq!(manager.stop(&session_id).await, StopOutcome::AlreadyStopped);
        assert_eq!(manager.stop("never-existed").await, StopOutcome::AlreadyStopped);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(matches!(
            manager.execute(&session_id, "ls").await,
            Err(SandboxError::SessionNotFound { .. })
        ));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn stop_cancels_an_in_flight_execute() {
        let provider = FakeProvider::default();
        let closed = Arc::clone(&provider.closed);
        let started = Arc::clone(&provider.started);
        let manager = Arc::new(manager(provider));
        let session_id = manager.start().await.expect("start");

        let execute = tokio::spawn({
            let manager = Arc::clone(&manager);
            let session_id = session_id.clone();
            async move { manager.execute(&session_id, "block").await }
        });
        started.notified().await;

        let outcome = tokio::time::timeout(Duration::from_secs(5), manager.stop(&session_id))
            .await
            .expect("stop should not wait for the command");
        assert_eq!(outcome, StopOutcome::Stopped);

        let result = tokio::time::timeout(Duration::from_secs(5), execute)
            .await
            .expect("execute should return once stopped")
            .expect("execute task");
        assert!(matches!(result, Err(SandboxError::Stopped)));
        assert!(manager.registry().is_empty().await);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn close_failure_still_removes_session() {
        let manager = manager(FakeProvider {
            fail_close: true,
            ..FakeProvider::default()
        });
        let session_id = manager.start().await.expect("start");
        assert_eq!(manager.stop(&session_id).await, StopOutcome::Stopped);
        assert!(manager.registry().is_empty().await);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_is_evicted_by_the_sweep() {
        let provider = FakeProvider::default();
        let closed = Arc::clone(&provider.closed);
        let manager = manager(provider);
        let session_id = manager.start().await.expect("start");

        tokio::time::sleep(Duration::from_secs(290)).await;
        assert!(manager.registry().contains(&session_id).await);

        tokio::time::sleep(Duration::from_secs(75)).await;
        assert!(!manager.registry().contains(&session_id).await);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(matches!(
            manager.execute(&session_id, "1+1").await,
            Err(SandboxError::SessionNotFound { .. })
        ));
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn execute_refreshes_last_used() {
        let manager = manager(FakeProvider::default());
        let session_id = manager.start().await.expect("start");

        tokio::time::sleep(Duration::from_secs(200)).await;
        manager.execute(&session_id, "pwd").await.expect("run");

        tokio::time::sleep(Duration::from_secs(165)).await;
        assert!(manager.registry().contains(&session_id).await);

        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(!manager.registry().contains(&session_id).await);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_sweep_and_closes_sessions() {
        let provider = FakeProvider::default();
        let closed = Arc::clone(&provider.closed);
        let manager = manager(provider);
        manager.start().await.expect("start");
        manager.start().await.expect("start");

        manager.shutdown().await;
        assert!(manager.registry().is_empty().await);
        assert_eq!(closed.load(Ordering::SeqCst), 2);

        // A second shutdown finds nothing left to do.
        manager.shutdown().await;
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn managers_do_not_share_sessions() {
        let first = manager(FakeProvider::default());
        let second = manager(FakeProvider::default());
        let session_id = first.start().await.expect("start");

        assert!(matches!(
            second.execute(&session_id, "ls").await,
            Err(SandboxError::SessionNotFound { .. })
        ));
        first.shutdown().await;
        second.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_now_respects_threshold() {
        let manager = manager(FakeProvider::default());
        manager.start().await.expect("start");

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(manager.sweep_now(Duration::from_secs(30)).await, 0);
        assert_eq!(manager.sweep_now(Duration::from_secs(10)).await, 1);
        assert!(manager.registry().is_empty().await);
        manager.shutdown().await;
    }
}
