use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::SandboxError;
use super::provider::SandboxHandle;

/// One provisioned sandbox. The handle lock serialises executions; closing
/// cancels whichever execution holds or awaits it.
pub struct SandboxSession {
    id: String,
    handle: Mutex<Box<dyn SandboxHandle>>,
    stopping: CancellationToken,
}

impl SandboxSession {
    pub fn new(id: impl Into<String>, handle: Box<dyn SandboxHandle>) -> Self {
        Self {
            id: id.into(),
            handle: Mutex::new(handle),
            stopping: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn run(&self, command: &str) -> Result<String, SandboxError> {
        let mut handle = tokio::select! {
            biased;
            _ = self.stopping.cancelled() => return Err(SandboxError::Stopped),
            handle = self.handle.lock() => handle,
        };
        tokio::select! {
            biased;
            _ = self.stopping.cancelled() => Err(SandboxError::Stopped),
            result = handle.run(command) => result,
        }
    }

    pub async fn close(&self) -> Result<(), SandboxError> {
        self.stopping.cancel();
        self.handle.lock().await.close().await
    }
}

impl std::fmt::Debug for SandboxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxSession").field("id", &self.id).finish()
    }
}

struct Entry {
    session: Arc<SandboxSession>,
    last_used: Instant,
}

/// Live sandbox sessions keyed by session id.
///
/// Owned explicitly and shared through `Arc`, so independent managers (and
/// tests) never see each other's sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Arc<SandboxSession>, now: Instant) {
        let id = session.id().to_string();
        self.sessions.lock().await.insert(
            id,
            Entry {
                session,
                last_used: now,
            },
        );
    }

    /// Looks up a session and marks it used at `now`.
    pub async fn touch(&self, session_id: &str, now: Instant) -> Option<Arc<SandboxSession>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(session_id)?;
        entry.last_used = now;
        Some(Arc::clone(&entry.session))
    }

    pub async fn remove(&self, session_id: &str) -> Option<Arc<SandboxSession>> {
        self.sessions
            .lock()
            .await
            .remove(session_id)
            .map(|entry| entry.session)
    }

    /// Removes and returns every session idle for longer than `idle`.
    pub async fn take_idle(&self, now: Instant, idle: Duration) -> Vec<Arc<SandboxSession>> {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_used) > idle)
            .map(|(id, _)| id.clone())
            .collect();
        expired
            .iter()
            .filter_map(|id| sessions.remove(id))
            .map(|entry| entry.session)
            .collect()
    }

    pub async fn drain(&self) -> Vec<Arc<SandboxSession>> {
        self.sessions
            .lock()
            .await
            .drain()
            .map(|(_, entry)| entry.session)
            .collect()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
