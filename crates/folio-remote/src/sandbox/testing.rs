use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::error::SandboxError;
use super::provider::SandboxHandle;
use super::provider::SandboxProvider;

/// In-memory provider: `fail` evaluates to an error, `block` signals
/// `started` and never finishes, anything else echoes.
#[derive(Default)]
pub(crate) struct FakeProvider {
    pub(crate) closed: Arc<AtomicUsize>,
    pub(crate) started: Arc<Notify>,
    pub(crate) fail_close: bool,
    pub(crate) fail_provision: bool,
}

struct FakeHandle {
    closed: Arc<AtomicUsize>,
    started: Arc<Notify>,
    fail_close: bool,
}

#[async_trait]
impl SandboxProvider for FakeProvider {
    async fn provision(&self) -> Result<Box<dyn SandboxHandle>, SandboxError> {
        if self.fail_provision {
            return Err(SandboxError::Provision("quota exceeded".to_string()));
        }
        Ok(Box::new(FakeHandle {
            closed: Arc::clone(&self.closed),
            started: Arc::clone(&self.started),
            fail_close: self.fail_close,
        }))
    }
}

#[async_trait]
impl SandboxHandle for FakeHandle {
    async fn run(&mut self, command: &str) -> Result<String, SandboxError> {
        match command {
            "fail" => Err(SandboxError::Evaluation("ReferenceError: fail".to_string())),
            "block" => {
                self.started.notify_one();
                std::future::pending().await
            }
            other => Ok(format!("ran {other}")),
        }
    }

    async fn close(&mut self) -> Result<(), SandboxError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(SandboxError::Close("already gone".to_string()));
        }
        Ok(())
    }
}
