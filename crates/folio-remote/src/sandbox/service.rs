use std::sync::Arc;

use tracing::warn;

use super::contracts::ExecuteSandboxRequest;
use super::contracts::ExecuteSandboxResponse;
use super::contracts::StartSandboxResponse;
use super::contracts::StopSandboxRequest;
use super::contracts::StopSandboxResponse;
use super::manager::SandboxManager;

/// Request/response face of [`SandboxManager`]. Every call resolves to a
/// value; failures come back as `error` fields.
#[derive(Clone)]
pub struct SandboxService {
    manager: Arc<SandboxManager>,
}

impl SandboxService {
    pub fn new(manager: Arc<SandboxManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<SandboxManager> {
        &self.manager
    }

    pub async fn start_sandbox_session(&self) -> StartSandboxResponse {
        match self.manager.start().await {
            Ok(session_id) => StartSandboxResponse::Started { session_id },
            Err(err) => {
                warn!(error = %err, "sandbox start failed");
                StartSandboxResponse::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    pub async fn execute_sandbox_command(
        &self,
        request: ExecuteSandboxRequest,
    ) -> ExecuteSandboxResponse {
        let session_id = non_empty(request.session_id);
        let command = non_empty(request.command);
        let (session_id, command) = match (session_id, command) {
            (Some(session_id), Some(command)) => (session_id, command),
            (None, None) => return failed("sessionId and command are required"),
            (None, Some(_)) => return failed("sessionId is required"),
            (Some(_), None) => return failed("command is required"),
        };

        match self.manager.execute(&session_id, &command).await {
            Ok(output) => ExecuteSandboxResponse::Output { output },
            Err(err) => ExecuteSandboxResponse::Failed {
                error: err.to_string(),
            },
        }
    }

    pub async fn stop_sandbox_session(&self, request: StopSandboxRequest) -> StopSandboxResponse {
        let message = match non_empty(request.session_id) {
            Some(session_id) => self.manager.stop(&session_id).await.message().to_string(),
            None => "No sandbox session to stop.".to_string(),
        };
        StopSandboxResponse { message }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn failed(error: &str) -> ExecuteSandboxResponse {
    ExecuteSandboxResponse::Failed {
        error: error.to_string(),
    }
}
