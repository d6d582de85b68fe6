//! Runs `TerminalEffect`s against the remote collaborators and reports their
//! completion back to the UI thread as `RuntimeAction`s.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use chrono::Utc;
use folio_core::RuntimeAction;
use folio_core::TerminalEffect;
use folio_remote::profile::ProfileService;
use folio_remote::sandbox::ExecuteSandboxRequest;
use folio_remote::sandbox::ExecuteSandboxResponse;
use folio_remote::sandbox::SandboxService;
use folio_remote::sandbox::StartSandboxResponse;
use folio_remote::sandbox::StopSandboxRequest;
use folio_remote::AdviceClient;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::warn;

#[derive(Clone)]
pub struct EffectRunner {
    handle: Handle,
    tx: Sender<RuntimeAction>,
    sandbox: SandboxService,
    advice: AdviceClient,
}

impl EffectRunner {
    pub fn new(
        handle: Handle,
        tx: Sender<RuntimeAction>,
        sandbox: SandboxService,
        advice: AdviceClient,
    ) -> Self {
        Self {
            handle,
            tx,
            sandbox,
            advice,
        }
    }

    /// Dispatches one effect. Returns `true` when the UI should redraw now.
    pub fn run(&self, effect: TerminalEffect) -> bool {
        match effect {
            TerminalEffect::RequestFrame => return true,
            TerminalEffect::OpenUrl(url) => {
                if let Err(err) = webbrowser::open(&url) {
                    warn!(%url, error = %err, "failed to open browser");
                }
            }
            TerminalEffect::FetchAdvice { ticket } => {
                let advice = self.advice.clone();
                let tx = self.tx.clone();
                self.handle.spawn(async move {
                    let result = advice.fetch_advice().await.map_err(|err| err.to_string());
                    let _ = tx.send(RuntimeAction::AdviceResolved { ticket, result });
                });
            }
            TerminalEffect::StartSandbox { generation } => {
                let sandbox = self.sandbox.clone();
                let tx = self.tx.clone();
                self.handle.spawn(async move {
                    let result = match sandbox.start_sandbox_session().await {
                        StartSandboxResponse::Started { session_id } => Ok(session_id),
                        StartSandboxResponse::Failed { error } => Err(error),
                    };
                    let _ = tx.send(RuntimeAction::SandboxStarted { generation, result });
                });
            }
            TerminalEffect::ExecuteSandbox {
                session_id,
                command,
                ticket,
            } => {
                let sandbox = self.sandbox.clone();
                let tx = self.tx.clone();
                self.handle.spawn(async move {
                    let request = ExecuteSandboxRequest::new(session_id.clone(), command);
                    let result = match sandbox.execute_sandbox_command(request).await {
                        ExecuteSandboxResponse::Output { output } => Ok(output),
                        ExecuteSandboxResponse::Failed { error } => Err(error),
                    };
                    let _ = tx.send(RuntimeAction::SandboxOutput {
                        session_id,
                        ticket,
                        result,
                    });
                });
            }
            TerminalEffect::StopSandbox { session_id } => {
                let sandbox = self.sandbox.clone();
                let tx = self.tx.clone();
                self.handle.spawn(async move {
                    let response = sandbox
                        .stop_sandbox_session(StopSandboxRequest::new(session_id.clone()))
                        .await;
                    let _ = tx.send(RuntimeAction::SandboxStopped {
                        session_id,
                        message: response.message,
                    });
                });
            }
        }
        false
    }
}

/// Fetches the owner's profile once in the background.
pub fn spawn_profile_fetch(handle: &Handle, service: Arc<ProfileService>, tx: Sender<RuntimeAction>) {
    handle.spawn(async move {
        let profile = service.fetch_profile(Utc::now()).await;
        debug!(degraded = profile.is_degraded(), "profile fetch finished");
        let _ = tx.send(RuntimeAction::ProfileLoaded(profile));
    });
}
