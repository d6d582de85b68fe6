//! Sandbox sessions: provisioning, execution, idle eviction, and the
//! request/response boundary the terminal talks to.

mod contracts;
mod error;
mod manager;
mod provider;
mod registry;
mod service;
#[cfg(test)]
mod testing;

pub use contracts::*;
pub use error::SandboxError;
pub use manager::SandboxManager;
pub use manager::SandboxManagerOptions;
pub use manager::StopOutcome;
pub use manager::DEFAULT_IDLE_TIMEOUT;
pub use manager::DEFAULT_SWEEP_INTERVAL;
pub use provider::ProcessSandboxProvider;
pub use provider::SandboxHandle;
pub use provider::SandboxProvider;
pub use registry::SandboxSession;
pub use registry::SessionRegistry;
pub use service::SandboxService;
