use chrono::DateTime;
use chrono::FixedOffset;

use super::profile::Profile;
use super::state::SessionId;

#[derive(Debug, Clone)]
pub enum TerminalAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    InputChar(char),
    InputBackspace,
    InputPaste(String),
    /// Enter. `at` is the wall-clock time of the key press.
    Submit { at: DateTime<FixedOffset> },
    HistoryPrevious,
    HistoryNext,
    /// Ctrl-C.
    Interrupt,
}

/// Completions of background work started by a `TerminalEffect`.
#[derive(Debug, Clone)]
pub enum RuntimeAction {
    ProfileLoaded(Profile),
    AdviceResolved {
        ticket: u64,
        result: Result<String, String>,
    },
    SandboxStarted {
        generation: u64,
        result: Result<SessionId, String>,
    },
    SandboxOutput {
        session_id: SessionId,
        ticket: u64,
        result: Result<String, String>,
    },
    SandboxStopped {
        session_id: SessionId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEffect {
    RequestFrame,
    FetchAdvice { ticket: u64 },
    OpenUrl(String),
    StartSandbox { generation: u64 },
    ExecuteSandbox {
        session_id: SessionId,
        command: String,
        ticket: u64,
    },
    StopSandbox { session_id: SessionId },
}
