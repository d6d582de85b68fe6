use std::collections::VecDeque;

use crate::config::Config;
use crate::history::CommandHistory;
use crate::profile::Profile;
use crate::transcript::Transcript;

pub type SessionId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxPhase {
    /// Start requested, no session id yet.
    Starting,
    Ready { session_id: SessionId },
}

/// A sandbox command waiting for the one ahead of it to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub ticket: u64,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxMode {
    pub generation: u64,
    pub phase: SandboxPhase,
    /// The Local transcript, restored on exit.
    pub saved: Transcript,
    /// Ticket of the command the session is evaluating. At most one is
    /// dispatched at a time.
    pub in_flight: Option<u64>,
    pub queued: VecDeque<QueuedCommand>,
}

impl SandboxMode {
    pub fn new(generation: u64, saved: Transcript) -> Self {
        Self {
            generation,
            phase: SandboxPhase::Starting,
            saved,
            in_flight: None,
            queued: VecDeque::new(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match &self.phase {
            SandboxPhase::Ready { session_id } => Some(session_id),
            SandboxPhase::Starting => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TerminalMode {
    #[default]
    Local,
    RemoteSandbox(SandboxMode),
}

impl TerminalMode {
    pub fn is_sandbox(&self) -> bool {
        matches!(self, Self::RemoteSandbox(_))
    }
}

#[derive(Debug, Clone)]
pub struct TerminalState {
    pub mode: TerminalMode,
    pub input: String,
    pub history: CommandHistory,
    pub transcript: Transcript,
    pub profile: Profile,
    pub prompt_host: String,
    pub fallback_phone: String,
    pub next_ticket: u64,
    pub next_generation: u64,
}

impl TerminalState {
    pub fn new(config: &Config) -> Self {
        let profile = Profile::from_identity(&config.identity);
        Self {
            mode: TerminalMode::Local,
            input: String::new(),
            history: CommandHistory::new(config.terminal.history_limit),
            transcript: Transcript::welcome(prompt_user(&profile)),
            prompt_host: config.terminal.prompt_host.clone(),
            fallback_phone: config.identity.phone.clone(),
            profile,
            next_ticket: 1,
            next_generation: 1,
        }
    }

    pub fn prompt_user(&self) -> &str {
        prompt_user(&self.profile)
    }

    pub fn allocate_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    pub fn allocate_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    pub fn sandbox(&self) -> Option<&SandboxMode> {
        match &self.mode {
            TerminalMode::RemoteSandbox(mode) => Some(mode),
            TerminalMode::Local => None,
        }
    }

    /// The Local transcript, wherever it currently lives.
    pub fn local_transcript_mut(&mut self) -> &mut Transcript {
        match &mut self.mode {
            TerminalMode::RemoteSandbox(mode) => &mut mode.saved,
            TerminalMode::Local => &mut self.transcript,
        }
    }
}

/// Name shown after `homegroup@` in the prompt and welcome banner.
pub fn prompt_user(profile: &Profile) -> &str {
    let plain = profile.plain_name.trim();
    if plain.is_empty() {
        "client"
    } else {
        plain
    }
}
