use tracing::debug;
use tracing::info;
use tracing::warn;

use super::actions::RuntimeAction;
use super::actions::TerminalAction;
use super::actions::TerminalEffect;
use super::actions::UserAction;
use super::interpreter::interpret;
use super::interpreter::is_sandbox_request;
use super::interpreter::InterpreterContext;
use super::interpreter::Outcome;
use super::interpreter::MOTD_FAILURE;
use super::state::prompt_user;
use super::state::QueuedCommand;
use super::state::SandboxMode;
use super::state::SandboxPhase;
use super::state::SessionId;
use super::state::TerminalMode;
use super::state::TerminalState;
use super::tokenizer::tokenize;
use super::tokenizer::Token;
use super::tokenizer::TokenKind;
use super::transcript::EntryContent;
use super::transcript::EntryKind;
use super::transcript::Transcript;
use super::transcript::TranscriptEntry;

use chrono::DateTime;
use chrono::FixedOffset;

pub const SANDBOX_STARTING: &str = "Starting sandbox session...";
pub const SANDBOX_READY: &str = "Sandbox Initialized. Type 'exit' or Ctrl+C to quit.";
pub const SANDBOX_NOT_READY: &str = "Sandbox not initialized.";
pub const SANDBOX_EXITED: &str = "Exited sandbox session.";
const EXIT_VERB: &str = "exit";

pub fn reduce(state: &mut TerminalState, action: TerminalAction) -> Vec<TerminalEffect> {
    match action {
        TerminalAction::User(user) => reduce_user(state, user),
        TerminalAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut TerminalState, action: UserAction) -> Vec<TerminalEffect> {
    match action {
        UserAction::InputChar(ch) => {
            state.input.push(ch);
            vec![TerminalEffect::RequestFrame]
        }
        UserAction::InputBackspace => {
            state.input.pop();
            vec![TerminalEffect::RequestFrame]
        }
        UserAction::InputPaste(text) => {
            // The prompt is a single line.
            state
                .input
                .extend(text.chars().map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch }));
            vec![TerminalEffect::RequestFrame]
        }
        UserAction::HistoryPrevious => {
            if let Some(entry) = state.history.recall_previous() {
                state.input = entry.to_string();
            }
            vec![TerminalEffect::RequestFrame]
        }
        UserAction::HistoryNext => {
            if let Some(entry) = state.history.recall_next() {
                state.input = entry.to_string();
            }
            vec![TerminalEffect::RequestFrame]
        }
        UserAction::Interrupt => {
            let line = std::mem::take(&mut state.input);
            if state.mode.is_sandbox() {
                return exit_sandbox(state, None);
            }
            let mut tokens = tokenize(&line);
            tokens.push(Token::new(TokenKind::Text, "^C"));
            state.transcript.push(TranscriptEntry {
                kind: EntryKind::Echo,
                content: EntryContent::Tokens { tokens },
            });
            vec![TerminalEffect::RequestFrame]
        }
        UserAction::Submit { at } => {
            let line = std::mem::take(&mut state.input);
            submit(state, line, at)
        }
    }
}

fn submit(state: &mut TerminalState, line: String, at: DateTime<FixedOffset>) -> Vec<TerminalEffect> {
    if line.trim().is_empty() {
        state.transcript.push(TranscriptEntry::echo(""));
        return vec![TerminalEffect::RequestFrame];
    }

    state.history.record(line.clone());

    if state.mode.is_sandbox() {
        return submit_sandbox(state, line);
    }

    if is_sandbox_request(&line) {
        return enter_sandbox(state, &line);
    }

    state.transcript.push(TranscriptEntry::echo(&line));
    let outcome = interpret(
        &line,
        &InterpreterContext {
            profile: &state.profile,
            fallback_phone: &state.fallback_phone,
            now: at,
        },
    );

    let mut effects = Vec::new();
    match outcome {
        Outcome::Append(content) => state.transcript.push(TranscriptEntry::output(content)),
        Outcome::Clear => {
            state.transcript = Transcript::welcome(prompt_user(&state.profile));
        }
        Outcome::Open { label, url } => {
            state
                .transcript
                .push(TranscriptEntry::output(EntryContent::Link {
                    label,
                    url: url.clone(),
                }));
            effects.push(TerminalEffect::OpenUrl(url));
        }
        Outcome::FetchAdvice => {
            let ticket = state.allocate_ticket();
            state.transcript.push(TranscriptEntry::pending(ticket));
            effects.push(TerminalEffect::FetchAdvice { ticket });
        }
    }
    effects.push(TerminalEffect::RequestFrame);
    effects
}

fn submit_sandbox(state: &mut TerminalState, line: String) -> Vec<TerminalEffect> {
    state.transcript.push(TranscriptEntry::echo(&line));

    if line.trim().eq_ignore_ascii_case(EXIT_VERB) {
        return exit_sandbox(state, None);
    }

    let session_id = match state.sandbox().map(|mode| &mode.phase) {
        Some(SandboxPhase::Ready { session_id }) => session_id.clone(),
        _ => {
            state
                .transcript
                .push(TranscriptEntry::output_text(SANDBOX_NOT_READY));
            return vec![TerminalEffect::RequestFrame];
        }
    };

    let ticket = state.allocate_ticket();
    state.transcript.push(TranscriptEntry::pending(ticket));
    let TerminalMode::RemoteSandbox(mode) = &mut state.mode else {
        return vec![TerminalEffect::RequestFrame];
    };
    if mode.in_flight.is_some() {
        debug!(ticket, queued = mode.queued.len() + 1, "queueing sandbox command");
        mode.queued.push_back(QueuedCommand {
            ticket,
            command: line,
        });
        return vec![TerminalEffect::RequestFrame];
    }
    mode.in_flight = Some(ticket);
    vec![
        TerminalEffect::ExecuteSandbox {
            session_id,
            command: line,
            ticket,
        },
        TerminalEffect::RequestFrame,
    ]
}

fn enter_sandbox(state: &mut TerminalState, line: &str) -> Vec<TerminalEffect> {
    let generation = state.allocate_generation();
    let mut visible = Transcript::default();
    visible.push(TranscriptEntry::echo(line));
    visible.push(TranscriptEntry::system(SANDBOX_STARTING));
    let saved = std::mem::replace(&mut state.transcript, visible);

    state.mode = TerminalMode::RemoteSandbox(SandboxMode::new(generation, saved));
    debug!(generation, "entering sandbox mode");
    vec![
        TerminalEffect::StartSandbox { generation },
        TerminalEffect::RequestFrame,
    ]
}

/// Leaves sandbox mode, restoring the Local transcript. `failure` is the
/// start error when the session never came up.
fn exit_sandbox(state: &mut TerminalState, failure: Option<String>) -> Vec<TerminalEffect> {
    let mode = match std::mem::take(&mut state.mode) {
        TerminalMode::RemoteSandbox(mode) => mode,
        TerminalMode::Local => return vec![TerminalEffect::RequestFrame],
    };

    let mut effects = Vec::new();
    if let SandboxPhase::Ready { session_id } = mode.phase {
        effects.push(TerminalEffect::StopSandbox { session_id });
    }

    state.transcript = mode.saved;
    if let Some(error) = failure {
        state
            .transcript
            .push(TranscriptEntry::system(format!("Error: {error}")));
    }
    state.transcript.push(TranscriptEntry::system(SANDBOX_EXITED));
    debug!(generation = mode.generation, "left sandbox mode");

    effects.push(TerminalEffect::RequestFrame);
    effects
}

fn reduce_runtime(state: &mut TerminalState, action: RuntimeAction) -> Vec<TerminalEffect> {
    match action {
        RuntimeAction::ProfileLoaded(profile) => {
            if profile.is_degraded() {
                warn!(
                    error = profile.error_message.as_deref().unwrap_or("unknown"),
                    "using fallback profile"
                );
            }
            state.profile = profile;
            let user = prompt_user(&state.profile).to_string();
            state.transcript.refresh_welcome(&user);
            if let TerminalMode::RemoteSandbox(mode) = &mut state.mode {
                mode.saved.refresh_welcome(&user);
            }
            vec![TerminalEffect::RequestFrame]
        }
        RuntimeAction::AdviceResolved { ticket, result } => {
            let text = result.unwrap_or_else(|err| {
                warn!(error = %err, "advice request failed");
                MOTD_FAILURE.to_string()
            });
            if !state
                .local_transcript_mut()
                .resolve_pending(ticket, TranscriptEntry::output_text(text))
            {
                debug!(ticket, "discarding advice for a cleared placeholder");
                return Vec::new();
            }
            vec![TerminalEffect::RequestFrame]
        }
        RuntimeAction::SandboxStarted { generation, result } => {
            sandbox_started(state, generation, result)
        }
        RuntimeAction::SandboxOutput {
            session_id,
            ticket,
            result,
        } => sandbox_output(state, session_id, ticket, result),
        RuntimeAction::SandboxStopped {
            session_id,
            message,
        } => {
            debug!(%session_id, %message, "sandbox session stopped");
            Vec::new()
        }
    }
}

fn sandbox_output(
    state: &mut TerminalState,
    session_id: SessionId,
    ticket: u64,
    result: Result<String, String>,
) -> Vec<TerminalEffect> {
    let TerminalMode::RemoteSandbox(mode) = &mut state.mode else {
        debug!(%session_id, ticket, "discarding sandbox output outside sandbox mode");
        return Vec::new();
    };
    if mode.session_id() != Some(session_id.as_str()) {
        debug!(%session_id, ticket, "discarding output from a stale sandbox session");
        return Vec::new();
    }

    let mut effects = Vec::new();
    if mode.in_flight == Some(ticket) {
        mode.in_flight = None;
        if let Some(next) = mode.queued.pop_front() {
            mode.in_flight = Some(next.ticket);
            effects.push(TerminalEffect::ExecuteSandbox {
                session_id,
                command: next.command,
                ticket: next.ticket,
            });
        }
    }

    let text = match result {
        Ok(output) => output,
        Err(err) => format!("Error: {err}"),
    };
    let resolved = state
        .transcript
        .resolve_pending(ticket, TranscriptEntry::output_text(text));
    if !resolved && effects.is_empty() {
        debug!(ticket, "no placeholder for sandbox output");
        return effects;
    }
    effects.push(TerminalEffect::RequestFrame);
    effects
}

fn sandbox_started(
    state: &mut TerminalState,
    generation: u64,
    result: Result<SessionId, String>,
) -> Vec<TerminalEffect> {
    let awaiting = matches!(
        &state.mode,
        TerminalMode::RemoteSandbox(mode)
            if mode.generation == generation && mode.phase == SandboxPhase::Starting
    );

    if !awaiting {
        return match result {
            Ok(session_id) => {
                debug!(%session_id, generation, "releasing session started after exit");
                vec![TerminalEffect::StopSandbox { session_id }]
            }
            Err(_) => Vec::new(),
        };
    }

    match result {
        Ok(session_id) => {
            info!(%session_id, generation, "sandbox session ready");
            if let TerminalMode::RemoteSandbox(mode) = &mut state.mode {
                mode.phase = SandboxPhase::Ready { session_id };
            }
            state.transcript.push(TranscriptEntry::system(SANDBOX_READY));
            vec![TerminalEffect::RequestFrame]
        }
        Err(error) => {
            warn!(%error, generation, "sandbox session failed to start");
            exit_sandbox(state, Some(error))
        }
    }
}

#[cfg(test)]
mod tests;
