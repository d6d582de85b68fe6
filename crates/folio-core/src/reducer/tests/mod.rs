use chrono::DateTime;
use chrono::FixedOffset;
use chrono::TimeZone;
use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::SANDBOX_EXITED;
pub(super) use super::SANDBOX_NOT_READY;
pub(super) use super::SANDBOX_READY;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::TerminalAction;
pub(super) use crate::actions::TerminalEffect;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::Config;
pub(super) use crate::interpreter::DISABLED_MESSAGE;
pub(super) use crate::interpreter::MOTD_FAILURE;
pub(super) use crate::profile::Profile;
pub(super) use crate::state::SandboxPhase;
pub(super) use crate::state::TerminalMode;
pub(super) use crate::state::TerminalState;
pub(super) use crate::transcript::EntryContent;
pub(super) use crate::transcript::EntryKind;
pub(super) use crate::transcript::TranscriptEntry;

mod ordering;

fn state() -> TerminalState {
    TerminalState::new(&Config::default())
}

fn now() -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(0).and_then(|tz| tz.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single()) {
        Some(at) => at,
        None => panic!("fixed timestamp must be valid"),
    }
}

fn type_line(state: &mut TerminalState, line: &str) {
    for ch in line.chars() {
        reduce(state, TerminalAction::User(UserAction::InputChar(ch)));
    }
}

/// Types `line` and presses Enter.
fn submit(state: &mut TerminalState, line: &str) -> Vec<TerminalEffect> {
    type_line(state, line);
    reduce(state, TerminalAction::User(UserAction::Submit { at: now() }))
}

fn run_user(state: &mut TerminalState, action: UserAction) -> Vec<TerminalEffect> {
    reduce(state, TerminalAction::User(action))
}

fn run_runtime(state: &mut TerminalState, action: RuntimeAction) -> Vec<TerminalEffect> {
    reduce(state, TerminalAction::Runtime(action))
}

fn texts(state: &TerminalState) -> Vec<String> {
    state
        .transcript
        .iter()
        .map(|entry| entry.content.plain_text())
        .collect()
}

fn last_text(state: &TerminalState) -> String {
    state
        .transcript
        .last()
        .map(|entry| entry.content.plain_text())
        .unwrap_or_default()
}

/// Enters sandbox mode and completes the start with `session_id`.
fn ready_sandbox(state: &mut TerminalState, session_id: &str) -> u64 {
    let effects = submit(state, "sandbox");
    let generation = match effects.as_slice() {
        [TerminalEffect::StartSandbox { generation }, TerminalEffect::RequestFrame] => *generation,
        other => panic!("unexpected effects {other:?}"),
    };
    let effects = run_runtime(
        state,
        RuntimeAction::SandboxStarted {
            generation,
            result: Ok(session_id.to_string()),
        },
    );
    assert_eq!(effects, vec![TerminalEffect::RequestFrame]);
    generation
}
