use super::*;
use pretty_assertions::assert_eq;

#[test]
fn out_of_order_completions_keep_submission_order() {
    let mut state = state();
    submit(&mut state, "motd");
    submit(&mut state, "motd");
    submit(&mut state, "whoami");

    run_runtime(
        &mut state,
        RuntimeAction::AdviceResolved {
            ticket: 2,
            result: Ok("second".to_string()),
        },
    );
    run_runtime(
        &mut state,
        RuntimeAction::AdviceResolved {
            ticket: 1,
            result: Ok("first".to_string()),
        },
    );

    assert_eq!(
        texts(&state)[1..].to_vec(),
        vec!["motd", "first", "motd", "second", "whoami", "Octocat"]
    );
}

#[test]
fn every_dispatched_command_resolves_to_one_entry() {
    let mut state = state();
    for line in ["help", "date", "about", "projects", "contact", "linkedin", "blog", "nope"] {
        let before = state.transcript.len();
        submit(&mut state, line);
        assert_eq!(state.transcript.len(), before + 2, "command {line:?}");
    }
}

#[test]
fn sandbox_commands_are_dispatched_one_at_a_time() {
    let mut state = state();
    ready_sandbox(&mut state, "s-1");

    let effects = submit(&mut state, "mkdir d");
    assert_eq!(
        effects,
        vec![
            TerminalEffect::ExecuteSandbox {
                session_id: "s-1".to_string(),
                command: "mkdir d".to_string(),
                ticket: 1,
            },
            TerminalEffect::RequestFrame,
        ]
    );

    // Held back until `mkdir d` completes.
    assert_eq!(submit(&mut state, "ls"), vec![TerminalEffect::RequestFrame]);
    assert_eq!(submit(&mut state, "pwd"), vec![TerminalEffect::RequestFrame]);

    let effects = run_runtime(
        &mut state,
        RuntimeAction::SandboxOutput {
            session_id: "s-1".to_string(),
            ticket: 1,
            result: Err("boom".to_string()),
        },
    );
    assert_eq!(
        effects,
        vec![
            TerminalEffect::ExecuteSandbox {
                session_id: "s-1".to_string(),
                command: "ls".to_string(),
                ticket: 2,
            },
            TerminalEffect::RequestFrame,
        ]
    );

    let effects = run_runtime(
        &mut state,
        RuntimeAction::SandboxOutput {
            session_id: "s-1".to_string(),
            ticket: 2,
            result: Ok("d".to_string()),
        },
    );
    assert!(matches!(
        effects.as_slice(),
        [TerminalEffect::ExecuteSandbox { ticket: 3, command, .. }, TerminalEffect::RequestFrame]
            if command == "pwd"
    ));

    let effects = run_runtime(
        &mut state,
        RuntimeAction::SandboxOutput {
            session_id: "s-1".to_string(),
            ticket: 3,
            result: Ok("/home".to_string()),
        },
    );
    assert_eq!(effects, vec![TerminalEffect::RequestFrame]);
    assert_eq!(state.sandbox().and_then(|mode| mode.in_flight), None);
    assert_eq!(
        texts(&state)[2..].to_vec(),
        vec![SANDBOX_READY, "mkdir d", "Error: boom", "ls", "d", "pwd", "/home"]
    );
}

#[test]
fn queued_sandbox_commands_are_dropped_on_exit() {
    let mut state = state();
    ready_sandbox(&mut state, "s-1");
    submit(&mut state, "sleep 3");
    submit(&mut state, "ls");
    submit(&mut state, "exit");

    let effects = run_runtime(
        &mut state,
        RuntimeAction::SandboxOutput {
            session_id: "s-1".to_string(),
            ticket: 1,
            result: Ok(String::new()),
        },
    );
    assert!(effects.is_empty());

    ready_sandbox(&mut state, "s-2");
    let effects = submit(&mut state, "ls");
    assert!(matches!(
        effects.as_slice(),
        [TerminalEffect::ExecuteSandbox { session_id, .. }, TerminalEffect::RequestFrame]
            if session_id == "s-2"
    ));
}

#[test]
fn advice_requested_before_sandbox_lands_in_saved_transcript() {
    let mut state = state();
    submit(&mut state, "motd");
    ready_sandbox(&mut state, "s-1");

    run_runtime(
        &mut state,
        RuntimeAction::AdviceResolved {
            ticket: 1,
            result: Ok("Stay curious.".to_string()),
        },
    );
    assert!(!texts(&state).contains(&"Stay curious.".to_string()));

    submit(&mut state, "exit");
    assert_eq!(
        texts(&state)[1..].to_vec(),
        vec!["motd", "Stay curious.", SANDBOX_EXITED]
    );
}
