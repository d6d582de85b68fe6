use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use folio_core::reduce;
use folio_core::token_style;
use folio_core::EntryContent;
use folio_core::EntryKind;
use folio_core::RuntimeAction;
use folio_core::StyleClass;
use folio_core::TerminalAction;
use folio_core::TerminalEffect;
use folio_core::TerminalState;
use folio_core::Token;
use folio_core::TranscriptEntry;
use folio_core::UserAction;

use crate::effects::EffectRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    }
}

pub fn run(
    mut state: TerminalState,
    runner: EffectRunner,
    rx: Receiver<RuntimeAction>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut state, &runner, &rx)?;
    Ok(())
}

enum KeyHandlerResult {
    Continue(Vec<TerminalEffect>),
    Exit,
}

fn handle_key_event(key: KeyEvent, state: &mut TerminalState) -> KeyHandlerResult {
    match key_action(key) {
        KeyBinding::Quit => KeyHandlerResult::Exit,
        KeyBinding::Action(action) => {
            KeyHandlerResult::Continue(reduce(state, TerminalAction::User(action)))
        }
        KeyBinding::Ignored => KeyHandlerResult::Continue(Vec::new()),
    }
}

#[derive(Debug)]
enum KeyBinding {
    Quit,
    Action(UserAction),
    Ignored,
}

fn key_action(key: KeyEvent) -> KeyBinding {
    if key.kind == KeyEventKind::Release {
        return KeyBinding::Ignored;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyBinding::Action(UserAction::Interrupt),
            KeyCode::Char('d') => KeyBinding::Quit,
            _ => KeyBinding::Ignored,
        };
    }
    match key.code {
        KeyCode::Enter => KeyBinding::Action(UserAction::Submit {
            at: chrono::Local::now().fixed_offset(),
        }),
        KeyCode::Backspace => KeyBinding::Action(UserAction::InputBackspace),
        KeyCode::Up => KeyBinding::Action(UserAction::HistoryPrevious),
        KeyCode::Down => KeyBinding::Action(UserAction::HistoryNext),
        KeyCode::Char(ch) => KeyBinding::Action(UserAction::InputChar(ch)),
        _ => KeyBinding::Ignored,
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut TerminalState,
    runner: &EffectRunner,
    rx: &Receiver<RuntimeAction>,
) -> io::Result<()> {
    let mut dirty = true;
    loop {
        while let Ok(action) = rx.try_recv() {
            let effects = reduce(state, TerminalAction::Runtime(action));
            dirty |= dispatch(runner, effects);
        }

        if dirty {
            terminal.draw(|f| ui(f, state))?;
            dirty = false;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let effects = match event::read()? {
            Event::Key(key) => match handle_key_event(key, state) {
                KeyHandlerResult::Exit => break,
                KeyHandlerResult::Continue(effects) => effects,
            },
            Event::Paste(text) => reduce(state, TerminalAction::User(UserAction::InputPaste(text))),
            Event::Resize(_, _) => vec![TerminalEffect::RequestFrame],
            _ => Vec::new(),
        };
        dirty |= dispatch(runner, effects);
    }

    // Leaving with a live session would strand it until the idle sweep.
    if let Some(session_id) = state.sandbox().and_then(|mode| mode.session_id()) {
        runner.run(TerminalEffect::StopSandbox {
            session_id: session_id.to_string(),
        });
    }
    Ok(())
}

fn dispatch(runner: &EffectRunner, effects: Vec<TerminalEffect>) -> bool {
    effects
        .into_iter()
        .fold(false, |redraw, effect| runner.run(effect) | redraw)
}

fn ui(f: &mut Frame, state: &TerminalState) {
    let title = format!(" {}@{}: ~ ", state.prompt_host, state.prompt_user());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(title, Style::default().fg(Color::Green)));
    let inner = block.inner(f.area());
    f.render_widget(block, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let lines = transcript_lines(state);
    let scroll = scroll_offset(&lines, chunks[0]);
    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(transcript, chunks[0]);

    let input = input_line(state);
    let cursor_x = chunks[1]
        .x
        .saturating_add(u16::try_from(input.width()).unwrap_or(u16::MAX));
    f.render_widget(Paragraph::new(input), chunks[1]);
    f.set_cursor_position((cursor_x.min(chunks[1].right().saturating_sub(1)), chunks[1].y));
}

/// Prompt plus the tokenized input. The cursor sits after its last cell.
fn input_line(state: &TerminalState) -> Line<'static> {
    let mut spans = prompt_spans(state);
    spans.extend(token_spans(&folio_core::tokenize(&state.input)));
    // Trailing whitespace is dropped by the tokenizer but was typed.
    let trailing = if state.input.trim().is_empty() {
        state.input.as_str()
    } else {
        &state.input[state.input.trim_end().len()..]
    };
    if !trailing.is_empty() {
        spans.push(Span::raw(trailing.to_string()));
    }
    Line::from(spans)
}

/// Rows needed to show the tail of the transcript once lines wrap.
fn scroll_offset(lines: &[Line<'_>], area: Rect) -> u16 {
    let width = usize::from(area.width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows.saturating_sub(usize::from(area.height))).unwrap_or(u16::MAX)
}

fn prompt_spans(state: &TerminalState) -> Vec<Span<'static>> {
    if state.mode.is_sandbox() {
        return vec![Span::styled("$ ", Style::default().fg(Color::Cyan))];
    }
    vec![
        Span::styled(
            format!("{}@{}", state.prompt_host, state.prompt_user()),
            Style::default().fg(Color::Green),
        ),
        Span::raw(":"),
        Span::styled("~", Style::default().fg(Color::Blue)),
        Span::raw("$ "),
    ]
}

fn transcript_lines(state: &TerminalState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in state.transcript.iter() {
        entry_lines(state, entry, &mut lines);
    }
    lines
}

fn entry_lines(state: &TerminalState, entry: &TranscriptEntry, out: &mut Vec<Line<'static>>) {
    if entry.kind == EntryKind::Echo {
        let mut spans = prompt_spans(state);
        if let EntryContent::Tokens { tokens } = &entry.content {
            spans.extend(token_spans(tokens));
        }
        out.push(Line::from(spans));
        return;
    }

    let base = match entry.kind {
        EntryKind::System => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };
    match &entry.content {
        EntryContent::Text { text } => {
            out.extend(text.lines().map(|line| Line::styled(line.to_string(), base)));
        }
        EntryContent::Tokens { tokens } => out.push(Line::from(token_spans(tokens))),
        EntryContent::Help { items } => {
            out.push(Line::from("Available commands:"));
            for item in items {
                let style = if item.disabled {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                out.push(Line::from(vec![
                    Span::styled(format!("  {:<14}", item.verb), style.fg(Color::Cyan)),
                    Span::styled(item.description.clone(), style),
                ]));
            }
        }
        EntryContent::Projects { projects } => {
            for project in projects {
                let mut header = vec![Span::styled(
                    project.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if !project.language.is_empty() {
                    header.push(Span::styled(
                        format!("  [{}]", project.language),
                        Style::default().fg(Color::Magenta),
                    ));
                }
                if project.stars > 0 {
                    header.push(Span::styled(
                        format!("  ★ {}", project.stars),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                out.push(Line::from(header));
                out.push(Line::from(format!("  {}", project.description)));
                out.push(Line::styled(
                    format!("  {}", project.url),
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                ));
            }
        }
        EntryContent::Contact { email, phone } => {
            out.push(Line::from(vec![
                Span::styled("Email: ", Style::default().fg(Color::Cyan)),
                Span::raw(email.clone()),
            ]));
            out.push(Line::from(vec![
                Span::styled("Phone: ", Style::default().fg(Color::Cyan)),
                Span::raw(phone.clone()),
            ]));
        }
        EntryContent::Link { label, url } => {
            out.push(Line::from(vec![
                Span::raw(format!("Opening {label}: ")),
                Span::styled(
                    url.clone(),
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]));
        }
        EntryContent::Welcome { user } => {
            out.push(Line::from(vec![
                Span::raw("Welcome to "),
                Span::styled(
                    format!("{}@{user}", state.prompt_host),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
            ]));
            out.push(Line::styled(
                "Type 'help' to see the available commands.",
                Style::default().fg(Color::DarkGray),
            ));
        }
        EntryContent::Pending { .. } => {
            out.push(Line::styled("...", Style::default().fg(Color::DarkGray)));
        }
    }
}

fn token_spans(tokens: &[Token]) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(tokens.len() * 2);
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            token.value.clone(),
            Style::default().fg(style_color(token_style(token.kind))),
        ));
    }
    spans
}

fn style_color(class: StyleClass) -> Color {
    match class {
        StyleClass::Yellow => Color::Yellow,
        StyleClass::Green => Color::Green,
        StyleClass::Cyan => Color::Cyan,
        StyleClass::Purple => Color::Magenta,
        StyleClass::Orange => Color::Rgb(255, 165, 0),
        StyleClass::Red => Color::Red,
        StyleClass::Blue => Color::Blue,
        StyleClass::Gray => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Config;
    use folio_core::TokenKind;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn state() -> TerminalState {
        TerminalState::new(&Config::default())
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn screen(state: &TerminalState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).expect("terminal");
        terminal.draw(|f| ui(f, state)).expect("draw");
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn ctrl_keys_map_to_interrupt_and_quit() {
        assert!(matches!(
            key_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyBinding::Action(UserAction::Interrupt)
        ));
        assert!(matches!(
            key_action(key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            KeyBinding::Quit
        ));
        assert!(matches!(
            key_action(key(KeyCode::Up, KeyModifiers::NONE)),
            KeyBinding::Action(UserAction::HistoryPrevious)
        ));
        assert!(matches!(
            key_action(key(KeyCode::Tab, KeyModifiers::NONE)),
            KeyBinding::Ignored
        ));
    }

    #[test]
    fn typed_keys_reach_the_input_line() {
        let mut state = state();
        for ch in "date".chars() {
            handle_key_event(key(KeyCode::Char(ch), KeyModifiers::NONE), &mut state);
        }
        handle_key_event(key(KeyCode::Backspace, KeyModifiers::NONE), &mut state);
        assert_eq!(state.input, "dat");
    }

    #[test]
    fn echo_lines_carry_the_prompt_and_token_colours() {
        let state = state();
        let mut lines = Vec::new();
        entry_lines(&state, &TranscriptEntry::echo("echo --loud"), &mut lines);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "homegroup@Octocat:~$ echo --loud");
        let flag = lines[0]
            .spans
            .iter()
            .find(|span| span.content == "--loud")
            .expect("flag span");
        assert_eq!(flag.style.fg, Some(style_color(token_style(TokenKind::Flag))));
    }

    #[test]
    fn screen_shows_welcome_and_prompt() {
        let screen = screen(&state());
        assert!(screen.contains("Welcome to homegroup@Octocat"));
        assert!(screen.contains("homegroup@Octocat:~$"));
    }

    #[test]
    fn cursor_follows_rendered_width() {
        let mut state = state();
        let prompt = input_line(&state).width();

        state.input = "ls ".to_string();
        assert_eq!(input_line(&state).width(), prompt + 3);

        state.input = "echo 日本".to_string();
        assert_eq!(input_line(&state).width(), prompt + "echo ".len() + 4);
    }

    #[test]
    fn cursor_is_clamped_inside_the_input_row() {
        let mut state = state();
        state.input = "x".repeat(200);
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).expect("terminal");
        terminal.draw(|f| ui(f, &state)).expect("draw");
        let cursor = terminal.get_cursor_position().expect("cursor");
        assert_eq!(cursor.x, 28);
    }

    #[test]
    fn scroll_keeps_the_tail_visible() {
        let lines: Vec<Line<'_>> = (0..10).map(|n| Line::from(n.to_string())).collect();
        assert_eq!(scroll_offset(&lines, Rect::new(0, 0, 20, 4)), 6);
        assert_eq!(scroll_offset(&lines, Rect::new(0, 0, 20, 40)), 0);
    }
}
