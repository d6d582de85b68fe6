//! Lexical classification of a raw command line for highlighted display.
//!
//! The tokenizer never fails. Anything the ordered pattern table does not
//! recognise falls back to a `text` token covering the next run of
//! non-whitespace characters, so every non-whitespace character of the input
//! ends up in exactly one token.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Command,
    String,
    Flag,
    Variable,
    Pipe,
    Operator,
    Number,
    Text,
}

impl TokenKind {
    pub const ALL: [TokenKind; 8] = [
        TokenKind::Command,
        TokenKind::String,
        TokenKind::Flag,
        TokenKind::Variable,
        TokenKind::Pipe,
        TokenKind::Operator,
        TokenKind::Number,
        TokenKind::Text,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::String => "string",
            Self::Flag => "flag",
            Self::Variable => "variable",
            Self::Pipe => "pipe",
            Self::Operator => "operator",
            Self::Number => "number",
            Self::Text => "text",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

struct Patterns {
    command: Regex,
    ordered: Vec<(TokenKind, Regex)>,
    text: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn anchored(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("invalid tokenizer pattern {pattern:?}: {err}"),
    }
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        // Word boundaries are ASCII: `é` ends a command or number run.
        command: anchored(r"^(?-u:\b)[a-zA-Z_-]+(?-u:\b)"),
        // Priority order matters: the first pattern that matches wins, even
        // when a later one would consume more input.
        ordered: vec![
            (TokenKind::String, anchored(r#"^"(?:\\.|[^"\\])*""#)),
            (TokenKind::String, anchored(r"^'(?:\\.|[^'\\])*'")),
            (TokenKind::Flag, anchored(r"^--[A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*")),
            (TokenKind::Flag, anchored(r"^-[A-Za-z0-9_]+")),
            (TokenKind::Variable, anchored(r"^\$[A-Za-z0-9_]+")),
            (TokenKind::Pipe, anchored(r"^\|")),
            (TokenKind::Operator, anchored(r"^(?:>|<|&&|\|\|)")),
            (TokenKind::Number, anchored(r"^(?-u:\b)[0-9]+(?-u:\b)")),
        ],
        text: anchored(r"^\S+"),
    })
}

/// Splits `input` into display tokens.
///
/// Only the very first identifier-like run can become a `command` token;
/// quoted strings keep their quotes and escape sequences verbatim.
pub fn tokenize(input: &str) -> Vec<Token> {
    let patterns = patterns();
    let mut tokens = Vec::new();
    let mut rest = input.trim();

    if let Some(found) = patterns.command.find(rest) {
        tokens.push(Token::new(TokenKind::Command, found.as_str()));
        rest = rest[found.end()..].trim();
    }

    while !rest.is_empty() {
        let matched = patterns
            .ordered
            .iter()
            .find_map(|(kind, regex)| regex.find(rest).map(|found| (*kind, found)));

        let (kind, end) = match matched {
            Some((kind, found)) => (kind, found.end()),
            None => match patterns.text.find(rest) {
                Some(found) => (TokenKind::Text, found.end()),
                None => break,
            },
        };

        tokens.push(Token::new(kind, &rest[..end]));
        rest = rest[end..].trim();
    }

    tokens
}
