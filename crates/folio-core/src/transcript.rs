//! The visible terminal transcript.
//!
//! Entries carry structured payloads instead of pre-rendered text so the
//! state machine can be tested without any rendering backend.

use serde::Deserialize;
use serde::Serialize;

use crate::profile::Project;
use crate::tokenizer::tokenize;
use crate::tokenizer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A submitted command line, shown after the prompt.
    Echo,
    /// Result of a command.
    Output,
    /// Notices from the terminal itself (mode changes, session lifecycle).
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpItem {
    pub verb: String,
    pub description: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryContent {
    Text { text: String },
    Tokens { tokens: Vec<Token> },
    Help { items: Vec<HelpItem> },
    Projects { projects: Vec<Project> },
    Contact { email: String, phone: String },
    Link { label: String, url: String },
    Welcome { user: String },
    /// Stand-in for a result that is still in flight.
    Pending { ticket: u64 },
}

impl EntryContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tokens(line: &str) -> Self {
        Self::Tokens {
            tokens: tokenize(line),
        }
    }

    /// Flat text form, used for logging and assertions.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Tokens { tokens } => tokens
                .iter()
                .map(|token| token.value.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Help { items } => items
                .iter()
                .map(|item| format!("{}: {}", item.verb, item.description))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Projects { projects } => projects
                .iter()
                .map(|project| format!("{}: {} ({})", project.name, project.description, project.url))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Contact { email, phone } => format!("Email: {email}\nPhone: {phone}"),
            Self::Link { label, url } => format!("Opening {label}: {url}"),
            Self::Welcome { user } => format!("homegroup@{user}"),
            Self::Pending { .. } => "...".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub content: EntryContent,
}

impl TranscriptEntry {
    pub fn echo(line: &str) -> Self {
        Self {
            kind: EntryKind::Echo,
            content: EntryContent::tokens(line),
        }
    }

    pub fn output(content: EntryContent) -> Self {
        Self {
            kind: EntryKind::Output,
            content,
        }
    }

    pub fn output_text(text: impl Into<String>) -> Self {
        Self::output(EntryContent::text(text))
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::System,
            content: EntryContent::text(text),
        }
    }

    pub fn pending(ticket: u64) -> Self {
        Self::output(EntryContent::Pending { ticket })
    }

    pub fn welcome(user: impl Into<String>) -> Self {
        Self::system_content(EntryContent::Welcome { user: user.into() })
    }

    fn system_content(content: EntryContent) -> Self {
        Self {
            kind: EntryKind::System,
            content,
        }
    }

    pub fn pending_ticket(&self) -> Option<u64> {
        match self.content {
            EntryContent::Pending { ticket } => Some(ticket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn welcome(user: impl Into<String>) -> Self {
        Self {
            entries: vec![TranscriptEntry::welcome(user)],
        }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Swaps the placeholder for `ticket` with `entry` at the same position.
    /// Returns `false` when no such placeholder exists any more.
    pub fn resolve_pending(&mut self, ticket: u64, entry: TranscriptEntry) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.pending_ticket() == Some(ticket))
        {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    /// Rewrites the user shown in welcome banners, e.g. after a profile
    /// arrives.
    pub fn refresh_welcome(&mut self, user: &str) {
        for entry in &mut self.entries {
            if let EntryContent::Welcome { user: shown } = &mut entry.content {
                *shown = user.to_string();
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }
}
