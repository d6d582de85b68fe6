//! The fixed command table used in Local mode.

use chrono::DateTime;
use chrono::FixedOffset;

use crate::profile::Profile;
use crate::transcript::EntryContent;
use crate::transcript::HelpItem;

pub const DISABLED_MESSAGE: &str = "This command is currently disabled.";
pub const MOTD_FAILURE: &str = "Failed to fetch message of the day.";
pub const SANDBOX_VERB: &str = "sandbox";
const DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S %z";

pub struct InterpreterContext<'a> {
    pub profile: &'a Profile,
    /// Shown by `contact` when the profile carries no phone number.
    pub fallback_phone: &'a str,
    pub now: DateTime<FixedOffset>,
}

/// What a command line asks the terminal to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Append(EntryContent),
    Clear,
    Open { label: String, url: String },
    FetchAdvice,
}

/// Splits a line into its verb and the verbatim remainder after the first
/// separator.
pub fn split_verb(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest),
        None => (line, ""),
    }
}

pub fn is_sandbox_request(line: &str) -> bool {
    split_verb(line).0 == SANDBOX_VERB
}

pub fn interpret(line: &str, ctx: &InterpreterContext<'_>) -> Outcome {
    let (verb, rest) = split_verb(line);
    let profile = ctx.profile;

    match verb {
        "echo" => Outcome::Append(EntryContent::tokens(rest)),
        "clear" => Outcome::Clear,
        "help" => Outcome::Append(EntryContent::Help {
            items: help_items(profile.display_name()),
        }),
        "date" => Outcome::Append(EntryContent::text(ctx.now.format(DATE_FORMAT).to_string())),
        "whoami" => Outcome::Append(EntryContent::text(profile.display_name())),
        "motd" => Outcome::FetchAdvice,
        "about" => Outcome::Append(EntryContent::text(profile.about.clone())),
        "projects" => Outcome::Append(EntryContent::Projects {
            projects: profile.projects.clone(),
        }),
        "contact" => Outcome::Append(EntryContent::Contact {
            email: profile.email.clone(),
            phone: contact_phone(profile, ctx.fallback_phone),
        }),
        "github" => Outcome::Open {
            label: "GitHub".to_string(),
            url: profile.github.clone(),
        },
        "linkedin" => Outcome::Open {
            label: "LinkedIn".to_string(),
            url: profile.linkedin.clone(),
        },
        "blog" | "resume" => Outcome::Append(EntryContent::text(DISABLED_MESSAGE)),
        other => Outcome::Append(EntryContent::text(format!("command not found: {other}"))),
    }
}

fn contact_phone(profile: &Profile, fallback: &str) -> String {
    [profile.phone.trim(), fallback.trim()]
        .into_iter()
        .find(|phone| !phone.is_empty())
        .unwrap_or("not listed")
        .to_string()
}

pub fn help_items(owner: &str) -> Vec<HelpItem> {
    let item = |verb: &str, description: String, disabled: bool| HelpItem {
        verb: verb.to_string(),
        description,
        disabled,
    };
    vec![
        item("help", "Show this help message".to_string(), false),
        item("echo [text]", "Print text to the console".to_string(), false),
        item("clear", "Clear the terminal".to_string(), false),
        item("date", "Show the current date".to_string(), false),
        item("whoami", "Show the current user".to_string(), false),
        item("motd", "Show the message of the day".to_string(), false),
        item("about", format!("Learn more about {owner}"), false),
        item("projects", format!("View {owner}'s projects"), false),
        item("contact", format!("Get in touch with {owner}"), false),
        item("github", format!("Open {owner}'s GitHub profile"), false),
        item("linkedin", format!("Open {owner}'s LinkedIn profile"), false),
        item("blog", format!("Read {owner}'s blog posts"), true),
        item("resume", format!("View {owner}'s resume"), true),
        item(SANDBOX_VERB, "Start a remote sandbox session".to_string(), false),
    ]
}
