//! Terminal input parsing.
//!
//! Slash commands control the REPL; anything else is a chat turn.

use std::path::PathBuf;

use crate::intake::Workflow;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain chat text.
    Say(String),
    /// Send a file, optionally with a caption.
    Attach {
        path: PathBuf,
        caption: Option<String>,
    },
    /// Rate the last general answer.
    Feedback { helpful: bool },
    /// Jump into a workflow.
    Start(Workflow),
    /// Drop the current flow and transcript.
    Reset,
    Help,
    Quit,
    /// A slash command that didn't parse.
    Invalid(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/quit" | "/exit" => Command::Quit,
            "/help" | "/?" => Command::Help,
            "/reset" | "/new" => Command::Reset,
            "/good" | "/helpful" => Command::Feedback { helpful: true },
            "/bad" | "/unhelpful" => Command::Feedback { helpful: false },
            _ => parse_attach(trimmed, &lower)
                .or_else(|| parse_start(trimmed, &lower))
                .unwrap_or_else(|| Command::Say(trimmed.to_string())),
        }
    }
}

/// `/attach <path> [caption...]`
fn parse_attach(trimmed: &str, lower: &str) -> Option<Command> {
    if lower != "/attach" && !lower.starts_with("/attach ") {
        return None;
    }
    let rest = trimmed["/attach".len()..].trim();
    let mut parts = rest.splitn(2, char::is_whitespace);
    let Some(path) = parts.next().filter(|p| !p.is_empty()) else {
        return Some(Command::Invalid("Usage: /attach <path> [caption]".into()));
    };
    let caption = parts
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    Some(Command::Attach {
        path: PathBuf::from(path),
        caption,
    })
}

/// `/start <workflow>`
fn parse_start(trimmed: &str, lower: &str) -> Option<Command> {
    if lower != "/start" && !lower.starts_with("/start ") {
        return None;
    }
    let name = trimmed["/start".len()..].trim();
    Some(match name.parse::<Workflow>() {
        Ok(workflow) => Command::Start(workflow),
        Err(_) => Command::Invalid(
            "Usage: /start <loan|insurance|yield|plant_doctor>".into(),
        ),
    })
}

pub const HELP_TEXT: &str = "\
Commands:
  /attach <path> [caption]  send a photo or document
  /start <workflow>         begin loan, insurance, yield or plant_doctor
  /good, /bad               rate the last answer
  /reset                    start a fresh conversation
  /quit                     exit
Type \"cancel\" at any point to abandon a flow.";
