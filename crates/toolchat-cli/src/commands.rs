// REPL input parsing

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text: ask the assistant
    Send(String),
    New,
    /// List conversations, optionally filtered by title
    List(Option<String>),
    Open(String),
    Rename { id: String, title: String },
    Delete(String),
    Clear,
    Reset,
    Profile(ProfileCommand),
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileCommand {
    Show,
    Set(Value),
    Delete,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Profile must be a JSON object: {0}")]
    InvalidProfile(String),
}

pub const HELP: &str = "\
Type a question to ask for tool recommendations.

  /new                   start a new conversation
  /list [term]           list conversations, optionally filtered by title
  /open <id>             open a past conversation
  /rename <id> <title>   rename a conversation
  /delete <id>           delete a conversation
  /clear                 delete every conversation
  /reset                 make the assistant forget this conversation
  /profile               show your profile
  /profile <json>        replace your profile with a JSON object
  /profile delete        delete your profile
  /help                  show this help
  /quit                  exit

Ctrl-C stops a reply in progress.";

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "new" => Ok(Command::New),
        "list" => Ok(Command::List((!args.is_empty()).then(|| args.to_string()))),
        "open" => required(args, "/open <id>").map(Command::Open),
        "rename" => {
            let (id, title) = args
                .split_once(char::is_whitespace)
                .map(|(id, title)| (id, title.trim()))
                .filter(|(_, title)| !title.is_empty())
                .ok_or(CommandError::Usage("/rename <id> <title>"))?;
            Ok(Command::Rename {
                id: id.to_string(),
                title: title.to_string(),
            })
        }
        "delete" => required(args, "/delete <id>").map(Command::Delete),
        "clear" => Ok(Command::Clear),
        "reset" => Ok(Command::Reset),
        "profile" => parse_profile(args).map(Command::Profile),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn required(args: &str, usage: &'static str) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(args.to_string())
    }
}

fn parse_profile(args: &str) -> Result<ProfileCommand, CommandError> {
    match args {
        "" => Ok(ProfileCommand::Show),
        "delete" => Ok(ProfileCommand::Delete),
        json => {
            let value: Value = serde_json::from_str(json)
                .map_err(|err| CommandError::InvalidProfile(err.to_string()))?;
            if !value.is_object() {
                return Err(CommandError::InvalidProfile("not an object".to_string()));
            }
            Ok(ProfileCommand::Set(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_is_a_query() {
        assert_eq!(
            parse("  best app for notes? ").unwrap(),
            Command::Send("best app for notes?".to_string())
        );
        assert_eq!(parse("   ").unwrap(), Command::Empty);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse("/list").unwrap(), Command::List(None));
        assert_eq!(
            parse("/list math ").unwrap(),
            Command::List(Some("math".to_string()))
        );
        assert_eq!(parse("/open abc").unwrap(), Command::Open("abc".to_string()));
        assert_eq!(
            parse("/rename abc  Study plan for June").unwrap(),
            Command::Rename {
                id: "abc".to_string(),
                title: "Study plan for June".to_string()
            }
        );
    }

    #[test]
    fn test_missing_arguments() {
        assert!(matches!(parse("/open"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("/rename abc"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("/delete "), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_profile_variants() {
        assert_eq!(parse("/profile").unwrap(), Command::Profile(ProfileCommand::Show));
        assert_eq!(
            parse("/profile delete").unwrap(),
            Command::Profile(ProfileCommand::Delete)
        );
        assert_eq!(
            parse(r#"/profile {"level": "beginner"}"#).unwrap(),
            Command::Profile(ProfileCommand::Set(json!({"level": "beginner"})))
        );
        assert!(matches!(
            parse("/profile [1, 2]"),
            Err(CommandError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("/dance").unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: /dance (try /help)");
    }
}
