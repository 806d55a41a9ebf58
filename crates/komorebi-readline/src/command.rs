//! REPL command parsing.

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &[
    "/reset", "/end", "/insight", "/archive", "/gallery", "/status", "/scene", "/video",
    "/pro", "/user", "/help",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChoice {
    Guest,
    Anonymous,
    SignIn(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveAction {
    List,
    Show(usize),
    Delete(usize),
    Insight(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryAction {
    List,
    Pin(usize),
    Delete(usize),
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Reset,
    End,
    Insight,
    Archive(ArchiveAction),
    Gallery(GalleryAction),
    Status,
    Scene(Option<String>),
    Video(bool),
    Pro(bool),
    User(UserChoice),
    Help,
    Quit,
}

impl Command {
    /// Parses a trimmed, non-empty line. Errors carry a usage hint.
    pub fn parse(line: &str) -> Result<Self, String> {
        if line == "quit" || line == "exit" {
            return Ok(Self::Quit);
        }
        if !line.starts_with('/') {
            return Ok(Self::Say(line.to_string()));
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("/reset", []) => Ok(Self::Reset),
            ("/end", []) => Ok(Self::End),
            ("/insight", []) => Ok(Self::Insight),
            ("/status", []) => Ok(Self::Status),
            ("/help", []) => Ok(Self::Help),
            ("/archive", []) => Ok(Self::Archive(ArchiveAction::List)),
            ("/archive", ["show", n]) => Ok(Self::Archive(ArchiveAction::Show(index(n)?))),
            ("/archive", ["delete", n]) => Ok(Self::Archive(ArchiveAction::Delete(index(n)?))),
            ("/archive", ["insight", n]) => Ok(Self::Archive(ArchiveAction::Insight(index(n)?))),
            ("/archive", _) => Err("usage: /archive [show|delete|insight <n>]".to_string()),
            ("/gallery", []) => Ok(Self::Gallery(GalleryAction::List)),
            ("/gallery", ["pin", n]) => Ok(Self::Gallery(GalleryAction::Pin(index(n)?))),
            ("/gallery", ["delete", n]) => Ok(Self::Gallery(GalleryAction::Delete(index(n)?))),
            ("/gallery", _) => Err("usage: /gallery [pin|delete <n>]".to_string()),
            ("/scene", []) => Ok(Self::Scene(None)),
            ("/scene", [scene]) => Ok(Self::Scene(Some(scene.to_string()))),
            ("/scene", _) => Err("usage: /scene [name]".to_string()),
            ("/video", [flag]) => Ok(Self::Video(on_off(flag, "/video")?)),
            ("/video", _) => Err("usage: /video on|off".to_string()),
            ("/pro", [flag]) => Ok(Self::Pro(on_off(flag, "/pro")?)),
            ("/pro", _) => Err("usage: /pro on|off".to_string()),
            ("/user", ["guest"]) => Ok(Self::User(UserChoice::Guest)),
            ("/user", ["anonymous"]) => Ok(Self::User(UserChoice::Anonymous)),
            ("/user", ["signin"]) => Ok(Self::User(UserChoice::SignIn(None))),
            ("/user", ["signin", name @ ..]) => {
                Ok(Self::User(UserChoice::SignIn(Some(name.join(" ")))))
            }
            ("/user", _) => Err("usage: /user guest|anonymous|signin [name]".to_string()),
            (other, _) => Err(format!("Unknown command {other}. Type /help for a list.")),
        }
    }
}

/// 1-based index as shown in listings.
fn index(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("'{arg}' is not a list number")),
    }
}

fn on_off(arg: &str, command: &str) -> Result<bool, String> {
    match arg {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(format!("usage: {command} on|off")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            Command::parse("I slept well"),
            Ok(Command::Say("I slept well".to_string()))
        );
    }

    #[test]
    fn test_quit_aliases() {
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_list_numbers_are_one_based() {
        assert_eq!(
            Command::parse("/archive show 1"),
            Ok(Command::Archive(ArchiveAction::Show(0)))
        );
        assert_eq!(
            Command::parse("/gallery pin 3"),
            Ok(Command::Gallery(GalleryAction::Pin(2)))
        );
        assert!(Command::parse("/archive show 0").is_err());
        assert!(Command::parse("/gallery delete x").is_err());
    }

    #[test]
    fn test_toggles() {
        assert_eq!(Command::parse("/pro on"), Ok(Command::Pro(true)));
        assert_eq!(Command::parse("/video off"), Ok(Command::Video(false)));
        assert!(Command::parse("/pro maybe").is_err());
        assert!(Command::parse("/pro").is_err());
    }

    #[test]
    fn test_user_choice() {
        assert_eq!(
            Command::parse("/user signin Aiko Tanaka"),
            Ok(Command::User(UserChoice::SignIn(Some("Aiko Tanaka".to_string()))))
        );
        assert_eq!(Command::parse("/user guest"), Ok(Command::User(UserChoice::Guest)));
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::parse("/meditate").unwrap_err();
        assert!(err.contains("/meditate"));
    }
}
