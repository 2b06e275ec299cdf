use crate::common::UserId;

/// One line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    List,
    Open(UserId),
    History(u32),
    Read,
    Notifications,
    Typing,
    Help,
    Quit,
    Send(String),
    Empty,
}

pub const HELP: &str = "\
/list              show conversations
/open <user id>    open a conversation
/history [page]    reload history of the open conversation
/read              mark the open conversation as read
/notifications     show the latest notifications
/typing            tell the open conversation you are typing
/quit              leave
anything else is sent to the open conversation";

pub fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Send(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let argument = parts.next();
    match (name, argument) {
        ("list" | "ls", None) => Ok(Input::List),
        ("open", Some(peer)) => peer
            .parse()
            .map(Input::Open)
            .map_err(|_| format!("`{peer}` is not a user id")),
        ("open", None) => Err("usage: /open <user id>".to_string()),
        ("history", None) => Ok(Input::History(1)),
        ("history", Some(page)) => match page.parse::<u32>() {
            Ok(page) if page > 0 => Ok(Input::History(page)),
            _ => Err(format!("`{page}` is not a page number")),
        },
        ("read", None) => Ok(Input::Read),
        ("notifications" | "n", None) => Ok(Input::Notifications),
        ("typing" | "t", None) => Ok(Input::Typing),
        ("help" | "?", None) => Ok(Input::Help),
        ("quit" | "exit" | "q", None) => Ok(Input::Quit),
        _ => Err(format!("unknown command `/{command}`, try /help")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(parse("  hi there "), Ok(Input::Send("hi there".to_string())));
        assert_eq!(parse("   "), Ok(Input::Empty));
    }

    #[test]
    fn commands_parse_their_arguments() {
        assert_eq!(parse("/open 42"), Ok(Input::Open(UserId(42))));
        assert_eq!(parse("/history"), Ok(Input::History(1)));
        assert_eq!(parse("/history 3"), Ok(Input::History(3)));
        assert_eq!(parse("/quit"), Ok(Input::Quit));
        assert_eq!(parse("/n"), Ok(Input::Notifications));
        assert_eq!(parse("/typing"), Ok(Input::Typing));
        assert!(parse("/typing now").is_err());
    }

    #[test]
    fn bad_commands_are_rejected() {
        assert!(parse("/open bob").is_err());
        assert!(parse("/open").is_err());
        assert!(parse("/history 0").is_err());
        assert!(parse("/dance").is_err());
        assert!(parse("/list extra").is_err());
    }
}
