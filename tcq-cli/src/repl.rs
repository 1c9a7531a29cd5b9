//! Interactive command parsing.

use std::str::FromStr;
use tcq_client::ItemRef;
use tcq_core::ValidationError;

pub const HELP: &str = "\
commands:
  <text> | search <text>   run a new search
  next | n                 next page
  prev | p                 previous page
  page <n>                 jump to page n (1-based)
  open <kind>:<id>         show one indicator or group
  back | forward           move through visited views
  history                  list recent searches
  up | down                recall the previous or next search
  help                     show this text
  quit | exit              leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    NextPage,
    PreviousPage,
    GotoPage(u32),
    Open(ItemRef),
    Back,
    Forward,
    History,
    RecallPrevious,
    RecallNext,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ValidationError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word.to_ascii_lowercase().as_str(), rest.is_empty()) {
            ("", _) => return Err(ValidationError::invalid("command", "empty input")),
            ("next" | "n", true) => Command::NextPage,
            ("prev" | "p", true) => Command::PreviousPage,
            ("back", true) => Command::Back,
            ("forward", true) => Command::Forward,
            ("history", true) => Command::History,
            ("up", true) => Command::RecallPrevious,
            ("down", true) => Command::RecallNext,
            ("help" | "?", true) => Command::Help,
            ("quit" | "exit" | "q", true) => Command::Quit,
            ("page", false) => {
                let page: u32 = rest.parse().map_err(|_| {
                    ValidationError::invalid("page", format!("'{}' is not a page number", rest))
                })?;
                let page = page
                    .checked_sub(1)
                    .ok_or_else(|| ValidationError::invalid("page", "pages start at 1"))?;
                Command::GotoPage(page)
            }
            ("open", false) => Command::Open(rest.parse()?),
            ("search", false) => Command::Search(rest.to_string()),
            _ => Command::Search(line.to_string()),
        };
        Ok(command)
    }
}
