//! Parsing of chat commands and button payloads.

use crate::session::Handle;

/// Payload prefix of the download buttons.
pub const DOWNLOAD_PAYLOAD_PREFIX: &str = "download|";

/// A recognised slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// `/search <query>`; `None` when no query was given.
    Search(Option<String>),
    /// `/download <url>`; `None` when no argument was given.
    Download(Option<String>),
    Active,
}

impl Command {
    /// Parse a message text. Anything that is not one of the bot's commands
    /// yields `None`.
    ///
    /// Arguments are split on whitespace: a search query is the arguments
    /// joined by single spaces, a download takes the first argument.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        // "/search@my_bot" addresses this bot in group chats
        let name = head.split_once('@').map_or(head, |(name, _)| name);
        let args: Vec<&str> = words.collect();

        match name {
            "start" => Some(Command::Start),
            "search" => Some(Command::Search(
                (!args.is_empty()).then(|| args.join(" ")),
            )),
            "download" => Some(Command::Download(args.first().map(|s| s.to_string()))),
            "active" => Some(Command::Active),
            _ => None,
        }
    }

    /// Metric label for this command.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Search(_) => "search",
            Command::Download(_) => "download",
            Command::Active => "active",
        }
    }
}

/// What a pressed button asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// `download|<n>`.
    Download(Handle),
    /// `download|` followed by something that is not a handle.
    MalformedHandle(String),
    /// Any other payload.
    Unknown,
}

impl ButtonAction {
    pub fn parse(payload: &str) -> Self {
        match payload.strip_prefix(DOWNLOAD_PAYLOAD_PREFIX) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) => ButtonAction::Download(Handle(n)),
                Err(_) => ButtonAction::MalformedHandle(raw.to_string()),
            },
            None => ButtonAction::Unknown,
        }
    }
}

/// Payload carried by the download button of `handle`.
pub fn download_payload(handle: Handle) -> String {
    format!("{}{}", DOWNLOAD_PAYLOAD_PREFIX, handle)
}
