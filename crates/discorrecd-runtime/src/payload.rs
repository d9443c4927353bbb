//! Platform data model carried through the dispatchers.
//!
//! Both the events and the commands dispatcher carry [`Payload`], so a module
//! declares all of its bindings over a single argument type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A platform account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A channel messages are posted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextChannel {
    pub id: u64,
    pub name: String,
}

impl TextChannel {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for TextChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub author: User,
    pub channel: TextChannel,
    pub content: String,
}

impl Message {
    /// Returns `true` if `user` wrote this message.
    pub fn is_from(&self, user: &User) -> bool {
        self.author.id == user.id
    }
}

/// A message parsed as a command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name without the prefix.
    pub name: String,
    /// Whitespace-separated arguments after the name.
    pub args: Vec<String>,
    /// The message the command was parsed from.
    pub message: Message,
}

/// Argument of every emission on the events and commands dispatchers.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Login completed; carries the bot's own account.
    Ready(User),
    /// The connection resumed after a drop.
    Resumed,
    /// A message was posted.
    Message(Message),
    /// A message was deleted.
    MessageDelete(Message),
    /// A message was edited.
    MessageEdit { before: Message, after: Message },
    /// A user started typing.
    Typing { channel: TextChannel, user: User },
    /// A prefixed message routed to the commands dispatcher.
    Command(Command),
    /// An emission on `event` failed with `reason`.
    ClientError { event: String, reason: String },
}

impl Payload {
    /// Returns the message this payload is about, if any.
    ///
    /// For edits this is the message after the edit; for commands the
    /// message the command was parsed from.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) | Self::MessageDelete(m) => Some(m),
            Self::MessageEdit { after, .. } => Some(after),
            Self::Command(c) => Some(&c.message),
            _ => None,
        }
    }

    /// Returns the command, if this payload is one.
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> Message {
        Message {
            id: 1,
            author: User::new(7, "bot"),
            channel: TextChannel::new(3, "general"),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_as_message() {
        let before = message("old");
        let after = message("new");
        let edit = Payload::MessageEdit {
            before,
            after: after.clone(),
        };
        assert_eq!(edit.as_message(), Some(&after));
        assert_eq!(Payload::Resumed.as_message(), None);
    }

    #[test]
    fn test_as_command() {
        let command = Command {
            name: "ping".into(),
            args: vec![],
            message: message(".ping"),
        };
        let payload = Payload::Command(command.clone());
        assert_eq!(payload.as_command(), Some(&command));
        assert_eq!(payload.as_message().map(|m| m.content.as_str()), Some(".ping"));
        assert!(Payload::Message(message("hi")).as_command().is_none());
    }

    #[test]
    fn test_is_from() {
        let msg = message("hi");
        assert!(msg.is_from(&User::new(7, "renamed")));
        assert!(!msg.is_from(&User::new(8, "bot")));
    }
}
