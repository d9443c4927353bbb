//! Routing of prefixed messages to the commands dispatcher.

use std::sync::Arc;

use discorrecd_core::{DispatchResult, Dispatcher, Handler};
use tracing::{debug, trace};

use crate::payload::{Command, Message, Payload};

/// Splits prefixed messages into a command name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parses `message` as a command.
    ///
    /// Returns `None` unless the content starts with the prefix immediately
    /// followed by a name.
    pub fn parse(&self, message: &Message) -> Option<Command> {
        let rest = message.content.strip_prefix(self.prefix.as_str())?;
        if rest.starts_with(char::is_whitespace) {
            return None;
        }

        let mut words = rest.split_whitespace();
        let name = words.next()?.to_string();
        Some(Command {
            name,
            args: words.map(str::to_string).collect(),
            message: message.clone(),
        })
    }
}

/// Emits `payload` as a command if it is a prefixed message.
///
/// Names with no registered channel on `commands` are ignored.
pub async fn route(
    commands: &Dispatcher<Payload>,
    parser: &CommandParser,
    payload: &Payload,
) -> DispatchResult<()> {
    let Payload::Message(message) = payload else {
        return Ok(());
    };
    let Some(command) = parser.parse(message) else {
        return Ok(());
    };

    if !commands.contains(&command.name) {
        debug!(command = %command.name, "Unknown command, ignored");
        return Ok(());
    }

    trace!(command = %command.name, args = ?command.args, "Routing command");
    let name = command.name.clone();
    commands.emit(&name, Payload::Command(command)).await
}

/// Builds the `message` observer that feeds `commands`.
pub fn router(commands: Arc<Dispatcher<Payload>>, parser: CommandParser) -> Handler<Payload> {
    let parser = Arc::new(parser);
    Handler::new(move |payload: Payload| {
        let commands = Arc::clone(&commands);
        let parser = Arc::clone(&parser);
        async move { route(&commands, &parser, &payload).await }
    })
}
