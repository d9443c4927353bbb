//! Console front end over the loopback connection.

use discorrecd::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Posts every stdin line as a message from the bot account in `channel`.
///
/// The connection ends when stdin is closed.
pub fn read_lines(handle: LoopbackHandle, channel: TextChannel) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    handle.say(&channel, handle.user(), &line);
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    })
}

/// Prints outbound actions until the gateway is dropped.
pub fn print_actions(mut actions: broadcast::Receiver<Action>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match actions.recv().await {
                Ok(action) => println!("{}", describe(&action)),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Dropped outbound actions"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn describe(action: &Action) -> String {
    match action {
        Action::SendMessage { channel, content } => format!("[#{channel}] {content}"),
        Action::DeleteMessage { message } => {
            format!("[#{}] (deleted) {}", message.channel, message.content)
        }
        Action::SendFile {
            channel,
            path,
            content,
        } => format!(
            "[#{channel}] <{}> {}",
            path.display(),
            content.as_deref().unwrap_or_default()
        ),
    }
}
