//! Emoticon Bot
//!
//! Runs the test and custom emoticons modules against a console connection:
//! every line typed on stdin is posted as a message from the bot account, and
//! every outbound action is printed. Close stdin to stop.
//!
//! # Usage
//!
//! ```bash
//! mkdir -p data/custom-emoticons && cp shrug.png data/custom-emoticons/
//! cargo run --package emoticon-bot -- --config-dir demos/emoticon_bot/config
//! ```

mod console;
mod emoticons;
mod test_module;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use discorrecd::config::DEFAULT_CONFIG_DIR;
use discorrecd::prelude::*;
use tracing::info;

use crate::emoticons::CustomEmoticonsModule;
use crate::test_module::TestModule;

#[derive(Debug, Parser)]
#[command(version, about = "Console demo bot for the Discorrecd framework")]
struct Args {
    /// Directory holding the configuration files; `<user config dir>/discorrecd`
    /// is searched after it.
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Configuration file inside the config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Token to log in with; overrides the configured one.
    #[arg(long)]
    token: Option<String>,

    /// Name of the bot account.
    #[arg(long, default_value = "discorrecd")]
    user: String,

    /// Channel console lines are posted in.
    #[arg(long, default_value = "console")]
    channel: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new()
        .config_dir(&args.config_dir)
        .with_user_config_dir();
    if let Some(file) = &args.config {
        loader = loader.file(file);
    }
    if let Some(token) = &args.token {
        loader = loader.set("token", token);
    }

    let mut bot = Discorrecd::initialize(loader)?;
    bot.add::<TestModule>()?;
    bot.add::<CustomEmoticonsModule>()?;

    let (connector, handle) = LoopbackConnector::new(User::new(1, args.user));
    let printer = console::print_actions(connector.gateway().subscribe());
    console::read_lines(handle, TextChannel::new(1, args.channel));

    info!("Type messages, close stdin to stop");
    bot.start(&connector).await?;

    // The printer ends once the last gateway handle is gone.
    drop(connector);
    printer.await?;
    Ok(())
}
