//! Replaces `/name` words in the bot's own messages with an image upload.
//!
//! When a message written by the bot contains a word made of the prefix and
//! the name of an image in the emoticon directory, the message is deleted and
//! re-posted as an upload of that image, with the word removed from the text.

use std::path::PathBuf;

use discorrecd::prelude::*;
use serde::Deserialize;
use tracing::debug;

/// Config section `emoticons`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmoticonsConfig {
    /// Image directory; `<data_dir>/custom-emoticons` when unset.
    pub directory: Option<PathBuf>,
    /// Prefix marking an emoticon word.
    pub prefix: String,
    /// Image extensions tried in order.
    pub extensions: Vec<String>,
}

impl Default for EmoticonsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            prefix: "/".to_string(),
            extensions: ["jpg", "png", "gif"].map(String::from).to_vec(),
        }
    }
}

pub struct CustomEmoticonsModule {
    client: Arc<CoreClient>,
    directory: PathBuf,
    prefix: String,
    extensions: Vec<String>,
}

impl CustomEmoticonsModule {
    async fn on_message(self: Arc<Self>, payload: Payload) -> Result<(), ClientError> {
        let Payload::Message(message) = payload else {
            return Ok(());
        };
        if !message.is_from(&self.client.user()?) {
            return Ok(());
        }
        let Some((word, image)) = self.parse_message(&message.content) else {
            return Ok(());
        };

        debug!(emoticon = word, image = %image.display(), "Posting emoticon");
        let content = message.content.replace(word, "");
        let content = content.trim();

        self.client.delete_message(&message).await?;
        self.client
            .send_file(
                &message.channel,
                &image,
                (!content.is_empty()).then_some(content),
            )
            .await?;
        Ok(())
    }

    /// Returns the first emoticon word of `content` and its image.
    fn parse_message<'a>(&self, content: &'a str) -> Option<(&'a str, PathBuf)> {
        content.split_whitespace().find_map(|word| {
            let name = word.strip_prefix(self.prefix.as_str())?;
            self.find_emoticon(name).map(|image| (word, image))
        })
    }

    fn find_emoticon(&self, name: &str) -> Option<PathBuf> {
        // Names must not escape the directory.
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        self.extensions
            .iter()
            .map(|ext| self.directory.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl Declared<Payload> for CustomEmoticonsModule {
    fn bindings() -> Vec<Binding<Self, Payload>> {
        vec![Binding::event(["message"]).method(Self::on_message)]
    }
}

impl Module for CustomEmoticonsModule {
    const NAME: &'static str = "emoticons";

    fn new(ctx: &ModuleContext) -> Result<Self, BoxError> {
        let config: EmoticonsConfig = ctx.config()?;
        let directory = config
            .directory
            .unwrap_or_else(|| ctx.data_dir().join("custom-emoticons"));
        debug!(directory = %directory.display(), "Emoticon directory");

        Ok(Self {
            client: Arc::clone(ctx.client()),
            directory,
            prefix: config.prefix,
            extensions: config.extensions,
        })
    }
}
