//! Echoes the bot's own messages to the log and answers `.testme`.

use discorrecd::prelude::*;
use tracing::info;

const TRIGGER: &str = ".testme";
const REPLY: &str = "Test: success!";

pub struct TestModule {
    client: Arc<CoreClient>,
}

impl TestModule {
    async fn on_message(self: Arc<Self>, payload: Payload) -> Result<(), ClientError> {
        let Payload::Message(message) = payload else {
            return Ok(());
        };
        if !message.is_from(&self.client.user()?) {
            return Ok(());
        }

        info!("Me @ {} : {}", message.channel, message.content);
        if message.content == TRIGGER {
            self.client.send_message(&message.channel, REPLY).await?;
        }
        Ok(())
    }
}

impl Declared<Payload> for TestModule {
    fn bindings() -> Vec<Binding<Self, Payload>> {
        vec![Binding::event(["message"]).method(Self::on_message)]
    }
}

impl Module for TestModule {
    const NAME: &'static str = "test";

    fn new(ctx: &ModuleContext) -> Result<Self, BoxError> {
        Ok(Self {
            client: Arc::clone(ctx.client()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> Core {
        let config = DiscorrecdConfig {
            token: Some("test".into()),
            ..Default::default()
        };
        let mut core = Core::new(config);
        core.add::<TestModule>().unwrap();
        core
    }

    #[tokio::test]
    async fn test_replies_to_own_trigger() {
        let core = core();
        let (connector, handle) = LoopbackConnector::new(User::new(1, "bot"));
        let general = TextChannel::new(9, "general");
        handle.say(&general, handle.user(), TRIGGER);
        handle.say(&general, handle.user(), "just chatting");
        drop(handle);

        core.start(&connector).await.unwrap();

        assert_eq!(
            connector.gateway().actions(),
            vec![Action::SendMessage {
                channel: general,
                content: REPLY.into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_ignores_other_authors() {
        let core = core();
        let (connector, handle) = LoopbackConnector::new(User::new(1, "bot"));
        handle.say(&TextChannel::new(9, "general"), &User::new(2, "alice"), TRIGGER);
        drop(handle);

        core.start(&connector).await.unwrap();

        assert!(connector.gateway().actions().is_empty());
    }
}
