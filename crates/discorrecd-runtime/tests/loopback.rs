//! End-to-end runs of a core over the loopback connection.

use discorrecd_runtime::client::{CLIENT_ERROR, READY, TYPING};
use discorrecd_runtime::prelude::*;
use parking_lot::Mutex;

struct Greeter {
    client: Arc<CoreClient>,
    log: Mutex<Vec<String>>,
}

impl Greeter {
    async fn on_ready(self: Arc<Self>, payload: Payload) {
        if let Payload::Ready(user) = payload {
            self.log.lock().push(format!("ready:{}", user.name));
        }
    }

    async fn on_hello(self: Arc<Self>, payload: Payload) -> Result<(), ClientError> {
        let Some(cmd) = payload.as_command() else {
            return Ok(());
        };
        let reply = format!("hello {}", cmd.message.author.name);
        self.client.send_message(&cmd.message.channel, &reply).await?;
        Ok(())
    }

    async fn on_typing(self: Arc<Self>, _: Payload) -> Result<(), BoxError> {
        Err("typing handler exploded".into())
    }

    async fn on_client_error(self: Arc<Self>, payload: Payload) {
        if let Payload::ClientError { event, .. } = payload {
            self.log.lock().push(format!("error:{event}"));
        }
    }
}

impl Declared<Payload> for Greeter {
    fn bindings() -> Vec<Binding<Self, Payload>> {
        vec![
            Binding::event([READY]).limit(1).method(Self::on_ready),
            Binding::event([TYPING]).method(Self::on_typing),
            Binding::event([CLIENT_ERROR]).method(Self::on_client_error),
            Binding::command(["hello"]).method(Self::on_hello),
        ]
    }
}

impl Module for Greeter {
    const NAME: &'static str = "greeter";

    fn new(ctx: &ModuleContext) -> Result<Self, BoxError> {
        Ok(Self {
            client: Arc::clone(ctx.client()),
            log: Mutex::new(Vec::new()),
        })
    }
}

fn bot() -> User {
    User::new(1, "bot")
}

fn core_with_token() -> Core {
    let config = ConfigLoader::new()
        .config_dir(std::env::temp_dir().join("discorrecd-no-config"))
        .without_env()
        .set("token", "secret")
        .load()
        .unwrap();
    Core::new(config)
}

#[tokio::test]
async fn test_command_round_trip() {
    let mut core = core_with_token();
    let greeter = core.add::<Greeter>().unwrap();
    let (connector, handle) = LoopbackConnector::new(bot());

    let general = TextChannel::new(10, "general");
    let alice = User::new(2, "alice");
    handle.say(&general, &alice, ".hello");
    handle.say(&general, &alice, ".unknown");
    handle.say(&general, &alice, "hello");
    drop(handle);

    core.start(&connector).await.unwrap();

    assert_eq!(
        connector.gateway().actions(),
        vec![Action::SendMessage {
            channel: general,
            content: "hello alice".into(),
        }]
    );
    assert_eq!(*greeter.log.lock(), vec!["ready:bot"]);
    assert!(!core.client().is_connected());
}

#[tokio::test]
async fn test_handler_failure_does_not_stop_the_loop() {
    let mut core = core_with_token();
    let greeter = core.add::<Greeter>().unwrap();
    let (connector, handle) = LoopbackConnector::new(bot());

    let general = TextChannel::new(10, "general");
    handle.push(PlatformEvent::TypingStart {
        channel: general.clone(),
        user: User::new(2, "alice"),
    });
    handle.say(&general, &User::new(2, "alice"), ".hello");
    drop(handle);

    core.start(&connector).await.unwrap();

    assert_eq!(*greeter.log.lock(), vec!["ready:bot", "error:typing"]);
    assert_eq!(connector.gateway().actions().len(), 1);
}

#[tokio::test]
async fn test_connection_failure_ends_start() {
    let core = core_with_token();
    let (connector, handle) = LoopbackConnector::new(bot());
    handle.fail(ClientError::ConnectionClosed {
        reason: "gateway went away".into(),
    });

    let err = core.start(&connector).await.unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Client(ClientError::ConnectionClosed { .. })
    ));
}

#[tokio::test]
async fn test_ready_budget_is_spent_once() {
    let mut core = core_with_token();
    let greeter = core.add::<Greeter>().unwrap();
    let (connector, handle) = LoopbackConnector::new(bot());
    handle.push(PlatformEvent::Ready { user: bot() });
    drop(handle);

    core.start(&connector).await.unwrap();

    assert_eq!(*greeter.log.lock(), vec!["ready:bot"]);
}
