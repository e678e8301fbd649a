//! Scripted handlers shared by the framework's unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hookrelay_core::{
    BoxError, BoxedHandler, CancellationToken, EventType, KnownTypes, PluginLoadContext, Status,
    WebhookEvent, WebhookHandler,
};

/// Registers for every known type and reports success.
pub struct Succeeds;

impl Succeeds {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(Succeeds))
    }
}

#[async_trait]
impl WebhookHandler for Succeeds {
    fn register(&self, known: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(known.iter().cloned().collect())
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::Success)
    }
}

/// Registers for `application` only.
pub struct AppsOnly;

impl AppsOnly {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(AppsOnly))
    }
}

#[async_trait]
impl WebhookHandler for AppsOnly {
    fn register(&self, _: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(vec!["application".into()])
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::Success)
    }
}

/// Declares one known type twice plus two types nobody knows about.
pub struct Greedy;

impl Greedy {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(Greedy))
    }
}

#[async_trait]
impl WebhookHandler for Greedy {
    fn register(&self, _: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(vec!["user".into(), "plan".into(), "user".into(), "invoice".into()])
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::Success)
    }
}

/// `init` fails, as a plugin with missing credentials would.
pub struct InitFails;

impl InitFails {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(InitFails))
    }
}

#[async_trait]
impl WebhookHandler for InitFails {
    async fn init(&mut self, _: &PluginLoadContext) -> Result<(), BoxError> {
        Err("Missing configuration".into())
    }

    fn register(&self, known: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(known.iter().cloned().collect())
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::Success)
    }
}

/// `init` panics.
pub struct InitPanics;

impl InitPanics {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(InitPanics))
    }
}

#[async_trait]
impl WebhookHandler for InitPanics {
    async fn init(&mut self, _: &PluginLoadContext) -> Result<(), BoxError> {
        panic!("init exploded");
    }

    fn register(&self, known: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(known.iter().cloned().collect())
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::Success)
    }
}

/// `register` fails.
pub struct RegisterFails;

impl RegisterFails {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(RegisterFails))
    }
}

#[async_trait]
impl WebhookHandler for RegisterFails {
    fn register(&self, _: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Err("no types for you".into())
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::Success)
    }
}

/// Requires `plugins.<name>.token` in its config section.
pub struct NeedsToken {
    token: Option<String>,
}

impl NeedsToken {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(NeedsToken { token: None }))
    }
}

#[async_trait]
impl WebhookHandler for NeedsToken {
    async fn init(&mut self, ctx: &PluginLoadContext) -> Result<(), BoxError> {
        let token = ctx
            .raw_config()
            .get("token")
            .and_then(|v| v.as_str())
            .ok_or("Missing configuration")?;
        self.token = Some(token.to_string());
        Ok(())
    }

    fn register(&self, _: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(vec!["account".into()])
    }

    async fn handle(&self, _: &WebhookEvent, _: &CancellationToken) -> Result<Status, BoxError> {
        Ok(Status::message(format!(
            "token={}",
            self.token.as_deref().unwrap_or_default()
        )))
    }
}

/// Factory returns an error.
pub struct FactoryFails;

impl FactoryFails {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Err("factory refused".into())
    }
}

/// Factory panics.
pub struct FactoryPanics;

impl FactoryPanics {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        panic!("factory exploded");
    }
}

// ─── Behaviours for dispatch tests ───────────────────────────────────────────

/// What a [`Scripted`] handler does when invoked.
#[derive(Clone)]
pub enum Script {
    Report(Status),
    Raise(&'static str),
    PanicBeforeFuture(&'static str),
    PanicInFuture(&'static str),
    Sleep(Duration),
    CancelThenReport(CancellationToken),
}

/// A handler that records its invocation into a shared journal, then follows
/// its script.
pub struct Scripted {
    pub name: &'static str,
    pub script: Script,
    pub journal: Arc<Mutex<Vec<&'static str>>>,
}

impl Scripted {
    fn record(&self) {
        self.journal.lock().unwrap().push(self.name);
    }
}

// Implemented by hand (no #[async_trait]) so the synchronous part of
// `handle` can panic before a future exists.
impl WebhookHandler for Scripted {
    fn register(&self, known: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(known.iter().cloned().collect())
    }

    fn handle<'a, 'b, 'c, 'd>(
        &'a self,
        _event: &'b WebhookEvent,
        _cancel: &'c CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Status, BoxError>> + Send + 'd>,
    >
    where
        'a: 'd,
        'b: 'd,
        'c: 'd,
        Self: 'd,
    {
        self.record();
        if let Script::PanicBeforeFuture(msg) = self.script {
            panic!("{msg}");
        }
        let script = self.script.clone();
        Box::pin(async move {
            match script {
                Script::Report(status) => Ok(status),
                Script::Raise(msg) => Err(msg.into()),
                Script::PanicBeforeFuture(_) => unreachable!(),
                Script::PanicInFuture(msg) => panic!("{msg}"),
                Script::Sleep(d) => {
                    tokio::time::sleep(d).await;
                    Ok(Status::Success)
                }
                Script::CancelThenReport(token) => {
                    token.cancel();
                    Ok(Status::Success)
                }
            }
        })
    }
}
