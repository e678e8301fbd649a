//! Dispatch engine.
//!
//! For one event the [`Dispatcher`] walks the registry's handler list for the
//! event type and invokes each handler in turn:
//!
//! 1. Handlers run strictly sequentially, in registration order.
//! 2. Every invocation sits behind a fault boundary: an `Err`, a panic (in the
//!    synchronous or asynchronous part of `handle`), an expired per-handler
//!    deadline or cancellation becomes that handler's status.
//! 3. Each status is normalised and appended to the [`DispatchResult`] under
//!    the handler's name, so the result always has one entry per handler.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(registry).with_handler_timeout(Some(Duration::from_secs(10)));
//! let result = dispatcher.dispatch(&event, &CancellationToken::new()).await?;
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use hookrelay_core::{
    CancellationToken, DispatchEntry, DispatchResult, HandlerFault, RouteError, Status,
    WebhookEvent, normalize,
};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::registry::{HandlerDescriptor, HandlerRegistry};

/// Runs dispatch chains over a shared, read-only [`HandlerRegistry`].
///
/// Cloning is cheap; independent events may be dispatched concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    handler_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Creates a dispatcher without a per-handler deadline.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            handler_timeout: None,
        }
    }

    /// Sets the per-handler deadline.
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// The registry this dispatcher reads from.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// The per-handler deadline, if any.
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout
    }

    /// Resolves the chain for `event` and runs it.
    ///
    /// Fails without invoking anything when the type is unknown or has no
    /// handler.
    pub async fn dispatch(
        &self,
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, RouteError> {
        let chain = self.registry.resolve(event.event_type.as_str())?;
        Ok(self.run_chain(chain, event, cancel).await)
    }

    /// Runs `chain` for `event`, one handler after the other.
    ///
    /// Once `cancel` fires, the remaining handlers are not invoked and are
    /// recorded as cancelled.
    pub async fn run_chain(
        &self,
        chain: &[HandlerDescriptor],
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> DispatchResult {
        let span = info_span!(
            "dispatch",
            action = %event.action,
            event_type = %event.event_type,
            handlers = chain.len()
        );

        async move {
            let mut results = DispatchResult::with_capacity(chain.len());

            for desc in chain {
                let outcome = self.invoke(desc, event, cancel).await;
                match &outcome {
                    Ok(status) if status.is_success() => {
                        debug!(handler = %desc.name(), "Handler succeeded");
                    }
                    Ok(status) => {
                        info!(handler = %desc.name(), status = %status, "Handler reported");
                    }
                    Err(fault) => {
                        warn!(handler = %desc.name(), error = %fault, "Handler faulted");
                    }
                }
                results.push(DispatchEntry::new(desc.name(), normalize(&outcome)));
            }

            info!(
                succeeded = results.success_count(),
                total = results.len(),
                "Dispatch finished"
            );
            results
        }
        .instrument(span)
        .await
    }

    /// Invokes one handler behind the fault boundary.
    async fn invoke(
        &self,
        desc: &HandlerDescriptor,
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> Result<Status, HandlerFault> {
        if cancel.is_cancelled() {
            return Err(HandlerFault::Cancelled);
        }

        let handler = desc.handler();
        let call = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event, cancel))) {
            Ok(call) => call,
            Err(payload) => return Err(HandlerFault::from_panic(payload)),
        };

        let guarded = async move {
            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(status)) => Ok(status),
                Ok(Err(err)) => Err(HandlerFault::Raised(err)),
                Err(payload) => Err(HandlerFault::from_panic(payload)),
            }
        };

        let bounded = async move {
            match self.handler_timeout {
                Some(limit) => tokio::time::timeout(limit, guarded)
                    .await
                    .unwrap_or(Err(HandlerFault::TimedOut(limit))),
                None => guarded.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HandlerFault::Cancelled),
            outcome = bounded => outcome,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_timeout", &self.handler_timeout)
            .field("active_plugins", &self.registry.active_count())
            .finish()
    }
}
