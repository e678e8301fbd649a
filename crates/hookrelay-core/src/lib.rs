//! # hookrelay Core
//!
//! Contracts shared by every hookrelay crate.
//!
//! ## Layers
//!
//! - **Events**: [`EventType`], [`KnownTypes`] and [`WebhookEvent`], the
//!   `(action, type, object)` triple extracted by the gateway.
//! - **Handlers**: the [`WebhookHandler`] trait every plugin implements,
//!   together with [`PluginLoadContext`] (per-plugin configuration).
//! - **Outcomes**: [`Status`], [`HandlerFault`] and [`DispatchResult`], the
//!   per-handler report and its aggregated, normalised form.
//! - **State**: [`HandlerState`], the load/init/registration record kept for
//!   every configured plugin.
//!
//! ```text
//! ┌─────────┐     ┌────────────┐     ┌──────────────┐
//! │ Gateway │────▶│ Dispatcher │────▶│ WebhookHandler│ (in registry order)
//! └─────────┘     └────────────┘────▶│ WebhookHandler│
//!                                    └──────────────┘
//! ```

pub mod error;
pub mod event;
pub mod handler;
pub mod outcome;
pub mod state;

pub use error::{BoxError, CoreError, CoreResult, RouteError};
pub use event::{EventType, KnownTypes, WebhookEvent};
pub use handler::{BoxedHandler, PluginLoadContext, WebhookHandler};
pub use outcome::{DispatchEntry, DispatchResult, HandlerFault, Status, normalize};
pub use state::HandlerState;

// Re-exported so plugins can name the cancellation type without a direct dependency.
pub use tokio_util::sync::CancellationToken;
