//! # hookrelay Framework
//!
//! The part of hookrelay with real control flow:
//!
//! - [`plugin`]: compiled-in plugin catalog and the [`define_plugin!`] macro.
//! - [`registry`]: builds the event-type → handler mapping from an ordered
//!   list of plugin names, isolating every per-plugin failure.
//! - [`dispatcher`]: runs the handlers registered for one event strictly in
//!   order, converting every fault into a result entry.

pub mod dispatcher;
pub mod plugin;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use plugin::{HOOKRELAY_PLUGIN_API_VERSION, PluginCatalog, PluginDescriptor, PluginFactory};
pub use registry::{HandlerDescriptor, HandlerRegistry, RegistryBuilder, parse_plugin_list};
