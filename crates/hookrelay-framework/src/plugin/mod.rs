//! Plugin discovery.
//!
//! A [`PluginDescriptor`] is the static, `Copy` handle to a plugin: its name
//! and a factory function. Plugin crates contribute descriptors to the global
//! [`PLUGIN_CATALOG`] with [`define_plugin!`](crate::define_plugin); the
//! registry then looks plugins up by the names listed in the configuration.
//!
//! ```rust,ignore
//! use hookrelay_framework::define_plugin;
//!
//! define_plugin! {
//!     /// Prints every event.
//!     pub static PRINT: {
//!         name: "print",
//!         create: PrintHandler::create,
//!     }
//! }
//! ```
//!
//! A crate's descriptors are only linked when the crate itself is; binaries
//! pull plugin crates in with `use my_plugin as _;`.

pub mod catalog;
pub mod descriptor;
pub mod macros;

pub use catalog::{PLUGIN_CATALOG, PluginCatalog};
pub use descriptor::{HOOKRELAY_PLUGIN_API_VERSION, PluginDescriptor, PluginFactory};

// ─── Macro-internal re-export (needed by define_plugin! at call sites) ───────
#[doc(hidden)]
pub use linkme as __linkme;
