//! The [`define_plugin!`](crate::define_plugin) macro.

/// Declares a plugin and adds it to the global [`PLUGIN_CATALOG`].
///
/// The description defaults to the defining crate's `CARGO_PKG_DESCRIPTION`.
///
/// ```rust,ignore
/// define_plugin! {
///     /// Synchronises OAuth applications into the identity provider.
///     pub static SSO_PLUGIN: {
///         name: "sso",
///         description: "Keycloak client synchronisation",
///         create: SsoHandler::create,
///     }
/// }
/// ```
///
/// [`PLUGIN_CATALOG`]: crate::plugin::PLUGIN_CATALOG
#[macro_export]
macro_rules! define_plugin {
    (
        $(#[$meta:meta])*
        $vis:vis static $ident:ident: {
            name: $name:expr,
            $(description: $desc:expr,)?
            create: $create:path $(,)?
        }
    ) => {
        $(#[$meta])*
        #[$crate::plugin::__linkme::distributed_slice($crate::plugin::PLUGIN_CATALOG)]
        #[linkme(crate = $crate::plugin::__linkme)]
        $vis static $ident: $crate::plugin::PluginDescriptor = $crate::plugin::PluginDescriptor {
            api_version: $crate::plugin::HOOKRELAY_PLUGIN_API_VERSION,
            name: $name,
            description: $crate::__plugin_description!($($desc)?),
            create: $create,
        };
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __plugin_description {
    () => {
        ::std::env!("CARGO_PKG_DESCRIPTION")
    };
    ($desc:expr) => {
        $desc
    };
}
