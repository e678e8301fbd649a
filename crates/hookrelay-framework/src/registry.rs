//! Event-type → handler registry.
//!
//! [`RegistryBuilder::build`] walks the configured plugin names in order and,
//! for each one, runs the lifecycle
//!
//! ```text
//! load (catalog lookup + factory) ──► init(ctx) ──► register(known types)
//! ```
//!
//! recording a [`HandlerState`] per plugin. A failure (error or panic) at any
//! stage only removes that plugin from dispatch; later plugins are processed
//! normally. Once built, the registry is immutable and shared behind an `Arc`.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use hookrelay_core::{
    BoxedHandler, CoreError, CoreResult, EventType, HandlerFault, HandlerState, KnownTypes,
    PluginLoadContext, RouteError, WebhookHandler,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::plugin::PluginCatalog;

/// Splits a comma-separated plugin list, trimming entries and dropping blanks.
pub fn parse_plugin_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed plugin names in order, without blanks or repeats.
fn distinct_plugin_names<S: AsRef<str>>(plugin_names: &[S]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::with_capacity(plugin_names.len());
    for name in plugin_names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if names.contains(&name) {
            warn!(plugin = %name, "Plugin listed twice, ignoring the duplicate");
            continue;
        }
        names.push(name);
    }
    names
}

// =============================================================================
// HandlerDescriptor
// =============================================================================

/// A registered handler and the plugin name it reports under.
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: Arc<str>,
    handler: Arc<dyn WebhookHandler>,
}

impl HandlerDescriptor {
    /// Pairs a name with a ready handler.
    pub fn new(name: impl Into<Arc<str>>, handler: Arc<dyn WebhookHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// Plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler instance.
    pub fn handler(&self) -> &dyn WebhookHandler {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

// =============================================================================
// HandlerRegistry
// =============================================================================

/// Immutable mapping from event type to the ordered handlers interested in it.
pub struct HandlerRegistry {
    known: KnownTypes,
    by_type: HashMap<EventType, Vec<HandlerDescriptor>>,
    /// Plugin states in configuration order.
    states: Vec<(String, HandlerState)>,
}

impl HandlerRegistry {
    /// Starts building a registry over `known` event types.
    pub fn builder(known: KnownTypes) -> RegistryBuilder {
        RegistryBuilder::new(known)
    }

    /// The known event types.
    pub fn known_types(&self) -> &KnownTypes {
        &self.known
    }

    /// Handlers for `event_type`, in registration order. Empty when the type
    /// is unknown or has no handler.
    pub fn handlers_for(&self, event_type: &str) -> &[HandlerDescriptor] {
        self.by_type
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolves the dispatch chain for `event_type`.
    ///
    /// Fails when the type is unknown or nobody registered for it; callers must
    /// reject the event instead of dispatching it.
    pub fn resolve(&self, event_type: &str) -> Result<&[HandlerDescriptor], RouteError> {
        if !self.known.contains(event_type) {
            return Err(RouteError::UnknownType(event_type.to_string()));
        }
        let chain = self.handlers_for(event_type);
        if chain.is_empty() {
            return Err(RouteError::NoHandler(event_type.to_string()));
        }
        Ok(chain)
    }

    /// Ordered handler names per known type, for introspection.
    pub fn handlers_by_type(&self) -> Vec<(EventType, Vec<String>)> {
        self.known
            .iter()
            .map(|t| {
                let names = self
                    .handlers_for(t.as_str())
                    .iter()
                    .map(|d| d.name().to_string())
                    .collect();
                (t.clone(), names)
            })
            .collect()
    }

    /// Plugin states in configuration order.
    pub fn states(&self) -> &[(String, HandlerState)] {
        &self.states
    }

    /// State of one plugin.
    pub fn state(&self, plugin: &str) -> Option<&HandlerState> {
        self.states
            .iter()
            .find(|(name, _)| name == plugin)
            .map(|(_, state)| state)
    }

    /// Number of plugins that reached dispatch.
    pub fn active_count(&self) -> usize {
        self.states.iter().filter(|(_, s)| s.is_active()).count()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers_by_type", &self.handlers_by_type())
            .field("states", &self.states)
            .finish()
    }
}

// =============================================================================
// RegistryBuilder
// =============================================================================

/// Builds a [`HandlerRegistry`].
///
/// # Example
///
/// ```rust,ignore
/// let registry = HandlerRegistry::builder(KnownTypes::default())
///     .catalog(PluginCatalog::discovered())
///     .plugin_configs(config.plugins.clone())
///     .build(&["log", "sso"])
///     .await;
/// ```
pub struct RegistryBuilder {
    known: KnownTypes,
    catalog: PluginCatalog,
    plugin_configs: HashMap<String, Value>,
}

impl RegistryBuilder {
    /// Creates a builder with an empty catalog.
    pub fn new(known: KnownTypes) -> Self {
        Self {
            known,
            catalog: PluginCatalog::new(),
            plugin_configs: HashMap::new(),
        }
    }

    /// Sets the catalog plugins are looked up in.
    pub fn catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets every plugin's config section at once.
    pub fn plugin_configs(mut self, configs: HashMap<String, Value>) -> Self {
        self.plugin_configs = configs;
        self
    }

    /// Sets one plugin's config section.
    pub fn plugin_config(mut self, plugin: impl Into<String>, config: Value) -> Self {
        self.plugin_configs.insert(plugin.into(), config);
        self
    }

    /// Loads, initialises and registers `plugin_names` in order.
    pub async fn build<S: AsRef<str>>(self, plugin_names: &[S]) -> HandlerRegistry {
        let mut by_type: HashMap<EventType, Vec<HandlerDescriptor>> = self
            .known
            .iter()
            .map(|t| (t.clone(), Vec::new()))
            .collect();
        let mut states: Vec<(String, HandlerState)> = Vec::with_capacity(plugin_names.len());

        let names = distinct_plugin_names(plugin_names);
        if names.is_empty() {
            warn!("No handler plugin configured, events will be rejected");
        } else {
            info!(count = names.len(), plugins = ?names, "Found webhook handler plugins");
        }

        for name in names {
            let (state, types) = match self.bring_up(name).await {
                Ok((handler, types)) => {
                    let desc = HandlerDescriptor::new(name, Arc::from(handler));
                    for t in &types {
                        if let Some(list) = by_type.get_mut(t) {
                            list.push(desc.clone());
                        }
                    }
                    (HandlerState::registered(), types)
                }
                Err(err) => {
                    warn!(plugin = %name, error = %err, "Plugin disabled");
                    let state = match err {
                        CoreError::PluginLoad(m) => HandlerState::load_failed(m),
                        CoreError::PluginInit(m) => HandlerState::init_failed(m),
                        CoreError::PluginRegistration(m) => HandlerState::registration_failed(m),
                    };
                    (state, Vec::new())
                }
            };

            if state.is_active() {
                info!(plugin = %name, types = ?types, "Plugin registered");
            }
            states.push((name.to_string(), state));
        }

        HandlerRegistry {
            known: self.known,
            by_type,
            states,
        }
    }

    /// Runs load → init → register for one plugin.
    ///
    /// Returns the handler and the declared types that are known, deduplicated
    /// and in declaration order.
    async fn bring_up(&self, name: &str) -> CoreResult<(BoxedHandler, Vec<EventType>)> {
        let mut handler = self.catalog.instantiate(name)?;
        debug!(plugin = %name, "Plugin loaded");

        let config = self
            .plugin_configs
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::default()));
        let ctx = PluginLoadContext::new(name, config);

        match AssertUnwindSafe(handler.init(&ctx)).catch_unwind().await {
            Ok(Ok(())) => debug!(plugin = %name, "Plugin initialized"),
            Ok(Err(e)) => return Err(CoreError::init(e.to_string())),
            Err(payload) => {
                return Err(CoreError::init(HandlerFault::from_panic(payload).to_string()));
            }
        }

        let declared = match panic::catch_unwind(AssertUnwindSafe(|| handler.register(&self.known)))
        {
            Ok(Ok(types)) => types,
            Ok(Err(e)) => return Err(CoreError::registration(e.to_string())),
            Err(payload) => {
                return Err(CoreError::registration(
                    HandlerFault::from_panic(payload).to_string(),
                ));
            }
        };

        let mut types: Vec<EventType> = Vec::with_capacity(declared.len());
        for t in declared {
            if !self.known.contains(t.as_str()) {
                debug!(plugin = %name, event_type = %t, "Ignoring unknown event type");
                continue;
            }
            if !types.contains(&t) {
                types.push(t);
            }
        }

        Ok((handler, types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginDescriptor;
    use crate::testing::{
        AppsOnly, Greedy, InitFails, InitPanics, NeedsToken, RegisterFails, Succeeds,
    };
    use serde_json::json;

    fn catalog() -> PluginCatalog {
        PluginCatalog::from_descriptors([
            PluginDescriptor::new("all", Succeeds::create),
            PluginDescriptor::new("all2", Succeeds::create),
            PluginDescriptor::new("apps", AppsOnly::create),
            PluginDescriptor::new("greedy", Greedy::create),
            PluginDescriptor::new("init_fails", InitFails::create),
            PluginDescriptor::new("init_panics", InitPanics::create),
            PluginDescriptor::new("register_fails", RegisterFails::create),
            PluginDescriptor::new("needs_token", NeedsToken::create),
        ])
    }

    async fn build(names: &[&str]) -> HandlerRegistry {
        HandlerRegistry::builder(KnownTypes::default())
            .catalog(catalog())
            .build(names)
            .await
    }

    fn names(registry: &HandlerRegistry, t: &str) -> Vec<String> {
        registry
            .handlers_for(t)
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    #[test]
    fn test_parse_plugin_list() {
        assert_eq!(parse_plugin_list(" log, sso ,,"), ["log", "sso"]);
        assert!(parse_plugin_list(" , ").is_empty());
    }

    #[tokio::test]
    async fn test_registration_order_follows_configuration() {
        let registry = build(&["apps", "all"]).await;
        assert_eq!(names(&registry, "application"), ["apps", "all"]);
        assert_eq!(names(&registry, "user"), ["all"]);
        assert_eq!(names(&registry, "account"), ["all"]);

        let registry = build(&["all", "apps"]).await;
        assert_eq!(names(&registry, "application"), ["all", "apps"]);
    }

    #[tokio::test]
    async fn test_init_failure_isolated() {
        let registry = build(&["init_fails", "all"]).await;

        assert_eq!(
            registry.state("init_fails"),
            Some(&HandlerState::init_failed("Missing configuration"))
        );
        for t in KnownTypes::DEFAULT {
            assert_eq!(names(&registry, t), ["all"]);
        }
        assert_eq!(registry.active_count(), 1);
    }

    #[tokio::test]
    async fn test_every_stage_failure_recorded() {
        let registry = build(&["missing", "init_panics", "register_fails", "all2"]).await;

        let missing = registry.state("missing").unwrap();
        assert!(!missing.loaded);
        assert_eq!(missing.initialized, None);
        assert_eq!(missing.error.as_deref(), Some("Cannot find plugin 'missing'"));

        assert_eq!(
            registry.state("init_panics"),
            Some(&HandlerState::init_failed("init exploded"))
        );
        assert_eq!(
            registry.state("register_fails"),
            Some(&HandlerState::registration_failed("no types for you"))
        );
        assert_eq!(registry.state("all2"), Some(&HandlerState::registered()));
        assert_eq!(names(&registry, "user"), ["all2"]);
    }

    #[tokio::test]
    async fn test_unknown_declared_types_ignored() {
        let registry = build(&["greedy"]).await;
        assert_eq!(names(&registry, "user"), ["greedy"]);
        assert!(registry.handlers_for("plan").is_empty());
        assert!(registry.handlers_for("application").is_empty());
        assert_eq!(registry.state("greedy"), Some(&HandlerState::registered()));
    }

    #[tokio::test]
    async fn test_duplicate_plugin_names_skipped() {
        let registry = build(&["all", " all ", "all"]).await;
        assert_eq!(registry.states().len(), 1);
        assert_eq!(names(&registry, "user"), ["all"]);
    }

    #[tokio::test]
    async fn test_blank_and_repeated_names_are_not_counted() {
        assert_eq!(
            distinct_plugin_names(&["log", " ", "sso", " log", ""]),
            ["log", "sso"]
        );

        let registry = build(&[" ", ""]).await;
        assert!(registry.states().is_empty());
    }

    #[tokio::test]
    async fn test_plugin_config_reaches_init() {
        let without = build(&["needs_token"]).await;
        assert_eq!(
            without.state("needs_token"),
            Some(&HandlerState::init_failed("Missing configuration"))
        );

        let with = HandlerRegistry::builder(KnownTypes::default())
            .catalog(catalog())
            .plugin_config("needs_token", json!({"token": "s3cr3t"}))
            .build(&["needs_token"])
            .await;
        assert!(with.state("needs_token").unwrap().is_active());
        assert_eq!(names(&with, "account"), ["needs_token"]);
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let list = ["apps", "init_fails", "all", "missing", "greedy"];
        let a = build(&list).await;
        let b = build(&list).await;
        assert_eq!(a.handlers_by_type().len(), 3);
        assert_eq!(a.handlers_by_type(), b.handlers_by_type());
        assert_eq!(a.states(), b.states());
    }

    #[tokio::test]
    async fn test_resolve() {
        let registry = build(&["apps"]).await;
        assert_eq!(registry.resolve("application").unwrap().len(), 1);
        assert_eq!(
            registry.resolve("user").unwrap_err(),
            RouteError::NoHandler("user".into())
        );
        assert_eq!(
            registry.resolve("plan").unwrap_err(),
            RouteError::UnknownType("plan".into())
        );
    }

    #[tokio::test]
    async fn test_empty_plugin_list() {
        let registry = build(&[]).await;
        assert!(registry.states().is_empty());
        assert_eq!(registry.handlers_by_type().len(), 3);
        assert!(registry.resolve("user").is_err());
    }
}
