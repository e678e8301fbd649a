//! Name → factory lookup table.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use hookrelay_core::{BoxedHandler, CoreError, CoreResult, HandlerFault};
use linkme::distributed_slice;
use tracing::{debug, warn};

use super::descriptor::{HOOKRELAY_PLUGIN_API_VERSION, PluginDescriptor};

/// Every plugin compiled into the binary.
///
/// Plugin crates contribute one entry each through
/// [`define_plugin!`](crate::define_plugin).
#[distributed_slice]
pub static PLUGIN_CATALOG: [PluginDescriptor];

/// A snapshot of available plugins, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    entries: HashMap<&'static str, PluginDescriptor>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots every descriptor linked into the binary.
    pub fn discovered() -> Self {
        let catalog = Self::from_descriptors(PLUGIN_CATALOG.iter().copied());
        debug!(plugins = ?catalog.names(), "Discovered compiled-in plugins");
        catalog
    }

    /// Builds a catalog from explicit descriptors.
    ///
    /// When two descriptors share a name the first one wins.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = PluginDescriptor>) -> Self {
        let mut catalog = Self::new();
        for desc in descriptors {
            catalog.add(desc);
        }
        catalog
    }

    /// Adds a descriptor unless its name is already taken.
    pub fn add(&mut self, desc: PluginDescriptor) {
        if self.entries.contains_key(desc.name) {
            warn!(plugin = %desc.name, "Duplicate plugin name in catalog, keeping the first");
            return;
        }
        self.entries.insert(desc.name, desc);
    }

    /// Adds a descriptor (builder pattern).
    pub fn with(mut self, desc: PluginDescriptor) -> Self {
        self.add(desc);
        self
    }

    /// Looks up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.entries.get(name)
    }

    /// Sorted plugin names.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of plugins in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locates `name` and runs its factory.
    ///
    /// Unknown names, incompatible API versions, factory errors and factory
    /// panics all become [`CoreError::PluginLoad`].
    pub fn instantiate(&self, name: &str) -> CoreResult<BoxedHandler> {
        let desc = self
            .get(name)
            .ok_or_else(|| CoreError::load(format!("Cannot find plugin '{name}'")))?;

        if !desc.is_compatible() {
            return Err(CoreError::load(format!(
                "Plugin API version {} is not compatible with host version {}.{}",
                desc.version_string(),
                HOOKRELAY_PLUGIN_API_VERSION >> 16,
                HOOKRELAY_PLUGIN_API_VERSION & 0xFFFF
            )));
        }

        match panic::catch_unwind(AssertUnwindSafe(|| desc.instantiate())) {
            Ok(Ok(handler)) => Ok(handler),
            Ok(Err(e)) => Err(CoreError::load(e.to_string())),
            Err(payload) => Err(CoreError::load(HandlerFault::from_panic(payload).to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FactoryFails, FactoryPanics, Succeeds};

    #[test]
    fn test_unknown_plugin_is_load_error() {
        let catalog = PluginCatalog::new();
        let err = catalog.instantiate("missing").err().unwrap();
        assert!(matches!(err, CoreError::PluginLoad(_)));
        assert_eq!(err.to_string(), "Cannot find plugin 'missing'");
    }

    #[test]
    fn test_factory_failures_are_load_errors() {
        let catalog = PluginCatalog::new()
            .with(PluginDescriptor::new("fails", FactoryFails::create))
            .with(PluginDescriptor::new("panics", FactoryPanics::create));

        let err = catalog.instantiate("fails").err().unwrap();
        assert_eq!(err.to_string(), "factory refused");

        let err = catalog.instantiate("panics").err().unwrap();
        assert_eq!(err.to_string(), "factory exploded");
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let desc = PluginDescriptor {
            api_version: 0x0002_0000,
            ..PluginDescriptor::new("future", Succeeds::create)
        };
        let catalog = PluginCatalog::from_descriptors([desc]);
        let err = catalog.instantiate("future").err().unwrap();
        assert!(err.to_string().contains("not compatible"));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let first = PluginDescriptor {
            description: "first",
            ..PluginDescriptor::new("dup", Succeeds::create)
        };
        let second = PluginDescriptor {
            description: "second",
            ..PluginDescriptor::new("dup", FactoryFails::create)
        };
        let catalog = PluginCatalog::from_descriptors([first, second]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("dup").unwrap().description, "first");
        assert!(catalog.instantiate("dup").is_ok());
    }
}
