//! Plugin descriptor: the static, `Copy` handle to a plugin.

use hookrelay_core::{BoxError, BoxedHandler};

// ─── API versioning ──────────────────────────────────────────────────────────

/// Current hookrelay plugin API version (1.0).
pub const HOOKRELAY_PLUGIN_API_VERSION: u32 = 0x0001_0000;

/// Factory that instantiates a plugin's handler.
pub type PluginFactory = fn() -> Result<BoxedHandler, BoxError>;

// ─── PluginDescriptor ────────────────────────────────────────────────────────

/// Identifies and instantiates a plugin.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Plugin API version this descriptor was compiled against.
    pub api_version: u32,

    /// Name used in the plugin list and as the config lookup key.
    pub name: &'static str,

    /// One-line description shown by the introspection endpoint.
    pub description: &'static str,

    /// Creates the handler instance.
    pub create: PluginFactory,
}

impl PluginDescriptor {
    /// Creates a descriptor for the current API version.
    pub const fn new(name: &'static str, create: PluginFactory) -> Self {
        Self {
            api_version: HOOKRELAY_PLUGIN_API_VERSION,
            name,
            description: "",
            create,
        }
    }

    /// Returns `true` if this descriptor's API version is compatible with the
    /// running framework.
    ///
    /// The major part must match exactly; the descriptor's minor part must be
    /// ≤ the host's minor part.
    pub fn is_compatible(&self) -> bool {
        let host_major = HOOKRELAY_PLUGIN_API_VERSION >> 16;
        let desc_major = self.api_version >> 16;
        let desc_minor = self.api_version & 0xFFFF;
        let host_minor = HOOKRELAY_PLUGIN_API_VERSION & 0xFFFF;
        desc_major == host_major && desc_minor <= host_minor
    }

    /// Formats the descriptor's API version as `major.minor`.
    pub fn version_string(&self) -> String {
        format!("{}.{}", self.api_version >> 16, self.api_version & 0xFFFF)
    }

    /// Creates the handler from the factory function.
    #[inline]
    pub fn instantiate(&self) -> Result<BoxedHandler, BoxError> {
        (self.create)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Succeeds;

    #[test]
    fn test_compatibility() {
        let desc = PluginDescriptor::new("ok", Succeeds::create);
        assert!(desc.is_compatible());
        assert_eq!(desc.version_string(), "1.0");

        let newer_minor = PluginDescriptor {
            api_version: HOOKRELAY_PLUGIN_API_VERSION + 1,
            ..desc
        };
        assert!(!newer_minor.is_compatible());

        let other_major = PluginDescriptor {
            api_version: 0x0002_0000,
            ..desc
        };
        assert!(!other_major.is_compatible());
    }
}
