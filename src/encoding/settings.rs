//! Encode and decode settings
//!
//! Small records threaded by reference through every encode/decode call and
//! inherited unchanged by nested calls.

use std::sync::Arc;

use super::registry::{default_registry, ExtensionRegistry};

/// Settings for encoding
///
/// # Example
/// ```
/// use firebase_common::encoding::EncodeSettings;
///
/// let sparse = EncodeSettings::builder().encode_defaults(false).build();
/// assert!(!sparse.encode_defaults());
/// assert!(EncodeSettings::default().encode_defaults());
/// ```
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    encode_defaults: bool,
    registry: Arc<ExtensionRegistry>,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            encode_defaults: true,
            registry: default_registry(),
        }
    }
}

impl EncodeSettings {
    /// Start building settings
    pub fn builder() -> EncodeSettingsBuilder {
        EncodeSettingsBuilder::default()
    }

    /// Whether fields equal to their declared default are emitted
    ///
    /// Default: true
    pub fn encode_defaults(&self) -> bool {
        self.encode_defaults
    }

    /// Registry used for special values, dynamic values and polymorphism
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Copy of these settings with a different `encode_defaults`
    pub fn with_encode_defaults(&self, encode_defaults: bool) -> Self {
        Self {
            encode_defaults,
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Builder for [`EncodeSettings`]
#[derive(Debug, Default)]
pub struct EncodeSettingsBuilder {
    encode_defaults: Option<bool>,
    registry: Option<Arc<ExtensionRegistry>>,
}

impl EncodeSettingsBuilder {
    /// Emit (true) or omit (false) fields equal to their declared default
    pub fn encode_defaults(mut self, encode_defaults: bool) -> Self {
        self.encode_defaults = Some(encode_defaults);
        self
    }

    /// Use a custom extension registry
    pub fn registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Finish building
    pub fn build(self) -> EncodeSettings {
        EncodeSettings {
            encode_defaults: self.encode_defaults.unwrap_or(true),
            registry: self.registry.unwrap_or_else(default_registry),
        }
    }
}

/// Settings for decoding
#[derive(Debug, Clone)]
pub struct DecodeSettings {
    registry: Arc<ExtensionRegistry>,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

impl DecodeSettings {
    /// Start building settings
    pub fn builder() -> DecodeSettingsBuilder {
        DecodeSettingsBuilder::default()
    }

    /// Registry used for special values and polymorphism
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }
}

/// Builder for [`DecodeSettings`]
#[derive(Debug, Default)]
pub struct DecodeSettingsBuilder {
    registry: Option<Arc<ExtensionRegistry>>,
}

impl DecodeSettingsBuilder {
    /// Use a custom extension registry
    pub fn registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Finish building
    pub fn build(self) -> DecodeSettings {
        DecodeSettings {
            registry: self.registry.unwrap_or_else(default_registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_settings_default() {
        let settings = EncodeSettings::default();
        assert!(settings.encode_defaults());
        assert!(!settings.registry().special_values().is_empty());
    }

    #[test]
    fn test_encode_settings_builder() {
        let registry = Arc::new(ExtensionRegistry::empty());
        let settings = EncodeSettings::builder()
            .encode_defaults(false)
            .registry(Arc::clone(&registry))
            .build();

        assert!(!settings.encode_defaults());
        assert!(settings.registry().special_values().is_empty());
    }

    #[test]
    fn test_with_encode_defaults_keeps_registry() {
        let registry = Arc::new(ExtensionRegistry::empty());
        let settings = EncodeSettings::builder().registry(registry).build();
        let sparse = settings.with_encode_defaults(false);

        assert!(!sparse.encode_defaults());
        assert!(sparse.registry().special_values().is_empty());
    }

    #[test]
    fn test_decode_settings_builder() {
        let settings = DecodeSettings::builder()
            .registry(Arc::new(ExtensionRegistry::empty()))
            .build();
        assert!(settings.registry().special_values().is_empty());
        assert!(!DecodeSettings::default().registry().special_values().is_empty());
    }
}
