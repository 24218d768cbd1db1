use channel_sink::{Overrides, Preset, StreamRegistry};

use crate::error::BindingError;

/// Description of a binding to push.
///
/// Presets are expanded against the registry of the rebinder they are pushed
/// on, so the same spec routes to different sinks under different registries.
/// The default spec is [`Preset::Diagnostics`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindingSpec {
    /// Explicit channel-to-sink overrides.
    Overrides(Overrides),
    /// A named preset.
    Preset(Preset),
    /// A preset referred to by name, parsed when the spec is resolved.
    Named(String),
}

impl BindingSpec {
    /// Expands the spec into concrete overrides against `registry`.
    pub fn resolve(&self, registry: &StreamRegistry) -> Result<Overrides, BindingError> {
        match self {
            Self::Overrides(overrides) => Ok(overrides.clone()),
            Self::Preset(preset) => Ok(registry.preset(*preset)),
            Self::Named(name) => Ok(registry.preset(name.parse()?)),
        }
    }
}

impl Default for BindingSpec {
    fn default() -> Self {
        Self::Preset(Preset::Diagnostics)
    }
}

impl From<Overrides> for BindingSpec {
    fn from(overrides: Overrides) -> Self {
        Self::Overrides(overrides)
    }
}

impl From<&Overrides> for BindingSpec {
    fn from(overrides: &Overrides) -> Self {
        Self::Overrides(overrides.clone())
    }
}

impl From<Preset> for BindingSpec {
    fn from(preset: Preset) -> Self {
        Self::Preset(preset)
    }
}

impl From<&str> for BindingSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for BindingSpec {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}
