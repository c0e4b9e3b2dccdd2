#![forbid(unsafe_code)]

//! Configuration for validated owners and the directives.
//!
//! Everything defaults to off / the conventional names, so an empty document
//! (or `Default::default()`) is a valid configuration. With the
//! `options-config` feature, [`GroupOptions`] and [`PluginConfig`] can be
//! loaded from TOML or JSON; missing keys take their defaults and unknown keys
//! are rejected.

use crate::element::ElementAttributes;

/// Default view strategy name for `show-error`.
pub const DEFAULT_VIEW_STRATEGY: &str = "inline";

/// Default summary strategy name for `validation-summary`.
pub const DEFAULT_SUMMARY_STRATEGY: &str = "default";

/// How an owner's validation group is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "options-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct GroupOptions {
    /// Re-evaluate continuously as the model changes.
    pub with_reactive_validation: bool,
    /// Evaluate every property once when the group is built.
    pub validate_on_start: bool,
    /// Let the engine read input parameters not found in own state.
    pub validate_props: bool,
    /// Let the engine read computed values not found in own state or props.
    pub validate_computed: bool,
}

impl GroupOptions {
    #[must_use]
    pub fn with_reactive_validation(mut self, enabled: bool) -> Self {
        self.with_reactive_validation = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_on_start(mut self, enabled: bool) -> Self {
        self.validate_on_start = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_props(mut self, enabled: bool) -> Self {
        self.validate_props = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_computed(mut self, enabled: bool) -> Self {
        self.validate_computed = enabled;
        self
    }
}

/// Strategy names used when an element does not declare one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "options-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct BindingDefaults {
    pub view_strategy: String,
    pub summary_strategy: String,
}

impl Default for BindingDefaults {
    fn default() -> Self {
        Self {
            view_strategy: DEFAULT_VIEW_STRATEGY.into(),
            summary_strategy: DEFAULT_SUMMARY_STRATEGY.into(),
        }
    }
}

/// Everything the plugin needs to build its directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "options-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct PluginConfig {
    pub defaults: BindingDefaults,
    pub attributes: ElementAttributes,
}

/// Errors from loading configuration documents.
#[cfg(feature = "options-config")]
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The TOML document was malformed or had unknown keys.
    Toml(String),
    /// The JSON document was malformed or had unknown keys.
    Json(String),
}

#[cfg(feature = "options-config")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toml(msg) => write!(f, "invalid TOML configuration: {msg}"),
            Self::Json(msg) => write!(f, "invalid JSON configuration: {msg}"),
        }
    }
}

#[cfg(feature = "options-config")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "options-config")]
impl GroupOptions {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Toml(err.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|err| ConfigError::Json(err.to_string()))
    }
}

#[cfg(feature = "options-config")]
impl PluginConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Toml(err.to_string()))
    }
}
