//! Runtime configuration.
//!
//! `defaults/runtime.default.toml` is embedded so documented defaults and
//! runtime behavior cannot drift. Callers layer TOML text or single
//! overrides on top through [`Loader`] before deserializing into
//! [`RuntimeConfig`]. Nothing here reads the file system.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;

use crate::runtime::atn::DeserializationOptions;
use crate::runtime::parser::ParserOptions;

const DEFAULT_TOML: &str = include_str!("../../defaults/runtime.default.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    pub deserialization: DeserializationOptions,
    pub parser: ParserOptions,
}

/// Layers user configuration over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer TOML text, e.g. configuration embedded by a generated parser.
    pub fn with_toml_str(mut self, toml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Apply a single key/value override such as `parser.trace`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<RuntimeConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<RuntimeConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_option_types() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.deserialization, DeserializationOptions::default());
        assert_eq!(config.parser, ParserOptions::default());
    }

    #[test]
    fn overrides_and_layers_apply_in_order() {
        let config = Loader::new()
            .with_toml_str("[parser]\ntrace = true\nbuild_parse_trees = false\n")
            .set_override("deserialization.generate_rule_bypass_transitions", true)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(config.parser.trace);
        assert!(!config.parser.build_parse_trees);
        assert!(config.deserialization.generate_rule_bypass_transitions);
        assert!(config.deserialization.verify_atn);
    }

    #[test]
    fn later_layers_win_and_bad_toml_is_an_error() {
        let config = Loader::new()
            .with_toml_str("[parser]\ntrace = true\n")
            .with_toml_str("[parser]\ntrace = false\n")
            .build()
            .expect("config to build");
        assert!(!config.parser.trace);

        let result = Loader::new().with_toml_str("[parser\ntrace = ").build();
        assert!(result.is_err());
    }
}
