//! Config types for config-driven mapper construction.
//!
//! These types describe a mapper declaratively and are serde-deserializable,
//! enabling construction via [`Registry::load_mapper()`](crate::Registry::load_mapper).
//!
//! # Relationship to builder calls
//!
//! | Config field | Builder call |
//! |--------------|--------------|
//! | [`MapperConfig::source`] / [`MapperConfig::target`] | [`MapperBuilder::init`](crate::MapperBuilder::init) |
//! | [`MapperConfig::constructor`] | `declare_property_in_constructor` |
//! | [`MapperConfig::automatic`] | `declare_automatic_excluding` |
//! | [`MapperConfig::rules`] | `declare_property` |
//! | [`MapperConfig::execution`] | `with_execution` |
//!
//! ```yaml
//! source: Movie
//! target: MovieDto
//! automatic:
//!   exclude: [rating]
//! rules:
//!   - from: rating
//!     to: rating
//!     formatter:
//!       type_url: mapperz.core.v1.ParseInt
//! execution:
//!   max_threads: 4
//! ```

use serde::Deserialize;

use crate::ExecutionConfig;

/// Configuration for a [`Mapper`](crate::Mapper).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    /// Registered name of the source type binding.
    pub source: String,

    /// Registered name of the target type binding.
    pub target: String,

    /// Automatic discovery, if enabled.
    #[serde(default)]
    pub automatic: Option<AutomaticConfig>,

    /// Name-based rules, declared after automatic discovery.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Constructor arguments, in constructor parameter order.
    #[serde(default)]
    pub constructor: Vec<ConstructorArgConfig>,

    /// Threading bounds.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Configuration for automatic discovery.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomaticConfig {
    /// Source property names left out of discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Configuration for one name-based rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Readable source property.
    pub from: String,

    /// Writable target property.
    pub to: String,

    /// Formatter applied between read and write.
    #[serde(default)]
    pub formatter: Option<TypedConfig>,
}

/// Configuration for one constructor argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstructorArgConfig {
    /// Readable source property supplying the argument.
    pub from: String,

    /// Declared parameter kind. Without it the value's runtime kind is used.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Reference to a registered formatter with its configuration.
///
/// - `type_url` identifies the registered formatter
/// - `config` carries the formatter-specific configuration payload
#[derive(Debug, Clone, Deserialize)]
pub struct TypedConfig {
    /// The name the formatter was registered under in the [`Registry`](crate::Registry).
    pub type_url: String,

    /// Formatter-specific configuration payload.
    /// Deserialized as the `Config` associated type of the registered [`IntoFormatter`](crate::IntoFormatter).
    #[serde(default = "default_config")]
    pub config: serde_json::Value,
}

fn default_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Empty configuration for formatters that need no parameters.
///
/// Accepts any JSON value (`{}`, `null`, etc.) and ignores it.
#[derive(Debug, Clone, Copy)]
pub struct UnitConfig;

impl<'de> Deserialize<'de> for UnitConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(UnitConfig)
    }
}
