//! Type and formatter registry for config-driven mapper construction.
//!
//! The registry enables **generic config loading**: JSON/YAML config -> built
//! `Mapper<S, T>` without per-mapper wiring code.
//!
//! # Two registration seams
//!
//! | Seam | Registered as | Builder method | Resolved from |
//! |------|---------------|----------------|---------------|
//! | Types | [`TypeBinding<X>`] | `builder.type_binding(binding)` | [`MapperConfig::source`] / [`MapperConfig::target`] |
//! | Formatters | [`IntoFormatter`] | `builder.formatter::<F>(name)` | [`TypedConfig::type_url`] |
//!
//! Bindings of any `X` share one table: each is stored type-erased and
//! downcast back to `TypeBinding<X>` when a mapper over `X` is loaded.
//! Formatter types are monomorphized into a factory closure at registration and
//! erased behind `Box<dyn Fn>`; the closure deserializes the formatter's own
//! config shape at load time.
//!
//! # Example
//!
//! ```ignore
//! let registry = register_core_formatters(RegistryBuilder::new())
//!     .type_binding(movie_binding())
//!     .type_binding(movie_dto_binding())
//!     .build();
//!
//! let config: MapperConfig = serde_json::from_str(json)?;
//! let mapper = registry.load_mapper::<Movie, MovieDto>(&config)?;
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::{MapperConfig, TypedConfig, UnitConfig},
    FieldValue, Formatter, Mapper, MapperBuilder, MapperError, TypeBinding,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Traits
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for formatter types that can be constructed from configuration.
///
/// Each formatter type knows its own config shape via the associated `Config` type.
/// The registry calls [`from_config`](Self::from_config) when a rule references it.
///
/// # Example
///
/// ```ignore
/// struct Uppercase;
///
/// impl IntoFormatter for Uppercase {
///     type Config = UnitConfig;
///     fn from_config(_: Self::Config) -> Result<Formatter, MapperError> {
///         Ok(Arc::new(|value: FieldValue| match value {
///             FieldValue::String(s) => FieldValue::String(s.to_uppercase()),
///             other => other,
///         }))
///     }
/// }
/// ```
pub trait IntoFormatter: Send + Sync + 'static {
    /// The configuration type deserialized from JSON/YAML.
    type Config: DeserializeOwned + Send + Sync;

    /// Construct a formatter from deserialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidConfig`] if the config is semantically invalid.
    fn from_config(config: Self::Config) -> Result<Formatter, MapperError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Type-erased factories
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-erased formatter factory closure.
type BoxedFormatterFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Formatter, MapperError> + Send + Sync>;

/// A `TypeBinding<X>` for some `X`.
type ErasedBinding = Box<dyn Any + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`Registry`].
///
/// Register type bindings and formatters by name, then call
/// [`build()`](Self::build) to produce an immutable `Registry`. Registering a
/// name twice keeps the later registration.
pub struct RegistryBuilder {
    types: HashMap<String, ErasedBinding>,
    formatter_factories: HashMap<String, BoxedFormatterFactory>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            formatter_factories: HashMap::new(),
        }
    }

    /// Register a type binding under its [name](TypeBinding::name).
    #[must_use]
    pub fn type_binding<X: 'static>(mut self, binding: TypeBinding<X>) -> Self {
        debug!(name = binding.name(), "registered type binding");
        self.types
            .insert(binding.name().to_owned(), Box::new(binding));
        self
    }

    /// Register a formatter type under `name`.
    ///
    /// The concrete type `F` is monomorphized here and erased behind a closure.
    /// At load time, the registry deserializes config as `F::Config` and calls
    /// `F::from_config()` to produce the formatter.
    #[must_use]
    pub fn formatter<F: IntoFormatter>(mut self, name: &str) -> Self {
        self.formatter_factories.insert(
            name.to_owned(),
            Box::new(|value: &serde_json::Value| {
                let config: F::Config = serde_json::from_value(value.clone()).map_err(|e| {
                    MapperError::InvalidConfig {
                        message: e.to_string(),
                    }
                })?;
                F::from_config(config)
            }),
        );
        self
    }

    /// Freeze the registry. No further registration is possible.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            types: self.types,
            formatter_factories: self.formatter_factories,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the built-in formatters.
///
/// | Name | Formatter |
/// |------|-----------|
/// | `mapperz.core.v1.ParseInt` | [`ParseInt`] |
/// | `mapperz.core.v1.AddInt` | [`AddInt`] |
/// | `mapperz.core.v1.ToString` | [`ToText`] |
/// | `mapperz.core.v1.Constant` | [`Constant`] |
#[must_use]
pub fn register_core_formatters(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .formatter::<ParseInt>("mapperz.core.v1.ParseInt")
        .formatter::<AddInt>("mapperz.core.v1.AddInt")
        .formatter::<ToText>("mapperz.core.v1.ToString")
        .formatter::<Constant>("mapperz.core.v1.Constant")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Built-in formatters
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses a string into an integer. Integers pass through; anything else,
/// unparseable strings included, becomes `None` and the write is skipped.
#[derive(Debug, Clone, Copy)]
pub struct ParseInt;

impl IntoFormatter for ParseInt {
    type Config = UnitConfig;

    fn from_config(_: Self::Config) -> Result<Formatter, MapperError> {
        Ok(Arc::new(|value: FieldValue| match value {
            FieldValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map_or(FieldValue::None, FieldValue::Int),
            FieldValue::Int(i) => FieldValue::Int(i),
            _ => FieldValue::None,
        }))
    }
}

/// Config for [`AddInt`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddIntConfig {
    /// Added to every integer.
    pub amount: i64,
}

/// Adds a fixed amount to integers (saturating). Non-integers become `None`.
#[derive(Debug, Clone, Copy)]
pub struct AddInt;

impl IntoFormatter for AddInt {
    type Config = AddIntConfig;

    fn from_config(config: Self::Config) -> Result<Formatter, MapperError> {
        let amount = config.amount;
        Ok(Arc::new(move |value: FieldValue| match value {
            FieldValue::Int(i) => FieldValue::Int(i.saturating_add(amount)),
            _ => FieldValue::None,
        }))
    }
}

/// Renders scalars as strings. Lists, maps, bytes and custom values become `None`.
#[derive(Debug, Clone, Copy)]
pub struct ToText;

impl IntoFormatter for ToText {
    type Config = UnitConfig;

    fn from_config(_: Self::Config) -> Result<Formatter, MapperError> {
        Ok(Arc::new(|value: FieldValue| match value {
            FieldValue::String(s) => FieldValue::String(s),
            FieldValue::Int(i) => FieldValue::String(i.to_string()),
            FieldValue::Float(f) => FieldValue::String(f.to_string()),
            FieldValue::Bool(b) => FieldValue::String(b.to_string()),
            _ => FieldValue::None,
        }))
    }
}

/// Config for [`Constant`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstantConfig {
    /// Written in place of every present value. `null` skips the write.
    pub value: FieldValue,
}

/// Replaces every present value with a fixed one.
#[derive(Debug, Clone, Copy)]
pub struct Constant;

impl IntoFormatter for Constant {
    type Config = ConstantConfig;

    fn from_config(config: Self::Config) -> Result<Formatter, MapperError> {
        let value = config.value;
        Ok(Arc::new(move |_| value.clone()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable registry of type bindings and formatter factories.
///
/// Constructed via [`RegistryBuilder`]. Use [`load_mapper()`](Self::load_mapper)
/// to turn config into a built `Mapper`.
pub struct Registry {
    types: HashMap<String, ErasedBinding>,
    formatter_factories: HashMap<String, BoxedFormatterFactory>,
}

impl Registry {
    /// Load a `Mapper` from configuration.
    ///
    /// Declarations are made in this order: constructor arguments, automatic
    /// discovery, then name-based rules.
    ///
    /// # Errors
    ///
    /// - [`MapperError::UnknownName`]: `source` or `target` is not registered
    /// - [`MapperError::InvalidConfig`]: a name is registered for a different Rust
    ///   type, or formatter config deserialization failed
    /// - [`MapperError::UnknownName`]: formatter `type_url` not registered
    /// - [`MapperError::UnknownProperty`], [`MapperError::MissingCatalog`],
    ///   [`MapperError::IncompatibleFieldTypes`]: from the declarations
    /// - [`MapperError::ThreadPool`]: the configured pool could not start
    pub fn load_mapper<S: 'static, T: 'static>(
        &self,
        config: &MapperConfig,
    ) -> Result<Mapper<S, T>, MapperError> {
        let source = self.resolve::<S>(&config.source)?;
        let target = self.resolve::<T>(&config.target)?;
        let mut builder =
            MapperBuilder::new(source, target).with_execution(config.execution.clone());

        for arg in &config.constructor {
            builder = builder.declare_property_in_constructor(&arg.from, arg.kind.as_deref())?;
        }
        if let Some(automatic) = &config.automatic {
            builder = builder.declare_automatic_excluding(automatic.exclude.as_slice())?;
        }
        for rule in &config.rules {
            let formatter = rule
                .formatter
                .as_ref()
                .map(|f| self.load_formatter(f))
                .transpose()?;
            builder = builder.declare_property(&rule.from, &rule.to, formatter)?;
        }
        builder.build()
    }

    /// Construct a registered formatter from its typed config.
    ///
    /// # Errors
    ///
    /// - [`MapperError::UnknownName`]: `type_url` not registered
    /// - [`MapperError::InvalidConfig`]: the payload does not fit the formatter's config
    pub fn load_formatter(&self, config: &TypedConfig) -> Result<Formatter, MapperError> {
        let factory = self
            .formatter_factories
            .get(&config.type_url)
            .ok_or_else(|| MapperError::UnknownName {
                name: config.type_url.clone(),
                registry: "formatter",
                available: sorted(self.formatter_factories.keys()),
            })?;
        factory(&config.config)
    }

    /// Look up the binding registered under `name` as a `TypeBinding<X>`.
    ///
    /// `Ok(None)` when nothing is registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidConfig`] when `name` is bound to another Rust type.
    pub fn binding<X: 'static>(&self, name: &str) -> Result<Option<TypeBinding<X>>, MapperError> {
        let Some(erased) = self.types.get(name) else {
            debug!(name, available = ?self.type_names(), "type binding not registered");
            return Ok(None);
        };
        erased
            .downcast_ref::<TypeBinding<X>>()
            .cloned()
            .map(Some)
            .ok_or_else(|| MapperError::InvalidConfig {
                message: format!(
                    "type \"{name}\" is not registered as `{}`",
                    std::any::type_name::<X>()
                ),
            })
    }

    fn resolve<X: 'static>(&self, name: &str) -> Result<TypeBinding<X>, MapperError> {
        self.binding::<X>(name)?
            .ok_or_else(|| MapperError::UnknownName {
                name: name.to_owned(),
                registry: "type",
                available: sorted(self.types.keys()),
            })
    }

    /// Returns the number of registered type bindings.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns the number of registered formatters.
    #[must_use]
    pub fn formatter_count(&self) -> usize {
        self.formatter_factories.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.formatter_factories.is_empty()
    }

    /// Returns `true` if a type binding is registered under `name`.
    #[must_use]
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns `true` if a formatter is registered under `name`.
    #[must_use]
    pub fn contains_formatter(&self, name: &str) -> bool {
        self.formatter_factories.contains_key(name)
    }

    /// Returns all registered type names (sorted).
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns all registered formatter names (sorted).
    #[must_use]
    pub fn formatter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatter_factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .field("formatters", &self.formatter_names())
            .finish()
    }
}

fn sorted<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut names: Vec<String> = names.cloned().collect();
    names.sort_unstable();
    names
}
