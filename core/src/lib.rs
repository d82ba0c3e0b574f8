//! mapperz - Declarative object-to-object field mapping
//!
//! A mapping engine that copies, transforms and constructs values from a source
//! type `S` into a target type `T` following declared or discovered rules.
//!
//! # Architecture
//!
//! The engine never inspects user types on its own. Two injected seams describe them:
//!
//! - [`PropertyCatalog<T>`]: Lists a type's properties and reads/writes them as [`FieldValue`]s
//! - [`Instantiate<T>`]: Builds instances from positional [`ConstructorArgument`]s
//!
//! Both live on a [`TypeBinding<T>`], one per side of a mapper. Rules are then declared
//! on a [`MapperBuilder<S, T>`] and frozen into a [`Mapper<S, T>`]:
//!
//! - [`MapperBuilder::declare`]: Closure rules, type-checked by the compiler
//! - [`MapperBuilder::declare_property`]: Rules between named catalog properties
//! - [`MapperBuilder::declare_automatic`]: One rule per same-named property pair,
//!   validated with [`check_compatible`]
//! - [`MapperBuilder::declare_in_constructor`]: Positional constructor arguments
//!
//! # Key Design Insights
//!
//! 1. **`None` skips the write**: An extractor that yields nothing leaves the
//!    target's current value in place.
//!
//! 2. **Two-phase rules**: Extraction runs on rayon workers; writes are applied
//!    on the calling thread, which holds the only `&mut T`.
//!
//! 3. **Constructor mode wins**: Once a constructor argument is declared, targets
//!    come from the matching constructor and any supplier is ignored.
//!
//! # Example
//!
//! ```
//! use mapperz::prelude::*;
//!
//! #[derive(Debug)]
//! struct Movie { id: i32, rating: Option<String> }
//!
//! #[derive(Debug, Default)]
//! struct MovieDto { id: i32, rating: i32 }
//!
//! let mapper = MapperBuilder::new(TypeBinding::<Movie>::new(), TypeBinding::<MovieDto>::defaulted())
//!     .declare(|m: &Movie| Some(m.id), |d: &mut MovieDto, id| d.id = id)
//!     .declare_with(
//!         |m: &Movie| m.rating.clone(),
//!         |d: &mut MovieDto, rating| d.rating = rating,
//!         |rating: String| rating.parse::<i32>().unwrap_or_default() + 40,
//!     )
//!     .build()?;
//!
//! let dto = mapper.map(Some(&Movie { id: 7, rating: Some("20".into()) }))?.unwrap();
//! assert_eq!((dto.id, dto.rating), (7, 60));
//! # Ok::<(), mapperz::MapperError>(())
//! ```
//!
//! # Extensions
//!
//! - Feature `serde`: `Deserialize` for [`ExecutionConfig`], [`PropertyDescriptor`],
//!   [`TypeDescriptor`] and [`FieldValue`]
//! - Feature `registry`: Config-driven mappers via `Registry::load_mapper`
//! - [`mapperz-test`](https://docs.rs/mapperz-test): Dynamic record domain for conformance (internal)

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod binding;
mod builder;
mod catalog;
mod descriptor;
mod execution;
mod instantiate;
mod mapper;
mod rule;
mod value;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use binding::TypeBinding;
pub use builder::MapperBuilder;
pub use catalog::{PropertyCatalog, PropertyDescriptor};
pub use descriptor::{check_compatible, TypeDescriptor};
pub use execution::ExecutionConfig;
pub use instantiate::{
    Arguments, BoxError, ConstructorArgument, ConstructorTable, DefaultConstructor, Instantiate,
    InstantiationError,
};
pub use mapper::Mapper;
pub use rule::Formatter;
pub use value::{CustomFieldValue, FieldType, FieldValue};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{
    AutomaticConfig, ConstructorArgConfig, MapperConfig, RuleConfig, TypedConfig, UnitConfig,
};
#[cfg(feature = "registry")]
pub use registry::{
    register_core_formatters, AddInt, AddIntConfig, Constant, ConstantConfig, IntoFormatter,
    ParseInt, Registry, RegistryBuilder, ToText,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use mapperz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Construction
        ConstructorArgument,
        ConstructorTable,
        DefaultConstructor,
        // Config
        ExecutionConfig,
        // Values
        FieldType,
        FieldValue,
        Formatter,
        // Traits
        Instantiate,
        // Core types
        Mapper,
        MapperBuilder,
        // Errors
        MapperError,
        PropertyCatalog,
        PropertyDescriptor,
        TypeBinding,
        TypeDescriptor,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Default minimum number of work items that are spread over threads.
///
/// Below it, rules (and batch sources) run on the calling thread, where forking
/// would cost more than the work itself.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// Message of every [`MapperError::Instantiation`].
pub const INSTANTIATION_GUIDANCE: &str = "Be sure to provide arguments in constructor in the \
    right order when you use declare_in_constructor() or when you have an output type with \
    no default constructor.";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from mapper declaration, configuration and mapping.
///
/// Everything except [`Instantiation`](Self::Instantiation) and
/// [`PropertyWrite`](Self::PropertyWrite) is raised while declaring rules or
/// loading config, before any source is mapped.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A source or target binding was not supplied.
    #[error("{side} type binding is missing")]
    MissingType {
        /// `"source"` or `"target"`.
        side: &'static str,
    },

    /// A catalog-driven declaration was made on a binding without a catalog.
    #[error("`{type_name}` has no property catalog; bind one to use automatic or name-based rules")]
    MissingCatalog {
        /// Name of the binding lacking a catalog.
        type_name: String,
    },

    /// Automatic discovery matched two properties whose generic shapes differ.
    #[error(
        "Mapping between '{field}' fields cannot be achieved because types differ from \
         {getter_type} to {setter_type}\n\
         - Rename this field to avoid automatic mapping or declare it manually with declare()\n\
         Note: exclude the field from automatic mapping with declare_automatic_excluding() \
         after declaring it manually"
    )]
    IncompatibleFieldTypes {
        /// Property name.
        field: String,
        /// Rendered source read type.
        getter_type: String,
        /// Rendered target write type.
        setter_type: String,
    },

    /// A name-based declaration referenced a property the catalog lacks.
    #[error("`{type_name}` has no {access} property \"{property}\"")]
    UnknownProperty {
        /// Name of the catalog's type.
        type_name: String,
        /// The requested property name.
        property: String,
        /// `"readable"` or `"writable"`.
        access: &'static str,
    },

    /// A catalog rejected a value during mapping.
    #[error("cannot write {actual} value into property \"{property}\" of type {expected}")]
    PropertyWrite {
        /// Property being written.
        property: String,
        /// Type the property accepts.
        expected: String,
        /// Kind of the rejected value.
        actual: String,
    },

    /// The target could not be instantiated.
    #[error("{}", INSTANTIATION_GUIDANCE)]
    Instantiation {
        /// What the instantiator reported.
        #[source]
        source: InstantiationError,
    },

    /// A dedicated worker pool could not be started.
    #[error("failed to start mapper worker pool: {source}")]
    ThreadPool {
        /// The rayon error.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    /// Configuration deserialization or construction failed.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// The underlying error message.
        message: String,
    },

    /// A name was not found in a registry.
    #[error("unknown {registry} \"{name}\"{}", available_suffix(.registry, .available))]
    UnknownName {
        /// The unregistered name.
        name: String,
        /// Which registry was searched (`"type"` or `"formatter"`).
        registry: &'static str,
        /// Names that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
}

fn available_suffix(registry: &str, available: &[String]) -> String {
    if available.is_empty() {
        format!(" (no {registry} names are registered)")
    } else {
        format!(" (registered: {})", available.join(", "))
    }
}
