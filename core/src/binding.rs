//! `TypeBinding`: One side of a mapper: a type's name, catalog and instantiator.

use std::fmt;
use std::sync::Arc;

use crate::{DefaultConstructor, Instantiate, PropertyCatalog};

/// Everything the engine knows about a source or target type `T`.
///
/// - The **catalog** is needed for automatic discovery and name-based rules.
/// - The **instantiator** is needed on the target side, for default construction
///   and for constructor-argument mode.
///
/// Bindings are cheap to clone; catalog and instantiator are shared.
///
/// # Example
///
/// ```
/// use mapperz::TypeBinding;
///
/// #[derive(Debug, Default)]
/// struct OrderDto { id: i64 }
///
/// let binding = TypeBinding::<OrderDto>::defaulted().named("OrderDto");
/// assert_eq!(binding.name(), "OrderDto");
/// assert!(binding.instantiator().is_some());
/// assert!(binding.catalog().is_none());
/// ```
pub struct TypeBinding<T> {
    name: String,
    catalog: Option<Arc<dyn PropertyCatalog<T>>>,
    instantiator: Option<Arc<dyn Instantiate<T>>>,
}

impl<T: 'static> TypeBinding<T> {
    /// A binding with neither catalog nor instantiator, named after `T`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>().to_owned(),
            catalog: None,
            instantiator: None,
        }
    }

    /// Replace the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach a property catalog.
    #[must_use]
    pub fn with_catalog(self, catalog: impl PropertyCatalog<T> + 'static) -> Self {
        self.with_shared_catalog(Arc::new(catalog))
    }

    /// Attach an already shared property catalog.
    #[must_use]
    pub fn with_shared_catalog(mut self, catalog: Arc<dyn PropertyCatalog<T>>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Attach an instantiator.
    #[must_use]
    pub fn with_instantiator(self, instantiator: impl Instantiate<T> + 'static) -> Self {
        self.with_shared_instantiator(Arc::new(instantiator))
    }

    /// Attach an already shared instantiator.
    #[must_use]
    pub fn with_shared_instantiator(mut self, instantiator: Arc<dyn Instantiate<T>>) -> Self {
        self.instantiator = Some(instantiator);
        self
    }
}

impl<T: Default + 'static> TypeBinding<T> {
    /// A binding whose instantiator is [`DefaultConstructor`].
    #[must_use]
    pub fn defaulted() -> Self {
        Self::new().with_instantiator(DefaultConstructor)
    }
}

impl<T> TypeBinding<T> {
    /// Display name of the bound type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property catalog, if any.
    #[must_use]
    pub fn catalog(&self) -> Option<&Arc<dyn PropertyCatalog<T>>> {
        self.catalog.as_ref()
    }

    /// The instantiator, if any.
    #[must_use]
    pub fn instantiator(&self) -> Option<&Arc<dyn Instantiate<T>>> {
        self.instantiator.as_ref()
    }
}

impl<T: 'static> Default for TypeBinding<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypeBinding<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            catalog: self.catalog.clone(),
            instantiator: self.instantiator.clone(),
        }
    }
}

impl<T> fmt::Debug for TypeBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBinding")
            .field("name", &self.name)
            .field("catalog", &self.catalog)
            .field("instantiator", &self.instantiator)
            .finish()
    }
}
