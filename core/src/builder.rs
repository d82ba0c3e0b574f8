//! `MapperBuilder`: Declaration phase of a mapper.
//!
//! Rules accumulate here; [`build()`](MapperBuilder::build) consumes the builder
//! into an immutable [`Mapper`], so no rule can be added once mapping has started.
//!
//! # Three ways to declare rules
//!
//! | Method | Reads with | Writes with | Type check |
//! |--------|-----------|-------------|------------|
//! | [`declare`](MapperBuilder::declare) / [`declare_with`](MapperBuilder::declare_with) | closure | closure | compiler |
//! | [`declare_property`](MapperBuilder::declare_property) | source catalog | target catalog | none (checked on write) |
//! | [`declare_automatic`](MapperBuilder::declare_automatic) | source catalog | target catalog | [`check_compatible`](crate::check_compatible) |
//!
//! Every call adds a rule. Nothing is de-duplicated, so exclude fields from
//! automatic discovery when they are declared manually.

use std::sync::Arc;

use tracing::debug;

use crate::{
    check_compatible,
    execution::{ExecutionConfig, Executor},
    rule::{ConstructorArg, MappingRule},
    FieldType, Formatter, Mapper, MapperError, PropertyCatalog, PropertyDescriptor, TypeBinding,
};

/// Builder for a [`Mapper<S, T>`](Mapper).
///
/// # Example
///
/// ```
/// use mapperz::prelude::*;
///
/// #[derive(Debug)]
/// struct Order { id: i64, note: Option<String> }
///
/// #[derive(Debug, Default, PartialEq)]
/// struct OrderDto { id: i64, note: String, code: i64 }
///
/// let mapper = MapperBuilder::new(TypeBinding::<Order>::new(), TypeBinding::<OrderDto>::defaulted())
///     .declare(|o: &Order| Some(o.id), |d: &mut OrderDto, id| d.id = id)
///     .declare(|o: &Order| o.note.clone(), |d: &mut OrderDto, note| d.note = note)
///     .declare_with(
///         |o: &Order| o.note.clone(),
///         |d: &mut OrderDto, code| d.code = code,
///         |note: String| note.len() as i64,
///     )
///     .build()
///     .unwrap();
///
/// let dto = mapper.map(Some(&Order { id: 7, note: None })).unwrap().unwrap();
/// assert_eq!(dto, OrderDto { id: 7, note: String::new(), code: 0 });
/// ```
pub struct MapperBuilder<S, T> {
    source: TypeBinding<S>,
    target: TypeBinding<T>,
    rules: Vec<MappingRule<S, T>>,
    constructor_args: Vec<ConstructorArg<S>>,
    execution: ExecutionConfig,
}

impl<S: 'static, T: 'static> MapperBuilder<S, T> {
    /// Create a builder for the given source and target bindings.
    #[must_use]
    pub fn new(source: TypeBinding<S>, target: TypeBinding<T>) -> Self {
        debug!(source = source.name(), target = target.name(), "new mapper");
        Self {
            source,
            target,
            rules: Vec::new(),
            constructor_args: Vec::new(),
            execution: ExecutionConfig::default(),
        }
    }

    /// Create a builder from bindings resolved at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MissingType`] if either binding is absent.
    pub fn init(
        source: Option<TypeBinding<S>>,
        target: Option<TypeBinding<T>>,
    ) -> Result<Self, MapperError> {
        let source = source.ok_or(MapperError::MissingType { side: "source" })?;
        let target = target.ok_or(MapperError::MissingType { side: "target" })?;
        Ok(Self::new(source, target))
    }

    /// Append one constructor argument, read by `extractor`.
    ///
    /// The argument's kind is the runtime kind of the extracted value. Any
    /// declared constructor argument switches the mapper into constructor mode:
    /// targets are built from the arguments and the target supplier is ignored.
    #[must_use]
    pub fn declare_in_constructor<D, E>(mut self, extractor: E) -> Self
    where
        E: Fn(&S) -> D + Send + Sync + 'static,
        D: FieldType,
    {
        self.constructor_args.push(ConstructorArg::new(extractor, None));
        self
    }

    /// Append one constructor argument with an explicitly declared kind.
    ///
    /// Use this when the value may be absent: an absent value has kind `"none"`
    /// and would match no constructor otherwise.
    #[must_use]
    pub fn declare_in_constructor_as<D, E>(mut self, extractor: E, kind: &str) -> Self
    where
        E: Fn(&S) -> D + Send + Sync + 'static,
        D: FieldType,
    {
        self.constructor_args
            .push(ConstructorArg::new(extractor, Some(kind.to_owned())));
        self
    }

    /// Append one constructor argument read from a source property by name.
    ///
    /// # Errors
    ///
    /// - [`MapperError::MissingCatalog`]: the source binding has no catalog
    /// - [`MapperError::UnknownProperty`]: no readable property named `from`
    pub fn declare_property_in_constructor(
        mut self,
        from: &str,
        kind: Option<&str>,
    ) -> Result<Self, MapperError> {
        let catalog = Self::catalog_of(&self.source)?;
        let property = Self::readable(&*catalog, from)?;
        self.constructor_args.push(ConstructorArg::from_property(
            catalog,
            property,
            kind.map(str::to_owned),
        ));
        Ok(self)
    }

    /// Declare a rule copying `extractor`'s value into `applier`.
    ///
    /// When `extractor` returns `None` the write is skipped and the target keeps
    /// whatever value it already had.
    #[must_use]
    pub fn declare<D, E, A>(self, extractor: E, applier: A) -> Self
    where
        E: Fn(&S) -> Option<D> + Send + Sync + 'static,
        A: Fn(&mut T, D) + Send + Sync + 'static,
        D: Send + 'static,
    {
        self.declare_with(extractor, applier, std::convert::identity)
    }

    /// Declare a rule that transforms the extracted value with `formatter`
    /// before `applier` writes it.
    #[must_use]
    pub fn declare_with<D, D1, E, A, F>(mut self, extractor: E, applier: A, formatter: F) -> Self
    where
        E: Fn(&S) -> Option<D> + Send + Sync + 'static,
        A: Fn(&mut T, D1) + Send + Sync + 'static,
        F: Fn(D) -> D1 + Send + Sync + 'static,
        D1: Send + 'static,
    {
        let label = format!("rule#{}", self.rules.len());
        debug!(rule = %label, "declared manual rule");
        self.rules
            .push(MappingRule::manual(label, extractor, applier, formatter));
        self
    }

    /// Declare a rule between two properties named through the catalogs.
    ///
    /// Like [`declare`](Self::declare), no type compatibility is checked: a value
    /// the target property cannot hold fails when written.
    ///
    /// # Errors
    ///
    /// - [`MapperError::MissingCatalog`]: either binding has no catalog
    /// - [`MapperError::UnknownProperty`]: no readable `from` or no writable `to`
    pub fn declare_property(
        mut self,
        from: &str,
        to: &str,
        formatter: Option<Formatter>,
    ) -> Result<Self, MapperError> {
        let source_catalog = Self::catalog_of(&self.source)?;
        let target_catalog = Self::catalog_of(&self.target)?;
        let from = Self::readable(&*source_catalog, from)?;
        let to = Self::writable(&*target_catalog, to)?;
        debug!(from = %from.name, to = %to.name, formatted = formatter.is_some(), "declared property rule");
        self.rules.push(MappingRule::property(
            source_catalog,
            from,
            target_catalog,
            to,
            formatter,
        ));
        Ok(self)
    }

    /// Discover rules for every source property with a same-named target property.
    ///
    /// # Errors
    ///
    /// See [`declare_automatic_excluding`](Self::declare_automatic_excluding).
    pub fn declare_automatic(self) -> Result<Self, MapperError> {
        self.declare_automatic_excluding::<&str>(&[])
    }

    /// Discover rules for every readable source property that is not in
    /// `excluded` and has a writable target property of the same name.
    ///
    /// Excluded properties and properties missing on the target are skipped
    /// without error.
    ///
    /// # Errors
    ///
    /// - [`MapperError::MissingCatalog`]: either binding has no catalog
    /// - [`MapperError::IncompatibleFieldTypes`]: a matched pair fails
    ///   [`check_compatible`]; no rule of this call is kept
    pub fn declare_automatic_excluding<N: AsRef<str>>(
        mut self,
        excluded: &[N],
    ) -> Result<Self, MapperError> {
        let source_catalog = Self::catalog_of(&self.source)?;
        let target_catalog = Self::catalog_of(&self.target)?;
        let target_properties = target_catalog.properties();

        let mut discovered = Vec::new();
        for from in source_catalog.properties() {
            let Some(getter) = from.read_type.as_ref() else {
                continue;
            };
            if excluded.iter().any(|name| name.as_ref() == from.name) {
                debug!(field = %from.name, "excluded from automatic mapping");
                continue;
            }
            let Some(to) = target_properties
                .iter()
                .find(|p| p.name == from.name && p.is_writable())
            else {
                debug!(field = %from.name, target = target_catalog.type_name(), "no target counterpart");
                continue;
            };
            if let Some(setter) = to.write_type.as_ref() {
                check_compatible(&from.name, getter, setter)?;
            }
            discovered.push((from, to.clone()));
        }

        debug!(
            source = source_catalog.type_name(),
            target = target_catalog.type_name(),
            rules = discovered.len(),
            "automatic mapping discovered"
        );
        for (from, to) in discovered {
            self.rules.push(MappingRule::property(
                Arc::clone(&source_catalog),
                from,
                Arc::clone(&target_catalog),
                to,
                None,
            ));
        }
        Ok(self)
    }

    /// Set how the mapper spreads work over threads.
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Number of rules declared so far.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of constructor arguments declared so far.
    #[must_use]
    pub fn constructor_arg_count(&self) -> usize {
        self.constructor_args.len()
    }

    /// Freeze the declarations into a [`Mapper`].
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::ThreadPool`] if a dedicated worker pool was
    /// requested and could not be started.
    pub fn build(self) -> Result<Mapper<S, T>, MapperError> {
        let executor = Executor::new(&self.execution)?;
        debug!(
            source = self.source.name(),
            target = self.target.name(),
            rules = self.rules.len(),
            constructor_args = self.constructor_args.len(),
            "mapper ready"
        );
        Ok(Mapper::new(
            self.source,
            self.target,
            self.rules,
            self.constructor_args,
            executor,
        ))
    }

    fn catalog_of<X>(binding: &TypeBinding<X>) -> Result<Arc<dyn PropertyCatalog<X>>, MapperError> {
        binding
            .catalog()
            .cloned()
            .ok_or_else(|| MapperError::MissingCatalog {
                type_name: binding.name().to_owned(),
            })
    }

    fn readable<X>(
        catalog: &dyn PropertyCatalog<X>,
        name: &str,
    ) -> Result<PropertyDescriptor, MapperError> {
        catalog
            .property(name)
            .filter(PropertyDescriptor::is_readable)
            .ok_or_else(|| MapperError::UnknownProperty {
                type_name: catalog.type_name().to_owned(),
                property: name.to_owned(),
                access: "readable",
            })
    }

    fn writable<X>(
        catalog: &dyn PropertyCatalog<X>,
        name: &str,
    ) -> Result<PropertyDescriptor, MapperError> {
        catalog
            .property(name)
            .filter(PropertyDescriptor::is_writable)
            .ok_or_else(|| MapperError::UnknownProperty {
                type_name: catalog.type_name().to_owned(),
                property: name.to_owned(),
                access: "writable",
            })
    }
}

impl<S, T> std::fmt::Debug for MapperBuilder<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperBuilder")
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field(
                "rules",
                &self.rules.iter().map(MappingRule::label).collect::<Vec<_>>(),
            )
            .field("constructor_args", &self.constructor_args.len())
            .field("execution", &self.execution)
            .finish()
    }
}
