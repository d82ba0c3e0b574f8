//! `Mapper`: Ready phase: turns source instances into target instances.
//!
//! A mapping call runs in three steps:
//!
//! 1. **Instantiate** the target, either from the constructor arguments (when any
//!    were declared) or from the supplier.
//! 2. **Extract** every rule against the source, possibly on worker threads.
//! 3. **Write** the extracted values into the target on the calling thread.
//!
//! A failed instantiation or write aborts the call; no partially mapped target
//! is ever returned.

use tracing::trace;

use crate::{
    execution::Executor,
    rule::{ConstructorArg, MappingRule},
    ConstructorArgument, InstantiationError, MapperError, TypeBinding,
};

/// Immutable mapper from `S` to `T`, produced by
/// [`MapperBuilder::build`](crate::MapperBuilder::build).
///
/// `Mapper` is `Send + Sync`; share it behind an `Arc` and call it from any
/// number of threads. Every call produces its own target.
pub struct Mapper<S, T> {
    source: TypeBinding<S>,
    target: TypeBinding<T>,
    rules: Vec<MappingRule<S, T>>,
    constructor_args: Vec<ConstructorArg<S>>,
    executor: Executor,
}

impl<S, T> Mapper<S, T> {
    pub(crate) fn new(
        source: TypeBinding<S>,
        target: TypeBinding<T>,
        rules: Vec<MappingRule<S, T>>,
        constructor_args: Vec<ConstructorArg<S>>,
        executor: Executor,
    ) -> Self {
        Self {
            source,
            target,
            rules,
            constructor_args,
            executor,
        }
    }

    /// The source binding.
    #[must_use]
    pub fn source(&self) -> &TypeBinding<S> {
        &self.source
    }

    /// The target binding.
    #[must_use]
    pub fn target(&self) -> &TypeBinding<T> {
        &self.target
    }

    /// Number of rules, manual and discovered.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of declared constructor arguments.
    #[must_use]
    pub fn constructor_arg_count(&self) -> usize {
        self.constructor_args.len()
    }

    /// Returns `true` if targets are built from constructor arguments.
    #[must_use]
    pub fn is_constructor_mode(&self) -> bool {
        !self.constructor_args.is_empty()
    }

    fn instantiate(&self, args: Vec<ConstructorArgument>) -> Result<T, MapperError> {
        let instantiator =
            self.target
                .instantiator()
                .ok_or_else(|| MapperError::Instantiation {
                    source: InstantiationError::Unbound {
                        type_name: self.target.name().to_owned(),
                    },
                })?;
        instantiator
            .construct(args)
            .map_err(|source| MapperError::Instantiation { source })
    }
}

impl<S: Sync, T> Mapper<S, T> {
    /// Map `source` onto a target built by the target's default constructor.
    ///
    /// Returns `Ok(None)` for a `None` source without constructing anything.
    ///
    /// # Errors
    ///
    /// - [`MapperError::Instantiation`]: no constructor fits, or none is bound
    /// - [`MapperError::PropertyWrite`]: a catalog rejected a written value
    pub fn map(&self, source: Option<&S>) -> Result<Option<T>, MapperError> {
        let Some(source) = source else {
            return Ok(None);
        };
        self.run(source, || self.instantiate(Vec::new())).map(Some)
    }

    /// Map `source` onto the target returned by `supplier`.
    ///
    /// In constructor mode the target is built from the constructor arguments and
    /// `supplier` is never called.
    ///
    /// # Errors
    ///
    /// Same as [`map`](Self::map).
    pub fn map_with<F>(&self, source: Option<&S>, supplier: F) -> Result<Option<T>, MapperError>
    where
        F: FnOnce() -> T,
    {
        let Some(source) = source else {
            return Ok(None);
        };
        self.run(source, || Ok(supplier())).map(Some)
    }

    fn run<F>(&self, source: &S, supplier: F) -> Result<T, MapperError>
    where
        F: FnOnce() -> Result<T, MapperError>,
    {
        let mut target = if self.constructor_args.is_empty() {
            supplier()?
        } else {
            let args = self
                .executor
                .collect(&self.constructor_args, |arg| arg.argument(source));
            trace!(
                target = self.target.name(),
                kinds = ?args.iter().map(|a| a.kind.as_str()).collect::<Vec<_>>(),
                "instantiating from constructor arguments"
            );
            self.instantiate(args)?
        };

        let pending = self
            .executor
            .collect(&self.rules, |rule| rule.extract(source));

        let mut skipped = 0usize;
        for (rule, write) in self.rules.iter().zip(pending) {
            match write {
                Some(write) => write(&mut target)?,
                None => {
                    skipped += 1;
                    trace!(rule = rule.label(), "absent value, write skipped");
                }
            }
        }
        trace!(
            source = self.source.name(),
            target = self.target.name(),
            rules = self.rules.len(),
            skipped,
            "mapped"
        );
        Ok(target)
    }
}

impl<S: Sync, T: Send> Mapper<S, T> {
    /// Map every element of `sources`, keeping their order.
    ///
    /// Sources are spread over the mapper's threads when there are at least
    /// `parallel_threshold` of them.
    ///
    /// # Errors
    ///
    /// The first error in input order; no targets are returned in that case.
    pub fn map_all(&self, sources: &[S]) -> Result<Vec<T>, MapperError> {
        self.executor
            .collect(sources, |source| {
                self.run(source, || self.instantiate(Vec::new()))
            })
            .into_iter()
            .collect()
    }
}

impl<S, T> std::fmt::Debug for Mapper<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field(
                "rules",
                &self.rules.iter().map(MappingRule::label).collect::<Vec<_>>(),
            )
            .field("constructor_args", &self.constructor_args.len())
            .field("executor", &self.executor)
            .finish()
    }
}
