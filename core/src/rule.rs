//! Mapping rules and constructor-argument extractors.
//!
//! A rule is "read from source, transform, write to target". Evaluation is split
//! in two so that the read half can run on worker threads while the target stays
//! exclusively borrowed by the caller:
//!
//! 1. [`MappingRule::extract`] reads and formats, returning a [`PendingWrite`] (or
//!    nothing if the value is absent);
//! 2. the executor applies the pending writes to the target.

use std::sync::Arc;

use crate::{
    ConstructorArgument, FieldType, FieldValue, MapperError, PropertyCatalog, PropertyDescriptor,
};

/// A value transformation applied between read and write in catalog-driven rules.
///
/// Returning [`FieldValue::None`] skips the write.
pub type Formatter = Arc<dyn Fn(FieldValue) -> FieldValue + Send + Sync>;

/// The write half of a rule, already holding its value.
pub(crate) type PendingWrite<T> = Box<dyn FnOnce(&mut T) -> Result<(), MapperError> + Send>;

type BoxedExtractor<S, T> = Box<dyn Fn(&S) -> Option<PendingWrite<T>> + Send + Sync>;

type BoxedArgument<S> = Box<dyn Fn(&S) -> FieldValue + Send + Sync>;

/// One declared or discovered field rule.
pub(crate) struct MappingRule<S, T> {
    label: String,
    extract: BoxedExtractor<S, T>,
}

impl<S: 'static, T: 'static> MappingRule<S, T> {
    /// A rule built from caller closures.
    pub(crate) fn manual<D, D1, E, A, F>(
        label: String,
        extractor: E,
        applier: A,
        formatter: F,
    ) -> Self
    where
        E: Fn(&S) -> Option<D> + Send + Sync + 'static,
        A: Fn(&mut T, D1) + Send + Sync + 'static,
        F: Fn(D) -> D1 + Send + Sync + 'static,
        D1: Send + 'static,
    {
        let applier = Arc::new(applier);
        Self {
            label,
            extract: Box::new(move |source: &S| {
                let value = formatter(extractor(source)?);
                let applier = Arc::clone(&applier);
                let write: PendingWrite<T> = Box::new(move |target: &mut T| {
                    applier(target, value);
                    Ok(())
                });
                Some(write)
            }),
        }
    }

    /// A rule that reads and writes through property catalogs.
    pub(crate) fn property(
        source_catalog: Arc<dyn PropertyCatalog<S>>,
        from: PropertyDescriptor,
        target_catalog: Arc<dyn PropertyCatalog<T>>,
        to: PropertyDescriptor,
        formatter: Option<Formatter>,
    ) -> Self {
        let label = if from.name == to.name {
            from.name.clone()
        } else {
            format!("{} -> {}", from.name, to.name)
        };
        let to = Arc::new(to);
        Self {
            label,
            extract: Box::new(move |source: &S| {
                let mut value = source_catalog.read(source, &from);
                if let Some(formatter) = &formatter {
                    if !value.is_none() {
                        value = formatter(value);
                    }
                }
                if value.is_none() {
                    return None;
                }
                let catalog = Arc::clone(&target_catalog);
                let to = Arc::clone(&to);
                let write: PendingWrite<T> =
                    Box::new(move |target: &mut T| catalog.write(target, &to, value));
                Some(write)
            }),
        }
    }
}

impl<S, T> MappingRule<S, T> {
    /// Read and format; `None` means the write is skipped.
    pub(crate) fn extract(&self, source: &S) -> Option<PendingWrite<T>> {
        (self.extract)(source)
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

/// One positional constructor argument extractor.
pub(crate) struct ConstructorArg<S> {
    extract: BoxedArgument<S>,
    kind: Option<String>,
}

impl<S: 'static> ConstructorArg<S> {
    pub(crate) fn new<D, E>(extractor: E, kind: Option<String>) -> Self
    where
        E: Fn(&S) -> D + Send + Sync + 'static,
        D: FieldType,
    {
        Self {
            extract: Box::new(move |source: &S| extractor(source).into_value()),
            kind,
        }
    }

    pub(crate) fn from_property(
        catalog: Arc<dyn PropertyCatalog<S>>,
        property: PropertyDescriptor,
        kind: Option<String>,
    ) -> Self {
        Self {
            extract: Box::new(move |source: &S| catalog.read(source, &property)),
            kind,
        }
    }
}

impl<S> ConstructorArg<S> {
    pub(crate) fn argument(&self, source: &S) -> ConstructorArgument {
        let value = (self.extract)(source);
        match &self.kind {
            Some(kind) => ConstructorArgument::typed(value, kind.clone()),
            None => ConstructorArgument::new(value),
        }
    }
}
