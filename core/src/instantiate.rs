//! `Instantiate`: Building target instances from positional arguments
//!
//! Two strategies produce a target:
//!
//! - **Default construction**: zero arguments. This is what [`Mapper::map`](crate::Mapper::map)
//!   uses as its target supplier.
//! - **Constructor arguments**: one value per `declare_in_constructor` call, in
//!   declaration order. The constructor whose parameter kinds equal the argument
//!   kinds is chosen.
//!
//! [`DefaultConstructor`] covers the first for any `T: Default`; [`ConstructorTable`]
//! covers both for types with several constructors.

use std::fmt::{self, Debug};

use tracing::trace;

use crate::{FieldType, FieldValue};

/// Boxed error returned by constructor bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One positional constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorArgument {
    /// The extracted value.
    pub value: FieldValue,

    /// Kind used to select the constructor: the declared kind if one was given,
    /// otherwise the value's runtime kind.
    pub kind: String,
}

impl ConstructorArgument {
    /// An argument whose kind is the runtime kind of `value`.
    pub fn new(value: FieldValue) -> Self {
        let kind = value.kind().to_owned();
        Self { value, kind }
    }

    /// An argument with an explicitly declared kind. A `None` value keeps the
    /// declared kind, so it can still select the intended constructor.
    pub fn typed(value: FieldValue, kind: impl Into<String>) -> Self {
        Self {
            value,
            kind: kind.into(),
        }
    }
}

/// Reasons a target instance could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum InstantiationError {
    /// The target binding carries no instantiator.
    #[error("no instantiator is bound for `{type_name}`")]
    Unbound {
        /// Target type name.
        type_name: String,
    },

    /// No constructor accepts the given argument kinds.
    #[error("`{type_name}` has no constructor taking ({})", .kinds.join(", "))]
    NoMatchingConstructor {
        /// Target type name.
        type_name: String,
        /// Kinds of the supplied arguments, in order.
        kinds: Vec<String>,
    },

    /// The selected constructor ran and failed.
    #[error("constructor `{type_name}({})` failed: {source}", .kinds.join(", "))]
    Failed {
        /// Target type name.
        type_name: String,
        /// Parameter kinds of the constructor that failed.
        kinds: Vec<String>,
        /// What the constructor reported.
        #[source]
        source: BoxError,
    },
}

/// Builds instances of `T` from positional arguments.
///
/// # Thread Safety
///
/// Instantiators are shared by a mapper across threads and must be `Send + Sync`.
pub trait Instantiate<T>: Send + Sync + Debug {
    /// Build a `T` from `args`. An empty `args` asks for default construction.
    ///
    /// # Errors
    ///
    /// - [`InstantiationError::NoMatchingConstructor`]: no constructor accepts the argument kinds
    /// - [`InstantiationError::Failed`]: the constructor itself failed
    fn construct(&self, args: Vec<ConstructorArgument>) -> Result<T, InstantiationError>;
}

/// Zero-argument construction through [`Default`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructor;

impl<T: Default> Instantiate<T> for DefaultConstructor {
    fn construct(&self, args: Vec<ConstructorArgument>) -> Result<T, InstantiationError> {
        if args.is_empty() {
            Ok(T::default())
        } else {
            Err(InstantiationError::NoMatchingConstructor {
                type_name: std::any::type_name::<T>().to_owned(),
                kinds: args.into_iter().map(|a| a.kind).collect(),
            })
        }
    }
}

type BoxedConstructor<T> = Box<dyn Fn(Arguments) -> Result<T, BoxError> + Send + Sync>;

/// A set of constructors for `T`, selected by exact parameter kinds.
///
/// # Example
///
/// ```
/// use mapperz::{ConstructorArgument, ConstructorTable, FieldValue, Instantiate};
///
/// #[derive(Debug)]
/// struct Movie { id: i32, title: String }
///
/// let table = ConstructorTable::new("Movie").constructor(&["int", "string"], |mut args| {
///     Ok(Movie { id: args.next()?, title: args.next()? })
/// });
///
/// let movie = table
///     .construct(vec![
///         ConstructorArgument::new(FieldValue::Int(7)),
///         ConstructorArgument::new("Heat".into()),
///     ])
///     .unwrap();
/// assert_eq!(movie.id, 7);
///
/// // Wrong order: no constructor takes (string, int).
/// assert!(table
///     .construct(vec![
///         ConstructorArgument::new("Heat".into()),
///         ConstructorArgument::new(FieldValue::Int(7)),
///     ])
///     .is_err());
/// ```
pub struct ConstructorTable<T> {
    type_name: String,
    constructors: Vec<(Vec<String>, BoxedConstructor<T>)>,
}

impl<T> ConstructorTable<T> {
    /// Create an empty table for the named type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            constructors: Vec::new(),
        }
    }

    /// Register a constructor taking the given parameter kinds.
    ///
    /// A later registration with the same kinds shadows nothing: the first
    /// registered match wins.
    #[must_use]
    pub fn constructor<F>(mut self, params: &[&str], build: F) -> Self
    where
        F: Fn(Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructors.push((
            params.iter().map(|p| (*p).to_owned()).collect(),
            Box::new(build),
        ));
        self
    }

    /// Number of registered constructors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns `true` if no constructor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<T: Default + 'static> ConstructorTable<T> {
    /// Register the zero-argument constructor as `T::default()`.
    #[must_use]
    pub fn with_default(self) -> Self {
        self.constructor(&[], |_| Ok(T::default()))
    }
}

impl<T> Debug for ConstructorTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorTable")
            .field("type_name", &self.type_name)
            .field(
                "constructors",
                &self.constructors.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T> Instantiate<T> for ConstructorTable<T> {
    fn construct(&self, args: Vec<ConstructorArgument>) -> Result<T, InstantiationError> {
        let kinds: Vec<String> = args.iter().map(|a| a.kind.clone()).collect();
        let Some((params, build)) = self.constructors.iter().find(|(p, _)| *p == kinds) else {
            return Err(InstantiationError::NoMatchingConstructor {
                type_name: self.type_name.clone(),
                kinds,
            });
        };
        trace!(type_name = %self.type_name, ?params, "invoking constructor");
        let values = args.into_iter().map(|a| a.value).collect::<Vec<_>>();
        build(Arguments::new(values)).map_err(|source| InstantiationError::Failed {
            type_name: self.type_name.clone(),
            kinds: params.clone(),
            source,
        })
    }
}

/// Positional arguments handed to a [`ConstructorTable`] constructor.
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<FieldValue>,
    position: usize,
}

impl Arguments {
    fn new(values: Vec<FieldValue>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Take the next argument as a `V`.
    ///
    /// # Errors
    ///
    /// Fails when the arguments are exhausted or the value does not convert.
    #[allow(clippy::should_implement_trait)]
    pub fn next<V: FieldType>(&mut self) -> Result<V, BoxError> {
        let position = self.position;
        self.position += 1;
        let value = self
            .values
            .next()
            .ok_or_else(|| format!("missing constructor argument {position}"))?;
        let kind = value.kind();
        V::from_value(value).ok_or_else(|| {
            format!(
                "constructor argument {position} is {kind}, expected {}",
                V::describe()
            )
            .into()
        })
    }

    /// Take the next argument without conversion.
    ///
    /// # Errors
    ///
    /// Fails when the arguments are exhausted.
    pub fn next_value(&mut self) -> Result<FieldValue, BoxError> {
        self.next::<FieldValue>()
    }
}
