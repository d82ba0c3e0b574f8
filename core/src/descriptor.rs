//! Structural type descriptors and the generic-type compatibility rule.
//!
//! A [`TypeDescriptor`] is either a plain named type (`String`, `i32`) or a named
//! type with type parameters (`Vec<String>`, `BTreeMap<String, i64>`).
//!
//! Automatic discovery only lets a same-named source/target pair through when
//! [`check_compatible`] accepts their declared types:
//!
//! | source | target | result |
//! |--------|--------|--------|
//! | plain | plain | compatible, even if the names differ |
//! | parameterized | plain (or the reverse) | incompatible |
//! | parameterized | parameterized | compatible iff same arity and each parameter renders identically |
//!
//! Plain-vs-plain drift (`String` onto `i32`) is deliberately let through; the
//! property write rejects it at map time instead.

use std::fmt;

use crate::MapperError;

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TypeDescriptor {
    /// A type without type parameters.
    Scalar(String),

    /// A type with an ordered list of type parameters.
    Parameterized {
        /// The raw type name, e.g. `"Vec"`.
        name: String,
        /// The type parameters, in declaration order.
        params: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    /// A type without type parameters.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    /// A type with type parameters.
    pub fn parameterized(name: impl Into<String>, params: Vec<TypeDescriptor>) -> Self {
        Self::Parameterized {
            name: name.into(),
            params,
        }
    }

    /// The raw type name, without parameters.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(name) | Self::Parameterized { name, .. } => name,
        }
    }

    /// The type parameters (empty for scalars).
    #[must_use]
    pub fn params(&self) -> &[TypeDescriptor] {
        match self {
            Self::Scalar(_) => &[],
            Self::Parameterized { params, .. } => params,
        }
    }

    /// Returns `true` if this type carries type parameters.
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        matches!(self, Self::Parameterized { .. })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(name) => f.write_str(name),
            Self::Parameterized { name, params } => {
                write!(f, "{name}<")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Validate that a source property of type `getter` may be written to a target
/// property of type `setter`.
///
/// # Errors
///
/// Returns [`MapperError::IncompatibleFieldTypes`] naming `field` and both types
/// when exactly one side is parameterized, or when both are and their parameter
/// lists differ in length or in any parameter's rendered name.
pub fn check_compatible(
    field: &str,
    getter: &TypeDescriptor,
    setter: &TypeDescriptor,
) -> Result<(), MapperError> {
    let compatible = match (getter, setter) {
        (TypeDescriptor::Scalar(_), TypeDescriptor::Scalar(_)) => true,
        (
            TypeDescriptor::Parameterized { params: g, .. },
            TypeDescriptor::Parameterized { params: s, .. },
        ) => {
            g.len() == s.len()
                && g.iter()
                    .zip(s)
                    .all(|(g, s)| g.to_string() == s.to_string())
        }
        _ => false,
    };

    if compatible {
        Ok(())
    } else {
        Err(MapperError::IncompatibleFieldTypes {
            field: field.to_owned(),
            getter_type: getter.to_string(),
            setter_type: setter.to_string(),
        })
    }
}
