//! `FieldValue`: Type-erased value that flows between catalogs, formatters and constructors
//!
//! Property catalogs read `FieldValue`s off source instances and write them onto
//! targets. Constructor-argument extractors produce them, and instantiators pick a
//! constructor from their runtime [kinds](FieldValue::kind).
//!
//! # Extensibility via `Custom`
//!
//! For domain types not covered by the primitives (dates, money, ids...), implement
//! [`CustomFieldValue`] and wrap in `FieldValue::Custom(Arc::new(your_type))`.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use crate::TypeDescriptor;

/// Extension trait for custom field value types.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use mapperz::{CustomFieldValue, FieldValue};
///
/// #[derive(Debug)]
/// struct Date {
///     year: i32,
///     day_of_year: u16,
/// }
///
/// impl CustomFieldValue for Date {
///     fn custom_kind(&self) -> &'static str {
///         "date"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let value = FieldValue::Custom(Arc::new(Date { year: 2024, day_of_year: 12 }));
/// assert!(value.is_custom());
/// assert_eq!(value.kind(), "date");
/// ```
pub trait CustomFieldValue: Send + Sync + Debug {
    /// Kind reported by [`FieldValue::kind`] for this value.
    ///
    /// Constructor tables match argument kinds against their parameter kinds, so
    /// use the same name when declaring a constructor that accepts this type.
    fn custom_kind(&self) -> &'static str;

    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// The erased value type read from and written to properties.
///
/// `None` plays the role of `null`: an extractor that yields `None` causes the
/// matching write to be skipped, leaving the target's current value in place.
#[derive(Debug, Clone, Default)]
pub enum FieldValue {
    /// No value.
    #[default]
    None,

    /// Boolean value.
    Bool(bool),

    /// Integer value (all integer widths are widened to `i64`).
    Int(i64),

    /// Floating point value.
    Float(f64),

    /// String value.
    String(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// Ordered list of values.
    List(Vec<FieldValue>),

    /// String-keyed map of values.
    Map(BTreeMap<String, FieldValue>),

    /// User-defined value implementing [`CustomFieldValue`].
    Custom(Arc<dyn CustomFieldValue>),
}

// Custom values compare by allocation, the rest structurally.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FieldValue {
    /// Returns `true` if this is the `None` variant.
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` if this is the `Custom` variant.
    #[inline]
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => Option::None,
        }
    }

    /// Try to get the value as an integer.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => Option::None,
        }
    }

    /// Try to get the value as a boolean.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => Option::None,
        }
    }

    /// Try to get the value as a list slice.
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => Option::None,
        }
    }

    /// Try to get the custom value; use [`CustomFieldValue::as_any`] to downcast.
    #[inline]
    #[must_use]
    pub fn as_custom(&self) -> Option<&dyn CustomFieldValue> {
        match self {
            Self::Custom(c) => Some(c.as_ref()),
            _ => Option::None,
        }
    }

    /// Runtime kind of this value.
    ///
    /// This is what constructor selection compares against parameter kinds, in
    /// the same way a reflective constructor lookup compares runtime classes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Custom(c) => c.custom_kind(),
        }
    }

    /// Convert into a concrete [`FieldType`], or `None` when the kinds differ.
    ///
    /// ```
    /// use mapperz::FieldValue;
    ///
    /// assert_eq!(FieldValue::Int(12).get::<i32>(), Some(12));
    /// assert_eq!(FieldValue::String("12".into()).get::<i32>(), None);
    /// ```
    #[must_use]
    pub fn get<T: FieldType>(self) -> Option<T> {
        T::from_value(self)
    }
}

/// A Rust type that can travel through a [`FieldValue`].
///
/// Implemented for the primitives, `String`, `Vec<T>`, `Option<T>` and string-keyed
/// maps. `describe` supplies the declared type used by automatic discovery;
/// `Option<T>` describes as `T` because nullability is not part of the type shape.
pub trait FieldType: Sized {
    /// Structural descriptor of this type.
    fn describe() -> TypeDescriptor;

    /// Erase into a `FieldValue`.
    fn into_value(self) -> FieldValue;

    /// Recover from a `FieldValue`. Returns `None` on kind mismatch.
    fn from_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for FieldValue {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::scalar("FieldValue")
    }

    fn into_value(self) -> FieldValue {
        self
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        Some(value)
    }
}

impl FieldType for bool {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::scalar("bool")
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Bool(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! int_field_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FieldType for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::scalar(stringify!($ty))
                }

                fn into_value(self) -> FieldValue {
                    FieldValue::Int(i64::from(self))
                }

                fn from_value(value: FieldValue) -> Option<Self> {
                    value.as_int().and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )+
    };
}

int_field_type!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! float_field_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FieldType for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::scalar(stringify!($ty))
                }

                fn into_value(self) -> FieldValue {
                    FieldValue::Float(f64::from(self))
                }

                #[allow(clippy::cast_possible_truncation)]
                fn from_value(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::Float(f) => Some(f as $ty),
                        _ => Option::None,
                    }
                }
            }
        )+
    };
}

float_field_type!(f32, f64);

impl FieldType for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::scalar("String")
    }

    fn into_value(self) -> FieldValue {
        FieldValue::String(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => Some(s),
            _ => Option::None,
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }

    fn into_value(self) -> FieldValue {
        self.map_or(FieldValue::None, FieldType::into_value)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::None => Some(Option::None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::parameterized("Vec", vec![T::describe()])
    }

    fn into_value(self) -> FieldValue {
        FieldValue::List(self.into_iter().map(FieldType::into_value).collect())
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => Option::None,
        }
    }
}

impl<V: FieldType> FieldType for BTreeMap<String, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::parameterized("BTreeMap", vec![String::describe(), V::describe()])
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| V::from_value(v).map(|v| (k, v)))
                .collect(),
            _ => Option::None,
        }
    }
}

impl<V: FieldType> FieldType for HashMap<String, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::parameterized("HashMap", vec![String::describe(), V::describe()])
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| V::from_value(v).map(|v| (k, v)))
                .collect(),
            _ => Option::None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            Option::None => Self::None,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FieldValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = FieldValue;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a null, bool, number, string, sequence or map")
            }

            fn visit_unit<E>(self) -> Result<FieldValue, E> {
                Ok(FieldValue::None)
            }

            fn visit_none<E>(self) -> Result<FieldValue, E> {
                Ok(FieldValue::None)
            }

            fn visit_some<D: serde::Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> Result<FieldValue, D::Error> {
                serde::Deserialize::deserialize(deserializer)
            }

            fn visit_bool<E>(self, b: bool) -> Result<FieldValue, E> {
                Ok(FieldValue::Bool(b))
            }

            fn visit_i64<E>(self, i: i64) -> Result<FieldValue, E> {
                Ok(FieldValue::Int(i))
            }

            fn visit_u64<E: serde::de::Error>(self, u: u64) -> Result<FieldValue, E> {
                i64::try_from(u)
                    .map(FieldValue::Int)
                    .map_err(|_| E::custom(format!("integer {u} does not fit in i64")))
            }

            fn visit_f64<E>(self, f: f64) -> Result<FieldValue, E> {
                Ok(FieldValue::Float(f))
            }

            fn visit_str<E>(self, s: &str) -> Result<FieldValue, E> {
                Ok(FieldValue::String(s.to_owned()))
            }

            fn visit_string<E>(self, s: String) -> Result<FieldValue, E> {
                Ok(FieldValue::String(s))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<FieldValue, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(FieldValue::List(items))
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<FieldValue, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, FieldValue>()? {
                    entries.insert(key, value);
                }
                Ok(FieldValue::Map(entries))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}
