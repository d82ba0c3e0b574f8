//! `PropertyCatalog`: Introspection of a type's readable and writable properties
//!
//! The engine never looks inside source or target types on its own. Automatic
//! discovery and name-based rules go through a catalog that lists the properties
//! of one type and reads/writes them on instances.
//!
//! Catalogs are plain trait objects, so they can be hand-written tables, generated
//! code, or schema-driven (as for dynamic records).

use std::fmt::Debug;

use crate::{FieldType, FieldValue, MapperError, TypeDescriptor};

/// One named property of a type.
///
/// A property is readable when it has a read type and writable when it has a
/// write type. The two usually agree; they can differ when a getter and a setter
/// expose different shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct PropertyDescriptor {
    /// Property name, matched by automatic discovery.
    pub name: String,

    /// Declared type when read, `None` if the property is write-only.
    #[cfg_attr(feature = "serde", serde(default))]
    pub read_type: Option<TypeDescriptor>,

    /// Declared type when written, `None` if the property is read-only.
    #[cfg_attr(feature = "serde", serde(default))]
    pub write_type: Option<TypeDescriptor>,
}

impl PropertyDescriptor {
    /// A readable and writable property of the given type.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            read_type: Some(ty.clone()),
            write_type: Some(ty),
        }
    }

    /// A readable and writable property whose type is described by `V`.
    ///
    /// ```
    /// use mapperz::PropertyDescriptor;
    ///
    /// let tags = PropertyDescriptor::of::<Vec<String>>("tags");
    /// assert_eq!(tags.read_type.unwrap().to_string(), "Vec<String>");
    /// ```
    pub fn of<V: FieldType>(name: impl Into<String>) -> Self {
        Self::new(name, V::describe())
    }

    /// A property that can only be read.
    pub fn read_only(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            read_type: Some(ty),
            write_type: None,
        }
    }

    /// A property that can only be written.
    pub fn write_only(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            read_type: None,
            write_type: Some(ty),
        }
    }

    /// Returns `true` if the property has a getter.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.read_type.is_some()
    }

    /// Returns `true` if the property has a setter.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.write_type.is_some()
    }

    /// Convert a value about to be written into this property's Rust type.
    ///
    /// Catalog `write` implementations call this so that a kind mismatch surfaces
    /// as a [`MapperError::PropertyWrite`] naming the property.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::PropertyWrite`] if `value` cannot become a `V`.
    pub fn convert<V: FieldType>(&self, value: FieldValue) -> Result<V, MapperError> {
        let actual = value.kind();
        V::from_value(value).ok_or_else(|| MapperError::PropertyWrite {
            property: self.name.clone(),
            expected: self
                .write_type
                .as_ref()
                .map_or_else(|| V::describe().to_string(), ToString::to_string),
            actual: actual.to_owned(),
        })
    }
}

/// Lists and accesses the properties of instances of `T`.
///
/// # Thread Safety
///
/// Catalogs are shared by every rule synthesized from them and rules run on
/// worker threads, so implementations must be `Send + Sync`.
///
/// # Example
///
/// ```
/// use mapperz::{FieldType, FieldValue, MapperError, PropertyCatalog, PropertyDescriptor};
///
/// #[derive(Debug, Default)]
/// struct User { name: String, age: Option<i32> }
///
/// #[derive(Debug)]
/// struct UserCatalog;
///
/// impl PropertyCatalog<User> for UserCatalog {
///     fn type_name(&self) -> &str { "User" }
///
///     fn properties(&self) -> Vec<PropertyDescriptor> {
///         vec![
///             PropertyDescriptor::of::<String>("name"),
///             PropertyDescriptor::of::<Option<i32>>("age"),
///         ]
///     }
///
///     fn read(&self, user: &User, property: &PropertyDescriptor) -> FieldValue {
///         match property.name.as_str() {
///             "name" => user.name.clone().into_value(),
///             "age" => user.age.into_value(),
///             _ => FieldValue::None,
///         }
///     }
///
///     fn write(
///         &self,
///         user: &mut User,
///         property: &PropertyDescriptor,
///         value: FieldValue,
///     ) -> Result<(), MapperError> {
///         match property.name.as_str() {
///             "name" => user.name = property.convert(value)?,
///             "age" => user.age = property.convert(value)?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
///
/// let mut user = User::default();
/// let name = PropertyDescriptor::of::<String>("name");
/// UserCatalog.write(&mut user, &name, "ada".into()).unwrap();
/// assert_eq!(UserCatalog.read(&user, &name).as_str(), Some("ada"));
/// ```
pub trait PropertyCatalog<T>: Send + Sync + Debug {
    /// Name of the described type, used in log lines and error messages.
    fn type_name(&self) -> &str;

    /// All properties of the type, in a stable order.
    fn properties(&self) -> Vec<PropertyDescriptor>;

    /// Read `property` off `instance`. Absent values are [`FieldValue::None`].
    fn read(&self, instance: &T, property: &PropertyDescriptor) -> FieldValue;

    /// Write `value` into `property` of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::PropertyWrite`] when the value's kind does not fit
    /// the property.
    fn write(
        &self,
        instance: &mut T,
        property: &PropertyDescriptor,
        value: FieldValue,
    ) -> Result<(), MapperError>;

    /// Look a property up by name.
    fn property(&self, name: &str) -> Option<PropertyDescriptor> {
        self.properties().into_iter().find(|p| p.name == name)
    }
}
