//! mapperz-test: Dynamic record domain for conformance testing
//!
//! Provides a schema-driven [`Record`] type whose properties and constructors are
//! described at runtime by a [`RecordSchema`]. The schema is both the
//! [`PropertyCatalog`] and the [`Instantiate`] implementation, so any mapping
//! scenario can be written as data (see the `fixtures` feature).
//!
//! This is the reference extension that demonstrates how to bind a type to mapperz.
//!
//! # Example
//!
//! ```
//! use mapperz_test::prelude::*;
//!
//! let movie = RecordSchema::new("Movie")
//!     .field("id", TypeDescriptor::scalar("Integer"))
//!     .field("title", TypeDescriptor::scalar("String"));
//! let dto = RecordSchema::new("MovieDto")
//!     .field("id", TypeDescriptor::scalar("Integer"))
//!     .field("title", TypeDescriptor::scalar("String"));
//!
//! let mapper = MapperBuilder::new(movie.binding(), dto.binding())
//!     .declare_automatic()?
//!     .build()?;
//!
//! let source = Record::new().with("id", 12).with("title", "test");
//! assert_eq!(mapper.map(Some(&source))?, Some(source.clone()));
//! # Ok::<(), MapperError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use mapperz::prelude::*;
use mapperz::InstantiationError;

#[cfg(feature = "fixtures")]
pub mod fixture;

// ═══════════════════════════════════════════════════════════════════════════════
// Record
// ═══════════════════════════════════════════════════════════════════════════════

/// A dynamic instance: property name to value.
///
/// Absent properties read as [`FieldValue::None`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value.into());
        self
    }

    /// Set a property. Setting [`FieldValue::None`] removes it.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        if value.is_none() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    /// Get a property by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Number of set properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over set properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, FieldValue>> for Record {
    fn from(values: BTreeMap<String, FieldValue>) -> Self {
        values.into_iter().collect()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Schema
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime description of a record type: its properties and constructors.
///
/// # Kinds
///
/// Writes and constructor selection compare value kinds against declared types.
/// A declared type maps to a kind by its raw name:
///
/// | Declared | Kind |
/// |----------|------|
/// | `Integer`, `Long`, `Short`, `int`, `i8`..`i64`, `u8`..`u32` | `int` |
/// | `Boolean`, `bool` | `bool` |
/// | `Double`, `Float`, `f32`, `f64` | `float` |
/// | `String` | `string` |
/// | `List`, `Set`, `Vec` | `list` (elements checked against the parameter) |
/// | `Map`, `BTreeMap`, `HashMap` | `map` (values checked against the second parameter) |
/// | `Object`, `FieldValue` | anything |
/// | any other name | the name lowercased (e.g. `Date` accepts custom kind `date`) |
///
/// # Constructors
///
/// A constructor is a list of property names; its parameter kinds are those
/// properties' kinds. A schema without constructors has only the zero-argument
/// one. Once constructors are declared, the zero-argument one exists only if
/// declared as an empty list.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    properties: Vec<PropertyDescriptor>,
    constructors: Vec<Vec<String>>,
}

impl RecordSchema {
    /// Create a schema without properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Add a property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a readable and writable property.
    #[must_use]
    pub fn field(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.with_property(PropertyDescriptor::new(name, ty))
    }

    /// Add a constructor taking the named properties, in order.
    #[must_use]
    pub fn constructor(mut self, params: &[&str]) -> Self {
        self.constructors
            .push(params.iter().map(|p| (*p).to_owned()).collect());
        self
    }

    /// The record type's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind this schema as both catalog and instantiator.
    #[must_use]
    pub fn binding(self) -> TypeBinding<Record> {
        let name = self.name.clone();
        let schema = Arc::new(self);
        TypeBinding::new()
            .named(name)
            .with_shared_catalog(Arc::clone(&schema) as Arc<dyn PropertyCatalog<Record>>)
            .with_shared_instantiator(schema)
    }

    fn param_kinds(&self, params: &[String]) -> Vec<String> {
        params
            .iter()
            .map(|param| {
                self.properties
                    .iter()
                    .find(|p| &p.name == param)
                    .and_then(|p| p.write_type.as_ref().or(p.read_type.as_ref()))
                    .map_or_else(|| "unknown".to_owned(), kind_of)
            })
            .collect()
    }
}

/// Kind accepted by a declared type. See [`RecordSchema`].
#[must_use]
pub fn kind_of(ty: &TypeDescriptor) -> String {
    match ty.name() {
        "Integer" | "Long" | "Short" | "int" | "i8" | "i16" | "i32" | "i64" | "u8" | "u16"
        | "u32" => "int".to_owned(),
        "Boolean" | "bool" => "bool".to_owned(),
        "Double" | "Float" | "f32" | "f64" => "float".to_owned(),
        "String" => "string".to_owned(),
        "List" | "Set" | "Vec" => "list".to_owned(),
        "Map" | "BTreeMap" | "HashMap" => "map".to_owned(),
        "Object" | "FieldValue" => "any".to_owned(),
        other => other.to_lowercase(),
    }
}

/// Returns `true` if `value` may be stored in a property of type `ty`.
#[must_use]
pub fn accepts(ty: &TypeDescriptor, value: &FieldValue) -> bool {
    let kind = kind_of(ty);
    if value.is_none() || kind == "any" {
        return true;
    }
    if kind != value.kind() {
        return false;
    }
    match value {
        FieldValue::List(items) => ty
            .params()
            .first()
            .map_or(true, |p| items.iter().all(|item| accepts(p, item))),
        FieldValue::Map(entries) => ty
            .params()
            .get(1)
            .map_or(true, |p| entries.values().all(|v| accepts(p, v))),
        _ => true,
    }
}

impl PropertyCatalog<Record> for RecordSchema {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> Vec<PropertyDescriptor> {
        self.properties.clone()
    }

    fn read(&self, record: &Record, property: &PropertyDescriptor) -> FieldValue {
        record.get(&property.name).cloned().unwrap_or_default()
    }

    fn write(
        &self,
        record: &mut Record,
        property: &PropertyDescriptor,
        value: FieldValue,
    ) -> Result<(), MapperError> {
        if let Some(ty) = &property.write_type {
            if !accepts(ty, &value) {
                return Err(MapperError::PropertyWrite {
                    property: property.name.clone(),
                    expected: ty.to_string(),
                    actual: value.kind().to_owned(),
                });
            }
        }
        record.set(property.name.clone(), value);
        Ok(())
    }
}

impl Instantiate<Record> for RecordSchema {
    fn construct(&self, args: Vec<ConstructorArgument>) -> Result<Record, InstantiationError> {
        if self.constructors.is_empty() && args.is_empty() {
            return Ok(Record::new());
        }
        let kinds: Vec<String> = args.iter().map(|a| a.kind.clone()).collect();
        let params = self
            .constructors
            .iter()
            .find(|params| {
                let expected = self.param_kinds(params);
                expected.len() == kinds.len()
                    && expected
                        .iter()
                        .zip(&kinds)
                        .all(|(e, k)| e == "any" || e == k)
            })
            .ok_or_else(|| InstantiationError::NoMatchingConstructor {
                type_name: self.name.clone(),
                kinds,
            })?;

        let mut record = Record::new();
        for (param, arg) in params.iter().zip(args) {
            record.set(param.clone(), arg.value);
        }
        Ok(record)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry support (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

/// Upper-cases strings; anything else passes through.
#[cfg(feature = "registry")]
#[derive(Debug, Clone, Copy)]
pub struct Uppercase;

#[cfg(feature = "registry")]
impl mapperz::IntoFormatter for Uppercase {
    type Config = mapperz::UnitConfig;

    fn from_config(_: Self::Config) -> Result<Formatter, MapperError> {
        Ok(Arc::new(|value: FieldValue| match value {
            FieldValue::String(s) => FieldValue::String(s.to_uppercase()),
            other => other,
        }))
    }
}

/// Register the core formatters, the test-domain formatters and every schema.
///
/// - `mapperz.test.v1.Uppercase` → [`Uppercase`]
/// - each schema under its [name](RecordSchema::name)
#[cfg(feature = "registry")]
#[must_use]
pub fn register(
    builder: mapperz::RegistryBuilder,
    schemas: impl IntoIterator<Item = RecordSchema>,
) -> mapperz::RegistryBuilder {
    let builder =
        mapperz::register_core_formatters(builder).formatter::<Uppercase>("mapperz.test.v1.Uppercase");
    schemas
        .into_iter()
        .fold(builder, |builder, schema| builder.type_binding(schema.binding()))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{Record, RecordSchema};
    pub use mapperz::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(name: &str) -> TypeDescriptor {
        TypeDescriptor::scalar(name)
    }

    fn list(param: &str) -> TypeDescriptor {
        TypeDescriptor::parameterized("List", vec![scalar(param)])
    }

    fn movie() -> RecordSchema {
        RecordSchema::new("Movie")
            .field("id", scalar("Integer"))
            .field("title", scalar("String"))
            .field("rating", scalar("String"))
            .field("release", scalar("String"))
    }

    fn movie_dto() -> RecordSchema {
        RecordSchema::new("MovieDto")
            .field("id", scalar("Integer"))
            .field("title", scalar("String"))
            .field("rating", scalar("Integer"))
            .field("release", scalar("Date"))
            .constructor(&[])
            .constructor(&["id", "title", "release"])
    }

    fn source() -> Record {
        Record::new()
            .with("id", 12)
            .with("title", "test")
            .with("rating", "20")
            .with("release", "2024-01-12")
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new().with("a", 1).with("b", "x").with("c", Option::<i32>::None);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&FieldValue::Int(1)));
        assert!(record.get("c").is_none());
        assert_eq!(record.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(kind_of(&scalar("Integer")), "int");
        assert_eq!(kind_of(&list("String")), "list");
        assert_eq!(kind_of(&scalar("LocalDate")), "localdate");
        assert!(accepts(&list("String"), &vec!["a".to_string()].into_value()));
        assert!(!accepts(&list("Integer"), &vec!["a".to_string()].into_value()));
        assert!(accepts(&scalar("Object"), &FieldValue::Bool(true)));
        assert!(!accepts(&scalar("Integer"), &"12".into()));
    }

    #[test]
    fn test_catalog_write_checks_kind() {
        let schema = movie_dto();
        let rating = schema.property("rating").unwrap();
        let mut record = Record::new();

        schema.write(&mut record, &rating, FieldValue::Int(20)).unwrap();
        assert_eq!(record.get("rating"), Some(&FieldValue::Int(20)));

        let err = schema.write(&mut record, &rating, "20".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot write string value into property \"rating\" of type Integer"
        );
    }

    #[test]
    fn test_constructor_selection() {
        let schema = movie_dto();
        assert_eq!(schema.construct(Vec::new()).unwrap(), Record::new());

        let record = schema
            .construct(vec![
                ConstructorArgument::new(FieldValue::Int(12)),
                ConstructorArgument::new("test".into()),
                ConstructorArgument::typed(FieldValue::None, "date"),
            ])
            .unwrap();
        assert_eq!(record, Record::new().with("id", 12).with("title", "test"));

        let err = schema
            .construct(vec![
                ConstructorArgument::new("test".into()),
                ConstructorArgument::new(FieldValue::Int(12)),
            ])
            .unwrap_err();
        assert!(matches!(err, InstantiationError::NoMatchingConstructor { .. }));
    }

    #[test]
    fn test_schema_without_default_constructor() {
        let schema = RecordSchema::new("Strict")
            .field("id", scalar("Integer"))
            .constructor(&["id"]);
        assert!(schema.construct(Vec::new()).is_err());
    }

    #[test]
    fn test_manual_and_automatic_rules_combined() {
        let mapper = MapperBuilder::new(movie().binding(), movie_dto().binding())
            .declare_automatic_excluding(&["rating", "release"])
            .unwrap()
            .declare_with(
                |m: &Record| m.get("rating").and_then(FieldValue::as_str).map(str::to_owned),
                |d: &mut Record, rating: i64| d.set("rating", FieldValue::Int(rating)),
                |rating: String| rating.parse::<i64>().unwrap_or_default() + 40,
            )
            .build()
            .unwrap();

        let dto = mapper.map(Some(&source())).unwrap().unwrap();
        assert_eq!(
            dto,
            Record::new().with("id", 12).with("title", "test").with("rating", 60)
        );
    }

    #[test]
    fn test_constructor_mode_from_properties() {
        let mapper = MapperBuilder::new(movie().binding(), movie_dto().binding())
            .declare_property_in_constructor("id", None)
            .unwrap()
            .declare_property_in_constructor("title", None)
            .unwrap()
            .declare_property_in_constructor("release", Some("date"))
            .unwrap()
            .build()
            .unwrap();

        let dto = mapper.map(Some(&source())).unwrap().unwrap();
        assert_eq!(dto.get("release").and_then(FieldValue::as_str), Some("2024-01-12"));
        assert_eq!(dto.len(), 3);
    }

    #[test_log::test]
    fn test_automatic_type_drift_fails_at_map_time() {
        let mapper = MapperBuilder::new(movie().binding(), movie_dto().binding())
            .declare_automatic_excluding(&["release"])
            .unwrap()
            .build()
            .unwrap();

        let err = mapper.map(Some(&source())).unwrap_err();
        assert!(matches!(err, MapperError::PropertyWrite { ref property, .. } if property == "rating"));

        let without_rating = Record::new().with("id", 1).with("title", "t");
        assert!(mapper.map(Some(&without_rating)).is_ok());
    }

    #[cfg(feature = "registry")]
    #[test]
    fn test_register() {
        let registry = register(mapperz::RegistryBuilder::new(), [movie(), movie_dto()]).build();
        assert_eq!(registry.type_names(), vec!["Movie", "MovieDto"]);
        assert!(registry.contains_formatter("mapperz.test.v1.Uppercase"));
        assert!(registry.contains_formatter("mapperz.core.v1.ParseInt"));
    }
}
