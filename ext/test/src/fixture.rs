//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the mapperz engine.
//!
//! A fixture declares record types, one mapper (in the [`MapperConfig`] shape) and
//! cases. [`Fixture::run`] wires the mapper by calling builder methods directly;
//! the registry conformance test loads the same config through
//! `Registry::load_mapper()` and must observe identical results.
//!
//! ```yaml
//! name: formatter_add
//! types:
//!   - name: Movie
//!     properties:
//!       - { name: rating, type: String }
//!   - name: MovieDto
//!     properties:
//!       - { name: rating, type: Integer }
//! mapper:
//!   source: Movie
//!   target: MovieDto
//!   rules:
//!     - from: rating
//!       to: rating
//!       formatter: { type_url: mapperz.core.v1.ParseInt }
//! cases:
//!   - name: parses
//!     source: { rating: "20" }
//!     expect: { rating: 20 }
//! ```

use std::collections::BTreeMap;

use mapperz::{MapperConfig, Registry, RegistryBuilder};
use serde::Deserialize;

use crate::{Record, RecordSchema};
use mapperz::prelude::*;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub types: Vec<TypeSpec>,
    pub mapper: MapperConfig,
    /// Error variant expected while building the mapper.
    #[serde(default)]
    pub expect_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// A record type declaration
#[derive(Debug, Clone, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    /// Constructors as lists of property names.
    #[serde(default)]
    pub constructors: Vec<Vec<String>>,
}

/// A property declaration
#[derive(Debug, Clone, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub access: Access,
}

/// Which accessors a property has
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// `None` maps an absent source.
    #[serde(default)]
    pub source: Option<BTreeMap<String, FieldValue>>,
    /// Pre-populated target handed to `map_with`; `map` is used when absent.
    #[serde(default)]
    pub target: Option<BTreeMap<String, FieldValue>>,
    #[serde(default)]
    pub expect: Option<BTreeMap<String, FieldValue>>,
    /// Error variant expected from the mapping call.
    #[serde(default)]
    pub expect_error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder: Convert declarations to mapperz types
// ═══════════════════════════════════════════════════════════════════════════════

impl TypeSpec {
    /// Build the record schema this declaration describes
    pub fn build(&self) -> RecordSchema {
        let mut schema = RecordSchema::new(&self.name);
        for property in &self.properties {
            schema = schema.with_property(property.build());
        }
        for params in &self.constructors {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            schema = schema.constructor(&params);
        }
        schema
    }
}

impl PropertySpec {
    fn build(&self) -> PropertyDescriptor {
        let ty = self.ty.clone();
        match self.access {
            Access::ReadWrite => PropertyDescriptor::new(&self.name, ty),
            Access::ReadOnly => PropertyDescriptor::read_only(&self.name, ty),
            Access::WriteOnly => PropertyDescriptor::write_only(&self.name, ty),
        }
    }
}

impl Fixture {
    /// Registry holding every declared type plus the core and test formatters
    pub fn registry(&self) -> Registry {
        crate::register(
            RegistryBuilder::new(),
            self.types.iter().map(TypeSpec::build),
        )
        .build()
    }

    /// Declared type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|t| t.name.clone()).collect();
        names.sort_unstable();
        names
    }

    /// Build the mapper with direct builder calls
    pub fn build_mapper(&self) -> Result<Mapper<Record, Record>, MapperError> {
        let registry = self.registry();
        let binding = |name: &str| {
            self.types
                .iter()
                .find(|t| t.name == name)
                .map(|t| t.build().binding())
                .ok_or_else(|| MapperError::UnknownName {
                    name: name.to_owned(),
                    registry: "type",
                    available: self.type_names(),
                })
        };

        let config = &self.mapper;
        let mut builder = MapperBuilder::new(binding(&config.source)?, binding(&config.target)?)
            .with_execution(config.execution.clone());
        for arg in &config.constructor {
            builder = builder.declare_property_in_constructor(&arg.from, arg.kind.as_deref())?;
        }
        if let Some(automatic) = &config.automatic {
            builder = builder.declare_automatic_excluding(automatic.exclude.as_slice())?;
        }
        for rule in &config.rules {
            let formatter = match &rule.formatter {
                Some(typed) => Some(registry.load_formatter(typed)?),
                None => None,
            };
            builder = builder.declare_property(&rule.from, &rule.to, formatter)?;
        }
        builder.build()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// What a mapping call produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Mapped(Option<Record>),
    Failed(&'static str),
}

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Outcome,
    pub actual: Outcome,
}

/// Variant name of an error, as written in fixtures
pub fn error_name(error: &MapperError) -> &'static str {
    match error {
        MapperError::MissingType { .. } => "MissingType",
        MapperError::MissingCatalog { .. } => "MissingCatalog",
        MapperError::IncompatibleFieldTypes { .. } => "IncompatibleFieldTypes",
        MapperError::UnknownProperty { .. } => "UnknownProperty",
        MapperError::PropertyWrite { .. } => "PropertyWrite",
        MapperError::Instantiation { .. } => "Instantiation",
        MapperError::ThreadPool { .. } => "ThreadPool",
        MapperError::InvalidConfig { .. } => "InvalidConfig",
        MapperError::UnknownName { .. } => "UnknownName",
    }
}

impl TestCase {
    fn expected(&self) -> Outcome {
        match &self.expect_error {
            Some(name) => Outcome::Failed(leak_name(name)),
            None => Outcome::Mapped(self.expect.clone().map(Record::from)),
        }
    }

    fn run(&self, mapper: &Mapper<Record, Record>) -> Outcome {
        let source = self.source.clone().map(Record::from);
        let result = match &self.target {
            Some(target) => {
                let target = Record::from(target.clone());
                mapper.map_with(source.as_ref(), || target)
            }
            None => mapper.map(source.as_ref()),
        };
        match result {
            Ok(mapped) => Outcome::Mapped(mapped),
            Err(e) => Outcome::Failed(error_name(&e)),
        }
    }
}

// Fixture error names are compared against `error_name`, which only yields
// known variants; anything else cannot match and is reported as-is.
fn leak_name(name: &str) -> &'static str {
    [
        "MissingType",
        "MissingCatalog",
        "IncompatibleFieldTypes",
        "UnknownProperty",
        "PropertyWrite",
        "Instantiation",
        "ThreadPool",
        "InvalidConfig",
        "UnknownName",
    ]
    .into_iter()
    .find(|known| *known == name)
    .unwrap_or("<unknown variant>")
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases against the builder-wired mapper
    pub fn run(&self) -> Vec<CaseResult> {
        self.run_with(self.build_mapper())
    }

    /// Run all test cases against an already built (or failed) mapper
    pub fn run_with(&self, built: Result<Mapper<Record, Record>, MapperError>) -> Vec<CaseResult> {
        let mapper = match (built, &self.expect_error) {
            (Ok(mapper), None) => mapper,
            (built, expected) => {
                let actual = match built {
                    Ok(_) => Outcome::Mapped(None),
                    Err(e) => Outcome::Failed(error_name(&e)),
                };
                let expected = expected
                    .as_deref()
                    .map_or(Outcome::Mapped(None), |name| Outcome::Failed(leak_name(name)));
                return vec![CaseResult {
                    case_name: "<build>".to_owned(),
                    passed: actual == expected && matches!(actual, Outcome::Failed(_)),
                    expected,
                    actual,
                }];
            }
        };

        self.cases
            .iter()
            .map(|case| {
                let expected = case.expected();
                let actual = case.run(&mapper);
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == expected,
                    expected,
                    actual,
                }
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        assert_results(&self.name, &self.run());
    }
}

/// Panic on the first failed case
pub fn assert_results(fixture: &str, results: &[CaseResult]) {
    for result in results {
        assert!(
            result.passed,
            "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
            fixture, result.case_name, result.expected, result.actual
        );
    }
}
