//! Declared build options and their resolution against caller overrides.
//!
//! A schema lists options in declaration order. That order is carried through
//! to the resolved [`OptionSet`] so that everything derived from it (flag
//! tokens in particular) is stable across runs.

use crate::error::InvalidOptionError;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Option toggling the recipe's own package-manager integration.
pub const ENABLE_CONAN: &str = "enable_conan";
/// Option selecting shared instead of static libraries.
pub const SHARED: &str = "shared";
/// Option enabling the library's test suite.
pub const BUILD_TESTS: &str = "build_tests";

/// Revision of the option schema.
///
/// `V2` is canonical. `V1` is the legacy layout without a test-enablement
/// option, in which the test framework is always required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Legacy schema: `enable_conan`, `shared`.
    V1,
    /// Current schema: `enable_conan`, `shared`, `build_tests`.
    #[default]
    V2,
}

impl SchemaVersion {
    /// Name of the option that gates the test framework, if the schema has one.
    #[must_use]
    pub const fn test_option(self) -> Option<&'static str> {
        match self {
            Self::V1 => None,
            Self::V2 => Some(BUILD_TESTS),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            other => Err(format!("unknown schema version {other:?}; expected v1 or v2")),
        }
    }
}

/// Set of values an option may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDomain {
    /// `True` or `False`.
    Boolean,
    /// One of a small list of named values.
    Choice(Vec<String>),
}

impl OptionDomain {
    /// Parse a raw override for the option `name` into a domain value.
    ///
    /// Booleans accept `true`/`false` in any ASCII case as well as `1`/`0`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOptionError::ValueOutOfDomain`] when `raw` is not
    /// part of the domain.
    pub fn parse(&self, name: &str, raw: &str) -> Result<OptionValue, InvalidOptionError> {
        let trimmed = raw.trim();
        let parsed = match self {
            Self::Boolean => parse_bool(trimmed).map(OptionValue::Bool),
            Self::Choice(values) => values
                .iter()
                .find(|v| v.as_str() == trimmed)
                .map(|v| OptionValue::Choice(v.clone())),
        };

        parsed.ok_or_else(|| InvalidOptionError::ValueOutOfDomain {
            name: name.to_owned(),
            value: raw.to_owned(),
            allowed: self.describe(),
        })
    }

    fn describe(&self) -> String {
        match self {
            Self::Boolean => "True, False".to_owned(),
            Self::Choice(values) => values.join(", "),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") || raw == "1" {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
        Some(false)
    } else {
        None
    }
}

/// A concrete option value.
///
/// Booleans always render as `True` or `False`, whatever spelling the caller
/// used to supply them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// Boolean value.
    Bool(bool),
    /// Enumerated value.
    Choice(String),
}

impl OptionValue {
    /// Return the boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Choice(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Choice(v) => f.write_str(v),
        }
    }
}

/// Declaration of a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    name: String,
    flag: String,
    domain: OptionDomain,
    default: OptionValue,
}

impl OptionDecl {
    /// Declare a boolean option whose flag is derived from its name.
    #[must_use]
    pub fn boolean(name: &str, default: bool) -> Self {
        Self {
            name: name.to_owned(),
            flag: flag_name(name),
            domain: OptionDomain::Boolean,
            default: OptionValue::Bool(default),
        }
    }

    /// Declare an enumerated option.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOptionError::ValueOutOfDomain`] if `default` is not
    /// one of `values`.
    pub fn choice(
        name: &str,
        values: Vec<String>,
        default: &str,
    ) -> Result<Self, InvalidOptionError> {
        let domain = OptionDomain::Choice(values);
        let default = domain.parse(name, default)?;
        Ok(Self {
            name: name.to_owned(),
            flag: flag_name(name),
            domain,
            default,
        })
    }

    /// Replace the derived flag with an explicit one.
    #[must_use]
    pub fn with_flag(mut self, flag: &str) -> Self {
        flag.clone_into(&mut self.flag);
        self
    }

    /// Option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flag name passed to the build tool.
    #[must_use]
    pub fn flag(&self) -> &str {
        &self.flag
    }

    /// Allowed values.
    #[must_use]
    pub const fn domain(&self) -> &OptionDomain {
        &self.domain
    }

    /// Value used when no override is supplied.
    #[must_use]
    pub const fn default_value(&self) -> &OptionValue {
        &self.default
    }
}

/// Derive a build-tool flag from an option identifier.
///
/// # Examples
///
/// ```
/// use desa_recipe::options::flag_name;
///
/// assert_eq!(flag_name("enable_conan"), "ENABLE_CONAN");
/// assert_eq!(flag_name("fast-math"), "FAST_MATH");
/// ```
#[must_use]
pub fn flag_name(name: &str) -> String {
    name.replace('-', "_").to_ascii_uppercase()
}

/// Ordered collection of option declarations for one schema revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSchema {
    version: SchemaVersion,
    options: Vec<OptionDecl>,
}

impl OptionSchema {
    /// Build the declared schema for a revision.
    #[must_use]
    pub fn for_version(version: SchemaVersion) -> Self {
        let mut options = vec![
            OptionDecl::boolean(ENABLE_CONAN, true),
            OptionDecl::boolean(SHARED, false).with_flag("BUILD_SHARED_LIBS"),
        ];
        if let Some(test_option) = version.test_option() {
            options.push(OptionDecl::boolean(test_option, false).with_flag("BUILD_TESTING"));
        }
        Self { version, options }
    }

    /// Append an option after the existing declarations.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOptionError::AlreadyDeclared`] when the schema already
    /// declares an option with the same name. Built-in declarations carry
    /// build-tool aliases and gate the test framework, so they cannot be
    /// replaced.
    pub fn with_option(mut self, decl: OptionDecl) -> Result<Self, InvalidOptionError> {
        if self.get(&decl.name).is_some() {
            return Err(InvalidOptionError::AlreadyDeclared {
                name: decl.name,
                version: self.version.to_string(),
            });
        }
        self.options.push(decl);
        Ok(self)
    }

    /// Schema revision.
    #[must_use]
    pub const fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Declarations in order.
    #[must_use]
    pub fn decls(&self) -> &[OptionDecl] {
        &self.options
    }

    /// Look up a declaration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|d| d.name == name)
    }

    fn declared_names(&self) -> String {
        self.options
            .iter()
            .map(OptionDecl::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for OptionSchema {
    fn default() -> Self {
        Self::for_version(SchemaVersion::default())
    }
}

/// One option after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOption {
    name: String,
    flag: String,
    value: OptionValue,
}

impl ResolvedOption {
    /// Option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flag name passed to the build tool.
    #[must_use]
    pub fn flag(&self) -> &str {
        &self.flag
    }

    /// Effective value.
    #[must_use]
    pub const fn value(&self) -> &OptionValue {
        &self.value
    }
}

/// The effective options for one build request.
///
/// Only [`resolve`] creates an `OptionSet`, so every option of the schema is
/// present and the set cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    version: SchemaVersion,
    entries: Vec<ResolvedOption>,
}

impl OptionSet {
    /// Schema revision the set was resolved against.
    #[must_use]
    pub const fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Resolved options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedOption> {
        self.entries.iter()
    }

    /// Look up a value by option name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(ResolvedOption::value)
    }

    /// Return true when `name` is a boolean option set to `True`.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name)
            .and_then(OptionValue::as_bool)
            .unwrap_or(false)
    }
}

/// Split a `name=value` override.
///
/// # Errors
///
/// Returns [`InvalidOptionError::MalformedOverride`] when there is no `=` or
/// the name is empty.
///
/// # Examples
///
/// ```
/// use desa_recipe::options::parse_override;
///
/// let (name, value) = parse_override("shared=True").unwrap();
/// assert_eq!(name, "shared");
/// assert_eq!(value, "True");
/// ```
pub fn parse_override(raw: &str) -> Result<(String, String), InvalidOptionError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(InvalidOptionError::MalformedOverride {
            raw: raw.to_owned(),
        }),
    }
}

/// Resolve caller overrides against a schema.
///
/// Every declared option appears in the result, taking the override when one
/// is given and the declared default otherwise.
///
/// # Errors
///
/// Returns [`InvalidOptionError`] when an override names an undeclared
/// option or carries a value outside the option's domain.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use desa_recipe::options::{OptionSchema, SchemaVersion, resolve};
///
/// let schema = OptionSchema::for_version(SchemaVersion::V2);
/// let overrides = BTreeMap::from([("shared".to_owned(), "true".to_owned())]);
/// let set = resolve(&schema, &overrides).unwrap();
/// assert_eq!(set.get("shared").unwrap().to_string(), "True");
/// ```
pub fn resolve(
    schema: &OptionSchema,
    overrides: &BTreeMap<String, String>,
) -> Result<OptionSet, InvalidOptionError> {
    if let Some(unknown) = overrides.keys().find(|name| schema.get(name).is_none()) {
        return Err(InvalidOptionError::UnknownOption {
            name: unknown.clone(),
            declared: schema.declared_names(),
        });
    }

    let entries = schema
        .decls()
        .iter()
        .map(|decl| {
            let value = match overrides.get(decl.name()) {
                Some(raw) => decl.domain.parse(decl.name(), raw)?,
                None => decl.default.clone(),
            };
            debug!("option {} = {value}", decl.name());
            Ok(ResolvedOption {
                name: decl.name.clone(),
                flag: decl.flag.clone(),
                value,
            })
        })
        .collect::<Result<Vec<_>, InvalidOptionError>>()?;

    Ok(OptionSet {
        version: schema.version(),
        entries,
    })
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
