//! The declarative package recipe.
//!
//! A recipe names the package, the libraries it provides, the option schema
//! revision it uses, default option overrides, and the test framework it
//! depends on when tests are built. The built-in [`Recipe::default`] is the
//! desa recipe; a TOML file can replace any part of it:
//!
//! ```toml
//! schema = "v2"
//!
//! [default_options]
//! shared = "True"
//! "gtest:shared" = "False"
//!
//! [test_requirement]
//! reference = "gtest/1.8.0@lasote/stable"
//! options = { shared = "False" }
//! ```

use crate::error::{InvalidOptionError, RecipeError, Result};
use crate::options::{OptionDecl, OptionDomain, OptionSchema, OptionSet, SchemaVersion, resolve};
use crate::reference::PackageReference;
use crate::requirements::{Requirement, RequirementSet, requirements_for};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Declarative description of a package build.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Recipe {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Library names published to consumers.
    pub libs: Vec<String>,
    /// Option schema revision.
    pub schema: SchemaVersion,
    /// Overrides applied on top of the schema defaults, before caller
    /// overrides. Keys of the form `package:option` target a requirement.
    pub default_options: BTreeMap<String, String>,
    /// Additional options declared by the recipe, appended to the schema.
    pub extra_options: Vec<ExtraOption>,
    /// The test framework dependency.
    pub test_requirement: TestRequirement,
}

/// An option declared by the recipe on top of the built-in schema.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExtraOption {
    /// Option name.
    pub name: String,
    /// Allowed values; a boolean option when omitted.
    #[serde(default)]
    pub values: Option<Vec<String>>,
    /// Default value.
    pub default: String,
    /// Explicit flag name; derived from `name` when omitted.
    #[serde(default)]
    pub flag: Option<String>,
}

impl ExtraOption {
    fn to_decl(&self) -> std::result::Result<OptionDecl, InvalidOptionError> {
        let decl = match &self.values {
            Some(values) => OptionDecl::choice(&self.name, values.clone(), &self.default)?,
            None => {
                let default = OptionDomain::Boolean
                    .parse(&self.name, &self.default)?
                    .as_bool()
                    .unwrap_or(false);
                OptionDecl::boolean(&self.name, default)
            }
        };
        Ok(match &self.flag {
            Some(flag) => decl.with_flag(flag),
            None => decl,
        })
    }
}

/// The test framework dependency and its own options.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TestRequirement {
    /// Registry reference.
    pub reference: PackageReference,
    /// Options for the dependency's own build.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for TestRequirement {
    fn default() -> Self {
        Self {
            reference: PackageReference::new("gtest", "1.8.0", "lasote", "stable"),
            options: BTreeMap::from([("shared".to_owned(), "False".to_owned())]),
        }
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            name: "desa".to_owned(),
            version: "0.1.0".to_owned(),
            libs: vec!["desa".to_owned()],
            schema: SchemaVersion::default(),
            default_options: BTreeMap::new(),
            extra_options: Vec::new(),
            test_requirement: TestRequirement::default(),
        }
    }
}

/// Options resolved for one build request, plus the test framework with any
/// scoped overrides applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRecipe {
    /// Effective options of the package itself.
    pub options: OptionSet,
    /// Test framework dependency, required or not depending on `options`.
    pub test_framework: Requirement,
}

impl ResolvedRecipe {
    /// Dependencies implied by the resolved options.
    #[must_use]
    pub fn requirements(&self) -> RequirementSet {
        requirements_for(&self.options, &self.test_framework)
    }
}

impl Recipe {
    /// Load a recipe from a TOML file and validate its defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or
    /// declares defaults outside the schema.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| RecipeError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Parse a recipe from TOML text. `origin` is only used in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or declares defaults
    /// outside the schema.
    pub fn from_toml_str(contents: &str, origin: &Utf8Path) -> Result<Self> {
        let recipe: Self = toml::from_str(contents).map_err(|e| RecipeError::Parse {
            path: origin.to_owned(),
            reason: e.to_string(),
        })?;
        recipe.validate()?;
        debug!("loaded recipe {} {} from {origin}", recipe.name, recipe.version);
        Ok(recipe)
    }

    /// Load the recipe at `path` when given, otherwise the built-in one.
    ///
    /// # Errors
    ///
    /// See [`Recipe::load`].
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Check that the recipe's own defaults resolve against its schema.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::InvalidDefault`] for undeclared or out-of-domain
    /// defaults.
    pub fn validate(&self) -> Result<()> {
        let schema = self.option_schema()?;
        let (own, scoped) = split_scoped(&self.default_options);
        resolve(&schema, &own)?;
        self.check_scoped(&scoped)?;
        Ok(())
    }

    /// The option schema: the built-in revision plus recipe extras.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOptionError`] when an extra option's default is
    /// outside its own domain or its name is already declared.
    pub fn option_schema(&self) -> std::result::Result<OptionSchema, InvalidOptionError> {
        self.extra_options
            .iter()
            .try_fold(OptionSchema::for_version(self.schema), |schema, extra| {
                schema.with_option(extra.to_decl()?)
            })
    }

    /// The test framework requirement with the recipe's defaults applied.
    #[must_use]
    pub fn test_framework(&self) -> Requirement {
        self.test_requirement.options.iter().fold(
            Requirement::new(self.test_requirement.reference.clone()),
            |req, (name, value)| req.with_option(name, value),
        )
    }

    /// Resolve caller overrides into an option set.
    ///
    /// Recipe defaults apply first and caller overrides win. Keys containing
    /// `:` are routed to the test framework instead of the package.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOptionError`] for undeclared options, values outside
    /// an option's domain, and scoped keys that do not name one of the test
    /// framework's own options.
    pub fn resolve(
        &self,
        overrides: &BTreeMap<String, String>,
    ) -> std::result::Result<ResolvedRecipe, InvalidOptionError> {
        let schema = self.option_schema()?;

        let mut merged = self.default_options.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        let (own, scoped) = split_scoped(&merged);

        let options = resolve(&schema, &own)?;
        self.check_scoped(&scoped)?;
        let test_framework = self.test_framework().with_scoped_overrides(&scoped);

        Ok(ResolvedRecipe {
            options,
            test_framework,
        })
    }

    /// Scoped keys must be `<test framework>:<option>` where the option is one
    /// the recipe sets for the test framework.
    fn check_scoped(
        &self,
        scoped: &BTreeMap<String, String>,
    ) -> std::result::Result<(), InvalidOptionError> {
        let package = self.test_requirement.reference.name();
        let declared = &self.test_requirement.options;

        for key in scoped.keys() {
            let known = key
                .split_once(':')
                .is_some_and(|(scope, option)| scope == package && declared.contains_key(option));
            if !known {
                return Err(InvalidOptionError::UnknownOption {
                    name: key.clone(),
                    declared: declared
                        .keys()
                        .map(|option| format!("{package}:{option}"))
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        Ok(())
    }

    /// Default recipe file name looked up next to the sources.
    #[must_use]
    pub fn default_file_name() -> Utf8PathBuf {
        Utf8PathBuf::from("desa-recipe.toml")
    }
}

fn split_scoped(
    options: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    options
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(k, _)| !k.contains(':'))
}
