//! Requirement resolution.
//!
//! The only conditional dependency is the test framework. Under the current
//! schema it is required exactly when `build_tests` is enabled; the legacy
//! schema has no such option and always requires it.

use crate::options::OptionSet;
use crate::reference::PackageReference;
use log::debug;
use std::collections::BTreeMap;

/// A dependency on another package, with the options it should be built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    reference: PackageReference,
    options: BTreeMap<String, String>,
}

impl Requirement {
    /// Create a requirement with no option overrides.
    #[must_use]
    pub const fn new(reference: PackageReference) -> Self {
        Self {
            reference,
            options: BTreeMap::new(),
        }
    }

    /// Set one of the dependency's own options.
    #[must_use]
    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Apply scoped overrides (`gtest:shared=True`) that target this package.
    ///
    /// Overrides addressed to other packages are ignored.
    #[must_use]
    pub fn with_scoped_overrides(mut self, scoped: &BTreeMap<String, String>) -> Self {
        let prefix = format!("{}:", self.reference.name());
        for (key, value) in scoped {
            if let Some(option) = key.strip_prefix(&prefix) {
                self.options.insert(option.to_owned(), value.clone());
            }
        }
        self
    }

    /// Registry reference.
    #[must_use]
    pub const fn reference(&self) -> &PackageReference {
        &self.reference
    }

    /// Options requested for the dependency, sorted by name.
    #[must_use]
    pub const fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

/// Ordered, duplicate-free set of requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    requirements: Vec<Requirement>,
}

impl RequirementSet {
    /// Requirements in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Number of requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Return true when nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Return true when a package with this name is required.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.requirements
            .iter()
            .any(|r| r.reference.name() == name)
    }

    fn push_unique(&mut self, requirement: Requirement) {
        if !self.contains(requirement.reference.name()) {
            self.requirements.push(requirement);
        }
    }
}

/// Compute the requirements implied by an option set.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use desa_recipe::options::{OptionSchema, resolve};
/// use desa_recipe::requirements::{Requirement, requirements_for};
///
/// let test_framework = Requirement::new("gtest/1.8.0@lasote/stable".parse().unwrap());
/// let options = resolve(&OptionSchema::default(), &BTreeMap::new()).unwrap();
/// assert!(requirements_for(&options, &test_framework).is_empty());
/// ```
#[must_use]
pub fn requirements_for(options: &OptionSet, test_framework: &Requirement) -> RequirementSet {
    let mut set = RequirementSet::default();

    let wants_tests = options
        .version()
        .test_option()
        .is_none_or(|name| options.is_enabled(name));

    if wants_tests {
        debug!(
            "schema {} requires test framework {}",
            options.version(),
            test_framework.reference()
        );
        set.push_unique(test_framework.clone());
    }

    set
}
