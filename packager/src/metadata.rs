//! Package metadata published alongside the staged layout.

use crate::error::{PackagerError, Result};
use crate::platform::PlatformSettings;
use camino::{Utf8Path, Utf8PathBuf};
use desa_recipe::{OptionSet, Recipe, RequirementSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

/// File name of the metadata document within the install prefix.
pub const PACKAGE_INFO_FILE: &str = "package_info.json";

/// Describes a staged package to its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Libraries consumers link against.
    pub libs: Vec<String>,
    /// Resolved option values, keyed by option name.
    pub options: BTreeMap<String, String>,
    /// Platform settings the package was built for.
    pub settings: PlatformSettings,
    /// Requirement references, in resolution order.
    pub requires: Vec<String>,
    /// SHA-256 of the configure command line.
    pub configure_fingerprint: String,
}

impl PackageInfo {
    /// Describe a package built from `recipe` with the given selections.
    #[must_use]
    pub fn new(
        recipe: &Recipe,
        options: &OptionSet,
        settings: &PlatformSettings,
        requirements: &RequirementSet,
        configure_fingerprint: String,
    ) -> Self {
        Self {
            name: recipe.name.clone(),
            version: recipe.version.clone(),
            libs: recipe.libs.clone(),
            options: options
                .iter()
                .map(|option| (option.name().to_owned(), option.value().to_string()))
                .collect(),
            settings: settings.clone(),
            requires: requirements
                .as_slice()
                .iter()
                .map(|requirement| requirement.reference().to_string())
                .collect(),
            configure_fingerprint,
        }
    }
}

/// Write `info` to `<install_prefix>/package_info.json`.
///
/// The document is written to a temporary file in the same directory and
/// renamed into place, so readers never observe a partial file.
///
/// # Errors
///
/// Returns [`PackagerError::MetadataWrite`] if the prefix cannot be created
/// or the file cannot be written.
pub fn write_package_info(install_prefix: &Utf8Path, info: &PackageInfo) -> Result<Utf8PathBuf> {
    let path = install_prefix.join(PACKAGE_INFO_FILE);
    let fail = |reason: String| PackagerError::MetadataWrite {
        path: path.clone(),
        reason,
    };

    std::fs::create_dir_all(install_prefix).map_err(|e| fail(e.to_string()))?;
    let json = serde_json::to_string_pretty(info).map_err(|e| fail(e.to_string()))?;

    let mut file = NamedTempFile::new_in(install_prefix).map_err(|e| fail(e.to_string()))?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|e| fail(e.to_string()))?;
    file.persist(&path).map_err(|e| fail(e.error.to_string()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, BuildType, Compiler, Os};
    use serde_json::Value;

    fn sample(build_tests: bool) -> PackageInfo {
        let recipe = Recipe::default();
        let overrides = BTreeMap::from([("build_tests".to_owned(), build_tests.to_string())]);
        let resolved = recipe.resolve(&overrides).expect("options");
        let settings = PlatformSettings {
            os: Os::Linux,
            compiler: Compiler::Gcc,
            compiler_version: None,
            arch: Arch::X86_64,
            build_type: BuildType::Release,
        };
        PackageInfo::new(
            &recipe,
            &resolved.options,
            &settings,
            &resolved.requirements(),
            "ab12".to_owned(),
        )
    }

    #[test]
    fn describes_the_desa_library() {
        let info = sample(false);

        assert_eq!(info.name, "desa");
        assert_eq!(info.libs, vec!["desa"]);
        assert!(info.requires.is_empty());
        assert_eq!(info.options.get("shared").map(String::as_str), Some("False"));
    }

    #[test]
    fn lists_the_test_framework_when_tests_are_built() {
        assert_eq!(sample(true).requires, vec!["gtest/1.8.0@lasote/stable"]);
    }

    #[test]
    fn writes_json_into_the_install_prefix() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prefix = Utf8PathBuf::try_from(temp.path().join("pkg")).expect("utf8 path");

        let path = write_package_info(&prefix, &sample(true)).expect("write metadata");

        assert_eq!(path, prefix.join(PACKAGE_INFO_FILE));
        let parsed: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(parsed["libs"], serde_json::json!(["desa"]));
        assert_eq!(parsed["configure_fingerprint"], "ab12");
        assert_eq!(parsed["settings"]["os"], "Linux");
        assert_eq!(parsed["requires"][0], "gtest/1.8.0@lasote/stable");
    }

    #[test]
    fn rewriting_replaces_the_previous_document() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prefix = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf8 path");

        write_package_info(&prefix, &sample(true)).expect("first write");
        let path = write_package_info(&prefix, &sample(false)).expect("second write");

        let parsed: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(parsed["requires"], serde_json::json!([]));
        let entries = std::fs::read_dir(temp.path()).expect("list").count();
        assert_eq!(entries, 1, "temporary files should not linger");
    }
}
