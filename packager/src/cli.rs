//! CLI argument definitions for the desa packager.
//!
//! The arguments are turned into pipeline inputs here, so the binary only
//! has to wire the pieces together.

use crate::assembler::DEFAULT_TOOL;
use crate::error::{PackagerError, Result};
use crate::platform::{Arch, BuildType, Compiler, Os, PlatformSettings};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use desa_recipe::options::parse_override;
use desa_recipe::{Recipe, SchemaVersion};
use std::collections::BTreeMap;

/// Environment variable naming the build-tool program.
pub const TOOL_ENV: &str = "DESA_CMAKE";

/// Configure, build, and package the desa library.
#[derive(Parser, Debug, Clone)]
#[command(name = "desa-packager")]
#[command(version, about)]
#[command(long_about = concat!(
    "Configure, build, and package the desa library.\n\n",
    "Options are resolved against the recipe, the build tool is run to ",
    "configure and build the sources, and headers, libraries, and CMake ",
    "helpers are staged into the install prefix together with a ",
    "package_info.json describing the result.",
))]
#[command(after_help = concat!(
    "OPTIONS (-o NAME=VALUE):\n",
    "  enable_conan    Integrate with the dependency manager [default: True]\n",
    "  shared          Build shared libraries [default: False]\n",
    "  build_tests     Build the test suite [default: False]\n",
    "  gtest:NAME      Set an option of the test framework\n\n",
    "ENVIRONMENT:\n",
    "  DESA_CMAKE      Build-tool program [default: cmake]\n\n",
    "EXAMPLES:\n",
    "  Package a static build:\n",
    "    $ desa-packager --source-dir desa --install-prefix /opt/desa\n\n",
    "  Build shared libraries with tests:\n",
    "    $ desa-packager --install-prefix /opt/desa -o shared=True -o build_tests=True\n\n",
    "  Preview the commands:\n",
    "    $ desa-packager --install-prefix /opt/desa --dry-run",
))]
pub struct Cli {
    /// Directory holding the top-level CMakeLists.txt.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_dir: Utf8PathBuf,

    /// Root of the staged package layout.
    #[arg(long, value_name = "DIR")]
    pub install_prefix: Utf8PathBuf,

    /// Build tree [default: <source-dir>/build].
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<Utf8PathBuf>,

    /// Override an option (can be repeated).
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Target operating system [default: host].
    #[arg(long, value_enum)]
    pub os: Option<Os>,

    /// Compiler family [default: usual compiler for the OS].
    #[arg(long, value_enum)]
    pub compiler: Option<Compiler>,

    /// Compiler version.
    #[arg(long, value_name = "VERSION")]
    pub compiler_version: Option<String>,

    /// Target architecture [default: host].
    #[arg(long, value_enum)]
    pub arch: Option<Arch>,

    /// Build type.
    #[arg(long, value_enum, default_value_t = BuildType::Release)]
    pub build_type: BuildType,

    /// Option schema revision [default: from the recipe].
    #[arg(long, value_name = "v1|v2")]
    pub schema: Option<SchemaVersion>,

    /// Recipe file [default: <source-dir>/desa-recipe.toml if present].
    #[arg(long, value_name = "FILE")]
    pub recipe: Option<Utf8PathBuf>,

    /// Print the resolved options and commands without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print each build-tool command before running it.
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Parse the repeated `-o NAME=VALUE` arguments.
    ///
    /// Later occurrences of the same name win.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidOption`] for an argument without `=`
    /// or with an empty name.
    pub fn overrides(&self) -> Result<BTreeMap<String, String>> {
        self.options
            .iter()
            .map(|raw| parse_override(raw).map_err(PackagerError::from))
            .collect()
    }

    /// Platform settings: host defaults overlaid with the given flags.
    #[must_use]
    pub fn settings(&self) -> PlatformSettings {
        let host = PlatformSettings::host();
        let os = self.os.unwrap_or(host.os);
        PlatformSettings {
            os,
            compiler: self.compiler.unwrap_or_else(|| Compiler::default_for(os)),
            compiler_version: self.compiler_version.clone(),
            arch: self.arch.unwrap_or(host.arch),
            build_type: self.build_type,
        }
    }

    /// The build tree, defaulting to `build` inside the sources.
    #[must_use]
    pub fn build_dir(&self) -> Utf8PathBuf {
        self.build_dir
            .clone()
            .unwrap_or_else(|| self.source_dir.join("build"))
    }

    /// The recipe file to load, if any.
    #[must_use]
    pub fn recipe_path(&self) -> Option<Utf8PathBuf> {
        self.recipe.clone().or_else(|| {
            let candidate = self.source_dir.join(Recipe::default_file_name());
            candidate.is_file().then_some(candidate)
        })
    }

    /// Load the recipe and apply the `--schema` flag.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Recipe`] when the recipe file cannot be read
    /// or is invalid.
    pub fn load_recipe(&self) -> Result<Recipe> {
        let path = self.recipe_path();
        let mut recipe = Recipe::load_or_default(path.as_deref())?;
        if let Some(schema) = self.schema {
            recipe.schema = schema;
            recipe.validate()?;
        }
        Ok(recipe)
    }
}

/// The build-tool program, from [`TOOL_ENV`] or [`DEFAULT_TOOL`].
#[must_use]
pub fn build_tool() -> String {
    std::env::var(TOOL_ENV)
        .ok()
        .filter(|tool| !tool.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TOOL.to_owned())
}

/// Make `path` absolute against the current directory.
///
/// Commands run inside the build tree, so relative paths would otherwise
/// resolve against the wrong directory.
///
/// # Errors
///
/// Returns [`PackagerError::NonUtf8Path`] if the current directory is not
/// valid UTF-8, or [`PackagerError::BuildDirectory`] if it cannot be read.
pub fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let absolute = std::path::absolute(path).map_err(|source| PackagerError::BuildDirectory {
        path: path.to_owned(),
        source,
    })?;
    Utf8PathBuf::try_from(absolute)
        .map_err(|e| PackagerError::NonUtf8Path(e.into_path_buf().display().to_string()))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
