//! User-facing output for the packager CLI.
//!
//! Progress and summaries go to stderr; nothing here affects what the
//! pipeline does.

use crate::assembler::BuildInvocation;
use camino::Utf8Path;
use desa_recipe::{OptionSet, RequirementSet};
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format the message printed once a package has been staged.
#[must_use]
pub fn success_message(name: &str, version: &str, count: usize, install_prefix: &Utf8Path) -> String {
    let plural = if count == 1 { "file" } else { "files" };
    format!("Packaged {name}/{version}: staged {count} {plural} to {install_prefix}")
}

/// What a dry run would do.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use desa_packager::output::DryRunInfo;
/// use desa_recipe::Recipe;
/// use std::collections::BTreeMap;
///
/// let resolved = Recipe::default().resolve(&BTreeMap::new())?;
/// let info = DryRunInfo {
///     package: "desa/0.1.0",
///     source_dir: Utf8Path::new("/src/desa"),
///     build_dir: Utf8Path::new("/src/desa/build"),
///     install_prefix: Utf8Path::new("/opt/desa"),
///     options: &resolved.options,
///     requirements: &resolved.requirements(),
///     commands: &[],
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("shared = False"));
/// # Ok::<(), desa_recipe::InvalidOptionError>(())
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Package name and version.
    pub package: &'a str,
    /// Directory holding the package sources.
    pub source_dir: &'a Utf8Path,
    /// Build tree.
    pub build_dir: &'a Utf8Path,
    /// Package layout root.
    pub install_prefix: &'a Utf8Path,
    /// Resolved options.
    pub options: &'a OptionSet,
    /// Resolved requirements.
    pub requirements: &'a RequirementSet,
    /// Commands that would run, in order.
    pub commands: &'a [BuildInvocation],
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no commands will be run".to_owned(),
            String::new(),
            format!("Package: {}", self.package),
            format!("Source directory: {}", self.source_dir),
            format!("Build directory: {}", self.build_dir),
            format!("Install prefix: {}", self.install_prefix),
            String::new(),
            "Options:".to_owned(),
        ];
        lines.extend(
            self.options
                .iter()
                .map(|option| format!("  {} = {}", option.name(), option.value())),
        );

        lines.push(String::new());
        if self.requirements.is_empty() {
            lines.push("Requirements: none".to_owned());
        } else {
            lines.push("Requirements:".to_owned());
            for requirement in self.requirements.as_slice() {
                lines.push(format!("  - {}", requirement.reference()));
            }
        }

        lines.push(String::new());
        lines.push("Commands:".to_owned());
        for command in self.commands {
            lines.push(format!("  {command}"));
        }

        lines.join("\n")
    }
}
