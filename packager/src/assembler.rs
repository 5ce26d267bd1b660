//! Build-tool command assembly.
//!
//! Commands are kept as ordered argument lists. Path arguments are shown in
//! double quotes when a command is displayed or fingerprinted, but the
//! process receives them verbatim, so no shell ever interprets a path.
//! Repeated runs with identical inputs produce identical commands.

use crate::platform::{PlatformSettings, SettingsTranslator};
use camino::{Utf8Path, Utf8PathBuf};
use desa_recipe::OptionSet;
use log::debug;
use sha2::{Digest, Sha256};
use std::fmt;

/// Default build-tool program.
pub const DEFAULT_TOOL: &str = "cmake";

/// One argument of a build-tool invocation.
///
/// An argument is a literal prefix optionally followed by a value that is
/// quoted when displayed. `-DCMAKE_INSTALL_PREFIX="/opt/desa"` is shown with
/// the quotes and passed to the process as `-DCMAKE_INSTALL_PREFIX=/opt/desa`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    prefix: String,
    quoted: Option<String>,
}

impl Arg {
    /// An argument shown and passed as written.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            prefix: text.into(),
            quoted: None,
        }
    }

    /// An argument whose `value` is double-quoted when displayed.
    #[must_use]
    pub fn quoted(prefix: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            quoted: Some(value.into()),
        }
    }

    /// The argument as the process receives it.
    #[must_use]
    pub fn raw(&self) -> String {
        match &self.quoted {
            Some(value) => format!("{}{value}", self.prefix),
            None => self.prefix.clone(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quoted {
            Some(value) => write!(f, "{}\"{value}\"", self.prefix),
            None => f.write_str(&self.prefix),
        }
    }
}

/// A single external build-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    program: String,
    args: Vec<Arg>,
    working_dir: Utf8PathBuf,
    source_dir: Option<Utf8PathBuf>,
}

impl BuildInvocation {
    /// Create an invocation of `program` running in `working_dir`.
    #[must_use]
    pub fn new(program: &str, args: Vec<Arg>, working_dir: &Utf8Path) -> Self {
        Self {
            program: program.to_owned(),
            args,
            working_dir: working_dir.to_owned(),
            source_dir: None,
        }
    }

    /// Program to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument tokens in order, as displayed in the command line.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        self.args.iter().map(ToString::to_string).collect()
    }

    /// Arguments in order, as the process receives them.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        self.args.iter().map(Arg::raw).collect()
    }

    /// Directory the command runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Source directory, for configure invocations.
    #[must_use]
    pub fn source_dir(&self) -> Option<&Utf8Path> {
        self.source_dir.as_deref()
    }

    /// The command line as displayed to the user.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lowercase hex SHA-256 of the command line.
    ///
    /// The working directory is not part of the fingerprint, so the same
    /// request built in two places fingerprints identically.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.command_line().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for BuildInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Where and how to drive an already configured build tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Build-tool program.
    pub tool: String,
    /// The configured build tree.
    pub build_dir: Utf8PathBuf,
    /// Configuration selector arguments (`--config Release`); empty on
    /// single-configuration generators.
    pub config_selector: Vec<Arg>,
}

impl BuildConfig {
    /// Derive the build configuration from platform settings.
    #[must_use]
    pub fn new(
        tool: &str,
        build_dir: &Utf8Path,
        settings: &PlatformSettings,
        translator: &dyn SettingsTranslator,
    ) -> Self {
        Self {
            tool: tool.to_owned(),
            build_dir: build_dir.to_owned(),
            config_selector: translator.build_config(settings),
        }
    }
}

/// Everything the configure command is assembled from.
pub struct ConfigureRequest<'a> {
    /// Build-tool program.
    pub tool: &'a str,
    /// Resolved options.
    pub options: &'a OptionSet,
    /// Platform settings.
    pub settings: &'a PlatformSettings,
    /// Translator producing the settings prefix.
    pub translator: &'a dyn SettingsTranslator,
    /// Directory holding the top-level `CMakeLists.txt`.
    pub source_dir: &'a Utf8Path,
    /// Build tree the command runs in.
    pub build_dir: &'a Utf8Path,
    /// Install prefix passed to the build tool.
    pub install_prefix: &'a Utf8Path,
}

/// Assemble the configure command.
///
/// The tokens are, in order: the quoted source directory, the settings
/// prefix, one `-D<FLAG>=<value>` per option in declaration order, and the
/// quoted install prefix.
#[must_use]
pub fn assemble_configure_command(request: &ConfigureRequest<'_>) -> BuildInvocation {
    let mut args = vec![Arg::quoted("", request.source_dir.as_str())];
    args.extend(request.translator.configure_flags(request.settings));
    args.extend(
        request
            .options
            .iter()
            .map(|option| Arg::plain(format!("-D{}={}", option.flag(), option.value()))),
    );
    args.push(Arg::quoted(
        "-DCMAKE_INSTALL_PREFIX=",
        request.install_prefix.as_str(),
    ));

    let invocation = BuildInvocation {
        program: request.tool.to_owned(),
        args,
        working_dir: request.build_dir.to_owned(),
        source_dir: Some(request.source_dir.to_owned()),
    };
    debug!("configure command: {invocation}");
    invocation
}

/// Assemble the command that builds a configured tree.
#[must_use]
pub fn assemble_build_command(config: &BuildConfig) -> BuildInvocation {
    build_invocation(config, &[])
}

/// Assemble the command that runs the build tool's own `install` target.
///
/// The packager stages artifacts with its rule table instead; this command
/// is offered for callers that want the build system's install layout.
#[must_use]
pub fn assemble_install_command(config: &BuildConfig) -> BuildInvocation {
    build_invocation(config, &["--target", "install"])
}

fn build_invocation(config: &BuildConfig, extra: &[&str]) -> BuildInvocation {
    let mut args = vec![Arg::plain("--build"), Arg::plain(".")];
    args.extend(extra.iter().map(|&s| Arg::plain(s)));
    args.extend(config.config_selector.iter().cloned());

    BuildInvocation {
        program: config.tool.clone(),
        args,
        working_dir: config.build_dir.clone(),
        source_dir: None,
    }
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod tests;
