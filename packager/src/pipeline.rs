//! Build and packaging pipeline orchestration.
//!
//! A [`Pipeline`] drives one package request through its stages: resolve
//! options and requirements, configure, build, stage artifacts, and publish
//! package metadata. Stages run strictly in order and the first failure ends
//! the run; nothing is retried. Every state the pipeline enters is recorded
//! so callers can see how far a failed run got.

use crate::assembler::{
    BuildConfig, BuildInvocation, ConfigureRequest, assemble_build_command,
    assemble_configure_command,
};
use crate::error::{PackagerError, Result};
use crate::executor::CommandExecutor;
use crate::metadata::{PackageInfo, write_package_info};
use crate::output::{success_message, write_stderr_line};
use crate::platform::{PlatformSettings, SettingsTranslator};
use crate::stager::{ArtifactOrigin, StagingReport, rules_for_origin, stage, standard_rules};
use camino::{Utf8Path, Utf8PathBuf};
use desa_recipe::{Recipe, RequirementSet, ResolvedRecipe};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::process::Output;

/// Where a pipeline run currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has happened yet.
    Init,
    /// Options and requirements are resolved.
    RequirementsResolved,
    /// The configure command succeeded.
    Configured,
    /// The build command succeeded.
    Built,
    /// Artifacts are staged into the package layout.
    Staged,
    /// Package metadata is published.
    Done,
    /// A stage failed; carries the error message.
    Failed(String),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::RequirementsResolved => f.write_str("requirements resolved"),
            Self::Configured => f.write_str("configured"),
            Self::Built => f.write_str("built"),
            Self::Staged => f.write_str("staged"),
            Self::Done => f.write_str("done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Everything one packaging run needs.
pub struct PackageRequest<'a> {
    /// Recipe describing the package.
    pub recipe: &'a Recipe,
    /// Caller option overrides, including scoped `name:option` keys.
    pub overrides: &'a BTreeMap<String, String>,
    /// Platform settings.
    pub settings: &'a PlatformSettings,
    /// Translator for the platform settings.
    pub translator: &'a dyn SettingsTranslator,
    /// Build-tool program.
    pub tool: &'a str,
    /// Directory holding the package sources.
    pub source_dir: &'a Utf8Path,
    /// Build tree, created if missing.
    pub build_dir: &'a Utf8Path,
    /// Root of the package layout.
    pub install_prefix: &'a Utf8Path,
    /// Verbosity level (0 = normal, 1+ prints commands before running them).
    pub verbosity: u8,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Resolved selections and the commands they produce, before anything runs.
#[derive(Debug, Clone)]
pub struct PackagePlan {
    /// Resolved options and test framework.
    pub resolved: ResolvedRecipe,
    /// Requirements implied by the options.
    pub requirements: RequirementSet,
    /// Configure command.
    pub configure: BuildInvocation,
    /// Build command.
    pub build: BuildInvocation,
}

/// Resolve a request and assemble its commands without running anything.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidOption`] when an override is undeclared
/// or outside its option's domain.
pub fn plan(request: &PackageRequest<'_>) -> Result<PackagePlan> {
    let resolved = request.recipe.resolve(request.overrides)?;
    let requirements = resolved.requirements();

    let configure = assemble_configure_command(&ConfigureRequest {
        tool: request.tool,
        options: &resolved.options,
        settings: request.settings,
        translator: request.translator,
        source_dir: request.source_dir,
        build_dir: request.build_dir,
        install_prefix: request.install_prefix,
    });
    let build = assemble_build_command(&BuildConfig::new(
        request.tool,
        request.build_dir,
        request.settings,
        request.translator,
    ));

    Ok(PackagePlan {
        resolved,
        requirements,
        configure,
        build,
    })
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    /// Published metadata.
    pub info: PackageInfo,
    /// Path of the metadata file.
    pub metadata_path: Utf8PathBuf,
    /// Files copied into the package layout.
    pub report: StagingReport,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Configure,
    Build,
}

impl Stage {
    fn failure(self, exit_code: Option<i32>, command: String, stderr: String) -> PackagerError {
        match self {
            Self::Configure => PackagerError::ConfigureFailed {
                exit_code,
                command,
                stderr,
            },
            Self::Build => PackagerError::BuildFailed {
                exit_code,
                command,
                stderr,
            },
        }
    }
}

/// Drives a package request through configure, build, staging, and
/// metadata publication.
pub struct Pipeline<'a> {
    executor: &'a dyn CommandExecutor,
    history: Vec<PipelineState>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline in the [`PipelineState::Init`] state.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self {
            executor,
            history: vec![PipelineState::Init],
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        self.history.last().unwrap_or(&PipelineState::Init)
    }

    /// Every state entered so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Run the request to completion.
    ///
    /// Progress is written to `stderr` unless the request is quiet.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails. The pipeline is then
    /// left in [`PipelineState::Failed`].
    ///
    /// Each run starts a fresh history from [`PipelineState::Init`].
    pub fn run(
        &mut self,
        request: &PackageRequest<'_>,
        stderr: &mut dyn Write,
    ) -> Result<PackageOutcome> {
        self.history = vec![PipelineState::Init];
        match self.execute(request, stderr) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.advance(PipelineState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn execute(
        &mut self,
        request: &PackageRequest<'_>,
        stderr: &mut dyn Write,
    ) -> Result<PackageOutcome> {
        let recipe = request.recipe;
        let package = format!("{}/{}", recipe.name, recipe.version);

        let plan = plan(request)?;
        self.advance(PipelineState::RequirementsResolved);
        if !request.quiet {
            for requirement in plan.requirements.as_slice() {
                write_stderr_line(stderr, format!("Requires {}", requirement.reference()));
            }
        }

        std::fs::create_dir_all(request.build_dir).map_err(|source| {
            PackagerError::BuildDirectory {
                path: request.build_dir.to_owned(),
                source,
            }
        })?;

        progress(request, stderr, format!("Configuring {package}..."));
        self.run_stage(Stage::Configure, &plan.configure, request, stderr)?;
        self.advance(PipelineState::Configured);

        progress(request, stderr, format!("Building {package}..."));
        self.run_stage(Stage::Build, &plan.build, request, stderr)?;
        self.advance(PipelineState::Built);

        progress(
            request,
            stderr,
            format!("Staging artifacts to {}...", request.install_prefix),
        );
        let report = stage_artifacts(request)?;
        self.advance(PipelineState::Staged);

        let info = PackageInfo::new(
            recipe,
            &plan.resolved.options,
            request.settings,
            &plan.requirements,
            plan.configure.fingerprint(),
        );
        let metadata_path = write_package_info(request.install_prefix, &info)?;
        self.advance(PipelineState::Done);

        progress(
            request,
            stderr,
            success_message(&recipe.name, &recipe.version, report.len(), request.install_prefix),
        );

        Ok(PackageOutcome {
            info,
            metadata_path,
            report,
        })
    }

    fn run_stage(
        &self,
        stage: Stage,
        invocation: &BuildInvocation,
        request: &PackageRequest<'_>,
        stderr: &mut dyn Write,
    ) -> Result<()> {
        if request.verbosity > 0 && !request.quiet {
            write_stderr_line(stderr, format!("  $ {invocation}"));
        }

        let output = match self.executor.run(invocation) {
            Ok(output) => output,
            Err(PackagerError::Spawn { command, source }) => {
                return Err(stage.failure(None, command, source.to_string()));
            }
            Err(other) => return Err(other),
        };

        if output.status.success() {
            debug!("{stage:?} succeeded: {invocation}");
            Ok(())
        } else {
            Err(stage.failure(
                output.status.code(),
                invocation.command_line(),
                failure_text(&output),
            ))
        }
    }

    fn advance(&mut self, state: PipelineState) {
        info!("pipeline: {} -> {state}", self.state());
        self.history.push(state);
    }
}

/// The tool's captured stderr, or its captured stdout when stderr is empty.
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    } else {
        stderr.trim().to_owned()
    }
}

fn progress(request: &PackageRequest<'_>, stderr: &mut dyn Write, message: String) {
    if !request.quiet {
        write_stderr_line(stderr, message);
    }
}

/// Stage source-tree rules from the sources and build-tree rules from the
/// build directory.
fn stage_artifacts(request: &PackageRequest<'_>) -> Result<StagingReport> {
    let rules = standard_rules(request.settings.os);

    let mut report = stage(
        request.source_dir,
        request.install_prefix,
        &rules_for_origin(&rules, ArtifactOrigin::Source),
    )?;
    report.merge(stage(
        request.build_dir,
        request.install_prefix,
        &rules_for_origin(&rules, ArtifactOrigin::Build),
    )?);

    Ok(report)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
