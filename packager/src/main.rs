//! desa packager CLI entrypoint.
//!
//! This binary configures and builds the desa library with the build tool,
//! stages headers and libraries into the install prefix, and writes the
//! package metadata next to them.

use clap::Parser;
use desa_packager::cli::{Cli, absolute, build_tool};
use desa_packager::error::Result;
use desa_packager::executor::{CommandExecutor, SystemCommandExecutor};
use desa_packager::output::{DryRunInfo, write_stderr_line};
use desa_packager::pipeline::{PackageRequest, Pipeline, plan};
use desa_packager::platform::CmakeSettingsTranslator;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    // The tool's own output streams through unless the run is quiet.
    let executor = SystemCommandExecutor::with_passthrough(!cli.quiet);
    let run_result = run(&cli, &executor, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, executor: &dyn CommandExecutor, stderr: &mut dyn Write) -> Result<()> {
    let recipe = cli.load_recipe()?;
    let overrides = cli.overrides()?;
    let settings = cli.settings();
    let tool = build_tool();
    let source_dir = absolute(&cli.source_dir)?;
    let build_dir = absolute(&cli.build_dir())?;
    let install_prefix = absolute(&cli.install_prefix)?;

    let request = PackageRequest {
        recipe: &recipe,
        overrides: &overrides,
        settings: &settings,
        translator: &CmakeSettingsTranslator,
        tool: &tool,
        source_dir: &source_dir,
        build_dir: &build_dir,
        install_prefix: &install_prefix,
        verbosity: cli.verbosity,
        quiet: cli.quiet,
    };

    // Dry-run mode: show what would be done without side effects
    if cli.dry_run {
        let plan = plan(&request)?;
        let package = format!("{}/{}", recipe.name, recipe.version);
        let info = DryRunInfo {
            package: &package,
            source_dir: &source_dir,
            build_dir: &build_dir,
            install_prefix: &install_prefix,
            options: &plan.resolved.options,
            requirements: &plan.requirements,
            commands: &[plan.configure.clone(), plan.build.clone()],
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    Pipeline::new(executor).run(&request, stderr)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}
