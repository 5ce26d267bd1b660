//! Running build-tool invocations.
//!
//! The program is started directly with its arguments, in the invocation's
//! working directory, so paths reach the build tool exactly as assembled. The
//! call blocks until the tool exits.

use crate::assembler::BuildInvocation;
use crate::error::{PackagerError, Result};
use log::debug;
use std::process::{Command, Output, Stdio};

/// Abstraction for running build-tool invocations.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs the invocation and returns its captured output.
    ///
    /// A non-zero exit status is not an error here; the caller decides what
    /// a failed stage means.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Spawn`] when the process cannot be started.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use desa_packager::assembler::{BuildConfig, assemble_build_command};
    /// use desa_packager::executor::{CommandExecutor, SystemCommandExecutor};
    /// use desa_packager::platform::{CmakeSettingsTranslator, PlatformSettings};
    ///
    /// let config = BuildConfig::new(
    ///     "cmake",
    ///     Utf8Path::new("build"),
    ///     &PlatformSettings::host(),
    ///     &CmakeSettingsTranslator,
    /// );
    /// let output = SystemCommandExecutor::default().run(&assemble_build_command(&config))?;
    /// assert!(output.status.success());
    /// # Ok::<(), desa_packager::error::PackagerError>(())
    /// ```
    fn run(&self, invocation: &BuildInvocation) -> Result<Output>;
}

/// Executes invocations as child processes.
///
/// Standard error is always captured for failure reports. Standard output is
/// captured by default; with passthrough enabled it goes straight to this
/// process's standard output and the returned `stdout` is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor {
    passthrough: bool,
}

impl SystemCommandExecutor {
    /// Create an executor, forwarding the tool's standard output when
    /// `passthrough` is set.
    #[must_use]
    pub const fn with_passthrough(passthrough: bool) -> Self {
        Self { passthrough }
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, invocation: &BuildInvocation) -> Result<Output> {
        let command_line = invocation.command_line();
        debug!("running `{command_line}` in {}", invocation.working_dir());

        let stdout = if self.passthrough {
            Stdio::inherit()
        } else {
            Stdio::piped()
        };
        let output = Command::new(invocation.program())
            .args(invocation.argv())
            .current_dir(invocation.working_dir())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| PackagerError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        debug!("`{command_line}` exited with {}", output.status);
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::assembler::Arg;
    use camino::Utf8Path;
    use tempfile::TempDir;

    fn temp_dir() -> (TempDir, camino::Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = Utf8Path::from_path(temp.path())
            .expect("utf8 temp path")
            .to_owned();
        (temp, dir)
    }

    #[test]
    fn runs_in_the_working_directory() {
        let (temp, dir) = temp_dir();
        let output = SystemCommandExecutor::default()
            .run(&BuildInvocation::new("pwd", Vec::new(), &dir))
            .expect("pwd runs");

        assert!(output.status.success());
        let printed = String::from_utf8_lossy(&output.stdout);
        let expected = temp.path().canonicalize().expect("canonical temp path");
        assert_eq!(
            std::path::Path::new(printed.trim())
                .canonicalize()
                .expect("canonical printed path"),
            expected
        );
    }

    #[test]
    fn shell_metacharacters_reach_the_process_unexpanded() {
        let (_temp, dir) = temp_dir();
        let prefix = "/opt/pkg$HOME`echo X`\"\\";
        let invocation = BuildInvocation::new(
            "printf",
            vec![
                Arg::plain("%s"),
                Arg::quoted("-DCMAKE_INSTALL_PREFIX=", prefix),
            ],
            &dir,
        );

        let output = SystemCommandExecutor::default()
            .run(&invocation)
            .expect("printf runs");

        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            format!("-DCMAKE_INSTALL_PREFIX={prefix}")
        );
    }

    #[test]
    fn non_zero_exit_is_returned_not_raised() {
        let (_temp, dir) = temp_dir();
        let output = SystemCommandExecutor::default()
            .run(&BuildInvocation::new("false", Vec::new(), &dir))
            .expect("false runs");

        assert!(!output.status.success());
    }

    #[test]
    fn stderr_is_captured_with_passthrough() {
        let (_temp, dir) = temp_dir();
        let invocation = BuildInvocation::new(
            "sh",
            vec![Arg::plain("-c"), Arg::plain("echo err >&2")],
            &dir,
        );

        let output = SystemCommandExecutor::with_passthrough(true)
            .run(&invocation)
            .expect("sh runs");

        assert!(output.stdout.is_empty());
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "err");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let (_temp, dir) = temp_dir();
        let err = SystemCommandExecutor::default()
            .run(&BuildInvocation::new("desa-no-such-tool", Vec::new(), &dir))
            .expect_err("spawn should fail");

        assert!(matches!(err, PackagerError::Spawn { .. }));
    }

    #[test]
    fn missing_working_directory_is_a_spawn_error() {
        let (_temp, dir) = temp_dir();
        let err = SystemCommandExecutor::default()
            .run(&BuildInvocation::new("true", Vec::new(), &dir.join("absent")))
            .expect_err("spawn should fail");

        assert!(matches!(err, PackagerError::Spawn { .. }));
    }
}
