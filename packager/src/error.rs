//! Error types for the desa packager.
//!
//! Every stage of the pipeline has its own variant so the process exit code
//! can mirror the stage that failed first.

use crate::stager::StagingError;
use camino::Utf8PathBuf;
use desa_recipe::{InvalidOptionError, RecipeError};
use thiserror::Error;

/// Errors that can occur while packaging.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// An option override was rejected before anything ran.
    #[error("invalid option: {0}")]
    InvalidOption(#[from] InvalidOptionError),

    /// The recipe could not be loaded.
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// The configure step exited unsuccessfully.
    #[error("configure failed ({}): {command}\n{stderr}", describe_exit(.exit_code))]
    ConfigureFailed {
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// The command line that was run.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The build step exited unsuccessfully.
    #[error("build failed ({}): {command}\n{stderr}", describe_exit(.exit_code))]
    BuildFailed {
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// The command line that was run.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Copying artifacts into the package layout failed.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// The build tool could not be started at all.
    #[error("failed to run {command}")]
    Spawn {
        /// The command line that could not be started.
        command: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The build directory could not be created.
    #[error("failed to create build directory {path}")]
    BuildDirectory {
        /// Path of the build directory.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Package metadata could not be written.
    #[error("failed to write package metadata to {path}: {reason}")]
    MetadataWrite {
        /// Destination of the metadata file.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// Test stub received an unexpected or mismatched invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl PackagerError {
    /// Process exit code for this error.
    ///
    /// Codes identify the failing stage: 2 for options and recipes, 3 for
    /// configure, 4 for build, 5 for staging, 1 for everything else.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidOption(_) | Self::Recipe(_) => 2,
            Self::ConfigureFailed { .. } => 3,
            Self::BuildFailed { .. } => 4,
            Self::Staging(_) => 5,
            _ => 1,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || "no exit code".to_owned(),
        |c| format!("exit code {c}"),
    )
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn configure_failure_includes_exit_code_and_command() {
        let err = PackagerError::ConfigureFailed {
            exit_code: Some(1),
            command: "cmake \"/src\" -DBUILD_TESTING=True".to_owned(),
            stderr: "CMake Error: missing CMakeLists.txt".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("-DBUILD_TESTING=True"));
        assert!(msg.contains("missing CMakeLists.txt"));
    }

    #[test]
    fn missing_exit_code_is_described() {
        let err = PackagerError::BuildFailed {
            exit_code: None,
            command: "cmake --build .".to_owned(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("no exit code"));
    }

    #[rstest]
    #[case::option(
        PackagerError::InvalidOption(InvalidOptionError::MalformedOverride { raw: "x".to_owned() }),
        2
    )]
    #[case::configure(
        PackagerError::ConfigureFailed { exit_code: Some(1), command: String::new(), stderr: String::new() },
        3
    )]
    #[case::build(
        PackagerError::BuildFailed { exit_code: Some(2), command: String::new(), stderr: String::new() },
        4
    )]
    #[case::staging(
        PackagerError::Staging(StagingError::InvalidPattern { pattern: "[".to_owned(), reason: "bad".to_owned() }),
        5
    )]
    #[case::metadata(
        PackagerError::MetadataWrite { path: Utf8PathBuf::from("/pkg"), reason: "disk full".to_owned() },
        1
    )]
    fn exit_codes_identify_the_failing_stage(#[case] err: PackagerError, #[case] expected: i32) {
        assert_eq!(err.exit_code(), expected);
    }

    #[test]
    fn spawn_failure_preserves_source() {
        let err = PackagerError::Spawn {
            command: "cmake --build .".to_owned(),
            source: std::io::Error::other("not found"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
