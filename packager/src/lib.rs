//! desa packager library.
//!
//! This crate turns a resolved desa recipe into build-tool invocations, runs
//! them, and stages the results into a package layout. It is used by the
//! `desa-packager` CLI binary and can be driven programmatically with a
//! custom [`executor::CommandExecutor`] for testing.
//!
//! # Modules
//!
//! - [`assembler`] - Configure, build, and install command assembly
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Error types and exit codes
//! - [`executor`] - Running build-tool invocations
//! - [`metadata`] - Package metadata publication
//! - [`output`] - Progress and dry-run output
//! - [`pipeline`] - Configure, build, stage, and publish orchestration
//! - [`platform`] - Platform settings and their build-tool flags
//! - [`stager`] - Artifact classification and staging

pub mod assembler;
pub mod cli;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
