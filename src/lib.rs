//! Declarative build recipe for the desa library.
//!
//! This crate holds everything about a package build that can be decided
//! without touching the filesystem or spawning a process: the option schema
//! and its resolution, the requirements implied by an option selection, and
//! the recipe file that ties them together. The `desa-packager` crate turns
//! the result into build-tool invocations and a staged package.
//!
//! # Modules
//!
//! - [`error`] - Recipe and option errors
//! - [`options`] - Option schema, values, and resolution
//! - [`recipe`] - Recipe loading from TOML
//! - [`reference`] - `name/version@user/channel` package references
//! - [`requirements`] - Requirement resolution

pub mod error;
pub mod options;
pub mod recipe;
pub mod reference;
pub mod requirements;

pub use error::{InvalidOptionError, RecipeError};
pub use options::{OptionSchema, OptionSet, OptionValue, SchemaVersion, resolve};
pub use recipe::{Recipe, ResolvedRecipe};
pub use reference::PackageReference;
pub use requirements::{Requirement, RequirementSet, requirements_for};
