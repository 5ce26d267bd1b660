//! Error types for recipe loading and option resolution.
//!
//! Option errors are kept separate from recipe errors so that callers can
//! reject a bad override before any external process is considered.

use camino::Utf8PathBuf;
use thiserror::Error;

/// An option override that cannot be applied to the declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOptionError {
    /// The override names an option the schema does not declare.
    #[error("unknown option {name}; declared options are: {declared}")]
    UnknownOption {
        /// Name supplied by the caller.
        name: String,
        /// Comma-separated list of declared option names.
        declared: String,
    },

    /// The override value lies outside the option's domain.
    #[error("invalid value {value:?} for option {name}; allowed values are: {allowed}")]
    ValueOutOfDomain {
        /// Name of the option.
        name: String,
        /// Value supplied by the caller.
        value: String,
        /// Human-readable rendering of the allowed values.
        allowed: String,
    },

    /// An extra declaration reuses the name of an existing option.
    #[error("option {name} is already declared by schema {version}")]
    AlreadyDeclared {
        /// Name of the redeclared option.
        name: String,
        /// Schema revision holding the existing declaration.
        version: String,
    },

    /// An override was not written as `name=value`.
    #[error("malformed option override {raw:?}; expected NAME=VALUE")]
    MalformedOverride {
        /// The raw override text.
        raw: String,
    },
}

/// Errors raised while loading or validating a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// The recipe file could not be read.
    #[error("failed to read recipe {path}")]
    Read {
        /// Path of the recipe file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The recipe file is not valid TOML for the recipe schema.
    #[error("invalid recipe {path}: {reason}")]
    Parse {
        /// Path of the recipe file, or `<inline>` for string input.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// A package reference string is malformed.
    #[error("invalid package reference {reference:?}: {reason}")]
    InvalidReference {
        /// The reference text.
        reference: String,
        /// Which part of the reference is wrong.
        reason: &'static str,
    },

    /// A default option declared by the recipe is not valid for its schema.
    #[error("invalid default option in recipe: {0}")]
    InvalidDefault(#[from] InvalidOptionError),
}

/// Result type alias using [`RecipeError`].
pub type Result<T> = std::result::Result<T, RecipeError>;
