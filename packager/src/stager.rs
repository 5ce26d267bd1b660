//! Artifact classification and staging.
//!
//! A staging pass walks rule by rule through an ordered table. Each rule
//! selects files by name beneath one subtree of a root directory and copies
//! them, keeping their relative path, into a subtree of the package layout.
//! A file claimed by an earlier rule is never copied again by a later one.

use crate::platform::Os;
use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use thiserror::Error;

/// Errors raised while staging artifacts.
#[derive(Debug, Error)]
pub enum StagingError {
    /// A rule's glob pattern does not compile.
    #[error("invalid artifact pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A directory in the source tree could not be listed.
    #[error("failed to read directory {path}")]
    Walk {
        /// Directory being listed.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A destination directory could not be created.
    #[error("failed to create destination directory {path}")]
    CreateDestination {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A matched file could not be copied.
    #[error("failed to copy {from} to {to}")]
    Copy {
        /// File being copied.
        from: Utf8PathBuf,
        /// Copy destination.
        to: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Which tree a rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactOrigin {
    /// The package sources, for headers and CMake helpers.
    Source,
    /// The build tree, for compiled libraries.
    Build,
}

/// One entry of the staging table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRule {
    /// Glob matched against file names.
    pub pattern: String,
    /// Subtree of the root searched recursively.
    pub source_subtree: Utf8PathBuf,
    /// Subtree of the package layout receiving matches.
    pub destination_subtree: Utf8PathBuf,
    /// Tree the rule reads from.
    pub origin: ArtifactOrigin,
}

impl ArtifactRule {
    /// Rule reading from the build tree.
    #[must_use]
    pub fn new(pattern: &str, source_subtree: &str, destination_subtree: &str) -> Self {
        Self {
            pattern: pattern.to_owned(),
            source_subtree: Utf8PathBuf::from(source_subtree),
            destination_subtree: Utf8PathBuf::from(destination_subtree),
            origin: ArtifactOrigin::Build,
        }
    }

    /// Same rule, reading from the source tree instead.
    #[must_use]
    pub fn from_sources(self) -> Self {
        Self {
            origin: ArtifactOrigin::Source,
            ..self
        }
    }
}

/// The standard staging table for a target operating system.
///
/// Headers and CMake helpers come first, then static and import libraries,
/// then the platform's shared-library rule.
#[must_use]
pub fn standard_rules(os: Os) -> Vec<ArtifactRule> {
    let shared = match os {
        Os::Windows => ArtifactRule::new("*.dll", "bin", "bin"),
        Os::Macos => ArtifactRule::new("*.dylib*", "lib", "lib"),
        Os::Linux | Os::FreeBsd => ArtifactRule::new("*.so*", "lib", "lib"),
    };

    vec![
        ArtifactRule::new("*.hpp", "include", "include").from_sources(),
        ArtifactRule::new("*.cmake", "cmake", "").from_sources(),
        ArtifactRule::new("*.a", "lib", "lib"),
        ArtifactRule::new("*.lib", "lib", "lib"),
        shared,
    ]
}

/// Rules from `rules` that read from `origin`, in table order.
#[must_use]
pub fn rules_for_origin(rules: &[ArtifactRule], origin: ArtifactOrigin) -> Vec<ArtifactRule> {
    rules
        .iter()
        .filter(|rule| rule.origin == origin)
        .cloned()
        .collect()
}

/// A single copied file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// File that was copied.
    pub source: Utf8PathBuf,
    /// Where it was copied to.
    pub destination: Utf8PathBuf,
    /// Pattern of the rule that claimed it.
    pub pattern: String,
}

/// What a staging pass copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    staged: Vec<StagedArtifact>,
    matches: BTreeMap<String, usize>,
}

impl StagingReport {
    /// Copied files, in the order they were staged.
    #[must_use]
    pub fn staged(&self) -> &[StagedArtifact] {
        &self.staged
    }

    /// Number of files copied.
    #[must_use]
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Return true when nothing was copied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Number of files claimed by rules with this pattern.
    #[must_use]
    pub fn matched(&self, pattern: &str) -> usize {
        self.matches.get(pattern).copied().unwrap_or(0)
    }

    /// Append another report, as when staging from several roots.
    pub fn merge(&mut self, other: Self) {
        self.staged.extend(other.staged);
        for (pattern, count) in other.matches {
            *self.matches.entry(pattern).or_default() += count;
        }
    }

    fn record(&mut self, artifact: StagedArtifact) {
        *self.matches.entry(artifact.pattern.clone()).or_default() += 1;
        self.staged.push(artifact);
    }
}

/// Copy the files selected by `rules` from `root` into `destination`.
///
/// Copies overwrite existing files, so staging the same tree twice yields the
/// same layout. Rules whose source subtree does not exist match nothing.
///
/// # Errors
///
/// Returns a [`StagingError`] when a pattern is invalid, a directory cannot
/// be listed, a destination directory cannot be created, or a copy fails.
pub fn stage(
    root: &Utf8Path,
    destination: &Utf8Path,
    rules: &[ArtifactRule],
) -> Result<StagingReport, StagingError> {
    let mut report = StagingReport::default();
    let mut claimed = BTreeSet::new();

    for rule in rules {
        let pattern = Pattern::new(&rule.pattern).map_err(|e| StagingError::InvalidPattern {
            pattern: rule.pattern.clone(),
            reason: e.to_string(),
        })?;

        let base = root.join(&rule.source_subtree);
        if !base.is_dir() {
            debug!("skipping `{}`: {base} is not a directory", rule.pattern);
            continue;
        }

        let target_root = destination.join(&rule.destination_subtree);
        for relative in files_beneath(&base)? {
            let from = base.join(&relative);
            let Some(name) = relative.file_name() else {
                continue;
            };
            if !pattern.matches(name) || claimed.contains(&from) {
                continue;
            }

            let to = target_root.join(&relative);
            copy_artifact(&from, &to)?;
            trace!("staged {from} -> {to}");
            report.record(StagedArtifact {
                source: from.clone(),
                destination: to,
                pattern: rule.pattern.clone(),
            });
            claimed.insert(from);
        }
    }

    debug!("staged {} file(s) from {root} into {destination}", report.len());
    Ok(report)
}

fn copy_artifact(from: &Utf8Path, to: &Utf8Path) -> Result<(), StagingError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| StagingError::CreateDestination {
            path: parent.to_owned(),
            source,
        })?;
    }

    fs::copy(from, to).map_err(|source| StagingError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    })?;
    Ok(())
}

/// Every file beneath `base`, relative to it, in sorted order.
fn files_beneath(base: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StagingError> {
    let mut files = Vec::new();
    collect_files(base, Utf8Path::new(""), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(
    base: &Utf8Path,
    relative: &Utf8Path,
    files: &mut Vec<Utf8PathBuf>,
) -> Result<(), StagingError> {
    let dir = base.join(relative);
    let walk_error = |source| StagingError::Walk {
        path: dir.clone(),
        source,
    };

    for entry in dir.read_dir_utf8().map_err(walk_error)? {
        let entry = entry.map_err(walk_error)?;
        let child = relative.join(entry.file_name());
        let file_type = entry.file_type().map_err(walk_error)?;

        if file_type.is_dir() {
            collect_files(base, &child, files)?;
        } else if entry.path().is_file() {
            files.push(child);
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
