//! Error types with fix suggestions
//!
//! [`ResolverError`] is what callers of the resolver see. [`EngineError`] is
//! the low-level failure reported by a [`crate::engine::ResolutionEngine`] and
//! travels as the `source` of [`ResolverError::ArtifactResolutionFailed`].

use std::path::PathBuf;

use thiserror::Error;

use crate::coordinate::Coordinate;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

pub type Result<T, E = ResolverError> = std::result::Result<T, E>;

/// Terminal failures of a resolution call. Nothing is retried.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("RES-001: {field} must not be blank")]
    InvalidCoordinate { field: &'static str },

    #[error("RES-005: {field} must be a single path segment, got '{value}'")]
    UnsafeCoordinate { field: &'static str, value: String },

    #[error("RES-004: Malformed coordinate '{input}' (expected group:artifact[:extension[:classifier]]:version)")]
    MalformedCoordinate { input: String },

    #[error("RES-002: Unable to create directory for local repository: {}", .path.display())]
    CacheDirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "RES-003: failed to resolve artifact {coordinate}. Configured remote {}: [{}]: {source}",
        repository_noun(.repositories.len()),
        .repositories.join(",")
    )]
    ArtifactResolutionFailed {
        coordinate: Coordinate,
        repositories: Vec<String>,
        #[source]
        source: EngineError,
    },

    // ─────────────────────────────────────────────────────────────
    // Configuration loading (binary edge)
    // ─────────────────────────────────────────────────────────────

    #[error("RES-010: Config error: {reason}")]
    Config { reason: String },
}

/// "repository" for a single configured repository, "repositories" otherwise.
pub(crate) fn repository_noun(count: usize) -> &'static str {
    if count > 1 {
        "repositories"
    } else {
        "repository"
    }
}

/// Failures reported by a resolution engine for one request or a whole batch.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("RES-020: Could not find artifact {coordinate} in {searched}")]
    NotFound { coordinate: String, searched: String },

    #[error("RES-021: Could not find artifact {coordinate}: no remote repositories configured")]
    NoRepositories { coordinate: String },

    #[error(
        "RES-022: Cannot access {repository} ({url}) in offline mode and the artifact {coordinate} has not been downloaded from it before"
    )]
    Offline {
        coordinate: String,
        repository: String,
        url: String,
    },

    #[error("RES-023: Could not transfer artifact {coordinate} from {repository} ({url}): {reason}")]
    Transfer {
        coordinate: String,
        repository: String,
        url: String,
        reason: String,
    },

    #[error("RES-024: Local cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "RES-025: The following artifacts could not be resolved: {}",
        .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Batch { failures: Vec<EngineError> },

    #[error("RES-026: Engine returned no result for primary artifact {coordinate}")]
    MissingPrimary { coordinate: String },
}

impl EngineError {
    /// Collapse per-request failures: a single failure is reported as-is.
    pub fn from_failures(mut failures: Vec<EngineError>) -> Self {
        if failures.len() == 1 {
            failures.remove(0)
        } else {
            EngineError::Batch { failures }
        }
    }
}

impl FixSuggestion for ResolverError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ResolverError::InvalidCoordinate { .. } => {
                Some("Use format: group:artifact[:extension[:classifier]]:version")
            }
            ResolverError::MalformedCoordinate { .. } => {
                Some("Use format: group:artifact[:extension[:classifier]]:version")
            }
            ResolverError::UnsafeCoordinate { .. } => {
                Some("Remove '/', '\\' and '..' from coordinate fields")
            }
            ResolverError::CacheDirectoryUnavailable { .. } => {
                Some("Check the local repository path exists or is creatable and writable")
            }
            ResolverError::ArtifactResolutionFailed { source, .. } => source.fix_suggestion(),
            ResolverError::Config { .. } => Some("Check the configuration file syntax and keys"),
        }
    }
}

impl FixSuggestion for EngineError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            EngineError::NotFound { .. } => {
                Some("Verify the coordinate and that a configured repository publishes it")
            }
            EngineError::NoRepositories { .. } => {
                Some("Add a remote repository (e.g. --repo central=https://repo.maven.apache.org/maven2)")
            }
            EngineError::Offline { .. } => {
                Some("Disable offline mode or pre-populate the local repository")
            }
            EngineError::Transfer { .. } => {
                Some("Check network access, proxy settings and repository credentials")
            }
            EngineError::Io { .. } => Some("Check local repository permissions and free disk space"),
            EngineError::Batch { failures } => {
                failures.first().and_then(FixSuggestion::fix_suggestion)
            }
            EngineError::MissingPrimary { .. } => None,
        }
    }
}
