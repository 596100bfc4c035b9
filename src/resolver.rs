//! Artifact resolver
//!
//! [`ArtifactResolver`] validates a coordinate, builds a fresh
//! [`ResolutionSession`], submits the descriptor (optional) and primary
//! requests as one batch, and maps the outcome to a [`ResolvedArtifact`] or a
//! repository-aware [`ResolverError`].
//!
//! ```rust,no_run
//! use artifact_resolver::{ArtifactResolver, Coordinate, RemoteRepo, RepositoryConfig};
//!
//! let config = RepositoryConfig::new("/var/cache/artifacts")
//!     .with_remote_repository("central", RemoteRepo::new("https://repo.maven.apache.org/maven2"));
//! let resolver = ArtifactResolver::new(config)?;
//!
//! let coordinate: Coordinate = "org.example:hello:1.0.0".parse()?;
//! let artifact = resolver.resolve(&coordinate)?;
//! println!("{}", artifact.local_file_path.display());
//! # Ok::<(), artifact_resolver::ResolverError>(())
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::RepositoryConfig;
use crate::coordinate::Coordinate;
use crate::engine::{ArtifactRequest, MavenEngine, RequestKind, ResolutionEngine};
use crate::error::{EngineError, Result, ResolverError};
use crate::repository::{build_repository_descriptors, ensure_local_cache, RepositoryDescriptor};
use crate::session::ResolutionSession;

/// A successfully resolved artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    /// File in the local cache; exists at the time `resolve` returns
    pub local_file_path: PathBuf,
}

/// Resolves coordinates under one configuration.
///
/// Cheap to share (`Arc<ArtifactResolver>`): every call builds its own
/// session and never mutates the resolver.
pub struct ArtifactResolver {
    config: Arc<RepositoryConfig>,
    repositories: Arc<[RepositoryDescriptor]>,
    engine: Arc<dyn ResolutionEngine>,
}

impl ArtifactResolver {
    /// Create a resolver backed by [`MavenEngine`].
    ///
    /// Creates the local cache directory if needed.
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        Self::with_engine(config, Arc::new(MavenEngine::new()))
    }

    /// Create a resolver backed by a custom engine
    pub fn with_engine(config: RepositoryConfig, engine: Arc<dyn ResolutionEngine>) -> Result<Self> {
        debug!(local_repository = %config.local_cache_path.display(), "Local repository");
        debug!(
            remote_repositories = %config.repository_names().join(","),
            "Remote repositories"
        );

        ensure_local_cache(&config.local_cache_path)?;
        let repositories: Arc<[RepositoryDescriptor]> =
            build_repository_descriptors(&config).into();

        Ok(Self {
            config: Arc::new(config),
            repositories,
            engine,
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Descriptors computed at construction
    pub fn repositories(&self) -> &[RepositoryDescriptor] {
        &self.repositories
    }

    /// Build the session for one resolution call
    pub fn new_session(&self) -> ResolutionSession {
        ResolutionSession::new(&self.config)
    }

    /// Descriptor request (when enabled) first, then the primary request
    pub fn build_requests(&self, coordinate: &Coordinate) -> Vec<ArtifactRequest> {
        let mut requests = Vec::with_capacity(2);
        if self.config.resolve_descriptor {
            requests.push(ArtifactRequest::new(
                RequestKind::Descriptor,
                coordinate.descriptor(),
                Arc::clone(&self.repositories),
            ));
        }
        requests.push(ArtifactRequest::new(
            RequestKind::Primary,
            coordinate.clone(),
            Arc::clone(&self.repositories),
        ));
        requests
    }

    /// Resolve a coordinate to a file in the local cache
    #[instrument(skip(self, coordinate), fields(artifact = %coordinate, engine = self.engine.name()))]
    pub fn resolve(&self, coordinate: &Coordinate) -> Result<ResolvedArtifact> {
        coordinate.validate()?;
        let session = self.new_session();
        self.resolve_with_session(&session, coordinate)
    }

    /// Resolve using a caller-built session (e.g. with a custom proxy selector)
    pub fn resolve_with_session(
        &self,
        session: &ResolutionSession,
        coordinate: &Coordinate,
    ) -> Result<ResolvedArtifact> {
        coordinate.validate()?;
        let requests = self.build_requests(coordinate);

        let results = self
            .engine
            .resolve_artifacts(session, &requests)
            .map_err(|source| self.resolution_failed(coordinate, source))?;

        let primary = results
            .into_iter()
            .find(|r| r.kind == RequestKind::Primary)
            .ok_or_else(|| {
                self.resolution_failed(
                    coordinate,
                    EngineError::MissingPrimary {
                        coordinate: coordinate.to_string(),
                    },
                )
            })?;

        debug!(path = %primary.path.display(), "Artifact available locally");
        Ok(ResolvedArtifact {
            coordinate: coordinate.clone(),
            local_file_path: primary.path,
        })
    }

    fn resolution_failed(&self, coordinate: &Coordinate, source: EngineError) -> ResolverError {
        ResolverError::ArtifactResolutionFailed {
            coordinate: coordinate.clone(),
            repositories: self.config.repository_names(),
            source,
        }
    }
}

/// One-shot resolution. The coordinate is validated before the local cache
/// directory is touched.
pub fn resolve(coordinate: &Coordinate, config: &RepositoryConfig) -> Result<ResolvedArtifact> {
    coordinate.validate()?;
    ArtifactResolver::new(config.clone())?.resolve(coordinate)
}
