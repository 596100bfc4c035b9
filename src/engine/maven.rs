//! Local-cache-first engine over Maven-layout repositories

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, instrument, warn};

use super::transport::{FileTransporter, HttpTransporter, TransferError, Transporter};
use super::{describe_repositories, ArtifactRequest, ArtifactResult, ResolutionEngine};
use crate::error::EngineError;
use crate::repository::RepositoryDescriptor;
use crate::session::ResolutionSession;

/// Cached snapshots older than this are checked again when online (daily policy)
pub const SNAPSHOT_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default engine: `file://` and `http(s)://` repositories
pub struct MavenEngine {
    file: FileTransporter,
    http: HttpTransporter,
    snapshot_update_interval: Duration,
}

impl Default for MavenEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MavenEngine {
    pub fn new() -> Self {
        Self {
            file: FileTransporter,
            http: HttpTransporter::new(),
            snapshot_update_interval: SNAPSHOT_UPDATE_INTERVAL,
        }
    }

    /// Override how long a cached snapshot stays fresh
    pub fn with_snapshot_update_interval(mut self, interval: Duration) -> Self {
        self.snapshot_update_interval = interval;
        self
    }

    fn transporter_for(&self, repository: &RepositoryDescriptor) -> Result<&dyn Transporter, String> {
        let scheme = repository
            .url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();

        match scheme.as_str() {
            "file" => Ok(&self.file),
            "http" | "https" => Ok(&self.http),
            other => Err(format!("unsupported repository protocol '{}'", other)),
        }
    }

    /// Releases never go stale; snapshots go stale after the update interval
    fn is_stale(&self, request: &ArtifactRequest, cached: &Path) -> bool {
        if !request.coordinate.is_snapshot() {
            return false;
        }
        let age = fs::metadata(cached)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok());
        match age {
            Some(age) => age >= self.snapshot_update_interval,
            None => true,
        }
    }

    fn resolve_one(
        &self,
        session: &ResolutionSession,
        request: &ArtifactRequest,
    ) -> Result<ArtifactResult, EngineError> {
        let coordinate = &request.coordinate;
        let local_path = session.local().path_for(coordinate);
        let cached = local_path.is_file();

        let hit = || ArtifactResult {
            kind: request.kind,
            coordinate: coordinate.clone(),
            path: local_path.clone(),
            repository: None,
        };

        if cached && (session.is_offline() || !self.is_stale(request, &local_path)) {
            debug!(artifact = %coordinate, path = %local_path.display(), "Local cache hit");
            return Ok(hit());
        }

        let Some(first) = request.repositories.first() else {
            return Err(EngineError::NoRepositories {
                coordinate: coordinate.to_string(),
            });
        };

        if session.is_offline() {
            return Err(EngineError::Offline {
                coordinate: coordinate.to_string(),
                repository: first.id.clone(),
                url: first.url.clone(),
            });
        }

        let mut transfer_error = None;
        for repository in request.repositories.iter() {
            let outcome = self
                .transporter_for(repository)
                .map_err(TransferError::Failed)
                .and_then(|t| t.fetch(session, repository, coordinate, &local_path));

            match outcome {
                Ok(()) => {
                    info!(
                        artifact = %coordinate,
                        repository = %repository.id,
                        path = %local_path.display(),
                        "Resolved artifact"
                    );
                    return Ok(ArtifactResult {
                        repository: Some(repository.id.clone()),
                        ..hit()
                    });
                }
                Err(TransferError::NotFound) => {
                    debug!(artifact = %coordinate, repository = %repository.id, "Not found");
                }
                Err(TransferError::Failed(reason)) => {
                    warn!(
                        artifact = %coordinate,
                        repository = %repository.id,
                        reason = %reason,
                        "Transfer failed"
                    );
                    transfer_error.get_or_insert(EngineError::Transfer {
                        coordinate: coordinate.to_string(),
                        repository: repository.id.clone(),
                        url: repository.url.clone(),
                        reason,
                    });
                }
            }
        }

        if let Some(error) = transfer_error {
            return Err(error);
        }

        if cached {
            // no repository publishes the snapshot any more: keep what we have
            warn!(artifact = %coordinate, "Using stale cached snapshot");
            return Ok(hit());
        }

        Err(EngineError::NotFound {
            coordinate: coordinate.to_string(),
            searched: describe_repositories(&request.repositories),
        })
    }
}

impl ResolutionEngine for MavenEngine {
    fn name(&self) -> &str {
        "maven"
    }

    #[instrument(skip(self, session, requests), fields(requests = requests.len(), offline = session.is_offline()))]
    fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ArtifactResult>, EngineError> {
        let mut results = Vec::with_capacity(requests.len());
        let mut failures = Vec::new();

        for request in requests {
            match self.resolve_one(session, request) {
                Ok(result) => results.push(result),
                Err(e) => failures.push(e),
            }
        }

        if failures.is_empty() {
            Ok(results)
        } else {
            Err(EngineError::from_failures(failures))
        }
    }
}
