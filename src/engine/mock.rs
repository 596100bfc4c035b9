//! Mock engine for testing
//!
//! Serves artifacts from an in-memory set without any network access and
//! records every batch and every proxy decision for assertions.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use super::{describe_repositories, ArtifactRequest, ArtifactResult, ResolutionEngine};
use crate::coordinate::Coordinate;
use crate::error::EngineError;
use crate::repository::ProxyDescriptor;
use crate::session::ResolutionSession;

/// Proxy decision taken for one repository while serving a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRouting {
    pub repository: String,
    pub proxy: Option<ProxyDescriptor>,
}

/// Engine double: "remote" artifacts live in memory and are written into the
/// session's local cache when resolved.
#[derive(Clone, Default)]
pub struct MockEngine {
    /// coordinate string -> (repository id, content)
    remote: Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>,
    /// Track all batches (for assertions)
    batches: Arc<Mutex<Vec<Vec<ArtifactRequest>>>>,
    /// Track proxy selector invocations
    routings: Arc<Mutex<Vec<ProxyRouting>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an artifact available from the named repository
    pub fn publish(&self, repository: &str, coordinate: &Coordinate, content: impl Into<Vec<u8>>) {
        self.remote.lock().unwrap().insert(
            coordinate.to_string(),
            (repository.to_string(), content.into()),
        );
    }

    /// Builder form of [`MockEngine::publish`]
    pub fn with_artifact(self, repository: &str, coordinate: &Coordinate, content: &[u8]) -> Self {
        self.publish(repository, coordinate, content);
        self
    }

    /// Get all batches submitted to this engine
    pub fn batches(&self) -> Vec<Vec<ArtifactRequest>> {
        self.batches.lock().unwrap().clone()
    }

    /// Get the last batch submitted
    pub fn last_batch(&self) -> Option<Vec<ArtifactRequest>> {
        self.batches.lock().unwrap().last().cloned()
    }

    /// Proxy decisions, in the order they were taken
    pub fn proxy_routings(&self) -> Vec<ProxyRouting> {
        self.routings.lock().unwrap().clone()
    }

    /// Number of simulated downloads (one proxy decision per repository tried)
    pub fn remote_calls(&self) -> usize {
        self.routings.lock().unwrap().len()
    }

    fn resolve_one(
        &self,
        session: &ResolutionSession,
        request: &ArtifactRequest,
    ) -> Result<ArtifactResult, EngineError> {
        let coordinate = &request.coordinate;
        let path = session.local().path_for(coordinate);

        if path.is_file() {
            return Ok(ArtifactResult {
                kind: request.kind,
                coordinate: coordinate.clone(),
                path,
                repository: None,
            });
        }

        if session.is_offline() {
            let first = request.repositories.first();
            return Err(EngineError::Offline {
                coordinate: coordinate.to_string(),
                repository: first.map(|r| r.id.clone()).unwrap_or_default(),
                url: first.map(|r| r.url.clone()).unwrap_or_default(),
            });
        }

        let published = self.remote.lock().unwrap().get(&coordinate.to_string()).cloned();

        for repository in request.repositories.iter() {
            self.routings.lock().unwrap().push(ProxyRouting {
                repository: repository.id.clone(),
                proxy: session.select_proxy(repository),
            });

            if let Some((owner, content)) = &published {
                if owner == &repository.id {
                    let io_err = |source| EngineError::Io {
                        path: path.clone(),
                        source,
                    };
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent).map_err(io_err)?;
                    }
                    fs::write(&path, content).map_err(io_err)?;
                    return Ok(ArtifactResult {
                        kind: request.kind,
                        coordinate: coordinate.clone(),
                        path: path.clone(),
                        repository: Some(repository.id.clone()),
                    });
                }
            }
        }

        Err(EngineError::NotFound {
            coordinate: coordinate.to_string(),
            searched: describe_repositories(&request.repositories),
        })
    }
}

impl ResolutionEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ArtifactResult>, EngineError> {
        self.batches.lock().unwrap().push(requests.to_vec());

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use crate::engine::RequestKind;
    use crate::repository::RepositoryDescriptor;
    use tempfile::TempDir;

    fn request(coord: &Coordinate) -> ArtifactRequest {
        ArtifactRequest::new(
            RequestKind::Primary,
            coord.clone(),
            Arc::from(vec![RepositoryDescriptor::new("central", "https://central")]),
        )
    }

    #[test]
    fn test_mock_serves_published_artifacts() {
        let cache = TempDir::new().unwrap();
        let session = ResolutionSession::new(&RepositoryConfig::new(cache.path()));
        let coord = Coordinate::new("g", "a", "1");
        let engine = MockEngine::new().with_artifact("central", &coord, b"bytes");

        let results = engine.resolve_artifacts(&session, &[request(&coord)]).unwrap();

        assert_eq!(fs::read(&results[0].path).unwrap(), b"bytes");
        assert_eq!(engine.batches().len(), 1);
        assert_eq!(engine.remote_calls(), 1);
    }

    #[test]
    fn test_mock_unknown_artifact_is_not_found() {
        let cache = TempDir::new().unwrap();
        let session = ResolutionSession::new(&RepositoryConfig::new(cache.path()));
        let coord = Coordinate::new("g", "a", "1");

        let err = MockEngine::new()
            .resolve_artifacts(&session, &[request(&coord)])
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
