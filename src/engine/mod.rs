//! # Resolution Engine
//!
//! The engine turns a batch of [`ArtifactRequest`]s into local files.
//!
//! - [`ResolutionEngine`] - the contract the resolver relies on
//! - [`MavenEngine`] - local-cache-first engine with `file://` and HTTP(S) transports
//! - [`MockEngine`] - in-memory engine for tests, records every call
//!
//! ## Contract
//!
//! | Concern | Behavior |
//! |---------|----------|
//! | Lookup order | local cache first, then repositories in request order |
//! | Staleness | missing or stale cached copies are downloaded again |
//! | Offline | no remote access; only cached files resolve |
//! | Batch | any failing request fails the whole batch |
//! | Threads | `Send + Sync`, concurrent batches are allowed |

mod maven;
mod mock;
mod transport;

pub use maven::{MavenEngine, SNAPSHOT_UPDATE_INTERVAL};
pub use mock::{MockEngine, ProxyRouting};
pub use transport::{FileTransporter, HttpTransporter, TransferError, Transporter};

use std::path::PathBuf;
use std::sync::Arc;

use crate::coordinate::Coordinate;
use crate::error::EngineError;
use crate::repository::RepositoryDescriptor;
use crate::session::ResolutionSession;

/// Scope used for every request
pub const RUNTIME_SCOPE: &str = "runtime";

/// What a request is for. Results carry the same tag back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// The artifact's descriptor (`.pom`)
    Descriptor,
    /// The artifact the caller asked for
    Primary,
}

/// One artifact to resolve against an ordered list of repositories
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    pub kind: RequestKind,
    pub coordinate: Coordinate,
    pub repositories: Arc<[RepositoryDescriptor]>,
    pub scope: &'static str,
}

impl ArtifactRequest {
    pub fn new(
        kind: RequestKind,
        coordinate: Coordinate,
        repositories: Arc<[RepositoryDescriptor]>,
    ) -> Self {
        Self {
            kind,
            coordinate,
            repositories,
            scope: RUNTIME_SCOPE,
        }
    }
}

/// A satisfied request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactResult {
    pub kind: RequestKind,
    pub coordinate: Coordinate,
    /// File in the local cache
    pub path: PathBuf,
    /// Repository it was downloaded from; `None` for a local cache hit
    pub repository: Option<String>,
}

/// Resolves batches of artifact requests
pub trait ResolutionEngine: Send + Sync {
    /// Engine name, for logs
    fn name(&self) -> &str;

    /// Resolve every request or fail. Results come back in request order.
    fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ArtifactResult>, EngineError>;
}

/// `id (url), id (url)` for error messages
pub(crate) fn describe_repositories(repositories: &[RepositoryDescriptor]) -> String {
    repositories
        .iter()
        .map(|r| format!("{} ({})", r.id, r.url))
        .collect::<Vec<_>>()
        .join(", ")
}
