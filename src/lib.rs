//! artifact-resolver - resolve versioned artifacts from a local cache and
//! Maven-layout remote repositories

pub mod config;
pub mod coordinate;
pub mod engine;
pub mod error;
pub mod repository;
pub mod resolver;
pub mod session;

pub use config::{Credentials, Proxy, RemoteRepo, RepositoryConfig};
pub use coordinate::Coordinate;
pub use engine::{ArtifactRequest, ArtifactResult, MavenEngine, RequestKind, ResolutionEngine};
pub use error::{EngineError, FixSuggestion, ResolverError};
pub use repository::{build_repository_descriptors, Authentication, RepositoryDescriptor};
pub use resolver::{resolve, ArtifactResolver, ResolvedArtifact};
pub use session::{ProxySelector, ResolutionSession};
