//! Repository descriptors
//!
//! The connector wiring for every configured remote repository (URL, proxy,
//! authentication) is derived once from a [`RepositoryConfig`] by the pure
//! function [`build_repository_descriptors`] and shared read-only afterwards.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::{Credentials, RepositoryConfig};
use crate::error::{Result, ResolverError};

/// Repository layout of every descriptor
pub const DEFAULT_CONTENT_TYPE: &str = "default";

/// Username/password handed to a transport as one unit.
///
/// Cloning is cheap; the proxy authentication is shared by every descriptor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Authentication {
    inner: Arc<(String, String)>,
}

impl Authentication {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            inner: Arc::new((username.into(), password.into())),
        }
    }

    /// Username and password together
    pub fn pair(&self) -> (&str, &str) {
        (&self.inner.0, &self.inner.1)
    }

    pub fn username(&self) -> &str {
        &self.inner.0
    }

    /// Same underlying allocation (shared, not merely equal)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<&Credentials> for Authentication {
    fn from(credentials: &Credentials) -> Self {
        Self::new(credentials.username.clone(), credentials.password.clone())
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("username", &self.inner.0)
            .field("password", &"***")
            .finish()
    }
}

/// Proxy attached to a repository descriptor or selected for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub authentication: Option<Authentication>,
}

impl ProxyDescriptor {
    /// `protocol://host:port`
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// A remote repository as the engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    pub id: String,
    pub content_type: String,
    pub url: String,
    pub proxy: Option<ProxyDescriptor>,
    pub authentication: Option<Authentication>,
}

impl RepositoryDescriptor {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            url: url.into(),
            proxy: None,
            authentication: None,
        }
    }

    /// Host part of the URL, if it has one (`file://` URLs usually don't)
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Proxy authentication, when the proxy is enabled and has both credentials
pub fn proxy_authentication(config: &RepositoryConfig) -> Option<Authentication> {
    config
        .enabled_proxy()
        .and_then(|p| p.usable_credentials())
        .map(Authentication::from)
}

/// Derive one descriptor per configured repository, in configuration order.
///
/// With an enabled proxy, each descriptor carries a proxy descriptor; all of
/// them share a single proxy [`Authentication`] when proxy credentials are
/// present. Repository credentials become a repository-scoped authentication,
/// independent of the proxy's.
pub fn build_repository_descriptors(config: &RepositoryConfig) -> Vec<RepositoryDescriptor> {
    let proxy_auth = proxy_authentication(config);
    let proxy = config.enabled_proxy().map(|p| ProxyDescriptor {
        protocol: p.protocol.clone(),
        host: p.host.clone(),
        port: p.port,
        authentication: proxy_auth.clone(),
    });

    config
        .remote_repositories
        .iter()
        .map(|(name, repo)| RepositoryDescriptor {
            id: name.clone(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            url: repo.url.clone(),
            proxy: proxy.clone(),
            authentication: repo.usable_credentials().map(Authentication::from),
        })
        .collect()
}

/// Create the local cache directory tree if missing.
///
/// A pre-existing directory, or one created concurrently by someone else,
/// is not an error.
pub fn ensure_local_cache(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ResolverError::CacheDirectoryUnavailable {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "local repository path is empty",
            ),
        });
    }

    if path.is_dir() {
        return Ok(());
    }

    match fs::create_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Created local repository");
            Ok(())
        }
        // may have been created by another process in between
        Err(_) if path.is_dir() => Ok(()),
        Err(source) => Err(ResolverError::CacheDirectoryUnavailable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
