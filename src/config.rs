//! Repository configuration
//!
//! [`RepositoryConfig`] is populated once (from a YAML/TOML file, the CLI, or
//! code) and treated as read-only by the resolver afterwards.
//!
//! ```yaml
//! local-repository: /var/cache/artifacts
//! offline: false
//! resolve-pom: true
//! connect-timeout: 5000
//! remote-repositories:
//!   central:
//!     url: https://repo.maven.apache.org/maven2
//!   internal:
//!     url: https://repo.example.com/releases
//!     auth: { username: deployer, password: secret }
//! proxy:
//!   host: proxy.example.com
//!   port: 3128
//!   non-proxy-hosts: "*.example.com|localhost"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ResolverError};

/// Default proxy protocol
pub const DEFAULT_PROXY_PROTOCOL: &str = "http";

/// `~/.m2/repository`, or `.m2/repository` when no home directory is known
pub fn default_local_repository() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".m2")
        .join("repository")
}

/// Local cache, remote repositories, proxy and network policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    /// Directory where artifacts are downloaded and reused
    #[serde(rename = "local-repository", default = "default_local_repository")]
    pub local_cache_path: PathBuf,

    /// Named remote repositories, searched in insertion order
    #[serde(default)]
    pub remote_repositories: IndexMap<String, RemoteRepo>,

    /// Never touch the network; only cached artifacts resolve
    #[serde(default)]
    pub offline: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Proxy>,

    /// Connect timeout in milliseconds (transport default when absent)
    #[serde(rename = "connect-timeout", default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,

    /// Request timeout in milliseconds (transport default when absent)
    #[serde(rename = "request-timeout", default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// Also resolve the artifact's descriptor (`.pom`) before the artifact itself
    #[serde(rename = "resolve-pom", alias = "resolve-descriptor", default)]
    pub resolve_descriptor: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            local_cache_path: default_local_repository(),
            remote_repositories: IndexMap::new(),
            offline: false,
            proxy: None,
            connect_timeout_ms: None,
            request_timeout_ms: None,
            resolve_descriptor: false,
        }
    }
}

impl RepositoryConfig {
    /// Create a config rooted at the given local cache directory
    pub fn new(local_cache_path: impl Into<PathBuf>) -> Self {
        Self {
            local_cache_path: local_cache_path.into(),
            ..Self::default()
        }
    }

    /// Add (or replace) a named remote repository. Order of first insertion is kept.
    pub fn with_remote_repository(mut self, name: impl Into<String>, repo: RemoteRepo) -> Self {
        self.remote_repositories.insert(name.into(), repo);
        self
    }

    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_resolve_descriptor(mut self, resolve: bool) -> Self {
        self.resolve_descriptor = resolve;
        self
    }

    pub fn with_timeouts(mut self, connect_ms: Option<u64>, request_ms: Option<u64>) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.request_timeout_ms = request_ms;
        self
    }

    /// The proxy, only if it is enabled (non-empty host and port > 0)
    pub fn enabled_proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref().filter(|p| p.is_enabled())
    }

    /// Names of the configured remote repositories, in order
    pub fn repository_names(&self) -> Vec<String> {
        self.remote_repositories.keys().cloned().collect()
    }

    /// Load configuration from a YAML file, or TOML when the extension is `.toml`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ResolverError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ResolverError::Config {
            reason: format!("Failed to parse YAML config: {}", e),
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ResolverError::Config {
            reason: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Copy with every password replaced by `***`, for display
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for repo in masked.remote_repositories.values_mut() {
            if let Some(auth) = repo.credentials.as_mut() {
                auth.password = mask_secret(&auth.password);
            }
        }
        if let Some(auth) = masked.proxy.as_mut().and_then(|p| p.credentials.as_mut()) {
            auth.password = mask_secret(&auth.password);
        }
        masked
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "***".to_string()
    }
}

/// A remote repository location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRepo {
    /// e.g. `https://repo.maven.apache.org/maven2` or `file:///srv/repo`
    pub url: String,

    #[serde(rename = "auth", default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl RemoteRepo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Credentials, only when both username and password are set
    pub fn usable_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| c.is_present())
    }
}

/// Proxy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Proxy {
    #[serde(default = "default_proxy_protocol")]
    pub protocol: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    /// `|`- or `,`-separated host patterns that bypass the proxy (`*` wildcard)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_proxy_hosts: Option<String>,

    #[serde(rename = "auth", default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

fn default_proxy_protocol() -> String {
    DEFAULT_PROXY_PROTOCOL.to_string()
}

impl Proxy {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: default_proxy_protocol(),
            host: host.into(),
            port,
            non_proxy_hosts: None,
            credentials: None,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_non_proxy_hosts(mut self, hosts: impl Into<String>) -> Self {
        self.non_proxy_hosts = Some(hosts.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.host.trim().is_empty() && self.port > 0
    }

    /// Credentials, only when both username and password are set
    pub fn usable_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| c.is_present())
    }

    /// `protocol://host:port`
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Username/password pair
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both username and password are non-empty
    pub fn is_present(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
