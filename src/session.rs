//! Per-call resolution session
//!
//! A [`ResolutionSession`] binds a configuration snapshot to a local cache
//! manager, an optional proxy selector and transport timeouts. It is built
//! fresh for every resolution and owned by that call alone.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::config::RepositoryConfig;
use crate::coordinate::Coordinate;
use crate::repository::{proxy_authentication, ProxyDescriptor, RepositoryDescriptor};

// ============================================================================
// LOCAL CACHE
// ============================================================================

/// Maps coordinates to files under the local repository directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCacheManager {
    basedir: PathBuf,
}

impl LocalCacheManager {
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
        }
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    /// Where the artifact lives (or will live) in the cache
    pub fn path_for(&self, coordinate: &Coordinate) -> PathBuf {
        coordinate
            .repository_path()
            .split('/')
            .fold(self.basedir.clone(), |path, segment| path.join(segment))
    }

    /// Cached file for the coordinate, if present
    pub fn find(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.path_for(coordinate);
        path.is_file().then_some(path)
    }
}

// ============================================================================
// PROXY SELECTION
// ============================================================================

/// Chooses the proxy (if any) used to reach a repository
pub trait ProxySelector: Send + Sync + fmt::Debug {
    fn select(&self, repository: &RepositoryDescriptor) -> Option<ProxyDescriptor>;
}

/// Routes every host through one proxy, except the non-proxy hosts.
#[derive(Debug)]
pub struct DefaultProxySelector {
    proxy: ProxyDescriptor,
    non_proxy_hosts: Vec<Regex>,
}

impl DefaultProxySelector {
    /// `non_proxy_hosts`: patterns separated by `|` or `,`; `*` matches anything
    pub fn new(proxy: ProxyDescriptor, non_proxy_hosts: Option<&str>) -> Self {
        let non_proxy_hosts = non_proxy_hosts
            .unwrap_or("")
            .split(['|', ','])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter_map(|pattern| match wildcard_regex(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern, error = %e, "Ignoring invalid non-proxy host pattern");
                    None
                }
            })
            .collect();

        Self {
            proxy,
            non_proxy_hosts,
        }
    }

    pub fn is_non_proxy_host(&self, host: &str) -> bool {
        self.non_proxy_hosts.iter().any(|re| re.is_match(host))
    }
}

fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(true)
        .build()
}

impl ProxySelector for DefaultProxySelector {
    fn select(&self, repository: &RepositoryDescriptor) -> Option<ProxyDescriptor> {
        // hostless URLs (file://) never go through a proxy
        let host = repository.host()?;
        if self.is_non_proxy_host(&host) {
            None
        } else {
            Some(self.proxy.clone())
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// Network/offline policy and local cache view for one resolution
#[derive(Debug, Clone)]
pub struct ResolutionSession {
    local: LocalCacheManager,
    offline: bool,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    proxy_selector: Option<Arc<dyn ProxySelector>>,
}

impl ResolutionSession {
    /// Build a fresh session from the configuration. No I/O.
    pub fn new(config: &RepositoryConfig) -> Self {
        let proxy_selector = config.enabled_proxy().map(|proxy| {
            let descriptor = ProxyDescriptor {
                protocol: proxy.protocol.clone(),
                host: proxy.host.clone(),
                port: proxy.port,
                authentication: proxy_authentication(config),
            };
            Arc::new(DefaultProxySelector::new(
                descriptor,
                proxy.non_proxy_hosts.as_deref(),
            )) as Arc<dyn ProxySelector>
        });

        Self {
            local: LocalCacheManager::new(&config.local_cache_path),
            offline: config.offline,
            connect_timeout: config.connect_timeout_ms.map(Duration::from_millis),
            request_timeout: config.request_timeout_ms.map(Duration::from_millis),
            proxy_selector,
        }
    }

    /// Replace the proxy selector
    pub fn with_proxy_selector(mut self, selector: Arc<dyn ProxySelector>) -> Self {
        self.proxy_selector = Some(selector);
        self
    }

    pub fn local(&self) -> &LocalCacheManager {
        &self.local
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn has_proxy_selector(&self) -> bool {
        self.proxy_selector.is_some()
    }

    /// Proxy for the repository; `None` without a selector
    pub fn select_proxy(&self, repository: &RepositoryDescriptor) -> Option<ProxyDescriptor> {
        self.proxy_selector
            .as_ref()
            .and_then(|selector| selector.select(repository))
    }
}
