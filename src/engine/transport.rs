//! Transports: fetch one repository file into the local cache
//!
//! Downloads land in a temporary file next to the destination and are renamed
//! into place once complete, so concurrent resolvers never see partial files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dashmap::DashMap;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::coordinate::Coordinate;
use crate::repository::{Authentication, ProxyDescriptor, RepositoryDescriptor};
use crate::session::ResolutionSession;

const USER_AGENT: &str = concat!("artifact-resolver/", env!("CARGO_PKG_VERSION"));

/// Why a single repository could not supply a file
#[derive(Debug)]
pub enum TransferError {
    /// The repository answered but does not have the file
    NotFound,
    /// Anything else: network, auth, I/O, bad URL
    Failed(String),
}

impl From<io::Error> for TransferError {
    fn from(e: io::Error) -> Self {
        TransferError::Failed(e.to_string())
    }
}

/// Copies a repository file to `dest`
pub trait Transporter: Send + Sync {
    fn fetch(
        &self,
        session: &ResolutionSession,
        repository: &RepositoryDescriptor,
        coordinate: &Coordinate,
        dest: &Path,
    ) -> Result<(), TransferError>;
}

/// Write `reader` to `dest` via a sibling temp file and an atomic rename
fn write_atomically(dest: &Path, reader: &mut dyn io::Read) -> io::Result<u64> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    let written = io::copy(reader, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(written)
}

// ============================================================================
// FILE
// ============================================================================

/// `file://` repositories
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransporter;

impl FileTransporter {
    fn source_path(
        repository: &RepositoryDescriptor,
        coordinate: &Coordinate,
    ) -> Result<PathBuf, TransferError> {
        let base = url::Url::parse(&repository.url)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| TransferError::Failed(format!("invalid file URL '{}'", repository.url)))?;

        Ok(coordinate
            .repository_path()
            .split('/')
            .fold(base, |path, segment| path.join(segment)))
    }
}

impl Transporter for FileTransporter {
    fn fetch(
        &self,
        _session: &ResolutionSession,
        repository: &RepositoryDescriptor,
        coordinate: &Coordinate,
        dest: &Path,
    ) -> Result<(), TransferError> {
        let source = Self::source_path(repository, coordinate)?;
        if !source.is_file() {
            return Err(TransferError::NotFound);
        }

        let mut file = fs::File::open(&source)?;
        let bytes = write_atomically(dest, &mut file)?;
        debug!(
            repository = %repository.id,
            source = %source.display(),
            bytes,
            "Copied artifact from file repository"
        );
        Ok(())
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Everything that shapes a client for one repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    repository: String,
    proxy: Option<String>,
    proxy_auth: Option<Authentication>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

/// HTTP(S) repositories via blocking reqwest clients.
///
/// Clients are cached per repository wiring (proxy + timeouts), so the
/// connection pool survives across sessions.
#[derive(Default)]
pub struct HttpTransporter {
    clients: DashMap<ClientKey, reqwest::blocking::Client>,
}

impl HttpTransporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct clients built so far
    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }

    /// Proxy for this repository: the session's selector decides when present,
    /// otherwise whatever the descriptor carries.
    fn effective_proxy(
        session: &ResolutionSession,
        repository: &RepositoryDescriptor,
    ) -> Option<ProxyDescriptor> {
        if session.has_proxy_selector() {
            session.select_proxy(repository)
        } else {
            repository.proxy.clone()
        }
    }

    /// Get or create a cached client (atomic via DashMap entry API)
    fn client(
        &self,
        session: &ResolutionSession,
        repository: &RepositoryDescriptor,
    ) -> Result<reqwest::blocking::Client, TransferError> {
        use dashmap::mapref::entry::Entry;

        let proxy = Self::effective_proxy(session, repository);
        let key = ClientKey {
            repository: repository.id.clone(),
            proxy: proxy.as_ref().map(ProxyDescriptor::url),
            proxy_auth: proxy.as_ref().and_then(|p| p.authentication.clone()),
            connect_timeout: session.connect_timeout(),
            request_timeout: session.request_timeout(),
        };

        match self.clients.entry(key) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => {
                let client = build_client(session, proxy.as_ref())?;
                e.insert(client.clone());
                Ok(client)
            }
        }
    }
}

fn build_client(
    session: &ResolutionSession,
    proxy: Option<&ProxyDescriptor>,
) -> Result<reqwest::blocking::Client, TransferError> {
    let mut builder = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5));

    if let Some(timeout) = session.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = session.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder = match proxy {
        Some(p) => {
            let mut proxy = reqwest::Proxy::all(p.url())
                .map_err(|e| TransferError::Failed(format!("invalid proxy {}: {}", p.url(), e)))?;
            if let Some(auth) = &p.authentication {
                let (username, password) = auth.pair();
                proxy = proxy.basic_auth(username, password);
            }
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| TransferError::Failed(format!("failed to build HTTP client: {}", e)))
}

/// `base/` + repository path, tolerating a trailing slash on the base
pub(crate) fn artifact_url(repository: &RepositoryDescriptor, coordinate: &Coordinate) -> String {
    format!(
        "{}/{}",
        repository.url.trim_end_matches('/'),
        coordinate.repository_path()
    )
}

impl Transporter for HttpTransporter {
    fn fetch(
        &self,
        session: &ResolutionSession,
        repository: &RepositoryDescriptor,
        coordinate: &Coordinate,
        dest: &Path,
    ) -> Result<(), TransferError> {
        let client = self.client(session, repository)?;
        let url = artifact_url(repository, coordinate);

        debug!(repository = %repository.id, url = %url, "Downloading artifact");

        let mut request = client.get(&url);
        if let Some(auth) = &repository.authentication {
            let (username, password) = auth.pair();
            request = request.basic_auth(username, Some(password));
        }

        let mut response = request
            .send()
            .map_err(|e| TransferError::Failed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TransferError::NotFound);
        }
        if !status.is_success() {
            return Err(TransferError::Failed(format!("status code: {}", status)));
        }

        let bytes = write_atomically(dest, &mut response)?;
        debug!(repository = %repository.id, url = %url, bytes, "Downloaded artifact");
        Ok(())
    }
}
