//! Proxy routing tests
//!
//! [`MockEngine`] records the proxy chosen by the session's proxy selector
//! for every repository it contacts, so routing can be asserted without a
//! real proxy.

use std::sync::{Arc, Mutex};

use artifact_resolver::engine::MockEngine;
use artifact_resolver::{
    ArtifactResolver, Coordinate, Credentials, Proxy, ProxySelector, RemoteRepo,
    RepositoryConfig, RepositoryDescriptor,
};
use artifact_resolver::repository::ProxyDescriptor;
use tempfile::TempDir;

fn hello() -> Coordinate {
    Coordinate::new("org.example", "hello", "1.0.0").with_extension("jar")
}

fn resolver(config: RepositoryConfig, engine: &MockEngine) -> ArtifactResolver {
    ArtifactResolver::with_engine(config, Arc::new(engine.clone())).unwrap()
}

#[test]
fn test_proxy_without_credentials_routes_through_proxy() {
    let cache = TempDir::new().unwrap();
    let engine = MockEngine::new().with_artifact("central", &hello(), b"jar");
    let config = RepositoryConfig::new(cache.path())
        .with_remote_repository("central", RemoteRepo::new("https://repo.example.com/maven2"))
        .with_proxy(Proxy::new("proxy.example.com", 3128));

    let artifact = resolver(config, &engine).resolve(&hello()).unwrap();
    assert!(artifact.local_file_path.ends_with("hello-1.0.0.jar"));

    let routings = engine.proxy_routings();
    assert_eq!(routings.len(), 1);
    assert_eq!(routings[0].repository, "central");
    let proxy = routings[0].proxy.as_ref().expect("routed through proxy");
    assert_eq!(proxy.url(), "http://proxy.example.com:3128");
    assert!(proxy.authentication.is_none());
}

#[test]
fn test_proxy_credentials_reach_the_selector() {
    let cache = TempDir::new().unwrap();
    let engine = MockEngine::new().with_artifact("central", &hello(), b"jar");
    let config = RepositoryConfig::new(cache.path())
        .with_remote_repository("central", RemoteRepo::new("https://repo.example.com/maven2"))
        .with_proxy(
            Proxy::new("proxy.example.com", 3128)
                .with_protocol("https")
                .with_credentials(Credentials::new("proxy-user", "proxy-pass")),
        );

    resolver(config, &engine).resolve(&hello()).unwrap();

    let routing = &engine.proxy_routings()[0];
    let proxy = routing.proxy.as_ref().unwrap();
    assert_eq!(proxy.protocol, "https");
    assert_eq!(
        proxy.authentication.as_ref().unwrap().pair(),
        ("proxy-user", "proxy-pass")
    );
}

#[test]
fn test_non_proxy_hosts_bypass_proxy() {
    let cache = TempDir::new().unwrap();
    let engine = MockEngine::new().with_artifact("public", &hello(), b"jar");
    let config = RepositoryConfig::new(cache.path())
        .with_remote_repository("internal", RemoteRepo::new("https://nexus.corp.local/repo"))
        .with_remote_repository("public", RemoteRepo::new("https://repo.example.com/maven2"))
        .with_proxy(Proxy::new("proxy.example.com", 3128).with_non_proxy_hosts("*.corp.local"));

    resolver(config, &engine).resolve(&hello()).unwrap();

    let routings = engine.proxy_routings();
    assert_eq!(routings.len(), 2);
    assert_eq!(routings[0].repository, "internal");
    assert!(routings[0].proxy.is_none());
    assert_eq!(routings[1].repository, "public");
    assert!(routings[1].proxy.is_some());
}

#[test]
fn test_no_proxy_configured_means_direct() {
    let cache = TempDir::new().unwrap();
    let engine = MockEngine::new().with_artifact("central", &hello(), b"jar");
    let config = RepositoryConfig::new(cache.path())
        .with_remote_repository("central", RemoteRepo::new("https://repo.example.com/maven2"));

    let resolver = resolver(config, &engine);
    assert!(resolver.repositories()[0].proxy.is_none());
    resolver.resolve(&hello()).unwrap();

    assert!(engine.proxy_routings()[0].proxy.is_none());
}

#[test]
fn test_offline_cache_hit_makes_no_remote_calls() {
    let cache = TempDir::new().unwrap();
    let engine = MockEngine::new().with_artifact("central", &hello(), b"jar");
    let config = RepositoryConfig::new(cache.path())
        .with_remote_repository("central", RemoteRepo::new("https://repo.example.com/maven2"));

    resolver(config.clone(), &engine).resolve(&hello()).unwrap();
    assert_eq!(engine.remote_calls(), 1);

    let offline = resolver(config.with_offline(true), &engine)
        .resolve(&hello())
        .unwrap();
    assert!(offline.local_file_path.starts_with(cache.path()));
    assert_eq!(engine.remote_calls(), 1);
}

/// Selector double that records which repositories it was asked about
#[derive(Debug, Default)]
struct RecordingSelector {
    asked: Mutex<Vec<String>>,
}

impl ProxySelector for RecordingSelector {
    fn select(&self, repository: &RepositoryDescriptor) -> Option<ProxyDescriptor> {
        self.asked.lock().unwrap().push(repository.id.clone());
        Some(ProxyDescriptor {
            protocol: "http".to_string(),
            host: "recording.proxy".to_string(),
            port: 8080,
            authentication: None,
        })
    }
}

#[test]
fn test_custom_selector_is_invoked_per_repository() {
    let cache = TempDir::new().unwrap();
    let engine = MockEngine::new().with_artifact("second", &hello(), b"jar");
    let config = RepositoryConfig::new(cache.path())
        .with_remote_repository("first", RemoteRepo::new("https://one.example.com"))
        .with_remote_repository("second", RemoteRepo::new("https://two.example.com"));

    let resolver = resolver(config, &engine);
    let selector = Arc::new(RecordingSelector::default());
    let session = resolver.new_session().with_proxy_selector(selector.clone());

    resolver.resolve_with_session(&session, &hello()).unwrap();

    assert_eq!(*selector.asked.lock().unwrap(), vec!["first", "second"]);
    assert!(engine
        .proxy_routings()
        .iter()
        .all(|r| r.proxy.as_ref().map(|p| p.host.as_str()) == Some("recording.proxy")));
}
