use std::sync::Arc;

use lib_retriever::test_support::{
    InMemoryCredentialStore, library_entries, tar_gz_archive, zip_archive,
};
use lib_retriever::{
    CollectingSink, CredentialScope, ExecutionContext, LibraryRetriever, NullSink, RetrieveError,
    RetrieverConfig, UsernamePassword,
};
use lib_retriever_http::http_retriever;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Arc<InMemoryCredentialStore> {
    let mut store = InMemoryCredentialStore::new();
    store.add(
        "someCredentials",
        UsernamePassword::new("username", "password"),
        CredentialScope::Global,
    );
    Arc::new(store)
}

/// A server that challenges bare requests and serves `body` at `route` to
/// authenticated ones. HEAD requests always succeed.
async fn protected_server(route: &str, body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .and(basic_auth("username", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic"))
        .with_priority(5)
        .mount(&server)
        .await;
    server
}

fn template(server: &MockServer, route: &str) -> String {
    format!("{}{route}", server.uri())
}

#[tokio::test]
async fn retrieves_versioned_library() {
    let server = protected_server(
        "/libs/foo-1.2.3.zip",
        zip_archive(&library_entries(Some("1.2.3"))),
    )
    .await;
    let retriever = http_retriever(
        RetrieverConfig::new(template(&server, "/libs/foo-${library.foo.version}.zip"))
            .with_credentials("someCredentials"),
        credentials(),
    );

    let workspace = tempfile::tempdir().unwrap();
    let target = workspace.path().join("build/libs/foo");
    let log = CollectingSink::new();

    let retrieval = retriever
        .retrieve(
            "foo",
            "1.2.3",
            &target,
            &ExecutionContext::new("p #1", workspace.path().join("p")),
            &log,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(retrieval.resolved_version.as_deref(), Some("1.2.3"));
    assert!(target.join("version.txt").is_file());
    assert!(target.join("src").is_dir());
    assert!(target.join("vars").is_dir());
    assert!(target.join("resources").is_dir());
    assert_eq!(
        log.messages(),
        vec![format!("From HTTP URL: {}/libs/foo-1.2.3.zip", server.uri())]
    );
}

#[tokio::test]
async fn retrieves_tarball() {
    let server = protected_server("/libs/foo.tar.gz", tar_gz_archive(&library_entries(None))).await;
    let retriever = http_retriever(
        RetrieverConfig::new(template(&server, "/libs/foo.tar.gz"))
            .with_credentials("someCredentials"),
        credentials(),
    );

    let workspace = tempfile::tempdir().unwrap();
    let target = workspace.path().join("target");
    retriever
        .retrieve(
            "foo",
            "1.0",
            &target,
            &ExecutionContext::new("p #1", workspace.path().join("p")),
            &NullSink,
        )
        .await
        .unwrap();

    assert!(target.join("vars/hello.groovy").is_file());
}

#[tokio::test]
async fn hidden_library_needs_preemptive_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(basic_auth("username", "password"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(zip_archive(&library_entries(None))),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(5)
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    let context = ExecutionContext::new("p #1", workspace.path().join("p"));
    let config = RetrieverConfig::new(template(&server, "/libs/foo.zip"))
        .with_credentials("someCredentials");

    let err = http_retriever(config.clone(), credentials())
        .retrieve("foo", "1.0", &workspace.path().join("a"), &context, &NullSink)
        .await
        .unwrap_err();
    assert!(matches!(err, RetrieveError::Download { status: 404, .. }));

    http_retriever(config.with_preemptive_auth(true), credentials())
        .retrieve("foo", "1.0", &workspace.path().join("b"), &context, &NullSink)
        .await
        .unwrap();
    assert!(workspace.path().join("b/vars").is_dir());
}

#[tokio::test]
async fn empty_url_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    let err = http_retriever(RetrieverConfig::new(""), credentials())
        .retrieve(
            "foo",
            "1.0",
            &workspace.path().join("target"),
            &ExecutionContext::new("p #1", workspace.path().join("p")),
            &NullSink,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RetrieveError::Configuration(_)));
}

#[tokio::test]
async fn missing_library_fails_the_retrieval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    let target = workspace.path().join("target");
    let err = http_retriever(
        RetrieverConfig::new(template(&server, "/libs/nope.zip")),
        credentials(),
    )
    .retrieve(
        "foo",
        "1.0",
        &target,
        &ExecutionContext::new("p #1", workspace.path().join("p")),
        &NullSink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RetrieveError::Download { status: 404, .. }));
    assert!(!target.exists());
}

#[tokio::test]
async fn plain_http_validation_warns_even_when_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/libs/foo-1.2.3.zip"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let retriever = http_retriever(
        RetrieverConfig::new(template(&server, "/libs/foo-${library.foo.version}.zip")),
        credentials(),
    );

    let validation = retriever.validate_version("foo", "1.2.3").await;
    assert!(validation.is_warning());
    assert!(validation.message().starts_with("Version 1.2.3 is valid"));
}

#[tokio::test]
async fn validation_reports_unauthorized_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/libs/foo-1.0.zip"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/libs/foo-2.0.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let retriever = http_retriever(
        RetrieverConfig::new(template(&server, "/libs/foo-${library.foo.version}.zip")),
        credentials(),
    );

    let unauthorized = retriever.validate_version("foo", "1.0").await;
    assert_eq!(unauthorized.message(), "You are not authorized to access this URL...");

    let missing = retriever.validate_version("foo", "2.0").await;
    assert_eq!(missing.message(), "This URL does not exist...");
}

#[tokio::test]
async fn validation_of_unreachable_server_warns() {
    let retriever = http_retriever(
        RetrieverConfig::new("http://127.0.0.1:1/libs/foo.zip"),
        credentials(),
    );

    let validation = retriever.validate_version("foo", "1.0").await;
    assert!(validation.is_warning());
    assert!(validation.message().starts_with("Cannot validate default version"));
}
