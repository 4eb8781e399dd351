use lib_retriever::{Authentication, ProbeOutcome, Transport, Url, UsernamePassword};
use lib_retriever_http::HttpTransport;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn probe(server: &MockServer, auth: Authentication<'_>) -> ProbeOutcome {
    let url = Url::parse(&format!("{}/libs/foo.zip", server.uri())).unwrap();
    HttpTransport::new().probe(&url, auth).await
}

async fn server_answering(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/libs/foo.zip"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn ok_is_available() {
    let server = server_answering(200).await;
    assert_eq!(probe(&server, Authentication::anonymous()).await, ProbeOutcome::Available);
}

#[tokio::test]
async fn unauthorized_is_distinct() {
    let server = server_answering(401).await;
    assert_eq!(probe(&server, Authentication::anonymous()).await, ProbeOutcome::Unauthorized);
}

#[tokio::test]
async fn other_statuses_are_not_found() {
    for status in [403, 404, 500] {
        let server = server_answering(status).await;
        assert_eq!(
            probe(&server, Authentication::anonymous()).await,
            ProbeOutcome::NotFound,
            "status {status}"
        );
    }
}

#[tokio::test]
async fn probe_uses_head() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(probe(&server, Authentication::anonymous()).await, ProbeOutcome::Available);
}

#[tokio::test]
async fn challenge_is_answered_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(basic_auth("user", "password"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic"))
        .with_priority(5)
        .mount(&server)
        .await;

    let credential = UsernamePassword::new("user", "password");
    assert_eq!(
        probe(&server, Authentication::new(Some(&credential), false)).await,
        ProbeOutcome::Available
    );
    assert_eq!(
        probe(&server, Authentication::anonymous()).await,
        ProbeOutcome::Unauthorized
    );
}

#[tokio::test]
async fn preemptive_probe_sends_credentials_first() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(basic_auth("user", "password"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(5)
        .mount(&server)
        .await;

    let credential = UsernamePassword::new("user", "password");
    assert_eq!(
        probe(&server, Authentication::new(Some(&credential), true)).await,
        ProbeOutcome::Available
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_carries_cause() {
    let url = Url::parse("http://127.0.0.1:1/libs/foo.zip").unwrap();
    let outcome = HttpTransport::new().probe(&url, Authentication::anonymous()).await;
    assert!(matches!(outcome, ProbeOutcome::Unreachable(cause) if !cause.is_empty()));
}
