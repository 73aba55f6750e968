//! HTTP checker tests against a wiremock server: auth injection styles and
//! failure classification.

use std::collections::HashMap;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use promodesk::catalog::{
    Category, FieldKind, FieldSpec, Probe, ProbeAuth, ServiceDescriptor,
};
use promodesk::models::service::FailureKind;
use promodesk::registry::checker::{ConnectivityChecker, HttpChecker};

const FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "api_key",
    label: "API key",
    kind: FieldKind::Password,
    required: true,
}];

fn probe_descriptor(url: String, auth: ProbeAuth) -> ServiceDescriptor {
    ServiceDescriptor {
        name: "probe_target",
        category: Category::AiServices,
        description: "probe target",
        fields: FIELDS,
        primary: Some("api_key"),
        // descriptors are 'static in the catalog; tests leak the mock URL
        probe: Some(Probe {
            url: Box::leak(url.into_boxed_str()),
            auth,
        }),
    }
}

fn credentials() -> HashMap<String, String> {
    HashMap::from([("api_key".to_string(), "sk-test".to_string())])
}

#[tokio::test]
async fn bearer_probe_sends_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor = probe_descriptor(format!("{}/v1/models", server.uri()), ProbeAuth::Bearer);
    let result = HttpChecker::new().check(&descriptor, &credentials()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn header_probe_sends_named_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("x-api-key", "sk-test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor = probe_descriptor(
        format!("{}/v1/models", server.uri()),
        ProbeAuth::Header("x-api-key"),
    );
    let result = HttpChecker::new().check(&descriptor, &credentials()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn query_probe_sends_credential_as_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(query_param("key", "sk-test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor =
        probe_descriptor(format!("{}/ping", server.uri()), ProbeAuth::Query("key"));
    let result = HttpChecker::new().check(&descriptor, &credentials()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn rejected_credential_classifies_as_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let descriptor = probe_descriptor(server.uri(), ProbeAuth::Bearer);
    let failure = HttpChecker::new()
        .check(&descriptor, &credentials())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Auth);
    // failure detail must never echo the credential
    assert!(!failure.message.contains("sk-test"));
}

#[tokio::test]
async fn server_error_classifies_as_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let descriptor = probe_descriptor(server.uri(), ProbeAuth::Bearer);
    let failure = HttpChecker::new()
        .check(&descriptor, &credentials())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Unknown);
}

#[tokio::test]
async fn unreachable_host_classifies_as_network() {
    // nothing listens on port 1
    let descriptor = probe_descriptor("http://127.0.0.1:1/".to_string(), ProbeAuth::Bearer);
    let failure = HttpChecker::new()
        .check(&descriptor, &credentials())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Network);
}
