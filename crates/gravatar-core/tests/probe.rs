//! Integration tests for the existence probe using wiremock HTTP mocks.

use std::sync::Arc;
use std::time::Duration;

use gravatar_core::{hash_email, Gravatar, GravatarConfig, GravatarError, Profile, ProfileSet};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, store: ProfileSet) -> Gravatar {
    let config = GravatarConfig {
        base_url: base_url.to_string(),
        secure_base_url: base_url.to_string(),
        probe_timeout_secs: 1,
        ..GravatarConfig::default()
    };
    Gravatar::from_config(Arc::new(store), &config).expect("client construction should not fail")
}

fn bare_store() -> ProfileSet {
    ProfileSet::with_default(Profile::new())
}

#[tokio::test]
async fn exists_returns_true_on_200() {
    let server = MockServer::start().await;
    let hash = hash_email("user@example.com");

    Mock::given(method("HEAD"))
        .and(path(format!("/avatar/{hash}")))
        .and(query_param("d", "404"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gravatar = test_client(&server.uri(), bare_store());
    let found = gravatar
        .exists("user@example.com")
        .await
        .expect("valid email");
    assert!(found);
}

#[tokio::test]
async fn exists_returns_false_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(query_param("d", "404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gravatar = test_client(&server.uri(), bare_store());
    assert!(!gravatar.exists("nobody@example.com").await.unwrap());
}

#[tokio::test]
async fn only_200_counts_as_found() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let gravatar = test_client(&server.uri(), bare_store());
    assert!(!gravatar.probe("user@example.com").await.unwrap());
}

#[tokio::test]
async fn sentinel_replaces_profile_fallback_and_keeps_other_options() {
    let server = MockServer::start().await;
    let hash = hash_email("user@example.com");

    Mock::given(method("HEAD"))
        .and(path(format!("/avatar/{hash}.jpg")))
        .and(query_param("s", "80"))
        .and(query_param("d", "404"))
        .and(query_param("r", "g"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // Built-in defaults carry `fallback: mp` and `forceExtension: jpg`.
    let gravatar = test_client(&server.uri(), ProfileSet::builtin());
    assert!(gravatar.exists("user@example.com").await.unwrap());
}

#[tokio::test]
async fn invalid_email_fails_without_network_access() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gravatar = test_client(&server.uri(), bare_store());
    let err = gravatar.exists("not-an-email").await.unwrap_err();
    assert!(
        matches!(err, GravatarError::InvalidEmail(_)),
        "expected InvalidEmail, got: {err:?}"
    );
}

#[tokio::test]
async fn slow_response_is_a_probe_failure() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let gravatar = test_client(&server.uri(), bare_store());

    let err = gravatar.probe("user@example.com").await.unwrap_err();
    assert!(
        matches!(err, GravatarError::ProbeFailed { ref source, .. } if source.is_timeout()),
        "expected ProbeFailed(timeout), got: {err:?}"
    );

    let found = gravatar
        .exists("user@example.com")
        .await
        .expect("timeouts are not fatal");
    assert!(!found);
}

#[tokio::test]
async fn unreachable_host_is_reported_as_not_found() {
    // Nothing listens on the discard port locally.
    let gravatar = test_client("http://127.0.0.1:9", bare_store());

    let err = gravatar.probe("user@example.com").await.unwrap_err();
    assert!(matches!(err, GravatarError::ProbeFailed { .. }));

    assert!(!gravatar.exists("user@example.com").await.unwrap());
}
