//! Mock server tests for the bullhorn-auth library.
//!
//! These tests use wiremock to simulate the Bullhorn OAuth and REST
//! endpoints and exercise the path-selection engine without network
//! access or real credentials.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bullhorn_auth::error::{InvalidInputError, TransportError};
use bullhorn_auth::{
    AccessToken, AcquireConfig, AcquireInput, AcquireMethod, ApiUrl, Credentials, Error,
    RefreshToken, RestSession, RestToken, TokenBundle,
};
use serde_json::json;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing discovery at the mock server.
fn config_for(server: &MockServer) -> AcquireConfig {
    let mut config = AcquireConfig::default();
    config.login_info_url = ApiUrl::new(format!("{}/loginInfo", server.uri())).unwrap();
    config
}

fn credentials() -> Credentials {
    Credentials::new("client-id", "client-secret", "api.user", "hunter2")
}

/// Mount the discovery endpoint advertising OAuth and REST bases on the
/// mock server itself.
async fn mount_login_info(server: &MockServer) {
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/loginInfo"))
        .and(query_param("username", "api.user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "oauthUrl": format!("{base}/oauth"),
            "restUrl": format!("{base}/rest"),
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Existing-Session Path
// ============================================================================

#[tokio::test]
async fn existing_session_is_reused() {
    let server = MockServer::start().await;
    let rest_url = format!("{}/rest/", server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .and(header("BhRestToken", "existing-token"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-RateLimit-Remaining-Minute", "120"),
        )
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(rest_url.clone()),
            rest_token: Some(RestToken::new("existing-token")),
            refresh_token: Some(RefreshToken::new("kept-refresh")),
            access_token: None,
        },
    };

    let session = RestSession::acquire(input, &config_for(&server)).await.unwrap();

    assert_eq!(session.method, AcquireMethod::Existing);
    assert_eq!(session.rest_url, rest_url);
    assert_eq!(session.rest_token.as_str(), "existing-token");
    assert_eq!(session.refresh_token.unwrap().as_str(), "kept-refresh");
    assert_eq!(session.min_remaining, Some(120));
}

#[tokio::test]
async fn quota_at_threshold_is_not_reused() {
    let server = MockServer::start().await;

    // Remaining quota equals the threshold; the comparison is strict.
    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-RateLimit-Remaining-Minute", "100"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(format!("{}/rest/", server.uri())),
            rest_token: Some(RestToken::new("depleted-token")),
            refresh_token: None,
            access_token: None,
        },
    };

    // With nothing else supplied, falling through exhausts every path.
    let err = RestSession::acquire(input, &config_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidInput(InvalidInputError::Insufficient)
    ));
}

// ============================================================================
// Refresh Path
// ============================================================================

#[tokio::test]
async fn stale_session_falls_back_to_refresh() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    mount_login_info(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(query_param("refresh_token", "R1"))
        .and(query_param("client_id", "client-id"))
        .and(query_param("client_secret", "client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A",
            "refresh_token": "R2",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .and(query_param("version", "*"))
        .and(query_param("access_token", "A"))
        .and(query_param("ttl", "43200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BhRestToken": "RT",
            "restUrl": format!("{base}/rest/"),
        })))
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: Some(credentials()),
        tokens: TokenBundle {
            rest_url: Some(format!("{base}/rest/")),
            rest_token: Some(RestToken::new("stale-token")),
            refresh_token: Some(RefreshToken::new("R1")),
            access_token: None,
        },
    };

    let session = RestSession::acquire(input, &config_for(&server)).await.unwrap();

    assert_eq!(session.method, AcquireMethod::Refresh);
    assert_eq!(session.rest_url, format!("{base}/rest/"));
    assert_eq!(session.rest_token.as_str(), "RT");
    assert_eq!(session.access_token.unwrap().as_str(), "A");
    // Freshly issued, not the stale one we supplied.
    assert_eq!(session.refresh_token.unwrap().as_str(), "R2");
    assert_eq!(session.min_remaining, None);
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_full_login() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_login_info(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid refresh token",
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/oauth/authorize"))
        .and(query_param("client_id", "client-id"))
        .and(query_param("response_type", "code"))
        .and(query_param("action", "Login"))
        .and(query_param("username", "api.user"))
        .and(query_param("password", "hunter2"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{base}/redirect?code=GRANT42").as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "authorization_code"))
        .and(query_param("code", "GRANT42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A2",
            "refresh_token": "R3",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .and(query_param("access_token", "A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BhRestToken": "RT2",
            "restUrl": format!("{base}/rest/"),
        })))
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: Some(credentials()),
        tokens: TokenBundle {
            rest_url: None,
            rest_token: None,
            refresh_token: Some(RefreshToken::new("expired-refresh")),
            access_token: None,
        },
    };

    let session = RestSession::acquire(input, &config_for(&server)).await.unwrap();

    assert_eq!(session.method, AcquireMethod::Full);
    assert_eq!(session.rest_token.as_str(), "RT2");
    assert_eq!(session.access_token.unwrap().as_str(), "A2");
    assert_eq!(session.refresh_token.unwrap().as_str(), "R3");
}

// ============================================================================
// Access-Token Path
// ============================================================================

#[tokio::test]
async fn access_token_with_rest_url_skips_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Discovery must not be called when the REST URL is already known.
    Mock::given(method("GET"))
        .and(path("/loginInfo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .and(query_param("access_token", "spendable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BhRestToken": "RT3",
            "restUrl": format!("{base}/rest/"),
        })))
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(format!("{base}/rest/")),
            rest_token: None,
            refresh_token: Some(RefreshToken::new("carried-over")),
            access_token: Some(AccessToken::new("spendable")),
        },
    };

    let session = RestSession::acquire(input, &config_for(&server)).await.unwrap();

    assert_eq!(session.method, AcquireMethod::Access);
    assert_eq!(session.rest_token.as_str(), "RT3");
    // The caller's refresh token is preserved in the result.
    assert_eq!(session.refresh_token.unwrap().as_str(), "carried-over");
}

#[tokio::test]
async fn access_token_without_rest_url_uses_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_login_info(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .and(query_param("access_token", "spendable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BhRestToken": "RT4",
            "restUrl": format!("{base}/rest/"),
        })))
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: Some(credentials()),
        tokens: TokenBundle {
            rest_url: None,
            rest_token: None,
            refresh_token: None,
            access_token: Some(AccessToken::new("spendable")),
        },
    };

    let session = RestSession::acquire(input, &config_for(&server)).await.unwrap();
    assert_eq!(session.method, AcquireMethod::Access);
    assert_eq!(session.rest_token.as_str(), "RT4");
}

#[tokio::test]
async fn access_token_alone_is_an_input_error() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: None,
            rest_token: None,
            refresh_token: None,
            access_token: Some(AccessToken::new("orphaned")),
        },
    };

    let err = RestSession::acquire(input, &config_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidInput(InvalidInputError::NoRestUrl)
    ));
}

// ============================================================================
// Insufficient Input
// ============================================================================

#[tokio::test]
async fn empty_input_fails_before_any_network_call() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = RestSession::acquire(AcquireInput::default(), &config_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidInput(InvalidInputError::Insufficient)
    ));
    // The message walks the caller through the acceptable combinations.
    let message = err.to_string();
    assert!(message.contains("rest_token"));
    assert!(message.contains("refresh_token"));
    assert!(message.contains("access_token"));
}

#[tokio::test]
async fn invalid_policy_fails_before_any_network_call() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.ttl_days = 0;

    let input = AcquireInput {
        credentials: Some(credentials()),
        tokens: TokenBundle::default(),
    };

    let err = RestSession::acquire(input, &config).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

// ============================================================================
// Determinism
// ============================================================================

#[tokio::test]
async fn acquisition_is_idempotent_against_fixed_responses() {
    let server = MockServer::start().await;
    let rest_url = format!("{}/rest/", server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-RateLimit-Remaining-Minute", "250"),
        )
        .mount(&server)
        .await;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(rest_url),
            rest_token: Some(RestToken::new("steady-token")),
            refresh_token: None,
            access_token: None,
        },
    };
    let config = config_for(&server);

    let first = RestSession::acquire(input.clone(), &config).await.unwrap();
    let second = RestSession::acquire(input, &config).await.unwrap();

    assert_eq!(first, second);
}

// ============================================================================
// Retry Behavior
// ============================================================================

#[tokio::test]
async fn transient_failures_are_retried_and_observed() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Two 500s, then success. Mount order decides which mock serves.
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BhRestToken": "RT5",
            "restUrl": format!("{base}/rest/"),
        })))
        .mount(&server)
        .await;

    let observed: Arc<Mutex<Vec<(u32, Option<u16>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);

    let mut config = config_for(&server);
    config.http.retries = 3;
    config.http.on_retry = Some(Arc::new(move |attempt| {
        sink.lock().unwrap().push((attempt.attempt, attempt.status));
    }));

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(format!("{base}/rest/")),
            rest_token: None,
            refresh_token: None,
            access_token: Some(AccessToken::new("spendable")),
        },
    };

    let session = RestSession::acquire(input, &config).await.unwrap();
    assert_eq!(session.rest_token.as_str(), "RT5");

    let observed = observed.lock().unwrap();
    assert_eq!(observed.as_slice(), &[(1, Some(500)), (2, Some(500))]);
}

#[tokio::test]
async fn retry_exhaustion_surfaces_the_last_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.http.retries = 1;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(format!("{}/rest/", server.uri())),
            rest_token: None,
            refresh_token: None,
            access_token: Some(AccessToken::new("spendable")),
        },
    };

    let err = RestSession::acquire(input, &config).await.unwrap_err();
    match err {
        Error::Api(api) => assert_eq!(api.status, 503),
        other => panic!("expected an API error, got: {other}"),
    }
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.http.timeout_ms = 50;

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(format!("{}/rest/", server.uri())),
            rest_token: None,
            refresh_token: None,
            access_token: Some(AccessToken::new("spendable")),
        },
    };

    let err = RestSession::acquire(input, &config).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Transport(TransportError::Timeout { duration_ms: 50 })
    ));
}

#[tokio::test]
async fn observer_panics_do_not_break_retries() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BhRestToken": "RT6",
            "restUrl": format!("{base}/rest/"),
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.http.retries = 2;
    config.http.on_retry = Some(Arc::new(|_| panic!("observer bug")));

    let input = AcquireInput {
        credentials: None,
        tokens: TokenBundle {
            rest_url: Some(format!("{base}/rest/")),
            rest_token: None,
            refresh_token: None,
            access_token: Some(AccessToken::new("spendable")),
        },
    };

    let session = RestSession::acquire(input, &config).await.unwrap();
    assert_eq!(session.rest_token.as_str(), "RT6");
}
