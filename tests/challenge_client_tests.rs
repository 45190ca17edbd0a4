//! Wire format tests for `HttpChallengeClient`
//!
//! Every test runs against a local wiremock server:
//! - manifest request body and token capture
//! - token forwarding on page fetches, batches and completion
//! - status, envelope and empty page failures

use job_scraper_lib::domain::JobRecord;
use job_scraper_lib::infrastructure::challenge_client::{ChallengeClient, ClientError, HttpChallengeClient};
use job_scraper_lib::infrastructure::config::ChallengeConfig;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn client_for(server: &MockServer) -> HttpChallengeClient {
    let config = ChallengeConfig {
        base_url: server.uri(),
        email: "tester@example.com".to_string(),
        request_timeout_seconds: 5,
        ..ChallengeConfig::default()
    };
    HttpChallengeClient::new(&config).unwrap()
}

fn grant_response() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "token": "tok-123",
            "assigned_job_ids": ["6a6e5522934047b742b8b85a049422ae", "16021d0c9917798822213233920a560c"]
        }
    })
}

async fn mount_grant(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/challenges"))
        .and(body_json(json!({ "data": { "email": "tester@example.com" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_response()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_manifest_request_captures_token() {
    let server = MockServer::start().await;
    mount_grant(&server).await;
    let client = client_for(&server);

    let grant = client.request_manifest().await.unwrap();

    assert_eq!(grant.auth_token, "tok-123");
    assert_eq!(grant.job_ids.len(), 2);
    assert_eq!(client.auth_token().await.as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn test_unsuccessful_manifest_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/challenges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let result = client_for(&server).request_manifest().await;

    assert!(matches!(result, Err(ClientError::Rejected { .. })));
}

#[tokio::test]
async fn test_page_fetch_sends_token_and_page() {
    let server = MockServer::start().await;
    mount_grant(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "3"))
        .and(header("Authorization", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>page three</body></html>"))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    client.request_manifest().await.unwrap();
    let markup = client.fetch_page(3).await.unwrap();

    assert!(markup.contains("page three"));
}

#[tokio::test]
async fn test_batch_body_uses_snake_case_records() {
    let server = MockServer::start().await;
    mount_grant(&server).await;
    Mock::given(method("POST"))
        .and(path("/jobs/batch"))
        .and(header("Authorization", "tok-123"))
        .and(body_json(json!({
            "data": [{
                "employer_job_id": "6a6e5522934047b742b8b85a049422ae",
                "employer_name": "Old Navy",
                "title": "Brand Associate",
                "posted_at": "2017-02-03T00:00:00.000Z",
                "location": "Moen Stream Haleyberg, PW 19505-6761"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let record = JobRecord {
        employer_job_id: "6a6e5522934047b742b8b85a049422ae".into(),
        employer_name: "Old Navy".into(),
        title: "Brand Associate".into(),
        posted_at: "2017-02-03T00:00:00.000Z".into(),
        location: "Moen Stream Haleyberg, PW 19505-6761".into(),
    };

    client.request_manifest().await.unwrap();

    assert!(client.submit_batch(&[record], 1).await.unwrap());
}

#[tokio::test]
async fn test_unacknowledged_batch_is_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/batch"))
        .and(body_json(json!({ "data": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    assert!(!client_for(&server).submit_batch(&[], 4).await.unwrap());
}

#[tokio::test]
async fn test_completion_is_acknowledged() {
    let server = MockServer::start().await;
    mount_grant(&server).await;
    Mock::given(method("POST"))
        .and(path("/challenges/complete"))
        .and(header("Authorization", "tok-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": { "message": "done" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    client.request_manifest().await.unwrap();

    assert!(client.complete_challenge().await.unwrap());
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    match client_for(&server).fetch_page(1).await {
        Err(ClientError::Status { status, body, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_page_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_page(2).await;

    assert!(matches!(result, Err(ClientError::EmptyPage { page: 2 })));
}

#[tokio::test]
async fn test_malformed_envelope_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/challenges/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).complete_challenge().await;

    assert!(matches!(result, Err(ClientError::Envelope { .. })));
}
