use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, etag_for, signature, MockState, DEFAULT_API_KEY, DEFAULT_AUTH_ID, DEFAULT_AUTH_SECRET};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn read_request(uri: &str, key: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header("X-TBA-Auth-Key", key)
        .body(String::new())
        .unwrap()
}

fn signed_request(path: &str, body: &str, secret: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("X-TBA-Auth-Id", DEFAULT_AUTH_ID)
        .header("X-TBA-Auth-Sig", signature(secret, path, body.as_bytes()))
        .body(body.to_string())
        .unwrap()
}

fn seeded() -> Arc<MockState> {
    Arc::new(MockState::seeded())
}

// --- read api ---

#[tokio::test]
async fn known_path_returns_body_and_etag() {
    let resp = app(seeded())
        .oneshot(read_request("/api/v3/team/frc254/simple", DEFAULT_API_KEY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let etag = resp.headers()[http::header::ETAG].to_str().unwrap().to_string();
    let bytes = body_bytes(resp).await;
    assert_eq!(etag, etag_for(std::str::from_utf8(&bytes).unwrap()));
    let team: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(team["team_number"], 254);
}

#[tokio::test]
async fn matching_if_none_match_returns_304() {
    let state = seeded();
    let first = app(state.clone())
        .oneshot(read_request("/api/v3/status", DEFAULT_API_KEY))
        .await
        .unwrap();
    let etag = first.headers()[http::header::ETAG].clone();

    let mut conditional = read_request("/api/v3/status", DEFAULT_API_KEY);
    conditional.headers_mut().insert(http::header::IF_NONE_MATCH, etag.clone());
    let resp = app(state.clone()).oneshot(conditional).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(resp.headers()[http::header::ETAG], etag);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(state.request_count(), 2);
}

#[tokio::test]
async fn stale_if_none_match_returns_fresh_body() {
    let mut request = read_request("/api/v3/status", DEFAULT_API_KEY);
    request
        .headers_mut()
        .insert(http::header::IF_NONE_MATCH, "\"stale\"".parse().unwrap());
    let resp = app(seeded()).oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["current_season"], 2022);
}

#[tokio::test]
async fn bad_key_returns_401_error_body() {
    let resp = app(seeded())
        .oneshot(read_request("/api/v3/status", "wrong"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert!(body["Error"].as_str().unwrap().contains("X-TBA-Auth-Key"));
}

#[tokio::test]
async fn unknown_path_returns_404_error_body() {
    let resp = app(seeded())
        .oneshot(read_request("/api/v3/team/frc0", DEFAULT_API_KEY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["Error"], "team/frc0 was not found");
}

#[tokio::test]
async fn inserted_fixture_changes_etag() {
    let state = seeded();
    let before = app(state.clone())
        .oneshot(read_request("/api/v3/team/frc4099", DEFAULT_API_KEY))
        .await
        .unwrap();
    state.insert("team/frc4099", json!({"key": "frc4099", "team_number": 4099})).await;
    let after = app(state)
        .oneshot(read_request("/api/v3/team/frc4099", DEFAULT_API_KEY))
        .await
        .unwrap();

    assert_ne!(before.headers()[http::header::ETAG], after.headers()[http::header::ETAG]);
}

// --- trusted api ---

#[tokio::test]
async fn signed_write_is_recorded() {
    let state = seeded();
    let path = "/api/trusted/v1/event/2022iri/team_list/update";
    let resp = app(state.clone())
        .oneshot(signed_request(path, r#"["frc254","frc1678"]"#, DEFAULT_AUTH_SECRET))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["Success"].is_string());
    let posted = state.posted().await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].path, "event/2022iri/team_list/update");
    assert_eq!(posted[0].payload, json!(["frc254", "frc1678"]));
}

#[tokio::test]
async fn wrong_secret_returns_401_and_records_nothing() {
    let state = seeded();
    let path = "/api/trusted/v1/event/2022iri/matches/delete";
    let resp = app(state.clone())
        .oneshot(signed_request(path, r#"["qm1"]"#, "guess"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(resp).await["Error"].is_string());
    assert!(state.posted().await.is_empty());
}

#[tokio::test]
async fn missing_auth_id_returns_401() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/trusted/v1/event/2022iri/info/update")
        .body("{}".to_string())
        .unwrap();
    let resp = app(seeded()).oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_malformed_json_returns_400() {
    let path = "/api/trusted/v1/event/2022iri/info/update";
    let resp = app(seeded())
        .oneshot(signed_request(path, "{not json", DEFAULT_AUTH_SECRET))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
