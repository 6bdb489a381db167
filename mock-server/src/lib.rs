//! In-process stand-in for The Blue Alliance service.
//!
//! Serves fixture JSON under `/api/v3` with key checking and ETag
//! revalidation, and accepts signed writes under `/api/trusted/v1`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};

pub const AUTH_KEY_HEADER: &str = "x-tba-auth-key";
pub const AUTH_ID_HEADER: &str = "x-tba-auth-id";
pub const AUTH_SIG_HEADER: &str = "x-tba-auth-sig";

pub const DEFAULT_API_KEY: &str = "mock-key";
pub const DEFAULT_AUTH_ID: &str = "mock-id";
pub const DEFAULT_AUTH_SECRET: &str = "mock-secret";

/// One accepted trusted write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posted {
    /// Path below `/api/trusted/v1/`, like `event/2022iri/team_list/update`.
    pub path: String,
    pub payload: Value,
}

#[derive(Debug)]
pub struct MockState {
    api_key: String,
    auth_id: String,
    auth_secret: String,
    fixtures: RwLock<HashMap<String, Value>>,
    posted: RwLock<Vec<Posted>>,
    requests: AtomicUsize,
}

pub type SharedState = Arc<MockState>;

impl MockState {
    pub fn new(api_key: &str, auth_id: &str, auth_secret: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            auth_id: auth_id.to_string(),
            auth_secret: auth_secret.to_string(),
            fixtures: RwLock::new(HashMap::new()),
            posted: RwLock::new(Vec::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Default credentials and the fixture set from [`seed_fixtures`].
    pub fn seeded() -> Self {
        Self::new(DEFAULT_API_KEY, DEFAULT_AUTH_ID, DEFAULT_AUTH_SECRET).with_fixtures(seed_fixtures())
    }

    pub fn with_fixtures(self, fixtures: HashMap<String, Value>) -> Self {
        Self {
            fixtures: RwLock::new(fixtures),
            ..self
        }
    }

    /// Adds or replaces the body served for a v3 path, like `team/frc254`.
    pub async fn insert(&self, path: &str, body: Value) {
        self.fixtures.write().await.insert(path.to_string(), body);
    }

    /// Accepted trusted writes in arrival order.
    pub async fn posted(&self) -> Vec<Posted> {
        self.posted.read().await.clone()
    }

    /// Requests seen on either surface, including rejected ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/api/v3/{*path}", get(read_api))
        .route("/api/trusted/v1/{*path}", post(trusted_api))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app(state)).await
}

/// Quoted MD5 of the body, the tag served in `ETag`.
pub fn etag_for(body: &str) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(body.as_bytes())))
}

/// Expected `X-TBA-Auth-Sig` for a trusted write.
pub fn signature(secret: &str, path: &str, body: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "Error": message.into() }))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn read_api(State(state): State<SharedState>, Path(path): Path<String>, headers: HeaderMap) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if header_str(&headers, AUTH_KEY_HEADER) != Some(state.api_key.as_str()) {
        warn!(%path, "rejected read with bad auth key");
        return error(
            StatusCode::UNAUTHORIZED,
            "X-TBA-Auth-Key is invalid. Please get an access key at http://www.thebluealliance.com/account.",
        );
    }

    let path = path.trim_end_matches('/');
    let fixtures = state.fixtures.read().await;
    let Some(body) = fixtures.get(path) else {
        debug!(%path, "no fixture");
        return error(StatusCode::NOT_FOUND, format!("{path} was not found"));
    };

    let body = body.to_string();
    let etag = etag_for(&body);
    if header_str(&headers, header::IF_NONE_MATCH.as_str()) == Some(etag.as_str()) {
        debug!(%path, "not modified");
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::ETAG, etag),
        ],
        body,
    )
        .into_response()
}

async fn trusted_api(State(state): State<SharedState>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let full_path = uri.path();

    if header_str(&headers, AUTH_ID_HEADER) != Some(state.auth_id.as_str()) {
        warn!(path = %full_path, "rejected write with unknown auth id");
        return error(StatusCode::UNAUTHORIZED, "Must provide a request header parameter 'X-TBA-Auth-Id'");
    }
    let expected = signature(&state.auth_secret, full_path, &body);
    if header_str(&headers, AUTH_SIG_HEADER) != Some(expected.as_str()) {
        warn!(path = %full_path, "rejected write with bad signature");
        return error(StatusCode::UNAUTHORIZED, "Invalid X-TBA-Auth-Sig!");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => return error(StatusCode::BAD_REQUEST, format!("Invalid JSON: {e}")),
    };
    let path = full_path.trim_start_matches("/api/trusted/v1/").to_string();
    info!(%path, "trusted write accepted");
    state.posted.write().await.push(Posted { path, payload });
    (StatusCode::OK, Json(json!({ "Success": "Request accepted" }))).into_response()
}

/// A small season of data: status, a few teams, the paged team listing,
/// two seasons of events and one event's matches and OPRs.
pub fn seed_fixtures() -> HashMap<String, Value> {
    let mut fixtures = HashMap::new();
    let mut put = |path: &str, body: Value| {
        fixtures.insert(path.to_string(), body);
    };

    put(
        "status",
        json!({
            "current_season": 2022,
            "max_season": 2022,
            "is_datafeed_down": false,
            "down_events": [],
            "ios": {"min_app_version": -1, "latest_app_version": -1},
            "android": {"min_app_version": -1, "latest_app_version": -1}
        }),
    );

    let teams = [
        (1, "The Juggernauts", "Pontiac"),
        (254, "The Cheesy Poofs", "San Jose"),
        (1678, "Citrus Circuits", "Davis"),
        (4099, "The Falcons", "Poolesville"),
    ];
    for (number, nickname, city) in teams {
        let key = format!("frc{number}");
        let simple = json!({"key": key, "team_number": number, "nickname": nickname, "city": city});
        let mut full = simple.clone();
        full["rookie_year"] = json!(1990 + number % 30);
        put(&format!("team/{key}/simple"), simple);
        put(&format!("team/{key}"), full);
    }

    // Page 0 holds low numbers, page 3 holds 1678 and up; the rest are empty.
    for page in 0..20u32 {
        let keys = match page {
            0 => json!(["frc1", "frc254"]),
            3 => json!(["frc1678"]),
            8 => json!(["frc4099"]),
            _ => json!([]),
        };
        put(&format!("teams/{page}/keys"), keys);
        put(&format!("teams/2021/{page}/keys"), if page == 0 { json!(["frc254"]) } else { json!([]) });
        put(
            &format!("teams/2022/{page}/keys"),
            match page {
                0 => json!(["frc1", "frc254"]),
                8 => json!(["frc4099"]),
                _ => json!([]),
            },
        );
    }

    put("events/2021/keys", json!(["2021va", "2021chcmp"]));
    put("team/frc254/events/2022/keys", json!(["2022iri"]));
    put("events/2022/keys", json!(["2022chcmp", "2022iri"]));
    put(
        "event/2022iri",
        json!({
            "key": "2022iri",
            "name": "Indiana Robotics Invitational",
            "event_code": "iri",
            "event_type": 99,
            "city": "Indianapolis",
            "year": 2022,
            "start_date": "2022-07-15",
            "end_date": "2022-07-16"
        }),
    );
    put(
        "event/2022iri/matches",
        json!([
            {
                "key": "2022iri_qm1",
                "comp_level": "qm",
                "match_number": 1,
                "event_key": "2022iri",
                "alliances": {
                    "red": {"score": 91, "team_keys": ["frc254", "frc1", "frc4099"]},
                    "blue": {"score": 120, "team_keys": ["frc1678", "frc118", "frc2056"]}
                }
            },
            {
                "key": "2022iri_qm2",
                "comp_level": "qm",
                "match_number": 2,
                "event_key": "2022iri",
                "alliances": {
                    "red": {"score": -1, "team_keys": ["frc254", "frc1678", "frc1"]},
                    "blue": {"score": -1, "team_keys": ["frc4099", "frc118", "frc2056"]}
                }
            }
        ]),
    );
    put(
        "event/2022iri/oprs",
        json!({
            "oprs": {"frc254": 48.5, "frc1678": 61.25, "frc4099": 22.0},
            "dprs": {"frc254": 30.0, "frc1678": 28.5, "frc4099": 35.25},
            "ccwms": {"frc254": 18.5, "frc1678": 32.75, "frc4099": -13.25}
        }),
    );
    fixtures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_is_quoted_md5_of_body() {
        assert_eq!(etag_for(""), "\"d41d8cd98f00b204e9800998ecf8427e\"");
    }

    #[test]
    fn signature_covers_secret_path_and_body() {
        assert_eq!(
            signature("s3cret", "/api/trusted/v1/event/2022iri/team_list/update", br#"["frc254"]"#),
            signature("s3cret", "/api/trusted/v1/event/2022iri/team_list/update", br#"["frc254"]"#)
        );
        assert_ne!(
            signature("s3cret", "/api/trusted/v1/event/2022iri/team_list/update", br#"["frc254"]"#),
            signature("other", "/api/trusted/v1/event/2022iri/team_list/update", br#"["frc254"]"#)
        );
        assert_eq!(signature("", "", b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn seed_covers_the_full_page_sweep() {
        let fixtures = seed_fixtures();
        for page in 0..20 {
            assert!(fixtures.contains_key(&format!("teams/{page}/keys")));
            assert!(fixtures.contains_key(&format!("teams/2021/{page}/keys")));
            assert!(fixtures.contains_key(&format!("teams/2022/{page}/keys")));
        }
        assert_eq!(fixtures["team/frc254/simple"]["nickname"], "The Cheesy Poofs");
    }

    #[test]
    fn posted_roundtrips_through_json() {
        let posted = Posted {
            path: "event/2022iri/matches/delete".to_string(),
            payload: json!(["qm1"]),
        };
        let back: Posted = serde_json::from_str(&serde_json::to_string(&posted).unwrap()).unwrap();
        assert_eq!(back, posted);
    }
}
