//! Mock Photos Library API and OAuth token endpoint
//!
//! Serves on an ephemeral local port and records every request so tests can
//! check request shapes. Routes are dispatched by hand from a fallback
//! handler since the API uses `:verb` suffixes inside path segments.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Endpoint kinds served by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Token,
    ListAlbums,
    CreateAlbum,
    EnrichAlbum,
    Upload,
    BatchCreate,
}

/// One request as received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    /// Album pages returned by the list endpoint, in order
    album_pages: Vec<Vec<Value>>,
    /// Fixed status for an endpoint, replacing its normal reply
    fail_with: HashMap<Endpoint, u16>,
    /// Reply body override for album creation
    create_reply: Option<Value>,
    next_id: usize,
}

/// Running mock server
#[derive(Clone)]
pub struct MockPhotos {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockPhotos {
    /// Bind to 127.0.0.1:0 and serve in the background
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// API root to hand to the client
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn token_uri(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn set_album_pages(&self, pages: Vec<Vec<Value>>) {
        self.state.lock().unwrap().album_pages = pages;
    }

    pub fn fail(&self, endpoint: Endpoint, status: u16) {
        self.state.lock().unwrap().fail_with.insert(endpoint, status);
    }

    pub fn set_create_reply(&self, reply: Value) {
        self.state.lock().unwrap().create_reply = Some(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, endpoint: Endpoint) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.endpoint == endpoint)
            .collect()
    }
}

fn classify(method: &Method, path: &str) -> Option<Endpoint> {
    match (method.as_str(), path) {
        ("POST", "/token") => Some(Endpoint::Token),
        ("GET", "/v1/albums") => Some(Endpoint::ListAlbums),
        ("POST", "/v1/albums") => Some(Endpoint::CreateAlbum),
        ("POST", "/v1/uploads") => Some(Endpoint::Upload),
        ("POST", "/v1/mediaItems:batchCreate") => Some(Endpoint::BatchCreate),
        ("POST", p) if p.starts_with("/v1/albums/") && p.ends_with(":addEnrichment") => {
            Some(Endpoint::EnrichAlbum)
        }
        _ => None,
    }
}

async fn handle(
    State(state): State<Arc<Mutex<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(endpoint) = classify(&method, uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut state = state.lock().unwrap();
    let query = uri.query().unwrap_or_default().to_string();
    let request = RecordedRequest {
        endpoint,
        path: uri.path().to_string(),
        query: query.clone(),
        headers,
        body: body.to_vec(),
    };
    state.requests.push(request.clone());

    if let Some(status) = state.fail_with.get(&endpoint) {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "mock failure").into_response();
    }

    match endpoint {
        Endpoint::Token => Json(json!({
            "access_token": "mock-access-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        }))
        .into_response(),
        Endpoint::ListAlbums => {
            let index = query
                .split('&')
                .find_map(|pair| pair.strip_prefix("pageToken=page"))
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);
            let albums = state.album_pages.get(index).cloned().unwrap_or_default();
            let mut reply = json!({ "albums": albums });
            if index + 1 < state.album_pages.len() {
                reply["nextPageToken"] = json!(format!("page{}", index + 1));
            }
            Json(reply).into_response()
        }
        Endpoint::CreateAlbum => {
            if let Some(reply) = state.create_reply.clone() {
                return Json(reply).into_response();
            }
            state.next_id += 1;
            let title = request.json()["album"]["title"].clone();
            Json(json!({
                "id": format!("mock-album-{}", state.next_id),
                "title": title,
                "productUrl": format!("https://photos.example/album/{}", state.next_id)
            }))
            .into_response()
        }
        Endpoint::EnrichAlbum => Json(json!({ "enrichmentItem": { "id": "enrichment-1" } })).into_response(),
        Endpoint::Upload => {
            state.next_id += 1;
            format!("mock-upload-token-{}", state.next_id).into_response()
        }
        Endpoint::BatchCreate => Json(json!({
            "newMediaItemResults": [ { "status": { "message": "Success" } } ]
        }))
        .into_response(),
    }
}
