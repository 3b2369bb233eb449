//! Mock LMS API for integration tests
//!
//! Serves canned JSON per path on an ephemeral port and records every hit
//! along with its query string and auth headers.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded request
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<String, (StatusCode, Value)>,
    hits: Vec<Hit>,
}

#[derive(Clone)]
pub struct MockLms {
    pub base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl MockLms {
    /// Start a mock server; routes are paths below `/api`
    pub async fn start(routes: Vec<(&str, u16, Value)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(path, status, body)| {
                (
                    format!("/api{}", path),
                    (StatusCode::from_u16(status).unwrap(), body),
                )
            })
            .collect();
        let state = Arc::new(Mutex::new(MockState {
            routes,
            hits: Vec::new(),
        }));

        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.lock().unwrap().hits.clone()
    }

    /// Number of requests to a path below `/api`
    pub fn hit_count(&self, path: &str) -> usize {
        let full = format!("/api{}", path);
        self.hits().iter().filter(|h| h.path == full).count()
    }

    pub fn total_hits(&self) -> usize {
        self.state.lock().unwrap().hits.len()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<MockState>>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut state = state.lock().unwrap();
    state.hits.push(Hit {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header("authorization"),
        access_token: header("x-access-token"),
    });

    match state.routes.get(uri.path()) {
        Some((status, body)) => (*status, Json(body.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Not found" })),
        ),
    }
}

/// `{ "success": true, "data": { "curriculum": ... } }`
pub fn envelope(curriculum: Value) -> Value {
    json!({ "success": true, "data": { "curriculum": curriculum } })
}

/// Two weeks, three lessons, authored in the weekly shape
pub fn weekly_curriculum() -> Value {
    json!({
        "weeks": [
            {
                "_id": "w1",
                "title": "Orientation",
                "weekNumber": 1,
                "sections": [ {
                    "_id": "s1",
                    "title": "Welcome",
                    "lessons": [
                        { "_id": "l1", "title": "Hello", "lessonType": "video", "videoUrl": "https://cdn.example/hello.mp4" },
                        { "_id": "l2", "title": "Syllabus", "lessonType": "reading" }
                    ]
                } ]
            },
            {
                "_id": "w2",
                "title": "Practice",
                "weekNumber": 2,
                "lessons": [ { "_id": "l3", "title": "First exercise", "lessonType": "video" } ]
            }
        ]
    })
}

/// Bare week array as returned by the course-type endpoints
pub fn week_array() -> Value {
    json!([
        { "title": "Live Week", "sections": [ { "title": "Session", "lessons": [
            { "_id": "live-1", "title": "Kickoff", "lessonType": "live_session" },
            { "_id": "live-2", "title": "Recording", "lessonType": "video" }
        ] } ] }
    ])
}
