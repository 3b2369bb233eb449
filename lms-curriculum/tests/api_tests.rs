//! HTTP API integration tests
//!
//! Exercises the router with `tower::ServiceExt::oneshot`; sources are
//! in-process so no network is involved.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use lms_common::config::{PINNED_FALLBACK_LESSON_ID, PINNED_FALLBACK_VIDEO_URL};
use lms_common::{Curriculum, CurriculumOrigin};
use lms_curriculum::normalizer::Normalizer;
use lms_curriculum::{
    build_router, AppState, CurriculumRequest, CurriculumResolver, CurriculumSource, SourceError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Source that always answers with the same curriculum (or nothing)
struct StaticSource(Option<Curriculum>);

#[async_trait::async_trait]
impl CurriculumSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn try_fetch(&self, _request: &CurriculumRequest) -> Result<Option<Curriculum>, SourceError> {
        Ok(self.0.clone())
    }
}

/// Source whose upstream is always unreachable
struct DownSource;

#[async_trait::async_trait]
impl CurriculumSource for DownSource {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn try_fetch(&self, _request: &CurriculumRequest) -> Result<Option<Curriculum>, SourceError> {
        Err(SourceError::Network("connection refused".to_string()))
    }
}

fn sample_source() -> StaticSource {
    let curriculum = Normalizer::default()
        .normalize(
            "c1",
            &json!({ "lessons": [
                { "_id": PINNED_FALLBACK_LESSON_ID, "title": "Intro", "lessonType": "video" },
                { "_id": "quiz-1", "title": "Check", "lessonType": "quiz",
                  "resources": [ { "title": "Notes", "type": "pdf" } ] }
            ] }),
            CurriculumOrigin::Dedicated,
        )
        .unwrap();
    StaticSource(Some(curriculum))
}

fn app_with(source: StaticSource) -> axum::Router {
    let resolver = CurriculumResolver::builder().source(Arc::new(source)).build();
    build_router(AppState::new(resolver))
}

async fn send(app: axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}


#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(app_with(sample_source()), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lms-curriculum");
    assert_eq!(body["sources"], json!(["static"]));
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_health_reports_last_source_failure() {
    let resolver = CurriculumResolver::builder()
        .source(Arc::new(DownSource))
        .source(Arc::new(sample_source()))
        .build();
    let app = build_router(AppState::new(resolver));

    let (status, _) = send(app.clone(), Method::GET, "/curriculum/c1").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(app, Method::GET, "/health").await;
    assert_eq!(body["last_error"], "down: Network error: connection refused");
    assert_eq!(body["cached_curricula"], 1);
}

#[tokio::test]
async fn test_get_curriculum() {
    let (status, body) = send(app_with(sample_source()), Method::GET, "/curriculum/c1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courseId"], "c1");
    assert_eq!(body["structureType"], "linear");
    assert_eq!(body["totalLessons"], 2);
    assert_eq!(body["weeks"].as_array().unwrap().len(), 1);
    assert_eq!(body["origin"]["source"], "dedicated");
}

#[tokio::test]
async fn test_no_curriculum_is_404_with_message() {
    let app = app_with(StaticSource(None));
    let (status, body) = send(app, Method::GET, "/curriculum/c1?fallback_to_sample=false").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "No curriculum data available");
}

#[tokio::test]
async fn test_sample_fallback_through_api() {
    let app = app_with(StaticSource(None));
    let (status, body) = send(app, Method::GET, "/curriculum/intro-to-quantum").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"]["source"], "sample");
    assert_eq!(body["totalLessons"], 6);
}

#[tokio::test]
async fn test_blank_course_id_is_400() {
    let (status, body) = send(app_with(sample_source()), Method::GET, "/curriculum/%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_lesson_with_fallback_media() {
    let uri = format!("/curriculum/c1/lessons/{}", PINNED_FALLBACK_LESSON_ID);
    let (status, body) = send(app_with(sample_source()), Method::GET, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["videoUrl"], PINNED_FALLBACK_VIDEO_URL);
    assert_eq!(body["lessonType"], "video");
}

#[tokio::test]
async fn test_lesson_keeps_resources_by_default() {
    let app = app_with(sample_source());
    let (status, body) = send(app, Method::GET, "/curriculum/c1/lessons/quiz-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resources"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_lesson_is_404() {
    let (status, body) = send(app_with(sample_source()), Method::GET, "/curriculum/c1/lessons/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Lesson not found: nope");
}

#[tokio::test]
async fn test_clear_cache_reports_count() {
    let app = app_with(sample_source());

    let (status, _) = send(app.clone(), Method::GET, "/curriculum/c1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app.clone(), Method::GET, "/curriculum/c2").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), Method::POST, "/cache/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 2);

    let (_, body) = send(app, Method::POST, "/cache/clear").await;
    assert_eq!(body["cleared"], 0);
}
