//! Curriculum API handlers
//!
//! GET /curriculum/:course_id, GET /curriculum/:course_id/lessons/:lesson_id,
//! POST /cache/clear

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use lms_common::{Curriculum, Lesson};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::types::CurriculumRequest;
use crate::AppState;

/// Query parameters shared by the curriculum and lesson endpoints
#[derive(Debug, Default, Deserialize)]
pub struct CurriculumQuery {
    pub student_id: Option<String>,
    pub include_progress: Option<bool>,
    pub include_resources: Option<bool>,
    /// Overrides the configured sample-fallback default
    pub fallback_to_sample: Option<bool>,
}

impl CurriculumQuery {
    fn into_request(self, state: &AppState, course_id: String) -> CurriculumRequest {
        let mut request = state.resolver.request(course_id);
        if let Some(student_id) = self.student_id.filter(|s| !s.trim().is_empty()) {
            request = request.for_student(student_id);
        }
        if let Some(include_progress) = self.include_progress {
            request = request.with_progress(include_progress);
        }
        if let Some(include_resources) = self.include_resources {
            request = request.with_resources(include_resources);
        }
        if let Some(fallback_to_sample) = self.fallback_to_sample {
            request = request.with_sample_fallback(fallback_to_sample);
        }
        request
    }
}

/// POST /cache/clear response
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}

/// GET /curriculum/:course_id
pub async fn get_curriculum(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<CurriculumQuery>,
) -> ApiResult<Json<Arc<Curriculum>>> {
    let request = query.into_request(&state, course_id);
    debug!(?request, "Get curriculum");

    let curriculum = state.resolver.get_curriculum(request).await?;
    Ok(Json(curriculum))
}

/// GET /curriculum/:course_id/lessons/:lesson_id
pub async fn get_lesson(
    State(state): State<AppState>,
    Path((course_id, lesson_id)): Path<(String, String)>,
    Query(query): Query<CurriculumQuery>,
) -> ApiResult<Json<Lesson>> {
    let request = query.into_request(&state, course_id);
    debug!(?request, lesson_id = %lesson_id, "Get lesson");

    match state.resolver.lesson(request, &lesson_id).await {
        Ok(Some(lesson)) => Ok(Json(lesson)),
        Ok(None) => Err(ApiError::NotFound(format!("Lesson not found: {}", lesson_id))),
        Err(e) => Err(e.into()),
    }
}

/// POST /cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.resolver.clear_cache().await;
    Json(ClearCacheResponse { cleared })
}

/// Build curriculum routes
pub fn curriculum_routes() -> Router<AppState> {
    Router::new()
        .route("/curriculum/:course_id", get(get_curriculum))
        .route("/curriculum/:course_id/lessons/:lesson_id", get(get_lesson))
        .route("/cache/clear", post(clear_cache))
}
