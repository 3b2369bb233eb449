//! lms-curriculum library interface
//!
//! Resolves a course's curriculum from the LMS API with caching, request
//! sharing and sample fallback. The binary serves it over HTTP.

pub mod api;
pub mod cache;
pub mod error;
pub mod lookup;
pub mod normalizer;
pub mod resolver;
pub mod sample;
pub mod sources;
pub mod types;

pub use crate::error::{ApiError, ApiResult, ResolveError};
pub use crate::resolver::CurriculumResolver;
pub use crate::types::{CurriculumRequest, CurriculumSource, SourceError};

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: CurriculumResolver,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(resolver: CurriculumResolver) -> Self {
        Self {
            resolver,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::curriculum_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
