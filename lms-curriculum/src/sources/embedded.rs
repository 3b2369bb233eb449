//! Curriculum embedded in the course document
//!
//! `GET {base}/courses/{courseId}?student_id=...`. The curriculum array may sit
//! at `data.curriculum`, `data.course.curriculum` or top-level `curriculum`.

use async_trait::async_trait;
use lms_common::{Curriculum, CurriculumOrigin};
use serde_json::Value;
use tracing::debug;

use super::api_client::{json_path, ApiClient};
use super::{non_empty_array, normalize_for_request};
use crate::normalizer::Normalizer;
use crate::types::{CurriculumRequest, CurriculumSource, SourceError};

/// Candidate locations of the embedded curriculum, in priority order
const CURRICULUM_PATHS: &[&[&str]] = &[
    &["data", "curriculum"],
    &["data", "course", "curriculum"],
    &["curriculum"],
];

pub struct EmbeddedSource {
    client: ApiClient,
    normalizer: Normalizer,
}

impl EmbeddedSource {
    pub fn new(client: ApiClient, normalizer: Normalizer) -> Self {
        Self { client, normalizer }
    }
}

/// First non-empty curriculum array in a course document
pub fn extract_embedded(body: &Value) -> Option<&Value> {
    CURRICULUM_PATHS
        .iter()
        .filter_map(|path| json_path(body, path))
        .find(|value| non_empty_array(value))
}

#[async_trait]
impl CurriculumSource for EmbeddedSource {
    fn name(&self) -> &'static str {
        "embedded"
    }

    async fn try_fetch(&self, request: &CurriculumRequest) -> Result<Option<Curriculum>, SourceError> {
        let query: Vec<(&str, String)> = request
            .student_id
            .iter()
            .map(|id| ("student_id", id.clone()))
            .collect();

        let body = self
            .client
            .get_json(&["courses", request.course_id.as_str()], &query)
            .await?;

        let Some(raw) = extract_embedded(&body) else {
            debug!(course_id = %request.course_id, "Course document has no embedded curriculum");
            return Ok(None);
        };

        normalize_for_request(&self.normalizer, request, raw, CurriculumOrigin::Embedded)
    }
}
