//! Dedicated curriculum endpoint
//!
//! `GET {base}/curriculum/course/{courseId}` returning
//! `{ "data": { "curriculum": ... } }` in any of the three authored shapes.

use async_trait::async_trait;
use lms_common::{Curriculum, CurriculumOrigin};
use tracing::debug;

use super::api_client::{json_path, ApiClient};
use super::normalize_for_request;
use crate::normalizer::Normalizer;
use crate::types::{CurriculumRequest, CurriculumSource, SourceError};

pub struct DedicatedSource {
    client: ApiClient,
    normalizer: Normalizer,
}

impl DedicatedSource {
    pub fn new(client: ApiClient, normalizer: Normalizer) -> Self {
        Self { client, normalizer }
    }

    fn query(request: &CurriculumRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![("include_progress", request.include_progress.to_string())];
        if let Some(student_id) = &request.student_id {
            query.push(("student_id", student_id.clone()));
        }
        query.push(("include_resources", request.include_resources.to_string()));
        query.push(("include_lesson_details", "true".to_string()));
        query.push(("fallback_to_empty", "false".to_string()));
        query
    }
}

#[async_trait]
impl CurriculumSource for DedicatedSource {
    fn name(&self) -> &'static str {
        "dedicated"
    }

    async fn try_fetch(&self, request: &CurriculumRequest) -> Result<Option<Curriculum>, SourceError> {
        let body = self
            .client
            .get_json(&["curriculum", "course", request.course_id.as_str()], &Self::query(request))
            .await?;

        let Some(raw) = json_path(&body, &["data", "curriculum"]) else {
            debug!(course_id = %request.course_id, "Dedicated endpoint returned no curriculum");
            return Ok(None);
        };

        normalize_for_request(&self.normalizer, request, raw, CurriculumOrigin::Dedicated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parameters() {
        let request = CurriculumRequest::new("c1").for_student("s1").with_progress(true);
        let query = DedicatedSource::query(&request);
        let keys: Vec<&str> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "include_progress",
                "student_id",
                "include_resources",
                "include_lesson_details",
                "fallback_to_empty"
            ]
        );
        assert_eq!(query[0].1, "true");
        assert_eq!(query[4].1, "false");

        let anonymous = DedicatedSource::query(&CurriculumRequest::new("c1"));
        assert!(anonymous.iter().all(|(k, _)| *k != "student_id"));
    }
}
