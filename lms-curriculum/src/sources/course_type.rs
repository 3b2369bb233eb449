//! Multi-tenant course-type endpoints
//!
//! Tries `GET {base}/tcourse/{type}/{courseId}/curriculum` for each configured
//! course type in order. The first non-empty `data.curriculum` array wins.
//! A failing type is logged and the next one is tried.

use async_trait::async_trait;
use lms_common::{Curriculum, CurriculumOrigin};
use tracing::{debug, warn};

use super::api_client::{json_path, ApiClient};
use super::{non_empty_array, normalize_for_request};
use crate::normalizer::Normalizer;
use crate::types::{CurriculumRequest, CurriculumSource, SourceError};

pub struct CourseTypeSource {
    client: ApiClient,
    normalizer: Normalizer,
    course_types: Vec<String>,
}

impl CourseTypeSource {
    pub fn new(client: ApiClient, normalizer: Normalizer, course_types: Vec<String>) -> Self {
        Self {
            client,
            normalizer,
            course_types,
        }
    }

    pub fn course_types(&self) -> &[String] {
        &self.course_types
    }

    async fn fetch_type(
        &self,
        course_type: &str,
        request: &CurriculumRequest,
    ) -> Result<Option<Curriculum>, SourceError> {
        let body = self
            .client
            .get_json(
                &["tcourse", course_type, request.course_id.as_str(), "curriculum"],
                &[],
            )
            .await?;

        match json_path(&body, &["data", "curriculum"]) {
            Some(raw) if non_empty_array(raw) => normalize_for_request(
                &self.normalizer,
                request,
                raw,
                CurriculumOrigin::CourseType {
                    course_type: course_type.to_string(),
                },
            ),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CurriculumSource for CourseTypeSource {
    fn name(&self) -> &'static str {
        "course_type"
    }

    async fn try_fetch(&self, request: &CurriculumRequest) -> Result<Option<Curriculum>, SourceError> {
        for course_type in &self.course_types {
            match self.fetch_type(course_type, request).await {
                Ok(Some(curriculum)) => {
                    debug!(course_id = %request.course_id, course_type = %course_type, "Course-type curriculum found");
                    return Ok(Some(curriculum));
                }
                Ok(None) => {
                    debug!(course_id = %request.course_id, course_type = %course_type, "Course-type curriculum empty");
                }
                Err(e) => {
                    warn!(course_id = %request.course_id, course_type = %course_type, error = %e, "Course-type request failed");
                }
            }
        }
        Ok(None)
    }
}
