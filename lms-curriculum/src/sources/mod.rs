//! Curriculum source adapters
//!
//! Each adapter wraps one LMS endpoint family and implements
//! [`CurriculumSource`]. The default chain is:
//! 1. **dedicated** - `/curriculum/course/{id}`
//! 2. **course_type** - `/tcourse/{type}/{id}/curriculum` per configured type
//! 3. **embedded** - curriculum array inside `/courses/{id}`
//!
//! Adapters never retry; a failure is reported to the resolver, which logs it
//! and moves on to the next source.

pub mod api_client;
pub mod course_type;
pub mod dedicated;
pub mod embedded;

pub use api_client::ApiClient;
pub use course_type::CourseTypeSource;
pub use dedicated::DedicatedSource;
pub use embedded::EmbeddedSource;

use lms_common::config::ApiConfig;
use lms_common::{Curriculum, CurriculumOrigin, Lesson};
use serde_json::Value;
use std::sync::Arc;

use crate::normalizer::{NormalizeError, Normalizer};
use crate::types::{CurriculumRequest, CurriculumSource, SourceError};

/// Default source chain, in resolution order
pub fn default_sources(
    client: &ApiClient,
    config: &ApiConfig,
    normalizer: &Normalizer,
) -> Vec<Arc<dyn CurriculumSource>> {
    vec![
        Arc::new(DedicatedSource::new(client.clone(), normalizer.clone())),
        Arc::new(CourseTypeSource::new(
            client.clone(),
            normalizer.clone(),
            config.course_types.clone(),
        )),
        Arc::new(EmbeddedSource::new(client.clone(), normalizer.clone())),
    ]
}

/// Normalize a raw payload and shape it for the request
///
/// Empty payloads become `Ok(None)` so the resolver moves on.
pub(crate) fn normalize_for_request(
    normalizer: &Normalizer,
    request: &CurriculumRequest,
    raw: &Value,
    origin: CurriculumOrigin,
) -> Result<Option<Curriculum>, SourceError> {
    let mut curriculum = match normalizer.normalize(&request.course_id, raw, origin) {
        Ok(curriculum) => curriculum,
        Err(NormalizeError::Empty) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if !request.include_resources || !request.include_progress {
        strip_optional_fields(&mut curriculum, request);
    }

    Ok(Some(curriculum).filter(Curriculum::has_content))
}

fn strip_optional_fields(curriculum: &mut Curriculum, request: &CurriculumRequest) {
    let strip = |lesson: &mut Lesson| {
        if !request.include_resources {
            lesson.resources.clear();
        }
        if !request.include_progress {
            lesson.progress = None;
        }
    };

    for week in &mut curriculum.weeks {
        for section in &mut week.sections {
            section.lessons.iter_mut().for_each(strip);
        }
        week.lessons.iter_mut().for_each(strip);
    }
}

/// Non-empty JSON array
pub(crate) fn non_empty_array(value: &Value) -> bool {
    value.as_array().is_some_and(|items| !items.is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_for_request_strips_unrequested_fields() {
        let raw = json!({ "lessons": [ {
            "title": "l",
            "resources": [ { "title": "r", "type": "pdf" } ],
            "progress": { "completed": true }
        } ] });

        let request = CurriculumRequest::new("c").with_resources(false);
        let c = normalize_for_request(&Normalizer::default(), &request, &raw, CurriculumOrigin::Dedicated)
            .unwrap()
            .unwrap();
        let lesson = c.iter_lessons().next().unwrap();
        assert!(lesson.resources.is_empty());
        assert!(lesson.progress.is_none());

        let request = CurriculumRequest::new("c").with_progress(true);
        let c = normalize_for_request(&Normalizer::default(), &request, &raw, CurriculumOrigin::Dedicated)
            .unwrap()
            .unwrap();
        let lesson = c.iter_lessons().next().unwrap();
        assert_eq!(lesson.resources.len(), 1);
        assert!(lesson.progress.is_some());
    }

    #[test]
    fn test_normalize_for_request_empty_is_none() {
        let request = CurriculumRequest::new("c");
        let result =
            normalize_for_request(&Normalizer::default(), &request, &json!([]), CurriculumOrigin::Embedded);
        assert!(matches!(result, Ok(None)));
    }
}
