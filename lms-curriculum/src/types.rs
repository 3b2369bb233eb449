//! Core types and the source adapter trait
//!
//! Every remote endpoint family is wrapped in a [`CurriculumSource`]. The
//! resolver walks an ordered list of sources and stops at the first one that
//! produces content; failures are isolated per source.

use lms_common::Curriculum;
use thiserror::Error;

use crate::normalizer::NormalizeError;

/// Inbound curriculum request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumRequest {
    pub course_id: String,
    pub student_id: Option<String>,
    pub include_progress: bool,
    pub include_resources: bool,
    /// Return a generated sample instead of failing when no source has data
    pub fallback_to_sample: bool,
}

impl CurriculumRequest {
    /// Request with resources included and sample fallback enabled
    pub fn new(course_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            student_id: None,
            include_progress: false,
            include_resources: true,
            fallback_to_sample: true,
        }
    }

    pub fn for_student(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    pub fn with_progress(mut self, include_progress: bool) -> Self {
        self.include_progress = include_progress;
        self
    }

    pub fn with_resources(mut self, include_resources: bool) -> Self {
        self.include_resources = include_resources;
        self
    }

    pub fn with_sample_fallback(mut self, fallback_to_sample: bool) -> Self {
        self.fallback_to_sample = fallback_to_sample;
        self
    }
}

/// Source adapter
///
/// `Ok(None)` means "no data here, try the next source". `Err` is a failure
/// that the resolver logs and then treats exactly like `Ok(None)`.
#[async_trait::async_trait]
pub trait CurriculumSource: Send + Sync {
    /// Source name for logs and provenance
    fn name(&self) -> &'static str;

    /// Attempt to fetch and normalize a curriculum for the request
    async fn try_fetch(&self, request: &CurriculumRequest) -> Result<Option<Curriculum>, SourceError>;
}

/// Source adapter error
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response
    #[error("HTTP {status}: {url}")]
    Status { status: u16, url: String },

    /// Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// URL could not be built from the base URL and path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}
