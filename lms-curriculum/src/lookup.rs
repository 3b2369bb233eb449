//! Lesson lookup and fallback media
//!
//! Finding a lesson never mutates the curriculum. Fallback media is a separate
//! pure step that returns a new lesson value; `lesson_with_media` composes the
//! two for callers that want both.

use lms_common::config::MediaConfig;
use lms_common::{Curriculum, Lesson};
use std::collections::BTreeMap;

/// True if any of `weeks`, `sections` or `lessons` is non-empty
pub fn has_content(curriculum: &Curriculum) -> bool {
    curriculum.has_content()
}

/// Depth-first search for a lesson by id
///
/// Order: `weeks[].sections[].lessons[]`, `weeks[].lessons[]`,
/// `sections[].lessons[]`, then top-level `lessons[]`. First match wins.
pub fn find_lesson_by_id<'a>(curriculum: &'a Curriculum, lesson_id: &str) -> Option<&'a Lesson> {
    curriculum.iter_lessons().find(|lesson| lesson.id == lesson_id)
}

/// Find a lesson and fill in fallback media if it is a video without a URL
pub fn lesson_with_media(
    curriculum: &Curriculum,
    lesson_id: &str,
    media: &FallbackMedia,
) -> Option<Lesson> {
    find_lesson_by_id(curriculum, lesson_id).map(|lesson| media.resolve(lesson))
}

/// Deterministic fallback video selection
///
/// Pinned lesson ids map straight to their URL; every other id picks
/// `urls[sum(UTF-16 code units) % urls.len()]`.
#[derive(Debug, Clone)]
pub struct FallbackMedia {
    urls: Vec<String>,
    overrides: BTreeMap<String, String>,
}

impl FallbackMedia {
    pub fn new(urls: Vec<String>, overrides: BTreeMap<String, String>) -> Self {
        Self { urls, overrides }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.fallback_videos.clone(), config.overrides.clone())
    }

    /// Fallback URL for a lesson id; `None` only when nothing is configured
    pub fn video_for(&self, lesson_id: &str) -> Option<&str> {
        if let Some(url) = self.overrides.get(lesson_id) {
            return Some(url.as_str());
        }
        if self.urls.is_empty() {
            return None;
        }
        let sum = lesson_id
            .encode_utf16()
            .fold(0u64, |acc, unit| acc.wrapping_add(u64::from(unit)));
        let index = (sum % self.urls.len() as u64) as usize;
        Some(self.urls[index].as_str())
    }

    /// Copy of `lesson` with fallback media applied where needed
    pub fn resolve(&self, lesson: &Lesson) -> Lesson {
        let mut resolved = lesson.clone();
        self.apply(&mut resolved);
        resolved
    }

    /// Fill in fallback media on a lesson that is still being built
    pub(crate) fn apply(&self, lesson: &mut Lesson) {
        if lesson.is_missing_video() {
            lesson.video_url = self.video_for(&lesson.id).map(str::to_string);
        }
    }
}

impl Default for FallbackMedia {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}
