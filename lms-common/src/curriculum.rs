//! Curriculum data model
//!
//! Canonical nested structure shared by the curriculum resolver and its HTTP
//! surface: `Curriculum` → `Week` → `Section` → `Lesson` → `Resource`.
//!
//! A normalized curriculum always carries its content in `weeks`; the flat
//! `sections`/`lessons` lists exist so that raw documents can be represented
//! before normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the curriculum was authored upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    /// Weeks containing sections and/or lessons
    #[default]
    Weekly,
    /// Flat list of sections
    Sectioned,
    /// Flat list of lessons
    Linear,
}

/// Which source produced a curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CurriculumOrigin {
    /// Dedicated curriculum endpoint
    Dedicated,
    /// Multi-tenant course-type endpoint
    CourseType {
        #[serde(rename = "courseType")]
        course_type: String,
    },
    /// Curriculum embedded in the course document
    Embedded,
    /// Locally generated placeholder
    Sample,
}

impl CurriculumOrigin {
    pub fn as_str(&self) -> &str {
        match self {
            CurriculumOrigin::Dedicated => "dedicated",
            CurriculumOrigin::CourseType { course_type } => course_type,
            CurriculumOrigin::Embedded => "embedded",
            CurriculumOrigin::Sample => "sample",
        }
    }
}

/// Lesson content kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    #[default]
    Video,
    Quiz,
    Assessment,
    Reading,
    Assignment,
    LiveSession,
}

impl LessonType {
    /// Parse an upstream tag, returning `None` for unknown tags
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "video" => Some(LessonType::Video),
            "quiz" => Some(LessonType::Quiz),
            "assessment" => Some(LessonType::Assessment),
            "reading" => Some(LessonType::Reading),
            "assignment" => Some(LessonType::Assignment),
            "live_session" | "live" => Some(LessonType::LiveSession),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::Video => "video",
            LessonType::Quiz => "quiz",
            LessonType::Assessment => "assessment",
            LessonType::Reading => "reading",
            LessonType::Assignment => "assignment",
            LessonType::LiveSession => "live_session",
        }
    }
}

/// Attachment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Pdf,
    Video,
    Link,
    Document,
    Code,
    Quiz,
    Assignment,
    #[default]
    Other,
}

impl ResourceType {
    /// Parse an upstream tag; unknown tags map to `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pdf" => ResourceType::Pdf,
            "video" => ResourceType::Video,
            "link" | "url" => ResourceType::Link,
            "document" | "doc" => ResourceType::Document,
            "code" => ResourceType::Code,
            "quiz" => ResourceType::Quiz,
            "assignment" => ResourceType::Assignment,
            _ => ResourceType::Other,
        }
    }
}

/// Top-level curriculum document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curriculum {
    pub id: String,
    pub course_id: String,
    #[serde(default)]
    pub weeks: Vec<Week>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lessons: Vec<Lesson>,
    pub total_lessons: usize,
    pub total_sections: usize,
    pub total_weeks: usize,
    pub structure_type: StructureType,
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub origin: CurriculumOrigin,
}

impl Curriculum {
    /// True if any of `weeks`, `sections` or `lessons` is non-empty
    pub fn has_content(&self) -> bool {
        !self.weeks.is_empty() || !self.sections.is_empty() || !self.lessons.is_empty()
    }

    /// Number of lessons across every placement in the document
    pub fn lesson_count(&self) -> usize {
        self.weeks.iter().map(Week::lesson_count).sum::<usize>()
            + self.sections.iter().map(|s| s.lessons.len()).sum::<usize>()
            + self.lessons.len()
    }

    /// Number of sections across every placement in the document
    pub fn section_count(&self) -> usize {
        self.weeks.iter().map(|w| w.sections.len()).sum::<usize>() + self.sections.len()
    }

    /// Recompute aggregate counts from the current contents
    pub fn recount(&mut self) {
        for week in &mut self.weeks {
            week.recount();
        }
        self.total_lessons = self.lesson_count();
        self.total_sections = self.section_count();
        self.total_weeks = self.weeks.len();
    }

    /// Iterate over every lesson depth-first
    ///
    /// Each week yields its sections' lessons, then its direct lessons,
    /// before the next week. Flat sections and lessons come last.
    pub fn iter_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.weeks
            .iter()
            .flat_map(Week::iter_lessons)
            .chain(self.sections.iter().flat_map(|s| s.lessons.iter()))
            .chain(self.lessons.iter())
    }
}

/// Ordered container of sections and/or direct lessons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub total_lessons: usize,
    #[serde(default)]
    pub total_sections: usize,
}

impl Week {
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum::<usize>() + self.lessons.len()
    }

    pub fn recount(&mut self) {
        self.total_lessons = self.lesson_count();
        self.total_sections = self.sections.len();
    }

    /// Section lessons first, then direct lessons
    pub fn iter_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.sections
            .iter()
            .flat_map(|s| s.lessons.iter())
            .chain(self.lessons.iter())
    }
}

/// Mid-level grouping inside a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Leaf content unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub lesson_type: LessonType,
    pub order: u32,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub meta: LessonMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<LessonProgress>,
}

impl Lesson {
    /// True when the lesson is a video with no usable URL
    pub fn is_missing_video(&self) -> bool {
        self.lesson_type == LessonType::Video
            && self.video_url.as_deref().map_or(true, |url| url.trim().is_empty())
    }
}

/// Free-form lesson metadata
///
/// Well-known keys are typed; anything else survives in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Time limit in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    /// Passing score in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-student lesson progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    #[serde(default)]
    pub completed: bool,
    /// Seconds watched
    #[serde(default)]
    pub watch_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub attempts: u32,
}

/// Attachment tied to a lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub downloadable: bool,
    #[serde(default)]
    pub required: bool,
}
