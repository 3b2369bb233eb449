//! Format normalizer
//!
//! Converts the three upstream payload shapes into the canonical curriculum:
//! - object with `weeks` → weeks kept, every level defaulted
//! - object with only `sections` → one synthetic "Course Content" week
//! - object with only `lessons` → one synthetic section inside one synthetic week
//!
//! Bare arrays (course-type and embedded payloads) are read as weeks unless
//! every element is lesson-shaped.
//!
//! Missing ids are synthesized from 1-based parent indices (`week_{i}`,
//! `section_{i}_{j}`, `lesson_{i}_{j}_{k}`; `j = 0` for lessons placed
//! directly in a week). Flat lists that arrive beside `weeks` are folded into
//! one trailing "Course Content" week. Missing
//! orders become index + 1; siblings are stably sorted by order and
//! renumbered if duplicates remain. Video lessons without media receive
//! their fallback URL here, once, before the curriculum is shared.

use chrono::{DateTime, Utc};
use lms_common::{
    Curriculum, CurriculumOrigin, Lesson, LessonMeta, LessonProgress, LessonType, Resource,
    ResourceType, Section, StructureType, Week,
};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::lookup::FallbackMedia;

/// Duration used when a lesson does not carry one
pub const DEFAULT_LESSON_DURATION: &str = "00:00";
/// Title of the week synthesized around flat sections or lessons
pub const SYNTHETIC_WEEK_TITLE: &str = "Course Content";
/// Title of the section synthesized around flat lessons
pub const SYNTHETIC_SECTION_TITLE: &str = "All Lessons";

/// Normalization error
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Payload has no weeks, sections or lessons
    #[error("Curriculum payload is empty")]
    Empty,

    /// Payload is neither an object nor an array
    #[error("Unexpected curriculum payload: {0}")]
    UnexpectedShape(String),

    #[error("Malformed curriculum payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Raw-to-canonical converter
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    media: FallbackMedia,
}

impl Normalizer {
    pub fn new(media: FallbackMedia) -> Self {
        Self { media }
    }

    pub fn media(&self) -> &FallbackMedia {
        &self.media
    }

    /// Normalize a raw payload into the canonical weeks-first shape
    pub fn normalize(
        &self,
        course_id: &str,
        raw: &Value,
        origin: CurriculumOrigin,
    ) -> Result<Curriculum, NormalizeError> {
        let raw = RawCurriculum::from_value(raw)?;

        let weeks = raw.weeks.unwrap_or_default();
        let sections = raw.sections.unwrap_or_default();
        let lessons = raw.lessons.unwrap_or_default();

        let (structure_type, weeks) = if !weeks.is_empty() {
            let index = weeks.len() + 1;
            let mut weeks = self.weeks(weeks);
            if !sections.is_empty() || !lessons.is_empty() {
                // Stray flat lists beside weeks go into a trailing week
                let mut extra = synthetic_week(
                    index,
                    self.sections(sections, index),
                    self.lessons(lessons, index, 0),
                );
                extra.order = weeks.iter().map(|w| w.order).max().unwrap_or(0) + 1;
                weeks.push(extra);
            }
            (StructureType::Weekly, weeks)
        } else if !sections.is_empty() {
            let week = synthetic_week(1, self.sections(sections, 1), Vec::new());
            (StructureType::Sectioned, vec![week])
        } else if !lessons.is_empty() {
            let section = Section {
                id: "section_1_1".to_string(),
                title: SYNTHETIC_SECTION_TITLE.to_string(),
                description: String::new(),
                order: 1,
                lessons: self.lessons(lessons, 1, 1),
            };
            let week = synthetic_week(1, vec![section], Vec::new());
            (StructureType::Linear, vec![week])
        } else {
            return Err(NormalizeError::Empty);
        };

        let mut curriculum = Curriculum {
            id: raw
                .id
                .unwrap_or_else(|| format!("curriculum_{}", course_id)),
            course_id: raw.course_id.unwrap_or_else(|| course_id.to_string()),
            weeks,
            sections: Vec::new(),
            lessons: Vec::new(),
            total_lessons: 0,
            total_sections: 0,
            total_weeks: 0,
            structure_type,
            is_published: raw.is_published.unwrap_or(true),
            created_at: parse_timestamp(raw.created_at.as_deref()),
            updated_at: parse_timestamp(raw.updated_at.as_deref()),
            origin,
        };
        curriculum.recount();

        debug!(
            course_id = %course_id,
            structure = ?curriculum.structure_type,
            weeks = curriculum.total_weeks,
            lessons = curriculum.total_lessons,
            "Normalized curriculum"
        );

        Ok(curriculum)
    }

    fn weeks(&self, raw: Vec<RawWeek>) -> Vec<Week> {
        let items = raw
            .into_iter()
            .enumerate()
            .map(|(idx, week)| {
                let i = idx + 1;
                let order = week.order;
                let week = Week {
                    id: week.id.unwrap_or_else(|| format!("week_{}", i)),
                    title: non_blank(week.title).unwrap_or_else(|| format!("Week {}", i)),
                    description: week.description.unwrap_or_default(),
                    order: 0,
                    sections: self.sections(week.sections.unwrap_or_default(), i),
                    lessons: self.lessons(week.lessons.unwrap_or_default(), i, 0),
                    topics: week.topics.unwrap_or_default(),
                    total_lessons: 0,
                    total_sections: 0,
                };
                (order, week)
            })
            .collect();
        ordered(items, |week, order| week.order = order)
    }

    fn sections(&self, raw: Vec<RawSection>, week_index: usize) -> Vec<Section> {
        let items = raw
            .into_iter()
            .enumerate()
            .map(|(idx, section)| {
                let j = idx + 1;
                let order = section.order;
                let section = Section {
                    id: section
                        .id
                        .unwrap_or_else(|| format!("section_{}_{}", week_index, j)),
                    title: non_blank(section.title).unwrap_or_else(|| format!("Section {}", j)),
                    description: section.description.unwrap_or_default(),
                    order: 0,
                    lessons: self.lessons(section.lessons.unwrap_or_default(), week_index, j),
                };
                (order, section)
            })
            .collect();
        ordered(items, |section, order| section.order = order)
    }

    fn lessons(&self, raw: Vec<RawLesson>, week_index: usize, section_index: usize) -> Vec<Lesson> {
        let items = raw
            .into_iter()
            .enumerate()
            .map(|(idx, lesson)| {
                let k = idx + 1;
                let order = lesson.order;
                let mut lesson = Lesson {
                    id: lesson
                        .id
                        .unwrap_or_else(|| format!("lesson_{}_{}_{}", week_index, section_index, k)),
                    title: non_blank(lesson.title).unwrap_or_else(|| format!("Lesson {}", k)),
                    description: lesson.description.unwrap_or_default(),
                    lesson_type: lesson
                        .lesson_type
                        .as_deref()
                        .and_then(LessonType::from_tag)
                        .unwrap_or_default(),
                    order: 0,
                    duration: non_blank(lesson.duration)
                        .unwrap_or_else(|| DEFAULT_LESSON_DURATION.to_string()),
                    video_url: non_blank(lesson.video_url),
                    is_preview: lesson.is_preview.unwrap_or(false),
                    is_completed: lesson.is_completed.unwrap_or(false),
                    resources: lesson
                        .resources
                        .unwrap_or_default()
                        .into_iter()
                        .map(RawResource::into_resource)
                        .collect(),
                    learning_objectives: lesson.learning_objectives.unwrap_or_default(),
                    meta: lesson.meta.map(meta_from_map).unwrap_or_default(),
                    progress: lesson.progress.map(RawProgress::into_progress),
                };
                self.media.apply(&mut lesson);
                (order, lesson)
            })
            .collect();
        ordered(items, |lesson, order| lesson.order = order)
    }
}

fn synthetic_week(index: usize, sections: Vec<Section>, lessons: Vec<Lesson>) -> Week {
    Week {
        id: format!("week_{}", index),
        title: SYNTHETIC_WEEK_TITLE.to_string(),
        description: String::new(),
        order: 1,
        sections,
        lessons,
        topics: Vec::new(),
        total_lessons: 0,
        total_sections: 0,
    }
}

/// Fill missing orders with index + 1, stable-sort, renumber on collisions
fn ordered<T>(items: Vec<(Option<u32>, T)>, set_order: impl Fn(&mut T, u32)) -> Vec<T> {
    let mut with_order: Vec<(u32, T)> = items
        .into_iter()
        .enumerate()
        .map(|(idx, (order, item))| (order.unwrap_or(idx as u32 + 1), item))
        .collect();
    with_order.sort_by_key(|(order, _)| *order);

    let has_duplicates = with_order.windows(2).any(|pair| pair[0].0 == pair[1].0);

    with_order
        .into_iter()
        .enumerate()
        .map(|(idx, (order, mut item))| {
            let order = if has_duplicates { idx as u32 + 1 } else { order };
            set_order(&mut item, order);
            item
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn meta_from_map(mut map: Map<String, Value>) -> LessonMeta {
    let mut take = |keys: &[&str]| keys.iter().find_map(|key| map.remove(*key));

    let difficulty = take(&["difficulty"]).and_then(|v| value_to_string(&v));
    let time_limit = take(&["timeLimit", "time_limit"]).and_then(|v| value_to_u32(&v));
    let passing_score = take(&["passingScore", "passing_score"]).and_then(|v| value_to_u32(&v));
    let presenter = take(&["presenter"]).and_then(|v| value_to_string(&v));

    LessonMeta {
        difficulty,
        time_limit,
        passing_score,
        presenter,
        extra: map,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // Mongo extended JSON ids: {"$oid": "..."}
        Value::Object(obj) => obj.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_string))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_u32))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}

/// String list that tolerates a lone string and object elements with a name
fn lenient_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    let item = |value: &Value| {
        value_to_string(value).or_else(|| {
            ["name", "title"]
                .iter()
                .find_map(|key| value.get(*key).and_then(value_to_string))
        })
    };
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => Some(items.iter().filter_map(item).collect()),
        Some(value) => item(&value).map(|s| vec![s]),
        None => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCurriculum {
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    course_id: Option<String>,
    weeks: Option<Vec<RawWeek>>,
    sections: Option<Vec<RawSection>>,
    lessons: Option<Vec<RawLesson>>,
    #[serde(deserialize_with = "lenient_bool")]
    is_published: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    created_at: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    updated_at: Option<String>,
}

impl RawCurriculum {
    fn from_value(raw: &Value) -> Result<Self, NormalizeError> {
        match canonical_keys(raw) {
            raw @ Value::Object(_) => Ok(serde_json::from_value(raw)?),
            Value::Array(items) if items.iter().all(is_lesson_shaped) && !items.is_empty() => {
                Ok(RawCurriculum {
                    lessons: Some(serde_json::from_value(Value::Array(items))?),
                    ..RawCurriculum::default()
                })
            }
            raw @ Value::Array(_) => Ok(RawCurriculum {
                weeks: Some(serde_json::from_value(raw)?),
                ..RawCurriculum::default()
            }),
            Value::Null => Err(NormalizeError::Empty),
            other => Err(NormalizeError::UnexpectedShape(json_kind(&other).to_string())),
        }
    }
}

/// Alternate spellings accepted for raw fields: `(alias, field, alias wins)`
///
/// Mongo documents may carry `_id` next to a virtual `id`; `_id` is
/// authoritative. Snake-case spellings only fill a field that is absent.
const KEY_ALIASES: &[(&str, &str, bool)] = &[
    ("_id", "id", true),
    ("course_id", "courseId", false),
    ("is_published", "isPublished", false),
    ("created_at", "createdAt", false),
    ("updated_at", "updatedAt", false),
    ("weekNumber", "order", false),
    ("week_number", "order", false),
    ("lesson_type", "lessonType", false),
    ("video_url", "videoUrl", false),
    ("is_preview", "isPreview", false),
    ("is_completed", "isCompleted", false),
    ("learning_objectives", "learningObjectives", false),
    ("watch_time", "watchTime", false),
    ("resourceType", "type", false),
];

/// Copy of `value` with every object's keys folded onto one spelling
///
/// Lesson `meta` maps are copied as-is.
fn canonical_keys(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonical_keys).collect()),
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            let mut aliased = Vec::new();
            for (key, child) in obj {
                let child = if key == "meta" {
                    child.clone()
                } else {
                    canonical_keys(child)
                };
                match KEY_ALIASES.iter().find(|(alias, _, _)| alias == key) {
                    Some(&(_, field, wins)) => aliased.push((field, wins, child)),
                    None => {
                        out.insert(key.clone(), child);
                    }
                }
            }
            for (field, wins, child) in aliased {
                if wins || !out.contains_key(field) {
                    out.insert(field.to_string(), child);
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// An element with lesson fields and no child collections
fn is_lesson_shaped(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if obj.contains_key("sections") || obj.contains_key("lessons") {
        return false;
    }
    ["lessonType", "videoUrl", "duration"]
        .iter()
        .any(|key| obj.contains_key(*key))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawWeek {
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    order: Option<u32>,
    sections: Option<Vec<RawSection>>,
    lessons: Option<Vec<RawLesson>>,
    #[serde(deserialize_with = "lenient_string_list")]
    topics: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSection {
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    order: Option<u32>,
    lessons: Option<Vec<RawLesson>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawLesson {
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    lesson_type: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    order: Option<u32>,
    #[serde(deserialize_with = "lenient_string")]
    duration: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    video_url: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    is_preview: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    is_completed: Option<bool>,
    resources: Option<Vec<RawResource>>,
    #[serde(deserialize_with = "lenient_string_list")]
    learning_objectives: Option<Vec<String>>,
    meta: Option<Map<String, Value>>,
    progress: Option<RawProgress>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawResource {
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    resource_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    size: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    duration: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    downloadable: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    required: Option<bool>,
}

impl RawResource {
    fn into_resource(self) -> Resource {
        Resource {
            title: non_blank(self.title).unwrap_or_else(|| "Resource".to_string()),
            resource_type: self
                .resource_type
                .as_deref()
                .map(ResourceType::from_tag)
                .unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            size: self.size,
            duration: self.duration,
            downloadable: self.downloadable.unwrap_or(false),
            required: self.required.unwrap_or(false),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawProgress {
    #[serde(deserialize_with = "lenient_bool")]
    completed: Option<bool>,
    #[serde(deserialize_with = "lenient_f64")]
    watch_time: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    score: Option<f64>,
    #[serde(deserialize_with = "lenient_u32")]
    attempts: Option<u32>,
}

impl RawProgress {
    fn into_progress(self) -> LessonProgress {
        LessonProgress {
            completed: self.completed.unwrap_or(false),
            watch_time: self.watch_time.filter(|w| *w > 0.0).map_or(0, |w| w.round() as u64),
            score: self.score,
            attempts: self.attempts.unwrap_or(0),
        }
    }
}
