//! # LMS Common Library
//!
//! Shared code for the LMS curriculum services including:
//! - Curriculum data model (weeks → sections → lessons)
//! - Configuration loading and config file resolution
//! - Common error type

pub mod config;
pub mod curriculum;
pub mod error;

pub use curriculum::{
    Curriculum, CurriculumOrigin, Lesson, LessonMeta, LessonProgress, LessonType, Resource,
    ResourceType, Section, StructureType, Week,
};
pub use error::{Error, Result};
