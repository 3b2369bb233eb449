//! HTTP API handlers for lms-curriculum

pub mod curriculum;
pub mod health;

pub use curriculum::curriculum_routes;
pub use health::health_routes;
