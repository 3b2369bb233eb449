//! Sample curriculum generator
//!
//! Produces a complete curriculum with no remote dependency. Demo courses are
//! matched against a template table; every other id gets the generic
//! four-lesson template.

use lms_common::config::SampleConfig;
use lms_common::{
    Curriculum, CurriculumOrigin, Lesson, LessonMeta, LessonType, Resource, ResourceType, Section,
    StructureType, Week,
};
use tracing::debug;

use crate::lookup::FallbackMedia;

/// Demo course template
pub struct DemoTemplate {
    pub name: &'static str,
    /// Exact course ids
    pub course_ids: &'static [&'static str],
    /// Case-insensitive substrings of the course id
    pub id_substrings: &'static [&'static str],
    pub build: fn() -> Vec<Week>,
}

impl DemoTemplate {
    pub fn matches(&self, course_id: &str) -> bool {
        if self.course_ids.iter().any(|id| *id == course_id) {
            return true;
        }
        let lowered = course_id.to_lowercase();
        self.id_substrings.iter().any(|s| lowered.contains(s))
    }
}

/// Registered demo templates, checked in order
pub const DEMO_TEMPLATES: &[DemoTemplate] = &[DemoTemplate {
    name: "quantum-computing",
    course_ids: &["67dce45f3321e3ccc478e271"],
    id_substrings: &["quantum"],
    build: quantum_weeks,
}];

/// Sample generator
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    demo_templates: bool,
    media: FallbackMedia,
}

impl SampleGenerator {
    pub fn new(demo_templates: bool, media: FallbackMedia) -> Self {
        Self {
            demo_templates,
            media,
        }
    }

    pub fn from_config(config: &SampleConfig, media: FallbackMedia) -> Self {
        Self::new(config.demo_templates, media)
    }

    /// Demo template matching `course_id`, if demo matching is enabled
    pub fn template_for(&self, course_id: &str) -> Option<&'static DemoTemplate> {
        if !self.demo_templates {
            return None;
        }
        DEMO_TEMPLATES.iter().find(|t| t.matches(course_id))
    }

    /// Build a sample curriculum for `course_id`
    pub fn generate(&self, course_id: &str) -> Curriculum {
        let weeks = match self.template_for(course_id) {
            Some(template) => {
                debug!(course_id = %course_id, template = template.name, "Using demo template");
                (template.build)()
            }
            None => generic_weeks(),
        };

        let mut curriculum = Curriculum {
            id: format!("sample_{}", course_id),
            course_id: course_id.to_string(),
            weeks,
            sections: Vec::new(),
            lessons: Vec::new(),
            total_lessons: 0,
            total_sections: 0,
            total_weeks: 0,
            structure_type: StructureType::Weekly,
            is_published: true,
            created_at: None,
            updated_at: None,
            origin: CurriculumOrigin::Sample,
        };

        for week in &mut curriculum.weeks {
            for section in &mut week.sections {
                for lesson in &mut section.lessons {
                    self.media.apply(lesson);
                }
            }
            for lesson in &mut week.lessons {
                self.media.apply(lesson);
            }
        }
        curriculum.recount();
        curriculum
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new(true, FallbackMedia::default())
    }
}

fn week(title: &str, description: &str, topics: &[&str], sections: Vec<Section>) -> Week {
    Week {
        id: "week_1".to_string(),
        title: title.to_string(),
        description: description.to_string(),
        order: 1,
        sections,
        lessons: Vec::new(),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        total_lessons: 0,
        total_sections: 0,
    }
}

fn section(j: u32, title: &str, lessons: Vec<Lesson>) -> Section {
    let lessons = lessons
        .into_iter()
        .enumerate()
        .map(|(idx, mut lesson)| {
            let k = idx as u32 + 1;
            lesson.id = format!("lesson_1_{}_{}", j, k);
            lesson.order = k;
            lesson
        })
        .collect();

    Section {
        id: format!("section_1_{}", j),
        title: title.to_string(),
        description: String::new(),
        order: j,
        lessons,
    }
}

fn lesson(title: &str, lesson_type: LessonType, duration: &str, description: &str) -> Lesson {
    Lesson {
        id: String::new(),
        title: title.to_string(),
        description: description.to_string(),
        lesson_type,
        order: 0,
        duration: duration.to_string(),
        video_url: None,
        is_preview: false,
        is_completed: false,
        resources: Vec::new(),
        learning_objectives: Vec::new(),
        meta: LessonMeta::default(),
        progress: None,
    }
}

fn video(title: &str, duration: &str, url: &str, description: &str) -> Lesson {
    let mut l = lesson(title, LessonType::Video, duration, description);
    l.video_url = Some(url.to_string());
    l
}

fn quiz(title: &str, time_limit: u32, passing_score: u32) -> Lesson {
    let mut l = lesson(title, LessonType::Quiz, "00:15:00", "Check your understanding");
    l.meta.difficulty = Some("beginner".to_string());
    l.meta.time_limit = Some(time_limit);
    l.meta.passing_score = Some(passing_score);
    l
}

fn generic_weeks() -> Vec<Week> {
    let mut overview = lesson(
        "Course Overview",
        LessonType::Video,
        "00:10:00",
        "What this course covers and how it is organized",
    );
    overview.is_preview = true;

    let mut guide = lesson(
        "Getting Started Guide",
        LessonType::Reading,
        "00:05:00",
        "Setting up your learning environment",
    );
    guide.resources.push(Resource {
        title: "Course Handbook".to_string(),
        resource_type: ResourceType::Pdf,
        url: String::new(),
        description: "Syllabus and grading policy".to_string(),
        size: None,
        duration: None,
        downloadable: true,
        required: false,
    });

    let concepts = lesson(
        "Key Concepts",
        LessonType::Video,
        "00:20:00",
        "The core ideas you will build on",
    );

    vec![week(
        "Week 1: Getting Started",
        "Introduction to the course",
        &["Orientation", "Fundamentals"],
        vec![
            section(1, "Introduction", vec![overview, guide]),
            section(2, "Core Concepts", vec![concepts, quiz("Knowledge Check", 15, 70)]),
        ],
    )]
}

fn quantum_weeks() -> Vec<Week> {
    let mut intro = video(
        "What is Quantum Computing?",
        "00:12:30",
        "https://www.youtube.com/watch?v=JhHMJCUmq28",
        "From classical bits to quantum bits",
    );
    intro.is_preview = true;
    intro.learning_objectives = vec![
        "Contrast classical and quantum computation".to_string(),
        "Describe where quantum advantage comes from".to_string(),
    ];

    let mut superposition = video(
        "Superposition and Measurement",
        "00:18:45",
        "https://www.youtube.com/watch?v=F_Riqjdh2oM",
        "Amplitudes, probabilities and the Born rule",
    );
    superposition.meta.presenter = Some("Course Staff".to_string());

    let entanglement = video(
        "Entanglement",
        "00:15:20",
        "https://www.youtube.com/watch?v=QuR969uMICM",
        "Correlations with no classical counterpart",
    );

    let mut gates = lesson(
        "Quantum Gates and Circuits",
        LessonType::Reading,
        "00:25:00",
        "Pauli, Hadamard and CNOT gates",
    );
    gates.resources.push(Resource {
        title: "Gate Reference Sheet".to_string(),
        resource_type: ResourceType::Pdf,
        url: String::new(),
        description: "Matrix forms of common gates".to_string(),
        size: None,
        duration: None,
        downloadable: true,
        required: true,
    });

    let algorithms = video(
        "Deutsch-Jozsa and Grover",
        "00:22:10",
        "https://www.youtube.com/watch?v=X8MZWCGgIb8",
        "First algorithms with a provable speedup",
    );

    vec![week(
        "Quantum Computing Fundamentals",
        "Qubits, gates and first algorithms",
        &["Qubits", "Superposition", "Entanglement", "Quantum gates"],
        vec![
            section(1, "Introduction to Quantum Computing", vec![intro, superposition]),
            section(2, "Quantum Phenomena", vec![entanglement, gates]),
            section(3, "Quantum Algorithms", vec![algorithms, quiz("Fundamentals Quiz", 20, 75)]),
        ],
    )]
}
