// ABOUTME: Course, module and lesson models with per-kind lesson payloads
// ABOUTME: Lesson kinds are a tagged enum instead of one row type with nullable columns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::quiz::QuizContent;
use super::tenant::TenantId;
use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminant stored in the `lessons.lesson_type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    /// Video lesson
    Video,
    /// Markdown document lesson
    Document,
    /// Lesson completed by passing a quiz
    Quiz,
}

impl LessonKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
            Self::Quiz => "quiz",
        }
    }

    /// Parse from database string representation
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupt` for unknown kinds
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "quiz" => Ok(Self::Quiz),
            other => Err(DomainError::corrupt(format!("unknown lesson type '{other}'"))),
        }
    }
}

/// Kind-specific lesson payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LessonContent {
    /// Video lesson; the URL points into blob storage
    Video {
        /// Stable URL of the uploaded video
        #[serde(default, skip_serializing_if = "Option::is_none")]
        video_url: Option<String>,
    },
    /// Markdown document
    Document {
        /// Markdown body
        markdown: String,
    },
    /// Quiz lesson
    Quiz {
        /// Validated questions
        questions: QuizContent,
    },
}

impl LessonContent {
    /// Kind of this payload
    #[must_use]
    pub const fn kind(&self) -> LessonKind {
        match self {
            Self::Video { .. } => LessonKind::Video,
            Self::Document { .. } => LessonKind::Document,
            Self::Quiz { .. } => LessonKind::Quiz,
        }
    }

    /// Rebuild the payload from its stored columns
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupt` when the kind is unknown or the
    /// kind-specific column is missing or undecodable
    pub fn from_columns(
        lesson_type: &str,
        body: Option<String>,
        video_url: Option<String>,
    ) -> DomainResult<Self> {
        match LessonKind::parse(lesson_type)? {
            LessonKind::Video => Ok(Self::Video { video_url }),
            LessonKind::Document => Ok(Self::Document {
                markdown: body.unwrap_or_default(),
            }),
            LessonKind::Quiz => {
                let raw = body
                    .ok_or_else(|| DomainError::corrupt("quiz lesson has no questions"))?;
                Ok(Self::Quiz {
                    questions: QuizContent::decode(&raw)?,
                })
            }
        }
    }

    /// Split into `(body, video_url)` columns for storage
    ///
    /// # Errors
    ///
    /// Returns an error if quiz content fails to encode
    pub fn to_columns(&self) -> DomainResult<(Option<String>, Option<String>)> {
        match self {
            Self::Video { video_url } => Ok((None, video_url.clone())),
            Self::Document { markdown } => Ok((Some(markdown.clone()), None)),
            Self::Quiz { questions } => Ok((Some(questions.encode()?), None)),
        }
    }

    /// Quiz questions if this is a quiz lesson
    #[must_use]
    pub const fn quiz(&self) -> Option<&QuizContent> {
        match self {
            Self::Quiz { questions } => Some(questions),
            _ => None,
        }
    }
}

/// A lesson inside a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier
    pub id: Uuid,
    /// Owning module
    pub module_id: Uuid,
    /// Display title
    pub title: String,
    /// 1-based position inside the module
    pub order: u32,
    /// Kind-specific payload
    #[serde(flatten)]
    pub content: LessonContent,
}

/// An ordered group of lessons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    /// Unique identifier
    pub id: Uuid,
    /// Owning course
    pub course_id: Uuid,
    /// Display title
    pub title: String,
    /// 1-based position inside the course
    pub order: u32,
    /// Lessons ordered by `order`
    pub lessons: Vec<Lesson>,
}

/// Who may see a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseAudience {
    /// Visible to internal employees
    pub is_internal: bool,
    /// Visible to external (paying) users
    pub is_public: bool,
}

/// Pre-test configuration: a single attempt, scored against a passing rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreTest {
    /// Questions
    pub content: QuizContent,
    /// Passing rate in percent (0-100)
    pub passing_rate: u8,
}

/// Final assessment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPolicy {
    /// Questions
    pub content: QuizContent,
    /// Passing rate in percent (0-100)
    pub passing_rate: u8,
    /// Attempts allowed per assessment cycle (at least 1)
    pub max_attempts: u32,
}

/// A course owned by one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier
    pub id: Uuid,
    /// Owning site
    pub tenant_id: TenantId,
    /// Title (also the cross-site match key for course sync)
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Catalog category
    pub category: Option<String>,
    /// Cover image URL in blob storage
    pub image_url: Option<String>,
    /// Venue for scheduled sessions
    pub venue: Option<String>,
    /// Start of the scheduling window
    pub starts_at: Option<DateTime<Utc>>,
    /// End of the scheduling window
    pub ends_at: Option<DateTime<Utc>>,
    /// Audience flags
    pub audience: CourseAudience,
    /// Price in minor currency units for external purchases
    pub price_cents: i64,
    /// Optional pre-test
    pub pre_test: Option<PreTest>,
    /// Optional final assessment
    pub final_assessment: Option<AssessmentPolicy>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Lesson immediately after `current` in course order, if any.
///
/// `ordered` must already be sorted by `(module.order, lesson.order)`.
#[must_use]
pub fn next_in_order(ordered: &[Uuid], current: Uuid) -> Option<Uuid> {
    ordered
        .iter()
        .position(|id| *id == current)
        .and_then(|index| ordered.get(index + 1))
        .copied()
}

/// Flatten modules into lesson ids ordered by `(module.order, lesson.order)`
#[must_use]
pub fn lesson_order(modules: &[CourseModule]) -> Vec<Uuid> {
    let mut sorted: Vec<&CourseModule> = modules.iter().collect();
    sorted.sort_by_key(|m| m.order);
    sorted
        .into_iter()
        .flat_map(|module| {
            let mut lessons: Vec<&Lesson> = module.lessons.iter().collect();
            lessons.sort_by_key(|l| l.order);
            lessons.into_iter().map(|l| l.id)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lesson(module_id: Uuid, order: u32) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            module_id,
            title: format!("lesson {order}"),
            order,
            content: LessonContent::Document {
                markdown: String::new(),
            },
        }
    }

    #[test]
    fn orders_by_module_then_lesson() {
        let course_id = Uuid::new_v4();
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let (a, b, c) = (lesson(m1, 2), lesson(m1, 1), lesson(m2, 1));
        let modules = vec![
            CourseModule {
                id: m2,
                course_id,
                title: "second".to_owned(),
                order: 2,
                lessons: vec![c.clone()],
            },
            CourseModule {
                id: m1,
                course_id,
                title: "first".to_owned(),
                order: 1,
                lessons: vec![a.clone(), b.clone()],
            },
        ];

        let order = lesson_order(&modules);
        assert_eq!(order, vec![b.id, a.id, c.id]);
        assert_eq!(next_in_order(&order, b.id), Some(a.id));
        assert_eq!(next_in_order(&order, a.id), Some(c.id));
        assert_eq!(next_in_order(&order, c.id), None);
        assert_eq!(next_in_order(&order, Uuid::new_v4()), None);
    }

    #[test]
    fn lesson_columns_round_trip_by_kind() {
        let doc = LessonContent::from_columns("document", Some("# Hi".to_owned()), None).unwrap();
        assert_eq!(doc.kind(), LessonKind::Document);
        assert_eq!(doc.to_columns().unwrap(), (Some("# Hi".to_owned()), None));

        assert!(LessonContent::from_columns("quiz", None, None).is_err());
        assert!(LessonContent::from_columns("podcast", None, None).is_err());
    }

    #[test]
    fn lesson_serializes_with_type_tag() {
        let l = lesson(Uuid::new_v4(), 1);
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["type"], "document");
        assert_eq!(json["markdown"], "");
    }
}
