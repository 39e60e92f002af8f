//! Task domain model.
//!
//! # Responsibility
//! - Define the one persisted record of the task store.
//! - Define the closed `Category` and `Priority` enumerations.
//!
//! # Invariants
//! - `id`, `owner` and `created_at` never change after construction.
//! - `title` is non-empty after trimming and at most `TITLE_MAX_CHARS` long.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of one task.
pub type TaskId = Uuid;

/// Longest accepted title, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// What kind of activity a task is.
///
/// Declaration order is the display order of dashboard histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Daily,
    Reading,
    Writing,
    Hobbies,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Daily,
        Self::Reading,
        Self::Writing,
        Self::Hobbies,
        Self::Other,
    ];

    /// Stable storage and wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Hobbies => "hobbies",
            Self::Other => "other",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily Work",
            Self::Reading => "Reading",
            Self::Writing => "Writing",
            Self::Hobbies => "Hobbies",
            Self::Other => "Other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| TaskValidationError::UnknownCategory(value.trim().to_string()))
    }
}

/// Task urgency. Listings put `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Sort rank used by the default listing order.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| TaskValidationError::UnknownPriority(value.trim().to_string()))
    }
}

/// Invalid task input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    UnknownCategory(String),
    UnknownPriority(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "title is {actual} characters long; the limit is {max}")
            }
            Self::UnknownCategory(value) => write!(
                f,
                "unknown category `{value}`; expected daily|reading|writing|hobbies|other"
            ),
            Self::UnknownPriority(value) => {
                write!(f, "unknown priority `{value}`; expected high|medium|low")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do item owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub title: String,
    pub category: Category,
    pub priority: Priority,
    pub completed: bool,
    /// Unix epoch milliseconds, UTC.
    pub created_at: i64,
    /// Unix epoch milliseconds, UTC.
    pub deadline: Option<i64>,
}

impl Task {
    /// Creates a pending, medium-priority task with a fresh id.
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        category: Category,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into(),
            category,
            priority: Priority::default(),
            completed: false,
            created_at,
            deadline: None,
        }
    }

    /// Checks the title rules.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }
}

/// Rejects blank titles and titles over `TITLE_MAX_CHARS`.
pub fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let actual = title.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(TaskValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}
