//! Core domain logic for TaskDesk, a personal task manager.
//! This crate is the single source of truth for task ownership, category
//! inference and dashboard aggregation.

pub mod classifier;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transcription;

pub use classifier::classify;
pub use config::{AppConfig, ConfigError, SpeechConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Category, Priority, Task, TaskId, TaskValidationError};
pub use model::user::{Owner, User, UserId};
pub use repo::task_repo::{SqliteTaskRepository, TaskCounts, TaskListQuery, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::dashboard_service::{DashboardService, DashboardView, Summary};
pub use service::deadline::{format_deadline, parse_deadline};
pub use service::identity_service::{
    IdentityError, IdentityResult, IdentityService, RegisterRequest, ResetMailer, SessionGrant,
};
pub use service::task_service::{
    CreateTaskRequest, EditTaskRequest, TaskService, TaskServiceError, TaskServiceResult,
};
pub use service::transcription_service::TranscriptionService;
pub use transcription::{HttpTranscriber, Transcriber, TranscriptionError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
