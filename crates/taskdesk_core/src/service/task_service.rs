//! Task use-case service.
//!
//! # Responsibility
//! - Apply the classifier and deadline parsing on create/edit.
//! - Scope every read and write to the calling owner.
//!
//! # Invariants
//! - A task owned by someone else surfaces as `NotFound`, never as a distinct
//!   error.
//! - Unparsable deadline text never fails an operation: create stores no
//!   deadline, edit keeps the current one.
//! - Titles are stored trimmed.

use crate::classifier::classify;
use crate::model::task::{validate_title, Category, Task, TaskId, TaskValidationError};
use crate::model::user::Owner;
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use crate::service::deadline::parse_deadline;
use chrono::Utc;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Input failed validation before reaching storage.
    Validation(TaskValidationError),
    /// Task is absent or belongs to another owner.
    NotFound(TaskId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(task_id) => write!(f, "task not found: {task_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(task_id) => Self::NotFound(task_id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: String,
    /// ISO-8601 text; unparsable values mean "no deadline".
    pub deadline: Option<String>,
}

/// Input for editing a task. `title` is always replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditTaskRequest {
    pub title: String,
    /// Keeps the current category when `None`.
    pub category: Option<Category>,
    /// Keeps the current deadline when `None`, blank or unparsable.
    pub deadline: Option<String>,
}

/// Use-case service for owner-scoped task management.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task with a classifier-inferred category.
    ///
    /// # Contract
    /// - Fails with `Validation(EmptyTitle)` for blank titles.
    /// - New tasks are `priority=medium`, `completed=false`.
    pub fn create(&self, owner: &Owner, request: &CreateTaskRequest) -> TaskServiceResult<Task> {
        let title = request.title.trim();
        validate_title(title)?;

        let mut task = Task::new(
            owner.user_id(),
            title,
            classify(title),
            Utc::now().timestamp_millis(),
        );
        task.deadline = resolve_deadline(request.deadline.as_deref(), "task_create");

        self.repo.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok task_id={} category={} has_deadline={}",
            task.id,
            task.category,
            task.deadline.is_some()
        );
        Ok(task)
    }

    /// Reads one of the owner's tasks.
    pub fn get(&self, owner: &Owner, task_id: TaskId) -> TaskServiceResult<Task> {
        self.repo
            .get_task(owner.user_id(), task_id)?
            .ok_or(TaskServiceError::NotFound(task_id))
    }

    /// Replaces the title and, when given, the category and deadline.
    pub fn edit(
        &self,
        owner: &Owner,
        task_id: TaskId,
        request: &EditTaskRequest,
    ) -> TaskServiceResult<Task> {
        let mut task = self.get(owner, task_id)?;

        let title = request.title.trim();
        validate_title(title)?;
        task.title = title.to_string();

        if let Some(category) = request.category {
            task.category = category;
        }
        if let Some(deadline) = resolve_deadline(request.deadline.as_deref(), "task_edit") {
            task.deadline = Some(deadline);
        }

        self.repo.update_task(&task)?;
        info!(
            "event=task_edit module=service status=ok task_id={} category={}",
            task.id, task.category
        );
        Ok(task)
    }

    /// Marks a task completed. Completing twice is not an error.
    pub fn complete(&self, owner: &Owner, task_id: TaskId) -> TaskServiceResult<Task> {
        let mut task = self.get(owner, task_id)?;
        if task.completed {
            return Ok(task);
        }

        task.completed = true;
        self.repo.update_task(&task)?;
        info!("event=task_complete module=service status=ok task_id={task_id}");
        Ok(task)
    }

    /// Permanently removes a task.
    pub fn delete(&self, owner: &Owner, task_id: TaskId) -> TaskServiceResult<()> {
        self.repo.delete_task(owner.user_id(), task_id)?;
        info!("event=task_delete module=service status=ok task_id={task_id}");
        Ok(())
    }

    /// Lists the owner's tasks in default order, optionally for one category.
    pub fn list(
        &self,
        owner: &Owner,
        category: Option<Category>,
    ) -> TaskServiceResult<Vec<Task>> {
        let tasks = self
            .repo
            .list_tasks(owner.user_id(), &TaskListQuery { category })?;
        Ok(tasks)
    }
}

fn resolve_deadline(text: Option<&str>, event: &str) -> Option<i64> {
    let text = text.map(str::trim).filter(|value| !value.is_empty())?;
    let parsed = parse_deadline(text);
    if parsed.is_none() {
        warn!("event={event} module=service status=ok deadline=ignored reason=unparsable");
    }
    parsed
}
