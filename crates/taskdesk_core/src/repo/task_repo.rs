//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD and aggregate queries over `tasks`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every statement filters on `(uuid, owner_uuid)` or `owner_uuid`; a task
//!   owned by someone else behaves exactly like a missing one.
//! - Updates never touch `owner_uuid` or `created_at`.
//! - Listings use priority rank, then deadline with nulls last, then
//!   `created_at DESC`, then `uuid ASC`.

use crate::db::ensure_connection_ready;
use crate::model::task::{Category, Priority, Task, TaskId};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, parse_bool, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    owner_uuid,
    title,
    category,
    priority,
    completed,
    created_at,
    deadline
FROM tasks";

const TASK_ORDER_SQL: &str = " ORDER BY
    CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END ASC,
    deadline IS NULL ASC,
    deadline ASC,
    created_at DESC,
    uuid ASC";

/// Filter options for owner task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Exact category match when set.
    pub category: Option<Category>,
}

/// Completion counts for one owner, after an optional category filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: u64,
    pub completed: u64,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Inserts a new task row and returns its id.
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Reads one task when it exists and belongs to `owner`.
    fn get_task(&self, owner: UserId, id: TaskId) -> RepoResult<Option<Task>>;
    /// Writes the mutable fields of `task`, scoped to `task.owner`.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Hard-deletes one task owned by `owner`.
    fn delete_task(&self, owner: UserId, id: TaskId) -> RepoResult<()>;
    /// Lists the owner's tasks in default listing order.
    fn list_tasks(&self, owner: UserId, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Counts the owner's tasks, optionally within one category.
    fn count_tasks(&self, owner: UserId, category: Option<Category>) -> RepoResult<TaskCounts>;
    /// Per-category task counts over the owner's full task set. Categories
    /// with no tasks are omitted.
    fn category_histogram(&self, owner: UserId) -> RepoResult<Vec<(Category, u64)>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                owner_uuid,
                title,
                category,
                priority,
                completed,
                created_at,
                deadline
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id.to_string(),
                task.owner.to_string(),
                task.title.as_str(),
                task.category.as_str(),
                task.priority.as_str(),
                bool_to_int(task.completed),
                task.created_at,
                task.deadline,
            ],
        )?;

        Ok(task.id)
    }

    fn get_task(&self, owner: UserId, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE uuid = ?1
               AND owner_uuid = ?2;"
        ))?;

        let row = stmt
            .query_row(params![id.to_string(), owner.to_string()], |row| {
                Ok(read_task_row(row))
            })
            .optional()?;

        row.transpose()
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                category = ?2,
                priority = ?3,
                completed = ?4,
                deadline = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6
               AND owner_uuid = ?7;",
            params![
                task.title.as_str(),
                task.category.as_str(),
                task.priority.as_str(),
                bool_to_int(task.completed),
                task.deadline,
                task.id.to_string(),
                task.owner.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn delete_task(&self, owner: UserId, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM tasks
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_tasks(&self, owner: UserId, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE owner_uuid = ?");
        let mut bind_values = vec![Value::Text(owner.to_string())];

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        sql.push_str(TASK_ORDER_SQL);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(read_task_row(row)?);
        }

        Ok(tasks)
    }

    fn count_tasks(&self, owner: UserId, category: Option<Category>) -> RepoResult<TaskCounts> {
        let (total, completed): (i64, i64) = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(completed), 0)
             FROM tasks
             WHERE owner_uuid = ?1
               AND (?2 IS NULL OR category = ?2);",
            params![owner.to_string(), category.map(Category::as_str)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(TaskCounts {
            total: to_count(total, "COUNT(*)")?,
            completed: to_count(completed, "SUM(completed)")?,
        })
    }

    fn category_histogram(&self, owner: UserId) -> RepoResult<Vec<(Category, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*)
             FROM tasks
             WHERE owner_uuid = ?1
             GROUP BY category;",
        )?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut histogram = Vec::new();

        while let Some(row) = rows.next()? {
            let category_text: String = row.get(0)?;
            let category = parse_category(&category_text)?;
            let count = to_count(row.get(1)?, "COUNT(*)")?;
            histogram.push((category, count));
        }

        histogram.sort_by_key(|(category, _)| *category);
        Ok(histogram)
    }
}

fn read_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("owner_uuid")?;
    let category_text: String = row.get("category")?;
    let priority_text: String = row.get("priority")?;

    let task = Task {
        id: parse_uuid(&uuid_text, "tasks.uuid")?,
        owner: parse_uuid(&owner_text, "tasks.owner_uuid")?,
        title: row.get("title")?,
        category: parse_category(&category_text)?,
        priority: priority_text.parse::<Priority>().map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid priority `{priority_text}` in tasks.priority"
            ))
        })?,
        completed: parse_bool(row.get("completed")?, "tasks.completed")?,
        created_at: row.get("created_at")?,
        deadline: row.get("deadline")?,
    };
    task.validate()?;
    Ok(task)
}

fn parse_category(value: &str) -> RepoResult<Category> {
    value.parse::<Category>().map_err(|_| {
        RepoError::InvalidData(format!("invalid category `{value}` in tasks.category"))
    })
}

fn to_count(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` from {column}")))
}
