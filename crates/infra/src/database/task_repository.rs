//! SQLite implementation of the task store port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Row};
use tasklane_core::ports::TaskStore;
use tasklane_domain::{NewTask, Result as DomainResult, Task, TaskStatus, TasklaneError};
use tokio::task;
use uuid::Uuid;

use super::manager::{map_sql_error, DbManager};

const TASK_COLUMNS: &str = "id, owner_id, title, description, status, due_at, due_date, \
     recurrence_rule, recurrence_timezone, created_at, updated_at";

/// SQLite-backed implementation of [`TaskStore`].
///
/// rusqlite is synchronous, so every call runs on the blocking thread pool.
pub struct SqliteTaskStore {
    db: Arc<DbManager>,
}

impl SqliteTaskStore {
    /// Create a new store over the shared connection pool.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn find_by_id(&self, owner: &str, id: Uuid) -> DomainResult<Option<Task>> {
        let db = Arc::clone(&self.db);
        let owner = owner.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Task>> {
            let conn = db.get_connection()?;
            let result = conn.query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ?1 AND id = ?2"),
                params![&owner, id.to_string()],
                map_task_row,
            );

            match result {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_title(&self, owner: &str, title: &str) -> DomainResult<Vec<Task>> {
        self.query_tasks(
            format!(
                "SELECT {TASK_COLUMNS} FROM tasks \
                 WHERE owner_id = ?1 AND title = ?2 ORDER BY created_at ASC"
            ),
            owner,
            title,
        )
        .await
    }

    async fn find_by_title_ci(&self, owner: &str, title: &str) -> DomainResult<Vec<Task>> {
        self.query_tasks(
            format!(
                "SELECT {TASK_COLUMNS} FROM tasks \
                 WHERE owner_id = ?1 AND title = ?2 COLLATE NOCASE ORDER BY created_at ASC"
            ),
            owner,
            title,
        )
        .await
    }

    async fn find_by_title_substring(&self, owner: &str, fragment: &str) -> DomainResult<Vec<Task>> {
        self.query_tasks(
            format!(
                "SELECT {TASK_COLUMNS} FROM tasks \
                 WHERE owner_id = ?1 AND instr(lower(title), lower(?2)) > 0 \
                 ORDER BY created_at ASC"
            ),
            owner,
            fragment,
        )
        .await
    }

    async fn insert(&self, new: NewTask) -> DomainResult<Task> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Task> {
            let now = Utc::now();
            let task = Task {
                id: Uuid::new_v4(),
                owner_id: new.owner_id,
                title: new.title,
                description: new.description,
                status: new.status,
                due_at: new.due_at,
                due_date: new.due_date,
                recurrence_rule: new.recurrence_rule,
                recurrence_timezone: new.recurrence_timezone,
                created_at: now,
                updated_at: now,
            };

            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO tasks (
                    id, owner_id, title, description, status, due_at, due_date,
                    recurrence_rule, recurrence_timezone, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    task.id.to_string(),
                    &task.owner_id,
                    &task.title,
                    &task.description,
                    status_to_str(task.status),
                    task.due_at.map(|at| at.to_rfc3339()),
                    task.due_date.map(|date| date.to_string()),
                    &task.recurrence_rule,
                    &task.recurrence_timezone,
                    task.created_at.to_rfc3339(),
                    task.updated_at.to_rfc3339(),
                ],
            )
            .map_err(map_sql_error)?;

            Ok(task)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, task: Task) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE tasks SET
                        title = ?1, description = ?2, status = ?3, due_at = ?4,
                        due_date = ?5, recurrence_rule = ?6, recurrence_timezone = ?7,
                        updated_at = ?8
                     WHERE owner_id = ?9 AND id = ?10",
                    params![
                        &task.title,
                        &task.description,
                        status_to_str(task.status),
                        task.due_at.map(|at| at.to_rfc3339()),
                        task.due_date.map(|date| date.to_string()),
                        &task.recurrence_rule,
                        &task.recurrence_timezone,
                        task.updated_at.to_rfc3339(),
                        &task.owner_id,
                        task.id.to_string(),
                    ],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(TasklaneError::NotFound(format!("no task with id {}", task.id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, owner: &str, ids: &[Uuid]) -> DomainResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let owner = owner.to_string();
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            let placeholders: Vec<String> =
                (0..ids.len()).map(|index| format!("?{}", index + 2)).collect();
            let sql = format!(
                "DELETE FROM tasks WHERE owner_id = ?1 AND id IN ({})",
                placeholders.join(", ")
            );

            let mut bound: Vec<String> = Vec::with_capacity(ids.len() + 1);
            bound.push(owner);
            bound.extend(ids);

            let removed =
                conn.execute(&sql, params_from_iter(bound.iter())).map_err(map_sql_error)?;
            Ok(removed)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_all(&self, owner: &str) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let owner = owner.to_string();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute("DELETE FROM tasks WHERE owner_id = ?1", params![&owner])
                .map_err(map_sql_error)?;
            Ok(removed)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count(&self, owner: &str) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let owner = owner.to_string();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM tasks WHERE owner_id = ?1",
                    params![&owner],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
        .map_err(map_join_error)?
    }
}

impl SqliteTaskStore {
    async fn query_tasks(&self, sql: String, owner: &str, needle: &str) -> DomainResult<Vec<Task>> {
        let db = Arc::clone(&self.db);
        let owner = owner.to_string();
        let needle = needle.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<Task>> {
            let conn = db.get_connection()?;
            let mut statement = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = statement
                .query_map(params![&owner, &needle], map_task_row)
                .map_err(map_sql_error)?;

            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row.map_err(map_sql_error)?);
            }
            Ok(tasks)
        })
        .await
        .map_err(map_join_error)?
    }
}

/* -------------------------------------------------------------------------- */
/* Row mapping */
/* -------------------------------------------------------------------------- */

fn map_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let status: String = row.get(4)?;
    let due_at: Option<String> = row.get(5)?;
    let due_date: Option<String> = row.get(6)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Task {
        id: parse_uuid(0, &id)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: parse_status(4, &status)?,
        due_at: due_at.as_deref().map(|raw| parse_instant(5, raw)).transpose()?,
        due_date: due_date.as_deref().map(|raw| parse_date(6, raw)).transpose()?,
        recurrence_rule: row.get(7)?,
        recurrence_timezone: row.get(8)?,
        created_at: parse_instant(9, &created_at)?,
        updated_at: parse_instant(10, &updated_at)?,
    })
}

fn conversion_failure(
    index: usize,
    cause: Box<dyn std::error::Error + Send + Sync>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, cause)
}

fn parse_uuid(index: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|err| conversion_failure(index, Box::new(err)))
}

fn parse_status(index: usize, raw: &str) -> rusqlite::Result<TaskStatus> {
    match raw {
        "pending" => Ok(TaskStatus::Pending),
        "completed" => Ok(TaskStatus::Completed),
        other => Err(conversion_failure(index, format!("unknown status: {other}").into())),
    }
}

fn parse_instant(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| conversion_failure(index, Box::new(err)))
}

fn parse_date(index: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    raw.parse::<NaiveDate>().map_err(|err| conversion_failure(index, Box::new(err)))
}

fn status_to_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
    }
}

fn map_join_error(err: task::JoinError) -> TasklaneError {
    TasklaneError::Internal(format!("task join error: {err}"))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
