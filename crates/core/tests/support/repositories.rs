//! In-memory implementations of the pipeline ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tasklane_core::ports::{CommandModel, TaskListInvalidator, TaskStore};
use tasklane_domain::{NewTask, Result, Task, TaskStatus, TasklaneError};
use uuid::Uuid;

/// Task store backed by a mutex-guarded vector.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pending task and return its id.
    pub fn seed(&self, owner: &str, title: &str) -> Uuid {
        self.seed_task(owner, title, None, None)
    }

    /// Seed a task with an optional due instant and recurrence rule.
    pub fn seed_task(
        &self,
        owner: &str,
        title: &str,
        due_at: Option<DateTime<Utc>>,
        recurrence_rule: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.tasks.lock().push(Task {
            id,
            owner_id: owner.to_string(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            due_at,
            due_date: due_at.map(|instant| instant.date_naive()),
            recurrence_rule: recurrence_rule.map(str::to_string),
            recurrence_timezone: recurrence_rule.map(|_| "UTC".to_string()),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.lock().iter().find(|task| task.id == id).cloned()
    }

    pub fn titles(&self, owner: &str) -> Vec<String> {
        self.tasks
            .lock()
            .iter()
            .filter(|task| task.owner_id == owner)
            .map(|task| task.title.clone())
            .collect()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_by_id(&self, owner: &str, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.lock().iter().find(|task| task.owner_id == owner && task.id == id).cloned())
    }

    async fn find_by_title(&self, owner: &str, title: &str) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|task| task.owner_id == owner && task.title == title)
            .cloned()
            .collect())
    }

    async fn find_by_title_ci(&self, owner: &str, title: &str) -> Result<Vec<Task>> {
        let needle = title.to_lowercase();
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|task| task.owner_id == owner && task.title.to_lowercase() == needle)
            .cloned()
            .collect())
    }

    async fn find_by_title_substring(&self, owner: &str, fragment: &str) -> Result<Vec<Task>> {
        let needle = fragment.to_lowercase();
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|task| task.owner_id == owner && task.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn insert(&self, new: NewTask) -> Result<Task> {
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
        self.tasks.lock().push(task.clone());
        Ok(task)
    }

    async fn update(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|candidate| candidate.id == task.id) {
            Some(slot) => {
                *slot = task;
                Ok(())
            }
            None => Err(TasklaneError::NotFound(format!("no task with id {}", task.id))),
        }
    }

    async fn delete(&self, owner: &str, ids: &[Uuid]) -> Result<usize> {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|task| !(task.owner_id == owner && ids.contains(&task.id)));
        Ok(before - tasks.len())
    }

    async fn delete_all(&self, owner: &str) -> Result<usize> {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|task| task.owner_id != owner);
        Ok(before - tasks.len())
    }

    async fn count(&self, owner: &str) -> Result<usize> {
        Ok(self.tasks.lock().iter().filter(|task| task.owner_id == owner).count())
    }
}

/// Invalidator that records every owner it is signalled for.
#[derive(Default)]
pub struct RecordingInvalidator {
    calls: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owners(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl TaskListInvalidator for RecordingInvalidator {
    fn invalidate(&self, owner: &str) {
        self.calls.lock().push(owner.to_string());
    }
}

/// Model double that replays a fixed result.
pub struct ScriptedModel {
    result: std::result::Result<serde_json::Value, String>,
}

impl ScriptedModel {
    /// Always respond with `payload`.
    pub fn responding(payload: serde_json::Value) -> Self {
        Self { result: Ok(payload) }
    }

    /// Always fail at the transport level.
    pub fn failing(message: &str) -> Self {
        Self { result: Err(message.to_string()) }
    }
}

#[async_trait]
impl CommandModel for ScriptedModel {
    async fn propose(&self, _system_prompt: &str, _input: &str) -> Result<serde_json::Value> {
        match &self.result {
            Ok(payload) => Ok(payload.clone()),
            Err(message) => Err(TasklaneError::Network(message.clone())),
        }
    }
}
