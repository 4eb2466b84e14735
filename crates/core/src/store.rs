//! Whole-collection task persistence.
//!
//! Every mutation is a read-modify-write of the full collection stored under a
//! single key. The `try_*` methods report failures; the plain methods are the
//! boundary the UI talks to and never fail: writes answer `true`/`false` and
//! reads degrade to an empty collection, logging the cause.
//!
//! A write is refused when any task's study time is not a finite positive
//! number, so the persisted collection always decodes.

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DEFAULT_STORAGE_KEY;
use crate::model::{Task, TaskPatch};
use crate::storage::{Storage, StorageError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode or decode the task collection: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task id '{0}' already exists")]
    DuplicateId(String),

    #[error("Task '{id}' has invalid study time {hours}")]
    InvalidStudyTime { id: String, hours: f64 },
}

pub struct TaskStore<S> {
    storage: S,
    key: String,
    // Held across each read-modify-write so mutations through one store never interleave.
    write_lock: Mutex<()>,
}

impl<S: Storage> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Full collection in stored order. Empty when nothing was persisted or
    /// the stored value is unreadable.
    pub fn get_all(&self) -> Vec<Task> {
        match self.try_get_all() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(key = self.key.as_str(), error = %err, "failed to load tasks, using empty list");
                Vec::new()
            }
        }
    }

    pub fn save_all(&self, tasks: &[Task]) -> bool {
        let _guard = self.write_lock.lock();
        self.report("save_all", self.write(tasks))
    }

    pub fn add(&self, task: Task) -> bool {
        self.report("add", self.try_add(task))
    }

    /// Merge `patch` onto the task with `id`. An unknown id is a successful no-op.
    pub fn update(&self, id: &str, patch: &TaskPatch) -> bool {
        self.report("update", self.try_update(id, patch).map(|_| ()))
    }

    /// Remove the task with `id`. An unknown id is a successful no-op.
    pub fn delete(&self, id: &str) -> bool {
        self.report("delete", self.try_delete(id).map(|_| ()))
    }

    pub fn clear(&self) -> bool {
        self.report("clear", self.try_clear())
    }

    pub fn find(&self, id: &str) -> Option<Task> {
        self.get_all().into_iter().find(|task| task.id == id)
    }

    pub fn try_get_all(&self) -> Result<Vec<Task>, StoreError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn try_save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.write(tasks)
    }

    /// Append `task`. Rejects ids already present in the collection.
    pub fn try_add(&self, task: Task) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut tasks = self.try_get_all()?;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(StoreError::DuplicateId(task.id));
        }
        tasks.push(task);
        self.write(&tasks)
    }

    /// Returns whether a task with `id` existed. Nothing is written when it did not.
    pub fn try_update(&self, id: &str, patch: &TaskPatch) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut tasks = self.try_get_all()?;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            debug!(task_id = id, "update skipped, no matching task");
            return Ok(false);
        };
        task.apply(patch);
        self.write(&tasks)?;
        Ok(true)
    }

    /// Returns whether a task with `id` existed. Nothing is written when it did not.
    pub fn try_delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut tasks = self.try_get_all()?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            debug!(task_id = id, "delete skipped, no matching task");
            return Ok(false);
        }
        self.write(&tasks)?;
        Ok(true)
    }

    pub fn try_clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.storage.remove(&self.key)?;
        debug!(key = self.key.as_str(), "cleared tasks");
        Ok(())
    }

    // Callers must hold `write_lock`.
    fn write(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if let Some(bad) = tasks
            .iter()
            .find(|task| !(task.study_time.is_finite() && task.study_time > 0.0))
        {
            return Err(StoreError::InvalidStudyTime {
                id: bad.id.clone(),
                hours: bad.study_time,
            });
        }
        let encoded = serde_json::to_string(tasks)?;
        self.storage.set(&self.key, &encoded)?;
        debug!(key = self.key.as_str(), count = tasks.len(), "persisted tasks");
        Ok(())
    }

    fn report(&self, operation: &'static str, result: Result<(), StoreError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(operation, key = self.key.as_str(), error = %err, "task store write failed");
                false
            }
        }
    }
}
