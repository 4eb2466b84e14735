use anyhow::Result;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::database::SqliteStorage;
use crate::model::{
    CompletionFilter, DeleteResult, ListSort, StatusUpdate, Task, TaskPatch,
};
use crate::storage::Storage;
use crate::store::{StoreError, TaskStore};
use crate::validation::{self, TaskDraft, ValidationErrors};
use crate::views::{self, HoursSummary, Motivation, SubjectSummary};

/// Days ahead covered by the dashboard's upcoming list.
const UPCOMING_DAYS: u32 = 7;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything the home screen shows, computed from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub greeting: &'static str,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress: u8,
    pub motivation: Motivation,
    pub hours: HoursSummary,
    pub due_today: Vec<Task>,
    pub overdue: Vec<Task>,
    pub upcoming: Vec<Task>,
    pub subjects: Vec<SubjectSummary>,
}

impl Dashboard {
    pub fn build<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Self {
        let progress = views::progress_percent(tasks);
        Self {
            greeting: views::greeting_for_hour(now.hour()),
            total_tasks: tasks.len(),
            completed_tasks: views::completed_count(tasks),
            progress,
            motivation: views::motivational_message(progress),
            hours: views::aggregate_hours(tasks),
            due_today: views::tasks_due_today(tasks, now),
            overdue: views::overdue(tasks, now),
            upcoming: views::upcoming(tasks, now, UPCOMING_DAYS),
            subjects: views::hours_by_subject(tasks),
        }
    }
}

/// Caller-facing facade: validates input, drives the store, and derives views.
pub struct TasksService<S> {
    store: TaskStore<S>,
}

impl TasksService<SqliteStorage> {
    pub fn open(config: &AppConfig) -> Result<Self> {
        let storage = SqliteStorage::initialize(config)?;
        Ok(Self::new(TaskStore::with_key(storage, config.storage_key())))
    }
}

impl<S: Storage> TasksService<S> {
    pub fn new(store: TaskStore<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.store.get_all()
    }

    pub fn list(&self, filter: CompletionFilter, sort: ListSort) -> Vec<Task> {
        let tasks = views::filter_by_completion(&self.snapshot(), filter);
        match sort {
            ListSort::Stored => tasks,
            ListSort::Priority => views::sort_by_priority(&tasks),
        }
    }

    pub fn due_today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<Task> {
        views::tasks_due_today(&self.snapshot(), now)
    }

    pub fn dashboard<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Dashboard {
        Dashboard::build(&self.snapshot(), now)
    }

    /// Validate `draft` against `now` and persist it as a new pending task.
    pub fn create<Tz: TimeZone>(
        &self,
        draft: &TaskDraft,
        now: &DateTime<Tz>,
    ) -> Result<Task, ServiceError> {
        let task = validation::validate(draft, now)?.into_task(now.with_timezone(&Utc));
        self.store.try_add(task.clone())?;
        Ok(task)
    }

    /// Returns the updated task, or `None` when `id` is unknown.
    pub fn edit(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>, ServiceError> {
        let patch = validation::validate_patch(patch)?;
        if !self.store.try_update(id, &patch)? {
            return Ok(None);
        }
        Ok(self.store.find(id))
    }

    pub fn set_completed(
        &self,
        ids: &[String],
        completed: bool,
    ) -> Result<Vec<StatusUpdate>, ServiceError> {
        let patch = TaskPatch::completed(completed);
        let mut results = Vec::new();
        for id in ids {
            let changed = self.store.try_update(id, &patch)?;
            results.push(StatusUpdate {
                id: id.to_string(),
                changed,
            });
        }
        Ok(results)
    }

    pub fn delete(&self, ids: &[String]) -> Result<Vec<DeleteResult>, ServiceError> {
        let mut results = Vec::new();
        for id in ids {
            let deleted = self.store.try_delete(id)?;
            results.push(DeleteResult {
                id: id.to_string(),
                deleted,
            });
        }
        Ok(results)
    }

    pub fn clear(&self) -> Result<(), ServiceError> {
        self.store.try_clear()?;
        Ok(())
    }
}
