use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Lowercase form accepted on the command line.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort rank: High sorts first. Unranked tasks use [`UNRANKED`].
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// Rank given to tasks whose persisted priority is missing or unrecognized.
pub const UNRANKED: u8 = 4;

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(anyhow!(
                "Unknown priority '{}': expected low|medium|high",
                other
            )),
        }
    }
}

impl ValueEnum for Priority {
    fn value_variants<'a>() -> &'a [Self] {
        const VARIANTS: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];
        &VARIANTS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.label()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub subject: String,
    pub topic: String,
    /// Estimated hours, always finite and positive.
    pub study_time: f64,
    pub deadline: DateTime<Utc>,
    /// `None` when the stored value was missing or not a recognized level.
    #[serde(
        default,
        deserialize_with = "lenient_priority",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn priority_rank(&self) -> u8 {
        self.priority.map(|p| p.rank()).unwrap_or(UNRANKED)
    }

    /// Overwrite the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(subject) = &patch.subject {
            self.subject = subject.clone();
        }
        if let Some(topic) = &patch.topic {
            self.topic = topic.clone();
        }
        if let Some(hours) = patch.study_time {
            self.study_time = hours;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(priority) = patch.priority {
            self.priority = Some(priority);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|value| value.as_str())
        .and_then(|label| label.parse::<Priority>().ok()))
}

/// A validated creation request. Ids and timestamps are assigned by
/// [`NewTask::into_task`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub subject: String,
    pub topic: String,
    pub study_time: f64,
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
}

impl NewTask {
    pub fn into_task(self, now: DateTime<Utc>) -> Task {
        Task {
            id: Ulid::new().to_string(),
            subject: self.subject,
            topic: self.topic,
            study_time: self.study_time,
            deadline: self.deadline,
            priority: Some(self.priority),
            completed: false,
            created_at: now,
        }
    }
}

/// Partial update applied by id. `id` and `created_at` are never patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub study_time: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.topic.is_none()
            && self.study_time.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
            && self.completed.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum CompletionFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl CompletionFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            CompletionFilter::All => true,
            CompletionFilter::Pending => !task.completed,
            CompletionFilter::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum ListSort {
    /// Insertion order, as persisted
    #[default]
    Stored,
    /// High, Medium, Low, then unranked
    Priority,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub id: String,
    pub changed: bool,
}
