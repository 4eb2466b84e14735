//! Pure computations over a task snapshot. Nothing here performs I/O or reads
//! the clock; time-dependent views take the reference instant as a parameter.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::model::{CompletionFilter, Task};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HoursSummary {
    pub total: f64,
    pub completed: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Motivation {
    pub icon: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub tasks: usize,
    pub completed: usize,
    pub total_hours: f64,
    pub completed_hours: f64,
}

pub fn completed_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.completed).count()
}

pub fn pending_count(tasks: &[Task]) -> usize {
    tasks.len() - completed_count(tasks)
}

/// Share of completed tasks, rounded to a whole percent. Zero for an empty list.
pub fn progress_percent(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let ratio = completed_count(tasks) as f64 / tasks.len() as f64;
    (ratio * 100.0).round() as u8
}

/// High first, then Medium, Low and unranked. Equal ranks keep their input order.
pub fn sort_by_priority(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(Task::priority_rank);
    sorted
}

pub fn filter_by_completion(tasks: &[Task], filter: CompletionFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

/// Tasks whose deadline falls on the same calendar day as `reference`, in
/// `reference`'s time zone.
pub fn tasks_due_today<Tz: TimeZone>(tasks: &[Task], reference: &DateTime<Tz>) -> Vec<Task> {
    let zone = reference.timezone();
    let today = reference.date_naive();
    tasks
        .iter()
        .filter(|task| task.deadline.with_timezone(&zone).date_naive() == today)
        .cloned()
        .collect()
}

/// Pending tasks whose deadline has already passed at `now`.
pub fn overdue<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Vec<Task> {
    let now = now.with_timezone(&Utc);
    tasks
        .iter()
        .filter(|task| !task.completed && task.deadline < now)
        .cloned()
        .collect()
}

/// Pending tasks due between today and `days` calendar days from now, soonest first.
pub fn upcoming<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>, days: u32) -> Vec<Task> {
    let zone = now.timezone();
    let first = now.date_naive();
    let last = first + Duration::days(i64::from(days));
    let mut due: Vec<Task> = tasks
        .iter()
        .filter(|task| {
            let day = task.deadline.with_timezone(&zone).date_naive();
            !task.completed && day >= first && day <= last
        })
        .cloned()
        .collect();
    due.sort_by_key(|task| task.deadline);
    due
}

pub fn aggregate_hours(tasks: &[Task]) -> HoursSummary {
    let total: f64 = tasks.iter().map(|task| task.study_time).sum();
    let completed: f64 = tasks
        .iter()
        .filter(|task| task.completed)
        .map(|task| task.study_time)
        .sum();
    HoursSummary {
        total,
        completed,
        remaining: total - completed,
    }
}

/// Per-subject counts and hours, ordered by subject name.
pub fn hours_by_subject(tasks: &[Task]) -> Vec<SubjectSummary> {
    let mut subjects: BTreeMap<&str, SubjectSummary> = BTreeMap::new();
    for task in tasks {
        let entry = subjects
            .entry(task.subject.as_str())
            .or_insert_with(|| SubjectSummary {
                subject: task.subject.clone(),
                tasks: 0,
                completed: 0,
                total_hours: 0.0,
                completed_hours: 0.0,
            });
        entry.tasks += 1;
        entry.total_hours += task.study_time;
        if task.completed {
            entry.completed += 1;
            entry.completed_hours += task.study_time;
        }
    }
    subjects.into_values().collect()
}

pub fn motivational_message(percent: u8) -> Motivation {
    let (icon, text) = match percent {
        100..=u8::MAX => ("🎉", "Amazing! You've completed all your tasks!"),
        75..=99 => ("🔥", "Almost there! Keep up the great work!"),
        50..=74 => ("💪", "Halfway done! You're making great progress!"),
        25..=49 => ("📚", "Good start! Keep the momentum going!"),
        1..=24 => ("🌱", "Every step counts. Keep studying!"),
        0 => ("🚀", "Ready to start? Pick your first task!"),
    };
    Motivation { icon, text }
}

pub fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good Morning"
    } else if hour < 17 {
        "Good Afternoon"
    } else {
        "Good Evening"
    }
}
