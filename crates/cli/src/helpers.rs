use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::model::Task;

const PROGRESS_BAR_WIDTH: usize = 20;

pub fn format_hours(hours: f64) -> String {
    let rounded = format!("{:.2}", hours);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{}h", trimmed)
}

pub fn format_deadline<Tz>(deadline: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    deadline
        .with_timezone(zone)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn priority_label(task: &Task) -> &'static str {
    task.priority.map(|p| p.as_str()).unwrap_or("-")
}

/// One table row: checkbox, id, priority, subject/topic, hours, deadline.
pub fn format_task_line<Tz>(task: &Task, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "[{}] {}  {:<6}  {} / {}  {}  due {}",
        if task.completed { "x" } else { " " },
        task.id,
        priority_label(task),
        task.subject,
        task.topic,
        format_hours(task.study_time),
        format_deadline(&task.deadline, zone)
    )
}

pub fn progress_bar(percent: u8) -> String {
    let filled = PROGRESS_BAR_WIDTH * usize::from(percent.min(100)) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        percent
    )
}
