use std::fmt;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, TimeZone};

use crate::cli::{AddArgs, ClearArgs, CliCommand, EditArgs, IdsArgs, ListArgs, StatsArgs};
use crate::config::AppConfig;
use crate::core::validation::{TaskDraft, ValidationErrors};
use crate::core::SqliteStorage;
use crate::helpers::{format_deadline, format_hours, format_task_line, progress_bar};
use crate::model::{DeleteResult, StatusUpdate, Task};
use crate::services::{Dashboard, ServiceError, TasksService};

pub fn execute<W, Tz>(
    config: &AppConfig,
    command: CliCommand,
    now: &DateTime<Tz>,
    mut writer: W,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    tracing::debug!(db = %config.db_path().display(), ?command, "running command");
    let service = TasksService::open(config)?;
    match command {
        CliCommand::Add(args) => handle_add(&service, &args, now, &mut writer),
        CliCommand::List(args) => handle_list(&service, &args, now, &mut writer),
        CliCommand::Done(args) => handle_status(&service, &args, true, &mut writer),
        CliCommand::Undo(args) => handle_status(&service, &args, false, &mut writer),
        CliCommand::Edit(args) => handle_edit(&service, &args, now, &mut writer),
        CliCommand::Delete(args) => handle_delete(&service, &args, &mut writer),
        CliCommand::Clear(args) => handle_clear(&service, &args, &mut writer),
        CliCommand::Stats(args) => handle_stats(&service, &args, now, &mut writer),
        CliCommand::Today => handle_today(&service, now, &mut writer),
    }
}

type Service = TasksService<SqliteStorage>;

fn handle_add<W, Tz>(
    service: &Service,
    args: &AddArgs,
    now: &DateTime<Tz>,
    mut writer: W,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
{
    match service.create(&TaskDraft::from(args), now) {
        Ok(task) => {
            writeln!(writer, "Added {} ({} / {})", task.id, task.subject, task.topic)?;
            Ok(())
        }
        Err(ServiceError::Invalid(errors)) => {
            write_field_errors("Task not added:", &errors, &mut writer)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_list<W, Tz>(
    service: &Service,
    args: &ListArgs,
    now: &DateTime<Tz>,
    mut writer: W,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tasks = service.list(args.filter, args.sort);
    if args.json {
        serde_json::to_writer_pretty(&mut writer, &tasks)?;
        writeln!(writer)?;
        return Ok(());
    }
    write_task_lines(&tasks, now, &mut writer)
}

fn handle_status<W: Write>(
    service: &Service,
    args: &IdsArgs,
    completed: bool,
    mut writer: W,
) -> Result<()> {
    let results = service.set_completed(&args.ids, completed)?;
    let summary = StatusSummary::from_results(&results, completed);
    summary.write_to(&mut writer)
}

fn handle_edit<W, Tz>(
    service: &Service,
    args: &EditArgs,
    now: &DateTime<Tz>,
    mut writer: W,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let patch = match args.to_patch(now) {
        Ok(patch) => patch,
        Err(errors) => return write_field_errors("Task not updated:", &errors, &mut writer),
    };
    if patch.is_empty() {
        writeln!(writer, "Nothing to change")?;
        return Ok(());
    }

    match service.edit(&args.id, patch) {
        Ok(Some(task)) => {
            writeln!(writer, "Updated {}", format_task_line(&task, &now.timezone()))?;
            Ok(())
        }
        Ok(None) => {
            writeln!(writer, "Not found: {}", args.id)?;
            Ok(())
        }
        Err(ServiceError::Invalid(errors)) => {
            write_field_errors("Task not updated:", &errors, &mut writer)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_delete<W: Write>(service: &Service, args: &IdsArgs, mut writer: W) -> Result<()> {
    let results = service.delete(&args.ids)?;
    let summary = DeleteSummary::from_results(&results);
    summary.write_to(&mut writer)?;
    Ok(())
}

fn handle_clear<W: Write>(service: &Service, args: &ClearArgs, mut writer: W) -> Result<()> {
    if !args.yes {
        writeln!(writer, "Refusing to remove every task without --yes")?;
        return Ok(());
    }
    let count = service.snapshot().len();
    service.clear()?;
    writeln!(writer, "Removed {} task{}", count, plural(count))?;
    Ok(())
}

fn handle_stats<W, Tz>(
    service: &Service,
    args: &StatsArgs,
    now: &DateTime<Tz>,
    mut writer: W,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let dashboard = service.dashboard(now);
    if args.json {
        serde_json::to_writer_pretty(&mut writer, &dashboard)?;
        writeln!(writer)?;
        return Ok(());
    }
    write_dashboard(&dashboard, now, &mut writer)
}

fn handle_today<W, Tz>(service: &Service, now: &DateTime<Tz>, mut writer: W) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tasks = service.due_today(now);
    if tasks.is_empty() {
        writeln!(writer, "Nothing due today")?;
        return Ok(());
    }
    write_task_lines(&tasks, now, &mut writer)
}

fn write_task_lines<W, Tz>(tasks: &[Task], now: &DateTime<Tz>, mut writer: W) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if tasks.is_empty() {
        writeln!(writer, "No tasks")?;
        return Ok(());
    }
    let zone = now.timezone();
    for task in tasks {
        writeln!(writer, "{}", format_task_line(task, &zone))?;
    }
    Ok(())
}

fn write_dashboard<W, Tz>(dashboard: &Dashboard, now: &DateTime<Tz>, mut writer: W) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let zone = now.timezone();
    writeln!(writer, "{}!", dashboard.greeting)?;
    writeln!(
        writer,
        "Progress {} ({}/{} tasks)",
        progress_bar(dashboard.progress),
        dashboard.completed_tasks,
        dashboard.total_tasks
    )?;
    writeln!(
        writer,
        "{} {}",
        dashboard.motivation.icon, dashboard.motivation.text
    )?;
    writeln!(
        writer,
        "Hours: {} total, {} done, {} remaining",
        format_hours(dashboard.hours.total),
        format_hours(dashboard.hours.completed),
        format_hours(dashboard.hours.remaining)
    )?;

    if !dashboard.overdue.is_empty() {
        writeln!(writer, "Overdue:")?;
        for task in &dashboard.overdue {
            writeln!(
                writer,
                "  {} / {} (was due {})",
                task.subject,
                task.topic,
                format_deadline(&task.deadline, &zone)
            )?;
        }
    }

    if !dashboard.upcoming.is_empty() {
        writeln!(writer, "Upcoming:")?;
        for task in &dashboard.upcoming {
            writeln!(
                writer,
                "  {} / {} due {}",
                task.subject,
                task.topic,
                format_deadline(&task.deadline, &zone)
            )?;
        }
    }

    if !dashboard.subjects.is_empty() {
        writeln!(writer, "Subjects:")?;
        for subject in &dashboard.subjects {
            writeln!(
                writer,
                "  {}: {}/{} tasks, {} of {}",
                subject.subject,
                subject.completed,
                subject.tasks,
                format_hours(subject.completed_hours),
                format_hours(subject.total_hours)
            )?;
        }
    }
    Ok(())
}

fn write_field_errors<W: Write>(
    heading: &str,
    errors: &ValidationErrors,
    mut writer: W,
) -> Result<()> {
    writeln!(writer, "{}", heading)?;
    for (field, message) in errors.iter() {
        writeln!(writer, "  {}: {}", field, message)?;
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

struct StatusSummary {
    changed: usize,
    missing: Vec<String>,
    completed: bool,
}

impl StatusSummary {
    fn from_results(results: &[StatusUpdate], completed: bool) -> Self {
        let mut changed = 0usize;
        let mut missing = Vec::new();
        for result in results {
            if result.changed {
                changed += 1;
            } else {
                missing.push(result.id.clone());
            }
        }
        Self {
            changed,
            missing,
            completed,
        }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let state = if self.completed { "complete" } else { "pending" };
        writeln!(
            writer,
            "Marked {} task{} {}",
            self.changed,
            plural(self.changed),
            state
        )?;
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
}

impl DeleteSummary {
    fn from_results(results: &[DeleteResult]) -> Self {
        let mut deleted = 0usize;
        let mut missing = Vec::new();
        for result in results {
            if result.deleted {
                deleted += 1;
            } else {
                missing.push(result.id.clone());
            }
        }
        Self { deleted, missing }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", SummaryLine::deleted(self.deleted))?;
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

enum SummaryLine {
    Deleted(usize),
    NoneDeleted,
}

impl SummaryLine {
    fn deleted(count: usize) -> Self {
        if count > 0 {
            SummaryLine::Deleted(count)
        } else {
            SummaryLine::NoneDeleted
        }
    }
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLine::Deleted(count) => {
                write!(f, "Deleted {} task{}", count, plural(*count))
            }
            SummaryLine::NoneDeleted => write!(f, "No tasks deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use chrono::FixedOffset;
    use clap::Parser;
    use tempfile::TempDir;

    fn temp_config() -> (AppConfig, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig::from_data_dir(dir.path().to_path_buf()).expect("config");
        (config, dir)
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 4, 8, 0, 0)
            .unwrap()
    }

    fn run(config: &AppConfig, args: &[&str]) -> String {
        let mut argv = vec!["studyplan"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("parse args");
        let mut output = Vec::new();
        execute(config, cli.command.expect("command"), &now(), &mut output).expect("execute");
        String::from_utf8(output).expect("utf8")
    }

    fn add(config: &AppConfig, subject: &str, topic: &str, hours: &str, priority: &str) -> String {
        let output = run(
            config,
            &[
                "add",
                "--subject",
                subject,
                "--topic",
                topic,
                "--hours",
                hours,
                "--deadline",
                "tomorrow",
                "--priority",
                priority,
            ],
        );
        output
            .split_whitespace()
            .nth(1)
            .expect("id in output")
            .to_string()
    }

    #[test]
    fn add_then_list_in_priority_order() {
        let (config, _dir) = temp_config();
        add(&config, "History", "WWII", "1", "low");
        add(&config, "Math", "Algebra", "2", "high");

        let output = run(&config, &["list", "--sort", "priority"]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Math / Algebra"));
        assert!(lines[1].contains("History / WWII"));
        assert!(lines[0].contains("due 2026-03-05 09:00"));
    }

    #[test]
    fn add_reports_each_invalid_field() {
        let (config, _dir) = temp_config();
        let output = run(
            &config,
            &[
                "add",
                "--subject",
                " ",
                "--topic",
                "Algebra",
                "--hours",
                "0",
                "--deadline",
                "2026-03-01",
            ],
        );

        assert!(output.starts_with("Task not added:"));
        assert!(output.contains("subject: Subject is required"));
        assert!(output.contains("studyTime: Study time must be greater than zero"));
        assert!(output.contains("deadline: Deadline cannot be in the past"));
        assert_eq!(run(&config, &["list"]), "No tasks\n");
    }

    #[test]
    fn done_and_undo_report_missing_ids() {
        let (config, _dir) = temp_config();
        let id = add(&config, "Math", "Algebra", "2", "high");

        let output = run(&config, &["done", &id, "missing"]);
        assert!(output.contains("Marked 1 task complete"));
        assert!(output.contains("Not found: missing"));
        assert!(run(&config, &["list", "--filter", "completed"]).contains(&id));

        let output = run(&config, &["undo", &id]);
        assert!(output.contains("Marked 1 task pending"));
        assert!(run(&config, &["list", "--filter", "completed"]).contains("No tasks"));
    }

    #[test]
    fn stats_matches_study_session_scenario() {
        let (config, _dir) = temp_config();
        let math = add(&config, "Math", "Algebra", "2h", "high");
        add(&config, "History", "WWII", "1h", "low");
        run(&config, &["done", &math]);

        let output = run(&config, &["stats"]);
        assert!(output.starts_with("Good Morning!"));
        assert!(output.contains("50% (1/2 tasks)"));
        assert!(output.contains("Hours: 3h total, 2h done, 1h remaining"));
        assert!(output.contains("History: 0/1 tasks, 0h of 1h"));
        assert!(output.contains("Math: 1/1 tasks, 2h of 2h"));
    }

    #[test]
    fn stats_json_is_machine_readable() {
        let (config, _dir) = temp_config();
        add(&config, "Math", "Algebra", "2", "high");

        let output = run(&config, &["stats", "--json"]);
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(value["total_tasks"], 1);
        assert_eq!(value["progress"], 0);
        assert_eq!(value["hours"]["total"], 2.0);
    }

    #[test]
    fn edit_changes_fields_and_handles_missing() {
        let (config, _dir) = temp_config();
        let id = add(&config, "Math", "Algebra", "2", "medium");

        let output = run(&config, &["edit", &id, "--topic", "Calculus", "--priority", "high"]);
        assert!(output.starts_with("Updated"));
        assert!(output.contains("High"));
        assert!(output.contains("Math / Calculus"));

        assert_eq!(run(&config, &["edit", &id]), "Nothing to change\n");
        assert_eq!(
            run(&config, &["edit", "missing", "--topic", "x"]),
            "Not found: missing\n"
        );
        assert!(run(&config, &["edit", &id, "--subject", " "]).starts_with("Task not updated:"));

        let output = run(&config, &["edit", &id, "--hours", "lots", "--deadline", "+3é"]);
        assert!(output.starts_with("Task not updated:"));
        assert!(output.contains("  studyTime: Unrecognized study time 'lots'"));
        assert!(output.contains("  deadline: "));
        assert!(run(&config, &["list"]).contains("Math / Calculus"));
    }

    #[test]
    fn delete_command_reports_deleted_and_missing() {
        let (config, _dir) = temp_config();
        let id = add(&config, "Math", "Algebra", "2", "high");

        let output = run(&config, &["delete", &id, "missing"]);
        assert!(output.contains("Deleted 1 task"));
        assert!(output.contains("Not found: missing"));
    }

    #[test]
    fn delete_command_handles_no_matches() {
        let (config, _dir) = temp_config();
        let output = run(&config, &["delete", "missing"]);
        assert!(output.contains("No tasks deleted"));
    }

    #[test]
    fn clear_requires_confirmation() {
        let (config, _dir) = temp_config();
        add(&config, "Math", "Algebra", "2", "high");
        add(&config, "History", "WWII", "1", "low");

        assert!(run(&config, &["clear"]).contains("without --yes"));
        assert_eq!(run(&config, &["clear", "--yes"]), "Removed 2 tasks\n");
        assert_eq!(run(&config, &["list"]), "No tasks\n");
    }

    #[test]
    fn today_lists_only_tasks_due_today() {
        let (config, _dir) = temp_config();
        add(&config, "Math", "Algebra", "2", "high");
        assert_eq!(run(&config, &["today"]), "Nothing due today\n");

        run(
            &config,
            &[
                "add", "--subject", "Biology", "--topic", "Cells", "--hours", "1", "--deadline",
                "today",
            ],
        );
        let output = run(&config, &["today"]);
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("Biology / Cells"));
    }
}
