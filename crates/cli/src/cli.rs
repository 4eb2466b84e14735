use std::path::PathBuf;

use chrono::{DateTime, TimeZone};
use clap::{Args, Parser, Subcommand};

use crate::core::validation::{self, PatchDraft, TaskDraft, ValidationErrors};
use crate::model::{CompletionFilter, ListSort, Priority, TaskPatch};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "studyplan",
    version,
    about = "Track study tasks, deadlines and progress from the terminal.",
    after_help = "Examples:\n  studyplan add --subject Math --topic Algebra --hours 2 --deadline tomorrow --priority high\n  studyplan list --filter pending --sort priority\n  studyplan done 01HV3K9Q2XW8M1T0C7N5B4A6ZE\n  studyplan stats"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the tracing filter (e.g. "info", "debug", or full directives)
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Add a study task
    Add(AddArgs),
    /// List tasks
    List(ListArgs),
    /// Mark one or more tasks complete
    Done(IdsArgs),
    /// Mark one or more tasks pending again
    Undo(IdsArgs),
    /// Change fields of an existing task
    Edit(EditArgs),
    /// Delete one or more tasks by id
    Delete(IdsArgs),
    /// Remove every task
    Clear(ClearArgs),
    /// Show progress, hours and upcoming deadlines (default command)
    Stats(StatsArgs),
    /// Show tasks due today
    Today,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Subject, e.g. Math
    #[arg(long)]
    pub subject: String,

    /// Topic within the subject, e.g. Algebra
    #[arg(long)]
    pub topic: String,

    /// Estimated study time (hours, or with a unit: 90m, 2h)
    #[arg(long = "hours", value_name = "TIME")]
    pub study_time: String,

    /// Deadline (ISO e.g. 2026-01-31, today, tomorrow, +3d, fri)
    #[arg(long, value_name = "DATE")]
    pub deadline: String,

    /// Priority (low, medium, high); anything else counts as medium
    #[arg(long, value_name = "LEVEL")]
    pub priority: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Which tasks to show
    #[arg(long, value_enum, default_value_t = CompletionFilter::All)]
    pub filter: CompletionFilter,

    /// Ordering of the listed tasks
    #[arg(long, value_enum, default_value_t = ListSort::Stored)]
    pub sort: ListSort,

    /// Print the tasks as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IdsArgs {
    /// One or more task ids (shown by `studyplan list`)
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// Task id
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long)]
    pub topic: Option<String>,

    /// New study time estimate (hours, or 90m / 2h)
    #[arg(long = "hours", value_name = "TIME")]
    pub study_time: Option<String>,

    /// New deadline (same formats as `add`)
    #[arg(long, value_name = "DATE")]
    pub deadline: Option<String>,

    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ClearArgs {
    /// Confirm removal of every task
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Print the dashboard as JSON
    #[arg(long)]
    pub json: bool,
}

impl From<&AddArgs> for TaskDraft {
    fn from(args: &AddArgs) -> Self {
        TaskDraft {
            subject: args.subject.clone(),
            topic: args.topic.clone(),
            study_time: args.study_time.clone(),
            deadline: args.deadline.clone(),
            priority: args.priority.clone(),
        }
    }
}

impl EditArgs {
    /// Parse the provided flags into a checked patch. Deadlines resolve against `now`.
    pub fn to_patch<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<TaskPatch, ValidationErrors> {
        let draft = PatchDraft {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            study_time: self.study_time.clone(),
            deadline: self.deadline.clone(),
            priority: self.priority,
        };
        validation::parse_patch(&draft, now)
    }
}
