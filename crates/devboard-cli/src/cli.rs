use std::path::PathBuf;

use clap::{builder::BoolishValueParser, ArgAction, Args, Parser, Subcommand};

/// CLI surface definition. Every task command performs one load, mutate, save
/// cycle against the tasks file.
#[derive(Parser, Debug)]
#[command(
    name = "devboard",
    about = "Personal developer task board backed by a local JSON file",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Answer with JSON instead of the refreshed board.
    #[arg(long, global = true)]
    pub json: bool,

    /// Tasks file to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Optional subcommand; defaults to the board view when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the terminal board (press q or Esc to exit).
    Board,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    #[command(flatten)]
    Task(TaskCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// List all tasks in board order.
    List,
    /// Print one task as JSON.
    Show { id: i64 },
    /// Add a task.
    Add(AddArgs),
    /// Edit a task; options left out keep their current value.
    Edit(EditArgs),
    /// Move a task to `todo`, `in progress` or `done`.
    Status { id: i64, status: String },
    /// Mark a task as selected (or not) for the current sprint.
    Sprint {
        id: i64,
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        in_sprint: bool,
    },
    /// Set a due date (YYYY-MM-DD); omit the date to clear it.
    Due { id: i64, date: Option<String> },
    /// Set the manual order of a column from a comma-separated id list.
    Reorder { status: String, ids: String },
    /// Delete a task and its subtasks.
    Delete { id: i64 },
    /// Manage a task's checklist.
    #[command(subcommand)]
    Subtask(SubtaskCommand),
    /// Tasks with a due date, earliest first.
    Timeline,
    /// Blocked tasks in board order.
    Blocked,
    /// Tasks selected for the current sprint.
    SprintList,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SubtaskCommand {
    Add { task: i64, title: String },
    Toggle { task: i64, subtask: i64 },
    Delete { task: i64, subtask: i64 },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// coding, debugging or learning.
    #[arg(long = "type", default_value = "coding")]
    pub task_type: String,
    #[arg(long, default_value = "todo")]
    pub status: String,
    #[arg(long, default_value = "")]
    pub due: String,
    /// Path or http(s) URL pointing at the relevant code.
    #[arg(long, default_value = "")]
    pub link: String,
    #[arg(long, default_value = "")]
    pub snippet: String,
    #[arg(long)]
    pub blocked: bool,
    #[arg(long, default_value = "")]
    pub reason: String,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub snippet: Option<String>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub blocked: Option<bool>,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub sprint: Option<bool>,
    /// New due date; pass an empty string to clear.
    #[arg(long)]
    pub due: Option<String>,
}
