use std::io::Write;

use chrono::NaiveDate;
use color_eyre::Result;
use devboard_core::{
    error::OpError,
    reply::{Outcome, Reply, ReplyBody, ResponseMode},
    store::TaskStore,
    tasks::{Task, TaskStatus},
};
use devboard_task::{
    views::{self, DueState},
    NewTask, TaskBoard, TaskEdit,
};

use crate::cli::{AddArgs, EditArgs, SubtaskCommand, TaskCommand};

/// How results are shown: the response mode plus what is needed to annotate
/// due dates.
#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    pub mode: ResponseMode,
    pub today: NaiveDate,
    pub due_soon_days: u64,
}

/// Execute a task subcommand and write the reply to `out`. Rejected input and
/// storage failures become errors after the reply has been written.
pub async fn handle<S, W>(
    cmd: TaskCommand,
    board: &TaskBoard<S>,
    presenter: &Presenter,
    out: &mut W,
) -> Result<()>
where
    S: TaskStore,
    W: Write,
{
    let result = match cmd {
        TaskCommand::List => {
            return presenter.print_view(out, "Board", views::board(&list(board).await?))
        }
        TaskCommand::Timeline => {
            return presenter.print_view(out, "Timeline", views::timeline(&list(board).await?))
        }
        TaskCommand::Blocked => {
            return presenter.print_view(out, "Blocked", views::blocked(&list(board).await?))
        }
        TaskCommand::SprintList => {
            return presenter.print_view(out, "Sprint", views::sprint(&list(board).await?))
        }
        TaskCommand::Show { id } => board.get(id).await.map(Outcome::Lookup),
        TaskCommand::Add(args) => board.create(new_task(args)).await.map(|_| Outcome::Redirect),
        TaskCommand::Edit(args) => edit(board, args).await.map(|_| Outcome::Redirect),
        TaskCommand::Status { id, status } => {
            board.set_status(id, &status).await.map(|_| Outcome::Ack)
        }
        TaskCommand::Sprint { id, in_sprint } => board
            .set_sprint(id, in_sprint)
            .await
            .map(|_| Outcome::Sprint { in_sprint }),
        TaskCommand::Due { id, date } => board
            .set_due_date(id, date.as_deref().unwrap_or_default())
            .await
            .map(|_| Outcome::Redirect),
        TaskCommand::Reorder { status, ids } => {
            board.reorder(&status, &ids).await.map(|_| Outcome::Ack)
        }
        TaskCommand::Delete { id } => board.delete(id).await.map(|_| Outcome::Redirect),
        TaskCommand::Subtask(SubtaskCommand::Add { task, title }) => {
            board.add_subtask(task, &title).await.map(Outcome::Task)
        }
        TaskCommand::Subtask(SubtaskCommand::Toggle { task, subtask }) => {
            board.toggle_subtask(task, subtask).await.map(Outcome::Task)
        }
        TaskCommand::Subtask(SubtaskCommand::Delete { task, subtask }) => {
            board.delete_subtask(task, subtask).await.map(Outcome::Task)
        }
    };

    let failure = result.as_ref().err().map(ToString::to_string);
    let reply = Reply::from_result(result, presenter.mode);
    match &reply.body {
        ReplyBody::Json(body) => writeln!(out, "{}", serde_json::to_string_pretty(body)?)?,
        ReplyBody::Redirect { .. } if reply.is_success() => {
            let tasks = list(board).await?;
            presenter.print_board(out, &tasks)?;
        }
        ReplyBody::Redirect { .. } => {}
    }
    if !reply.is_success() {
        let message = failure.unwrap_or_else(|| format!("request failed ({})", reply.status));
        color_eyre::eyre::bail!(message);
    }
    Ok(())
}

async fn list<S: TaskStore>(board: &TaskBoard<S>) -> Result<Vec<Task>> {
    board
        .list()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}

fn new_task(args: AddArgs) -> NewTask {
    NewTask {
        title: args.title,
        description: args.description,
        task_type: args.task_type,
        status: args.status,
        due_date: args.due,
        code_link: args.link,
        code_snippet: args.snippet,
        blocked: args.blocked,
        blocking_reason: args.reason,
    }
}

/// Options left out on the command line keep the task's current values.
async fn edit<S: TaskStore>(
    board: &TaskBoard<S>,
    args: EditArgs,
) -> Result<Option<Task>, OpError> {
    let current = board.get(args.id).await?;
    let mut edit = current.as_ref().map(TaskEdit::from_task).unwrap_or_default();
    if let Some(title) = args.title {
        edit.title = title;
    }
    if let Some(description) = args.description {
        edit.description = description;
    }
    if let Some(link) = args.link {
        edit.code_link = link;
    }
    if let Some(snippet) = args.snippet {
        edit.code_snippet = snippet;
    }
    if let Some(blocked) = args.blocked {
        edit.blocked = blocked;
    }
    if let Some(reason) = args.reason {
        edit.blocking_reason = reason;
    }
    if let Some(sprint) = args.sprint {
        edit.in_sprint = sprint;
    }
    if let Some(due) = args.due {
        edit.due_date = due;
    }
    board.edit(args.id, edit).await
}

impl Presenter {
    fn print_view<W: Write>(&self, out: &mut W, title: &str, tasks: Vec<Task>) -> Result<()> {
        if self.mode == ResponseMode::Json {
            writeln!(out, "{}", serde_json::to_string_pretty(&tasks)?)?;
            return Ok(());
        }
        writeln!(out, "{title} ({})", tasks.len())?;
        for task in &tasks {
            writeln!(out, "  {}", self.task_line(task))?;
        }
        Ok(())
    }

    /// The "reloaded page": every column in board order.
    fn print_board<W: Write>(&self, out: &mut W, tasks: &[Task]) -> Result<()> {
        if tasks.is_empty() {
            writeln!(out, "No tasks yet. Add one with `devboard add <title>`.")?;
            return Ok(());
        }
        for status in TaskStatus::ALL {
            let column = views::column(tasks, status);
            writeln!(out, "{} ({})", status.as_str().to_uppercase(), column.len())?;
            for task in &column {
                writeln!(out, "  {}", self.task_line(task))?;
            }
        }
        Ok(())
    }

    pub fn task_line(&self, task: &Task) -> String {
        let mut line = format!(
            "#{} [{}] {} ({})",
            task.id,
            task.status.as_str(),
            task.title,
            task.task_type.as_str()
        );
        if let Some(due) = &task.due_date {
            line.push_str(&format!(" due {due}"));
            if let Some(state) = views::due_state(task, self.today, self.due_soon_days) {
                if state != DueState::Later {
                    line.push_str(&format!(" ({})", state.label()));
                }
            }
        }
        let (done, total) = task.subtask_progress();
        if total > 0 {
            line.push_str(&format!(" [{done}/{total}]"));
        }
        if task.in_sprint {
            line.push_str(" *sprint*");
        }
        if task.blocked {
            if task.blocking_reason.is_empty() {
                line.push_str(" BLOCKED");
            } else {
                line.push_str(&format!(" BLOCKED: {}", task.blocking_reason));
            }
        }
        line
    }
}
