//! Read-only projections of a loaded collection. None of these touch storage.

use chrono::{Days, NaiveDate};
use devboard_core::tasks::{Task, TaskStatus};

/// Window, in days after today, in which a due date counts as "soon".
pub const DEFAULT_DUE_SOON_DAYS: u64 = 3;

/// Board order: column, then manual order, then id.
pub fn board(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| (t.status.rank(), t.order, t.id));
    sorted
}

/// One board column in board order.
pub fn column(tasks: &[Task], status: TaskStatus) -> Vec<Task> {
    board(tasks)
        .into_iter()
        .filter(|t| t.status == status)
        .collect()
}

/// Tasks with a due date, earliest first. Board order breaks ties.
pub fn timeline(tasks: &[Task]) -> Vec<Task> {
    let mut dated: Vec<Task> = board(tasks)
        .into_iter()
        .filter(|t| t.due_date.is_some())
        .collect();
    dated.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    dated
}

pub fn blocked(tasks: &[Task]) -> Vec<Task> {
    board(tasks).into_iter().filter(|t| t.blocked).collect()
}

pub fn sprint(tasks: &[Task]) -> Vec<Task> {
    board(tasks).into_iter().filter(|t| t.in_sprint).collect()
}

/// How close a due date is, relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Overdue,
    DueSoon,
    Later,
}

impl DueState {
    pub fn label(self) -> &'static str {
        match self {
            DueState::Overdue => "overdue",
            DueState::DueSoon => "due soon",
            DueState::Later => "later",
        }
    }
}

/// `None` when the task has no (parseable) due date.
pub fn due_state(task: &Task, today: NaiveDate, soon_days: u64) -> Option<DueState> {
    let due = task.due_date.as_deref()?;
    let due = NaiveDate::parse_from_str(due, "%Y-%m-%d").ok()?;
    let soon_end = today.checked_add_days(Days::new(soon_days)).unwrap_or(NaiveDate::MAX);
    Some(if due < today {
        DueState::Overdue
    } else if due <= soon_end {
        DueState::DueSoon
    } else {
        DueState::Later
    })
}
