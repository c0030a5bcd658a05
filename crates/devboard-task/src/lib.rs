use devboard_core::{
    error::OpError,
    store::{storage_err, TaskStore},
    tasks::{
        next_after, parse_due_date_input, sanitize_code_link, Subtask, Task, TaskStatus, TaskType,
    },
};
use tracing::{info, instrument, warn};

pub mod views;

/// Input for a new task, as a form or command line would supply it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub status: String,
    pub due_date: String,
    pub code_link: String,
    pub code_snippet: String,
    pub blocked: bool,
    pub blocking_reason: String,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Full edit of a task's free-form fields. Everything except an empty title
/// overwrites the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: String,
    pub description: String,
    pub code_link: String,
    pub code_snippet: String,
    pub blocked: bool,
    pub blocking_reason: String,
    pub in_sprint: bool,
    pub due_date: String,
}

impl TaskEdit {
    /// Start an edit from the current values so callers can change a subset.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            code_link: task.code_link.clone(),
            code_snippet: task.code_snippet.clone(),
            blocked: task.blocked,
            blocking_reason: task.blocking_reason.clone(),
            in_sprint: task.in_sprint,
            due_date: task.due_date.clone().unwrap_or_default(),
        }
    }
}

/// Task operations over a `TaskStore`. Each mutation is one full
/// load, mutate, save cycle; ids that do not exist are silent no-ops.
pub struct TaskBoard<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskBoard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Task>, OpError> {
        Ok(self.store.load().await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<Task>, OpError> {
        let tasks = self.store.load().await?;
        Ok(tasks.into_iter().find(|t| t.id == id))
    }

    /// Returns `None` without touching storage when the title is blank.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: NewTask) -> Result<Option<Task>, OpError> {
        let title = input.title.trim();
        if title.is_empty() {
            warn!("ignoring task without a title");
            return Ok(None);
        }
        let mut tasks = self.store.load().await?;
        let id = next_after(tasks.iter().map(|t| t.id).max(), 1).ok_or_else(exhausted)?;
        let order = next_after(tasks.iter().map(|t| t.order).max(), 0).ok_or_else(exhausted)?;
        let task = Task {
            id,
            title: title.to_string(),
            description: input.description.trim().to_string(),
            context: String::new(),
            code_link: sanitize_code_link(&input.code_link),
            code_snippet: input.code_snippet.trim().to_string(),
            task_type: TaskType::normalize(&input.task_type),
            status: TaskStatus::normalize(&input.status),
            subtasks: Vec::new(),
            due_date: parse_due_date_input(&input.due_date),
            order,
            blocked: input.blocked,
            blocking_reason: input.blocking_reason.trim().to_string(),
            in_sprint: false,
        };
        tasks.push(task.clone());
        self.store.save(&tasks).await?;
        info!(id, "created task");
        Ok(Some(task))
    }

    #[instrument(skip(self, edit))]
    pub async fn edit(&self, id: i64, edit: TaskEdit) -> Result<Option<Task>, OpError> {
        self.mutate(id, |task| {
            let title = edit.title.trim();
            if !title.is_empty() {
                task.title = title.to_string();
            }
            task.description = edit.description.trim().to_string();
            task.code_link = sanitize_code_link(&edit.code_link);
            task.code_snippet = edit.code_snippet.trim().to_string();
            task.blocked = edit.blocked;
            task.blocking_reason = edit.blocking_reason.trim().to_string();
            task.in_sprint = edit.in_sprint;
            task.due_date = parse_due_date_input(&edit.due_date);
            Ok(())
        })
        .await
    }

    /// Rejects unknown statuses before loading anything.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: i64, status: &str) -> Result<Option<Task>, OpError> {
        let status = TaskStatus::parse(status.trim()).ok_or(OpError::InvalidStatus)?;
        self.mutate(id, |task| {
            task.status = status;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_sprint(&self, id: i64, in_sprint: bool) -> Result<Option<Task>, OpError> {
        self.mutate(id, |task| {
            task.in_sprint = in_sprint;
            Ok(())
        })
        .await
    }

    /// An empty (or malformed) date clears the due date.
    #[instrument(skip(self))]
    pub async fn set_due_date(&self, id: i64, due_date: &str) -> Result<Option<Task>, OpError> {
        let due_date = parse_due_date_input(due_date);
        self.mutate(id, |task| {
            task.due_date = due_date;
            Ok(())
        })
        .await
    }

    /// Assign `order` = position for each listed task currently in `status`.
    /// Listed tasks in another column and unlisted tasks keep their order, so
    /// duplicate order values within a column are possible.
    #[instrument(skip(self))]
    pub async fn reorder(&self, status: &str, order: &str) -> Result<(), OpError> {
        let status = TaskStatus::parse(status.trim()).ok_or(OpError::InvalidOrder)?;
        let ids = parse_id_list(order);
        if ids.is_empty() {
            return Err(OpError::InvalidOrder);
        }
        let mut tasks = self.store.load().await?;
        for (position, id) in ids.iter().enumerate() {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == *id && t.status == status) {
                task.order = position as i64;
            }
        }
        self.store.save(&tasks).await?;
        info!(status = status.as_str(), count = ids.len(), "reordered column");
        Ok(())
    }

    /// Removes the task and, with it, all of its subtasks.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, OpError> {
        let mut tasks = self.store.load().await?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != before;
        if !removed {
            warn!("no task to delete");
        }
        self.store.save(&tasks).await?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn add_subtask(&self, task_id: i64, title: &str) -> Result<Option<Task>, OpError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(OpError::TitleRequired);
        }
        self.mutate(task_id, |task| {
            let id = task.next_subtask_id().ok_or_else(exhausted)?;
            task.subtasks.push(Subtask {
                id,
                title: title.to_string(),
                done: false,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn toggle_subtask(
        &self,
        task_id: i64,
        subtask_id: i64,
    ) -> Result<Option<Task>, OpError> {
        self.mutate(task_id, |task| {
            if let Some(subtask) = task.subtasks.iter_mut().find(|s| s.id == subtask_id) {
                subtask.done = !subtask.done;
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_subtask(
        &self,
        task_id: i64,
        subtask_id: i64,
    ) -> Result<Option<Task>, OpError> {
        self.mutate(task_id, |task| {
            task.subtasks.retain(|s| s.id != subtask_id);
            Ok(())
        })
        .await
    }

    /// Load, apply `change` to the task with `id` if present, and save either way.
    /// A failed `change` returns before anything is written.
    async fn mutate<F>(&self, id: i64, change: F) -> Result<Option<Task>, OpError>
    where
        F: FnOnce(&mut Task) -> Result<(), OpError>,
    {
        let mut tasks = self.store.load().await?;
        let updated = match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                change(task)?;
                Some(task.clone())
            }
            None => None,
        };
        if updated.is_none() {
            warn!(id, "task not found, saving unchanged collection");
        }
        self.store.save(&tasks).await?;
        Ok(updated)
    }
}

fn exhausted() -> OpError {
    OpError::Store(storage_err("id space exhausted"))
}

/// Comma-separated ids; tokens that are not plain digits are skipped.
fn parse_id_list(order: &str) -> Vec<i64> {
    order
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use devboard_core::store::{InMemoryTaskStore, StoreError};

    use super::*;

    fn board_with(document: &str) -> TaskBoard<InMemoryTaskStore> {
        TaskBoard::new(InMemoryTaskStore::with_document(document))
    }

    #[tokio::test]
    async fn first_task_walkthrough() {
        let board = TaskBoard::new(InMemoryTaskStore::new());
        let created = board
            .create(NewTask {
                title: "Fix bug".into(),
                status: "todo".into(),
                ..NewTask::default()
            })
            .await
            .expect("create")
            .expect("created");
        assert_eq!(created.id, 1);

        let tasks = board.list().await.expect("list");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[0].order, 0);
        assert_eq!(tasks[0].status, TaskStatus::Todo);
        assert!(tasks[0].subtasks.is_empty());

        let task = board
            .add_subtask(1, "write test")
            .await
            .expect("add subtask")
            .expect("task exists");
        assert_eq!(
            task.subtasks,
            vec![Subtask {
                id: 0,
                title: "write test".into(),
                done: false
            }]
        );

        board.set_status(1, "done").await.expect("set status");
        let err = board.set_status(1, "bogus").await.expect_err("rejected");
        assert_eq!(err, OpError::InvalidStatus);
        let task = board.get(1).await.expect("get").expect("exists");
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn create_with_blank_title_does_not_save() {
        let store = InMemoryTaskStore::new();
        let board = TaskBoard::new(store.clone());
        let created = board.create(NewTask::titled("   ")).await.expect("create");
        assert!(created.is_none());
        assert!(store.document().is_none(), "nothing should be written");
    }

    #[tokio::test]
    async fn create_normalizes_inputs() {
        let board = board_with(r#"[{"id": 1}, {"id": 2}, {"id": 5, "order": 9}]"#);
        let task = board
            .create(NewTask {
                title: "  Learn lifetimes ".into(),
                description: " chapter 10 ".into(),
                task_type: "reading".into(),
                status: "blocked".into(),
                due_date: "next week".into(),
                code_link: "https://x".into(),
                code_snippet: "  fn main() {}  ".into(),
                blocked: true,
                blocking_reason: " waiting on review ".into(),
            })
            .await
            .expect("create")
            .expect("created");
        assert_eq!(task.id, 6);
        assert_eq!(task.order, 10);
        assert_eq!(task.title, "Learn lifetimes");
        assert_eq!(task.description, "chapter 10");
        assert_eq!(task.task_type, TaskType::Coding);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.due_date, None);
        assert_eq!(task.code_link, "");
        assert_eq!(task.code_snippet, "fn main() {}");
        assert!(task.blocked);
        assert_eq!(task.blocking_reason, "waiting on review");
        assert!(!task.in_sprint);
    }

    #[tokio::test]
    async fn edit_overwrites_everything_but_blank_title() {
        let board = board_with(
            r#"[{"id": 1, "title": "Keep", "description": "old", "blocked": true,
                 "blocking_reason": "ci", "in_sprint": true, "due_date": "2025-03-01",
                 "code_link": "src/a.rs"}]"#,
        );
        let task = board
            .edit(
                1,
                TaskEdit {
                    title: "  ".into(),
                    code_link: "https://example.com/pr/1".into(),
                    ..TaskEdit::default()
                },
            )
            .await
            .expect("edit")
            .expect("found");
        assert_eq!(task.title, "Keep");
        assert_eq!(task.description, "");
        assert!(!task.blocked);
        assert_eq!(task.blocking_reason, "");
        assert!(!task.in_sprint);
        assert_eq!(task.due_date, None);
        assert_eq!(task.code_link, "https://example.com/pr/1");
        assert_eq!(board.get(1).await.expect("get"), Some(task));
    }

    #[tokio::test]
    async fn edit_from_task_changes_only_what_is_set() {
        let board = board_with(r#"[{"id": 1, "title": "Keep", "due_date": "2025-03-01"}]"#);
        let current = board.get(1).await.expect("get").expect("found");
        let mut edit = TaskEdit::from_task(&current);
        edit.in_sprint = true;
        let task = board.edit(1, edit).await.expect("edit").expect("found");
        assert!(task.in_sprint);
        assert_eq!(task.due_date.as_deref(), Some("2025-03-01"));
        assert_eq!(task.title, "Keep");
    }

    #[tokio::test]
    async fn unknown_ids_are_silent_noops_that_still_save() {
        let store = InMemoryTaskStore::with_document(r#"[{"id": 1, "title": "a", "done": true}]"#);
        let board = TaskBoard::new(store.clone());
        let before = board.list().await.expect("list");

        assert_eq!(board.set_status(42, "todo").await.expect("status"), None);
        assert_eq!(board.add_subtask(42, "x").await.expect("subtask"), None);
        let task = board.toggle_subtask(1, 42).await.expect("toggle");
        assert_eq!(task.map(|t| t.subtasks.len()), Some(0));
        assert!(!board.delete(42).await.expect("delete"));

        // The legacy document was rewritten in normalized form.
        let text = String::from_utf8(store.document().expect("document")).expect("utf8");
        assert!(text.contains("\"status\": \"done\""));
        assert_eq!(board.list().await.expect("list"), before);
    }

    #[tokio::test]
    async fn reorder_only_touches_matching_column() {
        let board = board_with(
            r#"[
                {"id": 1, "status": "todo", "order": 10},
                {"id": 2, "status": "done", "order": 20},
                {"id": 3, "status": "todo", "order": 30},
                {"id": 4, "status": "todo", "order": 40}
            ]"#,
        );
        board.reorder("todo", "3,1,2").await.expect("reorder");
        let tasks = board.list().await.expect("list");
        let order_of = |id: i64| tasks.iter().find(|t| t.id == id).map(|t| t.order);
        assert_eq!(order_of(3), Some(0));
        assert_eq!(order_of(1), Some(1));
        assert_eq!(order_of(2), Some(20), "listed but in another column");
        assert_eq!(order_of(4), Some(40), "unlisted keeps stale order");
    }

    #[tokio::test]
    async fn reorder_skips_non_numeric_tokens() {
        let board = board_with(r#"[{"id": 1}, {"id": 2}]"#);
        board
            .reorder("todo", " 2 , abc, -1, 1 ")
            .await
            .expect("reorder");
        let tasks = board.list().await.expect("list");
        assert_eq!(tasks[0].order, 1);
        assert_eq!(tasks[1].order, 0);
    }

    #[tokio::test]
    async fn reorder_rejects_bad_payloads_without_saving() {
        let store = InMemoryTaskStore::with_document(r#"[{"id": 1, "order": 5}]"#);
        let board = TaskBoard::new(store.clone());

        for (status, order) in [("todo", ""), ("todo", "a,b"), ("later", "1"), ("", "1")] {
            let err = board.reorder(status, order).await.expect_err("invalid");
            assert_eq!(err, OpError::InvalidOrder);
        }
        assert_eq!(
            store.document().as_deref(),
            Some(br#"[{"id": 1, "order": 5}]"#.as_slice()),
            "document untouched"
        );
    }

    #[tokio::test]
    async fn delete_cascades_subtasks() {
        let store = InMemoryTaskStore::with_document(
            r#"[{"id": 7, "title": "gone", "subtasks": [{"id": 0, "title": "needle"}]},
                {"id": 8, "title": "stays"}]"#,
        );
        let board = TaskBoard::new(store.clone());
        assert!(board.delete(7).await.expect("delete"));

        let tasks = board.list().await.expect("list");
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![8]);
        let text = String::from_utf8(store.document().expect("document")).expect("utf8");
        assert!(!text.contains("needle"));
    }

    #[tokio::test]
    async fn subtask_ids_follow_the_highest() {
        let board = board_with(
            r#"[{"id": 1, "subtasks": [{"id": 1, "title": "a"}, {"id": 3, "title": "b"}]}]"#,
        );
        let task = board
            .add_subtask(1, "c")
            .await
            .expect("add")
            .expect("found");
        assert_eq!(task.subtasks.last().map(|s| s.id), Some(4));

        let err = board.add_subtask(1, "  ").await.expect_err("blank title");
        assert_eq!(err, OpError::TitleRequired);
    }

    #[tokio::test]
    async fn rejected_input_is_never_saved() {
        const SEED: &str = r#"[{"id": 1, "title": "a", "done": true}]"#;
        let store = InMemoryTaskStore::with_document(SEED);
        let board = TaskBoard::new(store.clone());

        let err = board.set_status(1, "bogus").await.expect_err("bad status");
        assert_eq!(err, OpError::InvalidStatus);
        let err = board.add_subtask(1, "  ").await.expect_err("blank title");
        assert_eq!(err, OpError::TitleRequired);

        assert_eq!(
            store.document().as_deref(),
            Some(SEED.as_bytes()),
            "document untouched"
        );
    }

    #[tokio::test]
    async fn create_fails_when_task_ids_run_out() {
        const SEED: &str = r#"[{"id": 9223372036854775807, "title": "big", "order": 0}]"#;
        let store = InMemoryTaskStore::with_document(SEED);
        let board = TaskBoard::new(store.clone());

        let err = board.create(NewTask::titled("next")).await.expect_err("no id left");
        assert!(matches!(err, OpError::Store(StoreError::Storage { .. })));
        assert!(!err.is_validation());
        assert_eq!(store.document().as_deref(), Some(SEED.as_bytes()));
    }

    #[tokio::test]
    async fn create_fails_when_orders_run_out() {
        const SEED: &str = r#"[{"id": 1, "title": "last", "order": 9223372036854775807}]"#;
        let store = InMemoryTaskStore::with_document(SEED);
        let board = TaskBoard::new(store.clone());

        let err = board.create(NewTask::titled("next")).await.expect_err("no order left");
        assert!(matches!(err, OpError::Store(StoreError::Storage { .. })));
        assert_eq!(store.document().as_deref(), Some(SEED.as_bytes()));
    }

    #[tokio::test]
    async fn add_subtask_fails_when_subtask_ids_run_out() {
        // A float id saturates to i64::MAX on load.
        const SEED: &str = r#"[{"id": 1, "subtasks": [{"id": 1e300, "title": "s"}]}]"#;
        let store = InMemoryTaskStore::with_document(SEED);
        let board = TaskBoard::new(store.clone());

        let err = board.add_subtask(1, "next").await.expect_err("no id left");
        assert!(matches!(err, OpError::Store(StoreError::Storage { .. })));
        assert_eq!(store.document().as_deref(), Some(SEED.as_bytes()));
    }

    #[tokio::test]
    async fn toggle_and_delete_subtasks() {
        let board = board_with(
            r#"[{"id": 1, "subtasks": [{"id": 0, "title": "a"}, {"id": 1, "title": "b"}]}]"#,
        );
        let task = board.toggle_subtask(1, 1).await.expect("toggle").expect("found");
        assert!(task.subtasks[1].done);
        let task = board.toggle_subtask(1, 1).await.expect("toggle").expect("found");
        assert!(!task.subtasks[1].done);

        let task = board.delete_subtask(1, 0).await.expect("delete").expect("found");
        assert_eq!(task.subtasks.len(), 1);
        assert_eq!(task.subtasks[0].title, "b");

        let task = board.delete_subtask(1, 9).await.expect("delete").expect("found");
        assert_eq!(task.subtasks.len(), 1);
    }

    #[tokio::test]
    async fn sprint_and_due_date_overwrite() {
        let board = board_with(r#"[{"id": 1, "due_date": "2025-01-01"}]"#);
        let task = board.set_sprint(1, true).await.expect("sprint").expect("found");
        assert!(task.in_sprint);

        let task = board
            .set_due_date(1, " 2025-02-14 ")
            .await
            .expect("due")
            .expect("found");
        assert_eq!(task.due_date.as_deref(), Some("2025-02-14"));

        let task = board.set_due_date(1, "").await.expect("due").expect("found");
        assert_eq!(task.due_date, None);
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let board = board_with("not json");
        let err = board.set_sprint(1, true).await.expect_err("load fails");
        assert!(matches!(err, OpError::Store(StoreError::Load(_))));
        assert!(!err.is_validation());
    }

    #[test]
    fn parses_id_lists() {
        assert_eq!(parse_id_list("3,1,2"), vec![3, 1, 2]);
        assert_eq!(parse_id_list(" 4 ,x,,5"), vec![4, 5]);
        assert!(parse_id_list("").is_empty());
        assert!(parse_id_list("+1,-2,1.5").is_empty());
    }
}
