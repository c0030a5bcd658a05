use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Task status lifecycle. Each status is one board column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Strict parse of the stored/wire spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(TaskStatus::Todo),
            "in progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
        }
    }

    /// Column position on the board.
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    /// Lenient form used for user input on create: anything unknown is `Todo`.
    pub fn normalize(value: &str) -> Self {
        Self::parse(value.trim()).unwrap_or_default()
    }
}

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Coding,
    Debugging,
    Learning,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Coding
    }
}

impl TaskType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "coding" => Some(TaskType::Coding),
            "debugging" => Some(TaskType::Debugging),
            "learning" => Some(TaskType::Learning),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Coding => "coding",
            TaskType::Debugging => "debugging",
            TaskType::Learning => "learning",
        }
    }

    /// Unknown or missing types fall back to `Coding`.
    pub fn normalize(value: &str) -> Self {
        Self::parse(value.trim()).unwrap_or_default()
    }
}

/// Checklist item embedded in its parent task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: i64,
    pub title: String,
    pub done: bool,
}

/// Task entity as persisted and as handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub context: String,
    pub code_link: String,
    pub code_snippet: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub subtasks: Vec<Subtask>,
    pub due_date: Option<String>,
    pub order: i64,
    pub blocked: bool,
    pub blocking_reason: String,
    pub in_sprint: bool,
}

impl Task {
    /// Next subtask id within this task: one past the highest, or 0 when empty.
    /// `None` once the id space is used up.
    pub fn next_subtask_id(&self) -> Option<i64> {
        next_after(self.subtasks.iter().map(|s| s.id).max(), 0)
    }

    /// `(done, total)` subtask counts.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.done).count();
        (done, self.subtasks.len())
    }

    /// Rounded share of finished subtasks, 0 when there are none.
    pub fn subtask_percent(&self) -> u8 {
        let (done, total) = self.subtask_progress();
        if total == 0 {
            return 0;
        }
        ((100 * done) as f64 / total as f64).round() as u8
    }
}

/// Errors that make a persisted collection untrustworthy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// A record has no usable integer id.
    #[error("task record at index {index} has no integer id")]
    MissingId { index: usize },
    /// The document is not an array of task objects.
    #[error("malformed task file: {reason}")]
    Malformed { reason: String },
}

/// A task record exactly as found on disk. Every field is optional and loosely
/// typed; `normalize` turns it into a `Task`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawTask {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub context: Option<Value>,
    pub code_link: Option<Value>,
    /// Legacy name of `code_link`.
    pub link: Option<Value>,
    pub code_snippet: Option<Value>,
    pub task_type: Option<Value>,
    pub status: Option<Value>,
    /// Legacy completion flag that predates `status`.
    pub done: Option<Value>,
    pub subtasks: Option<Value>,
    pub due_date: Option<Value>,
    pub order: Option<Value>,
    pub blocked: Option<Value>,
    pub blocking_reason: Option<Value>,
    pub in_sprint: Option<Value>,
}

/// Coerce one raw record into a `Task`. `index` is only used for error reporting.
pub fn normalize(raw: RawTask, index: usize) -> Result<Task, LoadError> {
    let id = raw
        .id
        .as_ref()
        .and_then(integer_value)
        .ok_or(LoadError::MissingId { index })?;

    let status = match raw.status.as_ref().and_then(Value::as_str).and_then(TaskStatus::parse) {
        Some(status) => status,
        None if raw.done == Some(Value::Bool(true)) => TaskStatus::Done,
        None => TaskStatus::Todo,
    };

    let task_type = raw
        .task_type
        .as_ref()
        .and_then(Value::as_str)
        .and_then(TaskType::parse)
        .unwrap_or_default();

    let order = raw.order.as_ref().and_then(integer_value).unwrap_or(id);

    let code_link = [raw.code_link.as_ref(), raw.link.as_ref()]
        .into_iter()
        .map(string_value)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .trim()
        .to_string();

    let due_date = raw
        .due_date
        .as_ref()
        .and_then(Value::as_str)
        .and_then(normalize_due_date);

    Ok(Task {
        id,
        title: string_value(raw.title.as_ref()),
        description: string_value(raw.description.as_ref()),
        context: string_value(raw.context.as_ref()),
        code_link,
        code_snippet: string_value(raw.code_snippet.as_ref()).trim().to_string(),
        task_type,
        status,
        subtasks: normalize_subtasks(id, raw.subtasks.as_ref()),
        due_date,
        order,
        blocked: raw.blocked.as_ref().is_some_and(truthy),
        blocking_reason: string_value(raw.blocking_reason.as_ref())
            .trim()
            .to_string(),
        in_sprint: raw.in_sprint.as_ref().is_some_and(truthy),
    })
}

/// Decode a whole persisted document. Empty input is an empty collection.
///
/// Duplicate task ids are not rejected here; uniqueness is maintained by
/// id assignment on create, and lookups act on the first match.
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, LoadError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let raw: Vec<RawTask> = serde_json::from_slice(bytes).map_err(|e| LoadError::Malformed {
        reason: e.to_string(),
    })?;
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| normalize(record, index))
        .collect()
}

/// Encode a collection as indented, human-readable JSON.
pub fn encode_tasks(tasks: &[Task]) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(tasks)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// One past `max`, or `empty` when there is nothing to follow.
/// `None` when `max` is already `i64::MAX`.
pub fn next_after(max: Option<i64>, empty: i64) -> Option<i64> {
    match max {
        Some(max) => max.checked_add(1),
        None => Some(empty),
    }
}

/// Load rule: keep a stored due date only if it is exactly a real
/// `YYYY-MM-DD` calendar date. Surrounding whitespace disqualifies it.
pub fn normalize_due_date(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|_| value.to_string())
}

/// Input rule for user-supplied dates: trimmed, then held to the load rule.
/// Blank or malformed input means "no due date".
pub fn parse_due_date_input(value: &str) -> Option<String> {
    normalize_due_date(value.trim())
}

/// Empty links and non-URL paths are always accepted; http(s) URLs must be
/// longer than the bare scheme and contain no whitespace.
pub fn is_valid_code_link(value: &str) -> bool {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        return !value.chars().any(char::is_whitespace) && value.len() > 10;
    }
    true
}

/// Trimmed link, or empty when it is an unusable URL.
pub fn sanitize_code_link(value: &str) -> String {
    let value = value.trim();
    if is_valid_code_link(value) {
        value.to_string()
    } else {
        String::new()
    }
}

fn normalize_subtasks(task_id: i64, raw: Option<&Value>) -> Vec<Subtask> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let title = obj.get("title")?;
            let id = obj.get("id").and_then(integer_value);
            if id.is_none() {
                debug!(task_id, "dropping subtask without usable id");
            }
            Some(Subtask {
                id: id?,
                title: string_value(Some(title)),
                done: obj.get("done").is_some_and(truthy),
            })
        })
        .collect()
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn string_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
