//! Maps operation results to the two response shapes a caller can ask for:
//! a page reload (redirect back to the board) or a JSON document.

use serde::Serialize;
use serde_json::{json, Value};

use crate::{error::OpError, tasks::Task};

pub const BOARD_LOCATION: &str = "/";

/// How the caller wants to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Plain form submission expecting a reload.
    #[default]
    Page,
    /// Script-driven request expecting JSON.
    Json,
}

impl ResponseMode {
    /// Json when the request is marked as XHR or accepts `application/json`.
    pub fn from_headers(requested_with: Option<&str>, accept: Option<&str>) -> Self {
        let xhr = requested_with == Some("XMLHttpRequest");
        let wants_json = accept.is_some_and(|a| a.contains("application/json"));
        if xhr || wants_json {
            ResponseMode::Json
        } else {
            ResponseMode::Page
        }
    }
}

/// What an operation produced, independent of presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report beyond success; the board should be reloaded.
    Redirect,
    /// Plain acknowledgment.
    Ack,
    /// Acknowledgment carrying the new sprint flag.
    Sprint { in_sprint: bool },
    /// The affected task after the mutation, if it exists.
    Task(Option<Task>),
    /// A read of one task; absence is reported as not found.
    Lookup(Option<Task>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Redirect { location: String },
    Json(Value),
}

/// Rendered response: an HTTP-style status code plus body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub status: u16,
    pub body: ReplyBody,
}

impl Reply {
    pub fn redirect(status: u16) -> Self {
        Self {
            status,
            body: ReplyBody::Redirect {
                location: BOARD_LOCATION.to_string(),
            },
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(body),
        }
    }

    pub fn from_result(result: Result<Outcome, OpError>, mode: ResponseMode) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome, mode),
            Err(err) => Self::from_error(&err, mode),
        }
    }

    pub fn from_outcome(outcome: Outcome, mode: ResponseMode) -> Self {
        match (outcome, mode) {
            (Outcome::Lookup(Some(task)), _) => Self::json(200, task_value(&task)),
            (Outcome::Lookup(None), _) => Self::json(404, json!({ "error": "Not found" })),
            (Outcome::Redirect, _) | (_, ResponseMode::Page) => Self::redirect(303),
            (Outcome::Ack, ResponseMode::Json) | (Outcome::Task(None), ResponseMode::Json) => {
                Self::json(200, json!({ "ok": true }))
            }
            (Outcome::Sprint { in_sprint }, ResponseMode::Json) => {
                Self::json(200, json!({ "ok": true, "in_sprint": in_sprint }))
            }
            (Outcome::Task(Some(task)), ResponseMode::Json) => Self::json(200, task_value(&task)),
        }
    }

    pub fn from_error(err: &OpError, mode: ResponseMode) -> Self {
        if !err.is_validation() {
            return Self::json(500, json!({ "error": err.to_string() }));
        }
        match mode {
            ResponseMode::Page => Self::redirect(400),
            ResponseMode::Json => Self::json(400, json!({ "error": err.to_string() })),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

fn task_value(task: &Task) -> Value {
    serde_json::to_value(task).unwrap_or_else(|err| json!({ "error": err.to_string() }))
}
