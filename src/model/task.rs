//! UI-facing task entity shown by the Gantt widget.
//!
//! # Invariants
//! - `start <= end`
//! - `id` is `None` only for a placeholder whose create call has not returned

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Opaque record identifier, assigned by the backend.
///
/// The backend may hand out numeric or textual keys, and the widget echoes
/// them back in whatever form it received. Two ids are equal when their
/// textual forms are equal, so `5` and `"5"` address the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl PartialEq for TaskId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TaskId::Number(a), TaskId::Number(b)) => a == b,
            (TaskId::Text(a), TaskId::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for TaskId {}

impl Hash for TaskId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        TaskId::Number(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId::Text(value.to_string())
    }
}

/// A schedulable row in the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned identifier (`None` until the create call returns)
    pub id: Option<TaskId>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Completion, copied verbatim from the backend
    pub progress: f64,
    /// Parent row in the hierarchy, if any
    pub parent_id: Option<TaskId>,
}

impl Task {
    /// Create an unassigned task with no parent and zero progress.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: title.into(),
            start,
            end,
            progress: 0.0,
            parent_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Check whether this task carries the given identifier.
    pub fn has_id(&self, id: &TaskId) -> bool {
        self.id.as_ref() == Some(id)
    }
}
