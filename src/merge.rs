//! Differential updates: apply only the fields an edit reports as changed.
//!
//! The widget reports edits as a sparse object (`{"title": "B"}`). That object
//! is parsed into a `TaskChanges` value over the closed `TaskField` set and
//! applied field by field onto the tracked task, in place.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::adapter::{format_instant, parse_instant};
use crate::error::{Result, SyncError};
use crate::model::{Task, TaskId};
use crate::store::TaskStore;

/// Fields an edit may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Start,
    End,
    Progress,
    ParentId,
}

impl TaskField {
    /// Key used by the widget for this field.
    pub fn widget_key(&self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Start => "start",
            TaskField::End => "end",
            TaskField::Progress => "progress",
            TaskField::ParentId => "parentId",
        }
    }

    fn from_widget_key(key: &str) -> Option<Self> {
        match key {
            "title" => Some(TaskField::Title),
            "start" => Some(TaskField::Start),
            "end" => Some(TaskField::End),
            "progress" => Some(TaskField::Progress),
            "parentId" => Some(TaskField::ParentId),
            _ => None,
        }
    }
}

/// One changed field with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskChange {
    Title(String),
    Start(DateTime<Utc>),
    End(DateTime<Utc>),
    Progress(f64),
    ParentId(Option<TaskId>),
}

impl TaskChange {
    pub fn field(&self) -> TaskField {
        match self {
            TaskChange::Title(_) => TaskField::Title,
            TaskChange::Start(_) => TaskField::Start,
            TaskChange::End(_) => TaskField::End,
            TaskChange::Progress(_) => TaskField::Progress,
            TaskChange::ParentId(_) => TaskField::ParentId,
        }
    }

    fn parse(field: TaskField, value: &Value) -> Result<Self> {
        let invalid = |message: String| SyncError::InvalidEdit {
            field: field.widget_key(),
            message,
        };

        match field {
            TaskField::Title => value
                .as_str()
                .map(|s| TaskChange::Title(s.to_string()))
                .ok_or_else(|| invalid(format!("expected a string, got {}", value))),
            TaskField::Start | TaskField::End => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| invalid(format!("expected a date string, got {}", value)))?;
                let instant = parse_instant(raw).map_err(invalid)?;
                Ok(if field == TaskField::Start {
                    TaskChange::Start(instant)
                } else {
                    TaskChange::End(instant)
                })
            }
            TaskField::Progress => value
                .as_f64()
                .map(TaskChange::Progress)
                .ok_or_else(|| invalid(format!("expected a number, got {}", value))),
            TaskField::ParentId => match value {
                Value::Null => Ok(TaskChange::ParentId(None)),
                other => serde_json::from_value::<TaskId>(other.clone())
                    .map(|id| TaskChange::ParentId(Some(id)))
                    .map_err(|e| invalid(e.to_string())),
            },
        }
    }

    fn apply(&self, task: &mut Task) {
        match self {
            TaskChange::Title(title) => task.title = title.clone(),
            TaskChange::Start(start) => task.start = *start,
            TaskChange::End(end) => task.end = *end,
            TaskChange::Progress(progress) => task.progress = *progress,
            TaskChange::ParentId(parent) => task.parent_id = parent.clone(),
        }
    }
}

/// A sparse set of changes, at most one per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    changes: Vec<TaskChange>,
}

impl TaskChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change, replacing any earlier change to the same field.
    pub fn set(&mut self, change: TaskChange) {
        self.changes.retain(|c| c.field() != change.field());
        self.changes.push(change);
    }

    pub fn with(mut self, change: TaskChange) -> Self {
        self.set(change);
        self
    }

    /// Parse the widget's `values` object. Unknown keys are ignored.
    pub fn from_widget_values(values: &Value) -> Result<Self> {
        let object = values.as_object().ok_or_else(|| SyncError::InvalidEdit {
            field: "values",
            message: format!("expected an object, got {}", values),
        })?;

        let mut changes = Self::new();
        for (key, value) in object {
            match TaskField::from_widget_key(key) {
                Some(field) => changes.set(TaskChange::parse(field, value)?),
                None => tracing::debug!("Ignoring unknown edit field '{}'", key),
            }
        }
        Ok(changes)
    }

    pub fn get(&self, field: TaskField) -> Option<&TaskChange> {
        self.changes.iter().find(|c| c.field() == field)
    }

    pub fn fields(&self) -> Vec<TaskField> {
        self.changes.iter().map(TaskChange::field).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Overwrite the fields present in this set, leaving the rest untouched.
    ///
    /// Nothing is written when the result would end before it starts.
    pub fn apply_to(&self, task: &mut Task) -> Result<()> {
        let start = match self.get(TaskField::Start) {
            Some(TaskChange::Start(s)) => *s,
            _ => task.start,
        };
        let end = match self.get(TaskField::End) {
            Some(TaskChange::End(e)) => *e,
            _ => task.end,
        };
        if start > end {
            return Err(SyncError::InvalidRange {
                start: format_instant(&start),
                end: format_instant(&end),
            });
        }

        for change in &self.changes {
            change.apply(task);
        }
        Ok(())
    }

    /// Build a fresh, unassigned task from the values of an insert event.
    ///
    /// `start` and `end` are required; the title defaults to empty and the
    /// progress to zero.
    pub fn into_new_task(&self) -> Result<Task> {
        let missing = |field: TaskField| SyncError::InvalidEdit {
            field: field.widget_key(),
            message: "required for a new task".to_string(),
        };
        let start = match self.get(TaskField::Start) {
            Some(TaskChange::Start(s)) => *s,
            _ => return Err(missing(TaskField::Start)),
        };
        let end = match self.get(TaskField::End) {
            Some(TaskChange::End(e)) => *e,
            _ => return Err(missing(TaskField::End)),
        };

        let mut task = Task::new(String::new(), start, end);
        self.apply_to(&mut task)?;
        Ok(task)
    }
}

/// Merge `changes` onto the tracked task with id `key`.
///
/// Returns `SyncError::NotFoundLocal` without touching the store when no
/// tracked task carries `key`.
pub fn apply_edit<'a>(
    store: &'a mut TaskStore,
    key: &TaskId,
    changes: &TaskChanges,
) -> Result<&'a Task> {
    let task = store
        .find_mut(key)
        .ok_or_else(|| SyncError::NotFoundLocal(key.clone()))?;
    changes.apply_to(task)?;
    Ok(task)
}
