//! Conversion between backend production orders and chart tasks.
//!
//! Every function here is pure: no I/O, no retained state, and each call
//! produces a fresh output value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{Result, SyncError};
use crate::model::{NewProductionOrder, ProductionOrder, ProductionOrderResponse, Task, TaskId};

/// Title used when a record carries neither an order title nor an origin.
pub const FALLBACK_TITLE: &str = "No Title Detected";

/// Endpoint substring selecting the planning key convention.
const PLANNING_MARKER: &str = "planning";

/// The two key conventions sharing one endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceKind {
    #[default]
    Production,
    Planning,
}

impl ResourceKind {
    /// Classify an endpoint by its URL.
    pub fn from_endpoint(endpoint: &str) -> Self {
        if endpoint.contains(PLANNING_MARKER) {
            ResourceKind::Planning
        } else {
            ResourceKind::Production
        }
    }

    /// Name of the key column used in update URLs.
    pub fn key_field(&self) -> &'static str {
        match self {
            ResourceKind::Production => "production_order_id",
            ResourceKind::Planning => "planning_id",
        }
    }

    /// Build `<base>(<key_field>=<id>)`.
    pub fn update_url(&self, base: &str, id: &TaskId) -> String {
        format!("{}({}={})", base, self.key_field(), id)
    }
}

/// Parse an instant as sent by the backend or the widget.
///
/// Accepts RFC 3339, naive date-times (taken as UTC) and bare dates
/// (midnight UTC).
pub fn parse_instant(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("'{}' is not an ISO-8601 date", raw))
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Pick the display title: order title, then origin description, then the
/// fallback literal. Empty strings count as absent.
pub fn derive_title(order: &ProductionOrder) -> String {
    [&order.order_title, &order.origin_description]
        .into_iter()
        .flatten()
        .find(|title| !title.is_empty())
        .cloned()
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

/// Convert a single record.
pub fn to_task(order: &ProductionOrder) -> Result<Task> {
    let parse = |field: &'static str, raw: Option<&str>| -> Result<DateTime<Utc>> {
        let raw = raw.ok_or_else(|| SyncError::Parse {
            record: order.production_order_id.to_string(),
            field,
            message: "value is missing".to_string(),
        })?;
        parse_instant(raw).map_err(|message| SyncError::Parse {
            record: order.production_order_id.to_string(),
            field,
            message,
        })
    };

    Ok(Task {
        id: Some(order.production_order_id.clone()),
        title: derive_title(order),
        start: parse("start_date", order.start_date.as_deref())?,
        end: parse("end_date", order.end_date.as_deref())?,
        progress: order.progress.unwrap_or(0.0),
        parent_id: order.parent_id.clone(),
    })
}

/// Convert a list response, preserving record order.
///
/// Stops at the first record that fails to convert.
pub fn to_tasks(response: &ProductionOrderResponse) -> Result<Vec<Task>> {
    response.value.iter().map(to_task).collect()
}

/// Full payload for an update call.
pub fn to_update_payload(task: &Task) -> Result<ProductionOrder> {
    let id = task
        .id
        .clone()
        .ok_or_else(|| SyncError::UnassignedId(task.title.clone()))?;

    Ok(ProductionOrder {
        production_order_id: id,
        start_date: Some(format_instant(&task.start)),
        end_date: Some(format_instant(&task.end)),
        order_title: Some(task.title.clone()),
        origin_description: None,
        progress: Some(task.progress),
        parent_id: task.parent_id.clone(),
    })
}

/// Payload for a create call; carries neither id nor parent.
pub fn to_create_payload(task: &Task) -> NewProductionOrder {
    NewProductionOrder {
        start_date: format_instant(&task.start),
        end_date: format_instant(&task.end),
        order_title: task.title.clone(),
        progress: task.progress,
    }
}

/// Update URL for `task`, with the key convention picked from `base_url`.
pub fn resolve_update_url(base_url: &str, task: &Task) -> Result<String> {
    let id = task
        .id
        .as_ref()
        .ok_or_else(|| SyncError::UnassignedId(task.title.clone()))?;
    Ok(ResourceKind::from_endpoint(base_url).update_url(base_url, id))
}
