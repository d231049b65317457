//! Wire shapes of the backend's production order resource.

use serde::{Deserialize, Serialize};

use super::TaskId;

/// A production order (or planning line) as exchanged with the backend.
///
/// Dates stay as ISO-8601 strings here and may be null or missing;
/// conversion happens in the adapter so that a malformed or absent value is
/// reported against its record instead of failing the whole envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub production_order_id: TaskId,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_title: Option<String>,
    /// Fallback title, only ever read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_description: Option<String>,
    /// Null or missing reads as no progress
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
}

/// Body of a create call: the id is assigned by the server and a freshly
/// inserted row carries no parent from this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductionOrder {
    pub start_date: String,
    pub end_date: String,
    pub order_title: String,
    pub progress: f64,
}

/// Envelope returned by a list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrderResponse {
    #[serde(default)]
    pub value: Vec<ProductionOrder>,
}

impl ProductionOrderResponse {
    pub fn single(order: ProductionOrder) -> Self {
        Self { value: vec![order] }
    }
}

/// Fields read back from a create call.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    pub production_order_id: TaskId,
}
