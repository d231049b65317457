//! Domain and wire types.
//!
//! `Task` is what the chart works with; `ProductionOrder` is what the backend
//! stores. The adapter module converts between the two.

mod production_order;
mod task;

pub use production_order::{
    CreatedOrder, NewProductionOrder, ProductionOrder, ProductionOrderResponse,
};
pub use task::{Task, TaskId};
