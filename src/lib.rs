//! # gantt-sync
//!
//! Synchronization layer between an embedded Gantt chart and a remote
//! production order resource.
//!
//! This library provides:
//! - Discovery of the REST endpoint and locale from the embedding page's markup
//! - Conversion between backend production orders and chart tasks
//! - Differential merging of widget edits onto tracked tasks
//! - A typed HTTP client for list, create, update and delete
//!
//! ## Architecture
//!
//! ```text
//!   host page ──► HostContext ──┬──► Localizer (locale switch)
//!                               │
//!                               ▼
//!   widget events ──► GanttSession ──► merge ──► TaskStore
//!                               │
//!                               ▼
//!                     adapter ◄──► ProductionOrderClient ──► backend
//! ```
//!
//! ## Modules
//! - `host_context`: endpoint/locale discovery
//! - `adapter`: task ⇄ production order conversion
//! - `merge`: sparse field updates
//! - `client`: HTTP resource client
//! - `session`: event handling over the owned task collection

pub mod adapter;
pub mod client;
pub mod config;
pub mod deferred;
pub mod error;
pub mod host_context;
pub mod localization;
pub mod merge;
pub mod model;
pub mod session;
pub mod store;

pub use client::{ProductionOrderApi, ProductionOrderClient};
pub use config::Config;
pub use error::SyncError;
pub use host_context::HostContext;
pub use model::{ProductionOrder, ProductionOrderResponse, Task, TaskId};
pub use session::{GanttSession, SessionEvent};
