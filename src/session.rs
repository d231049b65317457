//! UI-facing session: owns the task collection and reacts to widget events.
//!
//! # Flow
//! ```text
//! HostContext ──► start(): apply locale ──► reload(): list ──► TaskStore
//!
//! widget edit ──► on_task_updated ──► merge in place ──► PATCH (Deferred)
//! widget add  ──► on_task_inserted ──► placeholder ──► POST ──► id written back
//!                                                         └──► TaskDetailsRequested
//! widget del  ──► on_task_deleted ──► DELETE ──► entry dropped on success
//! ```
//!
//! Store mutations happen between suspension points only; the lock is never
//! held across a request.

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::adapter;
use crate::client::ProductionOrderApi;
use crate::deferred::Deferred;
use crate::error::{Result, SyncError};
use crate::host_context::HostContext;
use crate::localization::Localizer;
use crate::merge::{self, TaskChanges};
use crate::model::{Task, TaskId};
use crate::store::TaskStore;

/// Observable outcomes the widget (or a log) may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A list reload replaced the collection.
    TasksLoaded { count: usize },
    /// A listed record could not be converted and was left out.
    RecordRejected { record: TaskId, reason: String },
    /// An edit named a key that is not tracked; nothing was sent.
    UnmatchedEdit { key: TaskId },
    /// A created task now has its id and its detail view may open.
    TaskDetailsRequested { id: TaskId },
    /// A delete succeeded and the task left the collection.
    TaskRemoved { id: TaskId },
}

/// How `reload` treats records that fail conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Skip the record and report it.
    #[default]
    Lenient,
    /// Abort the reload and keep the previous collection.
    Strict,
}

pub struct GanttSession<L: Localizer> {
    context: HostContext,
    api: Arc<dyn ProductionOrderApi>,
    tasks: Arc<RwLock<TaskStore>>,
    localizer: L,
    policy: LoadPolicy,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<L: Localizer> GanttSession<L> {
    pub fn new(
        context: HostContext,
        api: Arc<dyn ProductionOrderApi>,
        localizer: L,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            context,
            api,
            tasks: Arc::new(RwLock::new(TaskStore::new())),
            localizer,
            policy: LoadPolicy::default(),
            events,
        };
        (session, rx)
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn localizer(&self) -> &L {
        &self.localizer
    }

    /// Apply the resolved locale, then load the task list.
    pub async fn start(&mut self) -> Result<usize> {
        if let Some(locale) = self.context.locale.as_deref() {
            self.localizer.apply_locale(locale);
        }
        self.reload().await
    }

    /// Replace the collection with the backend's current list.
    pub async fn reload(&self) -> Result<usize> {
        let response = self.api.list_orders().await?;

        let mut loaded = Vec::with_capacity(response.value.len());
        for order in &response.value {
            match adapter::to_task(order) {
                Ok(task) => loaded.push(task),
                Err(e) if self.policy == LoadPolicy::Lenient => {
                    tracing::warn!("Skipping production order: {}", e);
                    self.emit(SessionEvent::RecordRejected {
                        record: order.production_order_id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let count = loaded.len();
        self.tasks.write().await.replace_all(loaded);
        tracing::info!("Loaded {} tasks", count);
        self.emit(SessionEvent::TasksLoaded { count });
        Ok(count)
    }

    /// Merge an edit onto the tracked task and persist it.
    ///
    /// Returns `Ok(None)` for an unknown key: the edit is dropped, reported
    /// as `SessionEvent::UnmatchedEdit`, and no request is issued. The local
    /// change is kept even if the request later fails.
    pub async fn on_task_updated(
        &self,
        key: &TaskId,
        changes: &TaskChanges,
    ) -> Result<Option<Deferred<()>>> {
        let payload = {
            let mut store = self.tasks.write().await;
            match merge::apply_edit(&mut store, key, changes) {
                Ok(task) => adapter::to_update_payload(task)?,
                Err(SyncError::NotFoundLocal(key)) => {
                    tracing::warn!("Dropping edit for untracked task {}", key);
                    self.emit(SessionEvent::UnmatchedEdit { key });
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        };

        let api = self.api.clone();
        Ok(Some(Deferred::spawn(async move {
            let result = api.update_order(&payload).await;
            if let Err(ref e) = result {
                tracing::warn!(
                    "Update of task {} failed, local copy kept: {}",
                    payload.production_order_id,
                    e
                );
            }
            result
        })))
    }

    /// Append a placeholder built from `values` and create it remotely.
    ///
    /// The returned id is written onto the placeholder inside the request's
    /// continuation, and only then is `TaskDetailsRequested` emitted.
    pub async fn on_task_inserted(&self, values: &TaskChanges) -> Result<Deferred<TaskId>> {
        let task = values.into_new_task()?;
        let payload = adapter::to_create_payload(&task);
        let local = self.tasks.write().await.insert(task);

        let api = self.api.clone();
        let tasks = self.tasks.clone();
        let events = self.events.clone();
        Ok(Deferred::spawn(async move {
            let id = api.create_order(&payload).await?;
            if !tasks.write().await.assign_id(local, id.clone()) {
                tracing::warn!(
                    "Placeholder {} was dropped locally before its id {} arrived",
                    local,
                    id
                );
                return Ok(id);
            }
            let _ = events.send(SessionEvent::TaskDetailsRequested { id: id.clone() });
            Ok(id)
        }))
    }

    /// Delete remotely; the entry leaves the collection once that succeeds.
    pub fn on_task_deleted(&self, key: TaskId) -> Deferred<()> {
        let api = self.api.clone();
        let tasks = self.tasks.clone();
        let events = self.events.clone();
        Deferred::spawn(async move {
            api.delete_order(&key).await?;
            if tasks.write().await.remove(&key).is_some() {
                let _ = events.send(SessionEvent::TaskRemoved { id: key });
            }
            Ok(())
        })
    }

    /// Current tasks in display order.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.snapshot()
    }

    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.find(id).cloned()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::MessageCatalog;
    use crate::merge::TaskChange;
    use crate::model::{NewProductionOrder, ProductionOrder, ProductionOrderResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List,
        Create(NewProductionOrder),
        Update(ProductionOrder),
        Delete(TaskId),
    }

    #[derive(Default)]
    struct RecordingApi {
        orders: Vec<ProductionOrder>,
        calls: Mutex<Vec<Call>>,
        next_id: i64,
        fail_remote: bool,
        /// Holds create calls until notified
        gate: Option<Arc<Notify>>,
    }

    impl RecordingApi {
        fn with_orders(orders: Vec<ProductionOrder>) -> Self {
            Self {
                orders,
                next_id: 100,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn failure(&self) -> Result<()> {
            if self.fail_remote {
                Err(SyncError::Remote {
                    status: 500,
                    body: "down".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ProductionOrderApi for RecordingApi {
        async fn list_orders(&self) -> Result<ProductionOrderResponse> {
            self.calls.lock().unwrap().push(Call::List);
            Ok(ProductionOrderResponse {
                value: self.orders.clone(),
            })
        }

        async fn create_order(&self, order: &NewProductionOrder) -> Result<TaskId> {
            self.calls.lock().unwrap().push(Call::Create(order.clone()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.failure()?;
            Ok(TaskId::Number(self.next_id))
        }

        async fn update_order(&self, order: &ProductionOrder) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Update(order.clone()));
            self.failure()
        }

        async fn delete_order(&self, id: &TaskId) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete(id.clone()));
            self.failure()
        }
    }

    fn order(id: i64, title: &str) -> ProductionOrder {
        ProductionOrder {
            production_order_id: TaskId::Number(id),
            start_date: Some("2024-07-01T08:00:00Z".to_string()),
            end_date: Some("2024-07-03T08:00:00Z".to_string()),
            order_title: Some(title.to_string()),
            origin_description: None,
            progress: Some(0.2),
            parent_id: None,
        }
    }

    fn new_session(
        api: Arc<RecordingApi>,
        locale: Option<&str>,
    ) -> (GanttSession<MessageCatalog>, mpsc::UnboundedReceiver<SessionEvent>) {
        let context = HostContext::from_parts(
            Some("https://erp.local/api/production_order".to_string()),
            locale.map(str::to_string),
            None,
        );
        GanttSession::new(context, api, MessageCatalog::new())
    }

    #[tokio::test]
    async fn test_start_applies_locale_and_loads() {
        let api = Arc::new(RecordingApi::with_orders(vec![order(1, "A"), order(2, "B")]));
        let (mut session, mut events) = new_session(api.clone(), Some("de"));

        assert_eq!(session.start().await.unwrap(), 2);
        assert_eq!(session.localizer().active_locale(), "de");
        assert_eq!(session.tasks().await[1].title, "B");
        assert_eq!(events.recv().await, Some(SessionEvent::TasksLoaded { count: 2 }));
        assert_eq!(api.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn test_bad_record_policy() {
        let mut bad = order(3, "bad");
        bad.start_date = Some("soon".to_string());
        let api = Arc::new(RecordingApi::with_orders(vec![order(1, "A"), bad]));

        let (lenient, mut events) = new_session(api.clone(), None);
        assert_eq!(lenient.reload().await.unwrap(), 1);
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::RecordRejected { record: TaskId::Number(3), .. })
        ));

        let (strict, _events) = new_session(api, None);
        let strict = strict.with_policy(LoadPolicy::Strict);
        assert!(matches!(strict.reload().await, Err(SyncError::Parse { .. })));
        assert!(strict.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_merged_full_record() {
        let api = Arc::new(RecordingApi::with_orders(vec![order(1, "A")]));
        let (session, _events) = new_session(api.clone(), None);
        session.reload().await.unwrap();

        let changes = TaskChanges::from_widget_values(&json!({ "title": "B" })).unwrap();
        let pending = session
            .on_task_updated(&TaskId::Number(1), &changes)
            .await
            .unwrap()
            .expect("tracked task");
        pending.await.unwrap();

        let task = session.task(&TaskId::Number(1)).await.unwrap();
        assert_eq!(task.title, "B");
        assert_eq!(task.progress, 0.2);

        match api.calls().last() {
            Some(Call::Update(sent)) => {
                assert_eq!(sent.order_title.as_deref(), Some("B"));
                assert_eq!(sent.progress, Some(0.2));
                assert_eq!(sent.production_order_id, TaskId::Number(1));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_key_issues_no_request() {
        let api = Arc::new(RecordingApi::with_orders(vec![order(1, "A")]));
        let (session, mut events) = new_session(api.clone(), None);
        session.reload().await.unwrap();
        let _ = events.recv().await;

        let changes = TaskChanges::new().with(TaskChange::Title("B".to_string()));
        let pending = session
            .on_task_updated(&TaskId::Number(999), &changes)
            .await
            .unwrap();

        assert!(pending.is_none());
        assert_eq!(api.calls(), vec![Call::List]);
        assert_eq!(session.tasks().await[0].title, "A");
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::UnmatchedEdit { key: TaskId::Number(999) })
        );
    }

    #[tokio::test]
    async fn test_failed_update_keeps_local_change() {
        let api = Arc::new(RecordingApi {
            fail_remote: true,
            ..RecordingApi::with_orders(vec![order(1, "A")])
        });
        let (session, _events) = new_session(api, None);
        session.reload().await.unwrap();

        let changes = TaskChanges::new().with(TaskChange::Progress(0.8));
        let result = session
            .on_task_updated(&TaskId::Number(1), &changes)
            .await
            .unwrap()
            .unwrap()
            .await;

        assert!(matches!(result, Err(SyncError::Remote { status: 500, .. })));
        assert_eq!(session.tasks().await[0].progress, 0.8);
    }

    #[tokio::test]
    async fn test_insert_assigns_id_before_details() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(RecordingApi {
            gate: Some(gate.clone()),
            ..RecordingApi::with_orders(vec![order(1, "A")])
        });
        let (session, mut events) = new_session(api.clone(), None);
        session.reload().await.unwrap();
        let _ = events.recv().await;

        let values = TaskChanges::from_widget_values(&json!({
            "title": "New",
            "start": "2024-07-05T08:00:00Z",
            "end": "2024-07-06T08:00:00Z",
            "parentId": 1
        }))
        .unwrap();
        let pending = session.on_task_inserted(&values).await.unwrap();

        // Still in flight: the placeholder exists without an id.
        let tasks = session.tasks().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].id, None);
        assert!(events.try_recv().is_err());

        gate.notify_one();
        assert_eq!(pending.await.unwrap(), TaskId::Number(100));
        assert_eq!(session.tasks().await[1].id, Some(TaskId::Number(100)));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::TaskDetailsRequested { id: TaskId::Number(100) })
        );

        match &api.calls()[1] {
            Call::Create(body) => {
                let json = serde_json::to_value(body).unwrap();
                assert!(json.get("parent_id").is_none());
                assert_eq!(json["order_title"], "New");
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_drops_entry_only_on_success() {
        let api = Arc::new(RecordingApi::with_orders(vec![order(1, "A"), order(2, "B")]));
        let (session, _events) = new_session(api.clone(), None);
        session.reload().await.unwrap();

        session.on_task_deleted(TaskId::Number(1)).await.unwrap();
        assert_eq!(session.tasks().await.len(), 1);
        assert_eq!(api.calls().last(), Some(&Call::Delete(TaskId::Number(1))));

        let failing = Arc::new(RecordingApi {
            fail_remote: true,
            ..RecordingApi::with_orders(vec![order(1, "A")])
        });
        let (session, _events) = new_session(failing, None);
        session.reload().await.unwrap();
        assert!(session.on_task_deleted(TaskId::Number(1)).await.is_err());
        assert_eq!(session.tasks().await.len(), 1);
    }
}
