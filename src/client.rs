//! HTTP client for the production order resource.
//!
//! Four single-shot calls against the endpoint resolved from the host page:
//! list, create, update and delete. No retries and no timeout override;
//! authentication rides on whatever the default client sends.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::adapter::ResourceKind;
use crate::error::{Result, SyncError};
use crate::host_context::HostContext;
use crate::model::{
    CreatedOrder, NewProductionOrder, ProductionOrder, ProductionOrderResponse, TaskId,
};

/// Operations on the remote resource.
#[async_trait]
pub trait ProductionOrderApi: Send + Sync {
    /// `GET <endpoint>`
    async fn list_orders(&self) -> Result<ProductionOrderResponse>;

    /// `POST <endpoint>`; returns the server-assigned id.
    async fn create_order(&self, order: &NewProductionOrder) -> Result<TaskId>;

    /// `PATCH <endpoint>(<key>=<id>)` with the full record.
    async fn update_order(&self, order: &ProductionOrder) -> Result<()>;

    /// `DELETE <endpoint>/<id>`
    async fn delete_order(&self, id: &TaskId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ProductionOrderClient {
    client: Client,
    endpoint: Option<String>,
    kind: ResourceKind,
}

impl ProductionOrderClient {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint.filter(|e| !e.is_empty());
        let kind = endpoint
            .as_deref()
            .map(ResourceKind::from_endpoint)
            .unwrap_or_default();
        Self {
            client: Client::new(),
            endpoint,
            kind,
        }
    }

    /// Build a client for the endpoint and key convention found on the page.
    pub fn from_context(context: &HostContext) -> Self {
        Self {
            client: Client::new(),
            endpoint: context.endpoint.clone().filter(|e| !e.is_empty()),
            kind: context.resource_kind,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn resource_kind(&self) -> ResourceKind {
        self.kind
    }

    fn base(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or(SyncError::Configuration)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("{} answered HTTP {}: {}", url, status, body);
            return Err(SyncError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
        let body = response.text().await.map_err(|source| SyncError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| SyncError::InvalidResponse {
            url: url.to_string(),
            message: format!("{}, body: {}", e, body),
        })
    }
}

#[async_trait]
impl ProductionOrderApi for ProductionOrderClient {
    async fn list_orders(&self) -> Result<ProductionOrderResponse> {
        let url = self.base()?;
        tracing::debug!("GET {}", url);
        let response = self.send(url, self.request(Method::GET, url)).await?;
        let orders: ProductionOrderResponse = Self::read_json(url, response).await?;
        tracing::info!("Fetched {} production orders", orders.value.len());
        Ok(orders)
    }

    async fn create_order(&self, order: &NewProductionOrder) -> Result<TaskId> {
        let url = self.base()?;
        tracing::debug!("POST {}", url);
        let response = self.send(url, self.request(Method::POST, url).json(order)).await?;
        let created: CreatedOrder = Self::read_json(url, response).await?;
        tracing::info!("Created production order {}", created.production_order_id);
        Ok(created.production_order_id)
    }

    async fn update_order(&self, order: &ProductionOrder) -> Result<()> {
        let url = self
            .kind
            .update_url(self.base()?, &order.production_order_id);
        tracing::debug!("PATCH {}", url);
        self.send(&url, self.request(Method::PATCH, &url).json(order)).await?;
        Ok(())
    }

    async fn delete_order(&self, id: &TaskId) -> Result<()> {
        let url = format!("{}/{}", self.base()?, id);
        tracing::debug!("DELETE {}", url);
        self.send(&url, self.request(Method::DELETE, &url)).await?;
        tracing::info!("Deleted production order {}", id);
        Ok(())
    }
}
