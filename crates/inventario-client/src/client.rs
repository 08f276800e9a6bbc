use std::sync::Arc;

use inventario_types::{Asset, AssetFields, FilterOptions, InventoryItem, InventoryQuery, Notice, Session};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::{ApiConfig, INVENTORY_ENDPOINT, item_endpoint};
use crate::demo::{DEMO_WARNING, demo_inventory, demo_page};
use crate::dispatcher::{Dispatcher, ReqwestTransport, Transport};
use crate::error::ClientError;
use crate::response::{handle_optional, handle_response};

/// Client for the `/inventario` REST resource.
#[derive(Clone)]
pub struct InventoryClient {
    config: ApiConfig,
    dispatcher: Dispatcher,
}

/// One page of the dashboard table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub items: Vec<InventoryItem>,
    pub total: usize,
    pub demo_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Listing {
    pub fn notice(&self) -> Option<Notice> {
        self.demo_mode.then(|| {
            Notice::info(
                "Modo Demostración",
                "La API no está disponible. Mostrando datos de ejemplo.",
            )
        })
    }
}

/// Outcome of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub success: bool,
    pub count: usize,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn provided_but_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| v.trim().is_empty())
}

pub fn validate_create(fields: &AssetFields) -> Result<(), ClientError> {
    if blank(&fields.name) {
        return Err(ClientError::Validation("El nombre del activo es requerido".into()));
    }
    if blank(&fields.asset_type) {
        return Err(ClientError::Validation("El tipo de activo es requerido".into()));
    }
    if blank(&fields.owner) {
        return Err(ClientError::Validation("El dueño del activo es requerido".into()));
    }
    Ok(())
}

pub fn validate_update(fields: &AssetFields) -> Result<(), ClientError> {
    if provided_but_blank(&fields.name) {
        return Err(ClientError::Validation("El nombre del activo no puede estar vacío".into()));
    }
    if provided_but_blank(&fields.asset_type) {
        return Err(ClientError::Validation("El tipo de activo no puede estar vacío".into()));
    }
    if provided_but_blank(&fields.owner) {
        return Err(ClientError::Validation("El dueño del activo no puede estar vacío".into()));
    }
    Ok(())
}

pub fn validate_delete(id: i64) -> Result<(), ClientError> {
    if id <= 0 {
        return Err(ClientError::Validation("ID de activo inválido".into()));
    }
    Ok(())
}

impl InventoryClient {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        let dispatcher = Dispatcher::new(transport, config.mode());
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET /inventario/?skip=&limit=`
    pub async fn list(&self, query: InventoryQuery) -> Result<Vec<Asset>, ClientError> {
        let params = [("skip", query.skip.to_string()), ("limit", query.limit.to_string())];
        let url = self.config.build_url(INVENTORY_ENDPOINT, &params)?;
        let resp = self.dispatcher.fetch(url, self.config.list_timeout()).await?;
        let assets: Vec<Asset> = handle_response(resp)?;
        info!(skip = query.skip, limit = query.limit, count = assets.len(), "inventory listed");
        Ok(assets)
    }

    /// Every asset the backend will return in one page.
    pub async fn list_all(&self) -> Result<Vec<Asset>, ClientError> {
        self.list(InventoryQuery::all()).await
    }

    pub async fn get(&self, id: i64) -> Result<Asset, ClientError> {
        let url = self.config.build_url(&item_endpoint(id), &[])?;
        let resp = self.dispatcher.fetch(url, self.config.item_timeout()).await?;
        handle_response(resp)
    }

    pub async fn create(&self, fields: &AssetFields) -> Result<Asset, ClientError> {
        let url = self.config.build_url(INVENTORY_ENDPOINT, &[])?;
        let body = serde_json::to_value(fields)?;
        let resp = self
            .dispatcher
            .send_once(Method::POST, url, Some(body), self.config.item_timeout())
            .await?;
        let asset: Asset = handle_response(resp)?;
        info!(id = asset.id, "asset created");
        Ok(asset)
    }

    pub async fn create_validated(&self, fields: &AssetFields) -> Result<Asset, ClientError> {
        validate_create(fields)?;
        self.create(fields).await
    }

    /// `PUT /inventario/{id}` with only the fields that are set.
    pub async fn update(&self, id: i64, fields: &AssetFields) -> Result<Asset, ClientError> {
        let url = self.config.build_url(&item_endpoint(id), &[])?;
        let body = serde_json::to_value(fields)?;
        let resp = self
            .dispatcher
            .send_once(Method::PUT, url, Some(body), self.config.item_timeout())
            .await?;
        let asset: Asset = handle_response(resp)?;
        info!(id, "asset updated");
        Ok(asset)
    }

    pub async fn update_validated(&self, id: i64, fields: &AssetFields) -> Result<Asset, ClientError> {
        validate_update(fields)?;
        self.update(id, fields).await
    }

    /// Partial update.  Unset fields never reach the wire, so this is an
    /// update that refuses an empty change set.
    pub async fn patch(&self, id: i64, changes: &AssetFields) -> Result<Asset, ClientError> {
        if changes.is_empty() {
            return Err(ClientError::Validation("No hay cambios para aplicar".into()));
        }
        self.update(id, changes).await
    }

    /// `DELETE /inventario/{id}`; returns the deleted record when the backend
    /// echoes it.
    pub async fn delete(&self, id: i64) -> Result<Option<Asset>, ClientError> {
        let url = self.config.build_url(&item_endpoint(id), &[])?;
        let resp = self
            .dispatcher
            .send_once(Method::DELETE, url, None, self.config.item_timeout())
            .await?;
        let deleted = handle_optional(resp)?;
        info!(id, "asset deleted");
        Ok(deleted)
    }

    pub async fn delete_validated(&self, id: i64) -> Result<Option<Asset>, ClientError> {
        validate_delete(id)?;
        self.delete(id).await
    }

    /// Delete `ids` one after another; one result per id, in order.
    pub async fn delete_many(&self, ids: &[i64]) -> Vec<Result<Option<Asset>, ClientError>> {
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = self.delete(id).await;
            if let Err(e) = &result {
                warn!(id, error = %e, "bulk delete item failed");
            }
            results.push(result);
        }
        results
    }

    /// Table page with a total count, falling back to the bundled demo data
    /// when the backend fails.
    pub async fn list_or_demo(&self, query: InventoryQuery) -> Listing {
        match self.list(query).await {
            Ok(assets) => {
                let items: Vec<InventoryItem> = assets.iter().map(InventoryItem::from).collect();
                let total = match self.list_all().await {
                    Ok(all) => all.len(),
                    Err(e) => {
                        warn!(error = %e, "could not count inventory, estimating");
                        let seen = query.skip as usize + items.len();
                        if items.len() == query.limit as usize { seen + 1 } else { seen }
                    }
                };
                Listing { items, total, demo_mode: false, warning: None }
            }
            Err(e) => {
                warn!(error = %e, "backend unavailable, serving demo inventory");
                Listing {
                    items: demo_page(query),
                    total: demo_inventory().len(),
                    demo_mode: true,
                    warning: Some(DEMO_WARNING.to_string()),
                }
            }
        }
    }

    /// Table page for `session`.
    ///
    /// Role visibility and table `filters` are applied to the whole registry
    /// before `query` picks the page, so `total` counts every matching row.
    /// Demo rows are sample data and are shown to every role.
    pub async fn list_visible(&self, query: InventoryQuery, session: &Session, filters: &FilterOptions) -> Listing {
        if session.role.owner_filter().is_none() && filters.active_count() == 0 {
            return self.list_or_demo(query).await;
        }

        let (rows, demo_mode) = match self.list_all().await {
            Ok(assets) => {
                let rows: Vec<InventoryItem> = session.visible(assets).iter().map(InventoryItem::from).collect();
                (rows, false)
            }
            Err(e) => {
                warn!(error = %e, "backend unavailable, serving demo inventory");
                (demo_inventory().to_vec(), true)
            }
        };
        let matching: Vec<InventoryItem> = filters.apply(&rows).into_iter().cloned().collect();
        info!(role = %session.role, visible = rows.len(), matching = matching.len(), "filtered inventory listing");

        Listing {
            items: query.slice(&matching),
            total: matching.len(),
            demo_mode,
            warning: demo_mode.then(|| DEMO_WARNING.to_string()),
        }
    }

    /// Time a small list request.
    pub async fn probe(&self, limit: u32) -> ProbeReport {
        let started = Instant::now();
        let result = self.list(InventoryQuery::new(0, limit)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(assets) => ProbeReport { success: true, count: assets.len(), elapsed_ms, error: None },
            Err(e) => ProbeReport {
                success: false,
                count: 0,
                elapsed_ms,
                error: Some(e.to_string()),
            },
        }
    }
}
