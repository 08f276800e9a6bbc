//! Dashboard view of an asset.
//!
//! The tables and charts work on a stock-style item rather than on the raw
//! registry record: availability becomes a stock status and criticality
//! becomes a quantity so the same widgets can rank and colour assets.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::asset::{Asset, AssetFields, Rating};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Status derived from the availability text of an asset.
    pub fn from_availability(availability: Option<&str>) -> Self {
        let Some(text) = availability else {
            return StockStatus::OutOfStock;
        };
        let t = text.to_lowercase();
        if t.contains("alt") || t.contains("disponible") || t.contains("activo") {
            StockStatus::InStock
        } else if t.contains("medi") || t.contains("limitado") {
            StockStatus::LowStock
        } else {
            StockStatus::OutOfStock
        }
    }

    fn as_availability(self) -> &'static str {
        match self {
            StockStatus::InStock => "Alta",
            StockStatus::LowStock => "Media",
            StockStatus::OutOfStock => "Baja",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub min_stock: u32,
    pub price: f64,
    pub supplier: String,
    pub last_updated: String,
    pub status: StockStatus,
}

impl InventoryItem {
    pub const DEFAULT_MIN_STOCK: u32 = 5;

    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

/// Quantity used by the dashboard for a criticality text.
pub fn quantity_for_criticality(criticality: Option<&str>) -> u32 {
    match criticality {
        None => 0,
        Some(text) => match Rating::parse_lenient(text) {
            Some(Rating::Alto) => 5,
            Some(Rating::Medio) => 15,
            Some(Rating::Bajo) => 25,
            None => 10,
        },
    }
}

impl From<&Asset> for InventoryItem {
    fn from(asset: &Asset) -> Self {
        let f = &asset.fields;
        InventoryItem {
            id: asset.id.to_string(),
            name: f.name.clone().unwrap_or_else(|| "Sin nombre".into()),
            category: f.asset_type.clone().unwrap_or_else(|| "Sin categoría".into()),
            quantity: quantity_for_criticality(f.criticality.as_deref()),
            min_stock: InventoryItem::DEFAULT_MIN_STOCK,
            price: 0.0,
            supplier: f.owner.clone().unwrap_or_else(|| "Sin proveedor".into()),
            last_updated: Utc::now().format("%Y-%m-%d").to_string(),
            status: StockStatus::from_availability(f.availability.as_deref()),
        }
    }
}

/// Build the backend payload for an item edited through the dashboard form.
pub fn item_to_fields(item: &InventoryItem) -> AssetFields {
    let criticality = match item.quantity {
        0 => "Baja",
        1..=5 => "Alta",
        6..=15 => "Media",
        _ => "Baja",
    };
    AssetFields {
        name: Some(item.name.clone()),
        description: Some(format!("Producto: {}", item.name)),
        asset_type: Some(item.category.clone()),
        conservation_medium: Some("Digital".into()),
        format: Some("Electrónico".into()),
        language: Some("Español".into()),
        process: Some("Gestión de Inventario".into()),
        owner: Some(item.supplier.clone()),
        personal_data_type: Some("No aplica".into()),
        collection_purpose: Some("Control de inventario".into()),
        confidentiality: Some("Media".into()),
        integrity: Some("Alta".into()),
        availability: Some(item.status.as_availability().into()),
        criticality: Some(criticality.into()),
        published_info: Some("No".into()),
        consultation_place: Some("Sistema de inventario".into()),
    }
}
