//! Aggregates behind the dashboard cards and charts.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, Rating};
use crate::view::{InventoryItem, StockStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub name: String,
    pub count: u64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub name: String,
    pub quantity: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: u64,
    pub total_value: f64,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    /// In first-seen order.
    pub categories: Vec<CategoryStat>,
    pub top_items: Vec<TopItem>,
}

impl InventoryStats {
    pub const TOP_ITEMS: usize = 5;

    pub fn compute(items: &[InventoryItem]) -> Self {
        let mut categories: Vec<CategoryStat> = Vec::new();
        for item in items {
            match categories.iter_mut().find(|c| c.name == item.category) {
                Some(c) => {
                    c.count += u64::from(item.quantity);
                    c.value += item.value();
                }
                None => categories.push(CategoryStat {
                    name: item.category.clone(),
                    count: u64::from(item.quantity),
                    value: item.value(),
                }),
            }
        }

        let mut top_items: Vec<TopItem> = items
            .iter()
            .map(|i| TopItem { name: i.name.clone(), quantity: i.quantity, value: i.value() })
            .collect();
        top_items.sort_by(|a, b| b.value.total_cmp(&a.value));
        top_items.truncate(Self::TOP_ITEMS);

        InventoryStats {
            total_items: items.iter().map(|i| u64::from(i.quantity)).sum(),
            total_value: items.iter().map(InventoryItem::value).sum(),
            low_stock_items: items.iter().filter(|i| i.status == StockStatus::LowStock).count(),
            out_of_stock_items: items.iter().filter(|i| i.status == StockStatus::OutOfStock).count(),
            categories,
            top_items,
        }
    }
}

/// Criticality histogram for the assets chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalityBreakdown {
    pub alto: usize,
    pub medio: usize,
    pub bajo: usize,
    pub unknown: usize,
}

impl CriticalityBreakdown {
    pub fn compute(assets: &[Asset]) -> Self {
        assets.iter().fold(Self::default(), |mut acc, a| {
            match a.criticality() {
                Some(Rating::Alto) => acc.alto += 1,
                Some(Rating::Medio) => acc.medio += 1,
                Some(Rating::Bajo) => acc.bajo += 1,
                None => acc.unknown += 1,
            }
            acc
        })
    }
}
