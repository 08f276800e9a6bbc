//! In-memory filters applied after a fetch.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::view::{InventoryItem, StockStatus};

/// Table filters over dashboard items.  Empty strings and `None` mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOptions {
    pub search_term: String,
    pub category: String,
    pub status: Option<StockStatus>,
    pub supplier: String,
    pub min_quantity: Option<u32>,
    pub max_quantity: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FilterOptions {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if !self.search_term.is_empty() {
            let needle = self.search_term.to_lowercase();
            let hit = [&item.name, &item.category, &item.supplier]
                .iter()
                .any(|s| s.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if !self.category.is_empty() && item.category != self.category {
            return false;
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if !self.supplier.is_empty() && item.supplier != self.supplier {
            return false;
        }
        if self.min_quantity.is_some_and(|min| item.quantity < min)
            || self.max_quantity.is_some_and(|max| item.quantity > max)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| item.price < min)
            || self.max_price.is_some_and(|max| item.price > max)
        {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, items: &'a [InventoryItem]) -> Vec<&'a InventoryItem> {
        items.iter().filter(|i| self.matches(i)).collect()
    }

    /// Number of filters currently narrowing the view.
    pub fn active_count(&self) -> usize {
        [
            !self.search_term.is_empty(),
            !self.category.is_empty(),
            self.status.is_some(),
            !self.supplier.is_empty(),
            self.min_quantity.is_some(),
            self.max_quantity.is_some(),
            self.min_price.is_some(),
            self.max_price.is_some(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }
}

/// Sorted, de-duplicated values for the category and supplier selectors.
pub fn distinct_options(items: &[InventoryItem]) -> (Vec<String>, Vec<String>) {
    let mut categories: Vec<String> = items.iter().map(|i| i.category.clone()).collect();
    let mut suppliers: Vec<String> = items.iter().map(|i| i.supplier.clone()).collect();
    categories.sort();
    categories.dedup();
    suppliers.sort();
    suppliers.dedup();
    (categories, suppliers)
}

/// Report filters over raw assets.  `"all"` and `None` both mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetFilter {
    pub asset_type: Option<String>,
    pub process: Option<String>,
    pub criticality: Option<String>,
    pub confidentiality: Option<String>,
    pub availability: Option<String>,
    pub integrity: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

fn wanted(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|f| !f.is_empty() && *f != "all")
}

fn contains_ci(value: &Option<String>, needle: &str) -> bool {
    value
        .as_deref()
        .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        let f = &asset.fields;
        if let Some(t) = wanted(&self.asset_type) {
            if f.asset_type.as_deref() != Some(t) {
                return false;
            }
        }
        if let Some(p) = wanted(&self.process) {
            if f.process.as_deref() != Some(p) {
                return false;
            }
        }
        let substring_checks = [
            (&self.criticality, &f.criticality),
            (&self.confidentiality, &f.confidentiality),
            (&self.availability, &f.availability),
            (&self.integrity, &f.integrity),
        ];
        substring_checks
            .into_iter()
            .all(|(filter, value)| wanted(filter).is_none_or(|needle| contains_ci(value, needle)))
    }

    pub fn apply(&self, assets: &[Asset]) -> Vec<Asset> {
        assets
            .iter()
            .filter(|a| self.matches(a))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
