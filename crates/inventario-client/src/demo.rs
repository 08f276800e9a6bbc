//! Bundled sample data shown when the backend cannot be reached.

use std::sync::LazyLock;

use inventario_types::{InventoryItem, InventoryQuery};

const DEMO_INVENTORY_JSON: &str = include_str!("../fixtures/demo_inventory.json");

static DEMO_INVENTORY: LazyLock<Vec<InventoryItem>> = LazyLock::new(|| {
    serde_json::from_str(DEMO_INVENTORY_JSON).unwrap_or_else(|e| {
        tracing::error!(error = %e, "bundled demo inventory is malformed");
        Vec::new()
    })
});

pub const DEMO_WARNING: &str = "Usando datos de demostración - La API no está disponible en este momento";

pub fn demo_inventory() -> &'static [InventoryItem] {
    &DEMO_INVENTORY
}

/// One page of the demo data, paginated with the same `skip`/`limit` the
/// backend would have received.
pub fn demo_page(query: InventoryQuery) -> Vec<InventoryItem> {
    query.slice(demo_inventory())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_data_parses() {
        assert_eq!(demo_inventory().len(), 6);
        assert_eq!(demo_inventory()[0].id, "INV001");
    }

    #[test]
    fn test_demo_pagination_matches_backend_semantics() {
        let page = demo_page(InventoryQuery::new(2, 3));
        let ids: Vec<&str> = page.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["INV003", "INV004", "INV005"]);
        assert!(demo_page(InventoryQuery::new(10, 5)).is_empty());
        assert_eq!(demo_page(InventoryQuery::default()).len(), 6);
    }
}
