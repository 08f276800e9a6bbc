//! Natural-language filtered reports over the dashboard view of the inventory.

use std::sync::Arc;

use inventario_types::InventoryItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::AgentError;
use crate::llm::{GenerationConfig, GenerativeModel};
use crate::prompts::{REPORT_MAX_RECORDS, report_prompt};
use crate::reconcile::{RepairHint, extract_json};

pub const MIN_QUERY_CHARS: usize = 5;
pub const MAX_QUERY_CHARS: usize = 500;

const DEFAULT_TITLE: &str = "Reporte Personalizado";
const DEFAULT_DESCRIPTION: &str = "Reporte generado con IA";
const DEFAULT_CRITERION: &str = "Filtrado con IA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub filtered_products: Vec<InventoryItem>,
    pub report_title: String,
    pub report_description: String,
    pub criteria: Vec<String>,
}

/// Check a report query, returning every problem found.
pub fn validate_query(query: &str) -> Result<(), AgentError> {
    let mut errors = Vec::new();
    if query.trim().chars().count() < MIN_QUERY_CHARS {
        errors.push(format!("La consulta debe tener al menos {MIN_QUERY_CHARS} caracteres"));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        errors.push(format!("La consulta no puede exceder {MAX_QUERY_CHARS} caracteres"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AgentError::InvalidQuery(errors.join(". ")))
    }
}

/// Sample queries offered to the user.
pub fn query_suggestions() -> &'static [&'static str] {
    &[
        "Muéstrame todos los activos con criticidad alta",
        "Activos con disponibilidad baja para revisión urgente",
        "Activos del proceso de Gestión Financiera",
        "Activos en formato físico ordenados por criticidad",
        "Los activos de la Oficina de Control Interno",
        "Activos con datos personales sensibles",
        "Activos actualizados en los últimos 30 días",
    ]
}

fn text_field(root: &Value, key: &str, fallback: &str) -> String {
    root.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Build a [`Report`] from parsed model output.
///
/// Records that do not match the item shape are skipped; a missing
/// `filteredProducts` array is an error.
pub fn parse_report(value: &Value) -> Result<Report, AgentError> {
    let products = value
        .get("filteredProducts")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::SchemaMismatch("`filteredProducts` is missing or not an array".into()))?;

    let mut filtered_products = Vec::with_capacity(products.len().min(REPORT_MAX_RECORDS));
    for (index, product) in products.iter().enumerate() {
        match serde_json::from_value::<InventoryItem>(product.clone()) {
            Ok(item) => filtered_products.push(item),
            Err(e) => warn!(index, error = %e, "dropping report record with unexpected shape"),
        }
    }
    filtered_products.truncate(REPORT_MAX_RECORDS);

    let criteria: Vec<String> = value
        .get("criteria")
        .and_then(Value::as_array)
        .map(|c| c.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    Ok(Report {
        filtered_products,
        report_title: text_field(value, "reportTitle", DEFAULT_TITLE),
        report_description: text_field(value, "reportDescription", DEFAULT_DESCRIPTION),
        criteria: if criteria.is_empty() { vec![DEFAULT_CRITERION.to_string()] } else { criteria },
    })
}

#[derive(Clone)]
pub struct ReportGenerator {
    model: Arc<dyn GenerativeModel>,
}

impl ReportGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Markers that end a complete item in echoed report output.
    pub fn repair_hint() -> RepairHint {
        RepairHint::new([r#""status": ""#, r#""status":""#])
    }

    #[instrument(skip(self, inventory), fields(inventory = inventory.len()))]
    pub async fn generate(&self, query: &str, inventory: &[InventoryItem]) -> Result<Report, AgentError> {
        validate_query(query)?;
        if inventory.is_empty() {
            return Err(AgentError::InvalidQuery("No hay datos de inventario disponibles".into()));
        }

        let inventory_json = serde_json::to_string_pretty(inventory)
            .map_err(|e| AgentError::InvalidQuery(format!("inventory is not serializable: {e}")))?;
        let prompt = report_prompt(query.trim(), &inventory_json, inventory.len());
        let text = self.model.generate(&prompt, &GenerationConfig::REPORT).await?;

        let report = parse_report(&extract_json(&text, &Self::repair_hint())?)?;
        info!(records = report.filtered_products.len(), title = %report.report_title, "report generated");
        Ok(report)
    }
}
