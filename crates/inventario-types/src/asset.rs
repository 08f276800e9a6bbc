//! Asset ("activo") records exactly as the inventory backend serializes them.
//!
//! The backend is a FastAPI service whose column names are upper-case Spanish
//! identifiers, some with accented characters.  Every descriptive field is an
//! optional string; only the numeric `id` is guaranteed and it is always
//! assigned by the backend.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The id-less body used to create or update an asset.
///
/// Absent fields are omitted from the serialized JSON, so the same type works
/// for full creates and for partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFields {
    #[serde(rename = "NOMBRE_DEL_ACTIVO", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "DESCRIPCION", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "TIPO_DE_ACTIVO", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(rename = "MEDIO_DE_CONSERVACIÓN", default, skip_serializing_if = "Option::is_none")]
    pub conservation_medium: Option<String>,
    #[serde(rename = "FORMATO", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "IDIOMA", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "PROCESO", default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(rename = "DUEÑO_DE_ACTIVO", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "TIPO_DE_DATOS_PERSONALES", default, skip_serializing_if = "Option::is_none")]
    pub personal_data_type: Option<String>,
    #[serde(rename = "FINALIDAD_DE_LA_RECOLECCIÓN", default, skip_serializing_if = "Option::is_none")]
    pub collection_purpose: Option<String>,
    #[serde(rename = "CONFIDENCIALIDAD", default, skip_serializing_if = "Option::is_none")]
    pub confidentiality: Option<String>,
    #[serde(rename = "INTEGRIDAD", default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    #[serde(rename = "DISPONIBILIDAD", default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(rename = "CRITICIDAD_TOTAL_DEL_ACTIVO", default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
    #[serde(rename = "INFORMACIÓN_PUBLICADA_O_DISPONIBLE", default, skip_serializing_if = "Option::is_none")]
    pub published_info: Option<String>,
    #[serde(rename = "LUGAR_DE_CONSULTA", default, skip_serializing_if = "Option::is_none")]
    pub consultation_place: Option<String>,
}

impl AssetFields {
    /// Overwrite every field that is set in `changes`, leaving the rest alone.
    pub fn apply(&mut self, changes: &AssetFields) {
        fn set(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
        set(&mut self.name, &changes.name);
        set(&mut self.description, &changes.description);
        set(&mut self.asset_type, &changes.asset_type);
        set(&mut self.conservation_medium, &changes.conservation_medium);
        set(&mut self.format, &changes.format);
        set(&mut self.language, &changes.language);
        set(&mut self.process, &changes.process);
        set(&mut self.owner, &changes.owner);
        set(&mut self.personal_data_type, &changes.personal_data_type);
        set(&mut self.collection_purpose, &changes.collection_purpose);
        set(&mut self.confidentiality, &changes.confidentiality);
        set(&mut self.integrity, &changes.integrity);
        set(&mut self.availability, &changes.availability);
        set(&mut self.criticality, &changes.criticality);
        set(&mut self.published_info, &changes.published_info);
        set(&mut self.consultation_place, &changes.consultation_place);
    }

    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == AssetFields::default()
    }
}

/// A stored asset: backend-assigned id plus its descriptive fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    #[serde(flatten)]
    pub fields: AssetFields,
}

impl Asset {
    pub fn new(id: i64, fields: AssetFields) -> Self {
        Self { id, fields }
    }

    /// Name for display, with the placeholder the dashboard uses.
    pub fn display_name(&self) -> &str {
        self.fields.name.as_deref().unwrap_or("Sin nombre")
    }

    /// Parsed criticality rating, if the stored text is recognisable.
    pub fn criticality(&self) -> Option<Rating> {
        self.fields.criticality.as_deref().and_then(Rating::parse_lenient)
    }
}

/// Pagination cursor for `GET /inventario/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    InventoryQuery::DEFAULT_LIMIT
}

impl InventoryQuery {
    pub const DEFAULT_LIMIT: u32 = 100;
    /// Page size used when the whole registry is needed (filters, AI snapshots).
    pub const ALL_LIMIT: u32 = 1000;

    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    /// Everything the dashboard loads at once.
    pub fn all() -> Self {
        Self::new(0, Self::ALL_LIMIT)
    }

    /// The rows of `rows` inside this window, for data already in memory.
    pub fn slice<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        rows.iter().skip(self.skip as usize).take(self.limit as usize).cloned().collect()
    }
}

impl Default for InventoryQuery {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Three-level rating used for confidentiality, integrity, availability and
/// total criticality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum Rating {
    Alto,
    Medio,
    Bajo,
}

impl Rating {
    /// Parse the free-form text stored by the backend ("Alta", "ALTO",
    /// "Crítico", "media", ...).
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let t = text.trim().to_lowercase();
        if t.contains("alt") || t.contains("crít") || t.contains("critic") {
            Some(Rating::Alto)
        } else if t.contains("medi") {
            Some(Rating::Medio)
        } else if t.contains("baj") {
            Some(Rating::Bajo)
        } else {
            None
        }
    }
}
