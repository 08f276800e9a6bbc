//! Prompt templates.  The model is asked to answer in Spanish with a single
//! JSON object whose shape depends on the action.

use std::fmt::Write;

use inventario_types::Asset;

/// Records included in an edit prompt.
pub const EDIT_SNAPSHOT: usize = 30;
/// Records included in delete and consult prompts.
pub const LOOKUP_SNAPSHOT: usize = 50;
/// Upper bound on records a report may return.
pub const REPORT_MAX_RECORDS: usize = 20;

fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

#[derive(Clone, Copy)]
enum Detail {
    Lookup,
    Edit,
    Full,
}

fn snapshot(assets: &[Asset], limit: usize, detail: Detail) -> String {
    let mut out = String::new();
    for asset in assets.iter().take(limit) {
        let f = &asset.fields;
        let _ = writeln!(out, "- ID: {}, Nombre: \"{}\"", asset.id, asset.display_name());
        let _ = writeln!(out, "  * Tipo: {}", text_or(&f.asset_type, "Sin tipo"));
        let _ = writeln!(out, "  * Proceso: {}", text_or(&f.process, "Sin proceso"));
        let _ = writeln!(out, "  * Dueño: {}", text_or(&f.owner, "Sin dueño"));
        if matches!(detail, Detail::Edit | Detail::Full) {
            let _ = writeln!(out, "  * Criticidad: {}", text_or(&f.criticality, "Sin datos"));
            let _ = writeln!(out, "  * Confidencialidad: {}", text_or(&f.confidentiality, "Sin datos"));
            let _ = writeln!(out, "  * Disponibilidad: {}", text_or(&f.availability, "Sin datos"));
            let _ = writeln!(out, "  * Integridad: {}", text_or(&f.integrity, "Sin datos"));
            let _ = writeln!(out, "  * Formato: {}", text_or(&f.format, "Sin formato"));
            let _ = writeln!(out, "  * Medio: {}", text_or(&f.conservation_medium, "Sin datos"));
        }
        if matches!(detail, Detail::Full) {
            let _ = writeln!(out, "  * Idioma: {}", text_or(&f.language, "Sin idioma"));
            let _ = writeln!(out, "  * Tipo Datos Personales: {}", text_or(&f.personal_data_type, "Sin datos"));
            let _ = writeln!(out, "  * Finalidad Recolección: {}", text_or(&f.collection_purpose, "Sin datos"));
            let _ = writeln!(out, "  * Info Publicada: {}", text_or(&f.published_info, "Sin datos"));
            let _ = writeln!(out, "  * Lugar Consulta: {}", text_or(&f.consultation_place, "Sin datos"));
        }
        let _ = writeln!(out, "  * Descripción: {}", text_or(&f.description, "Sin descripción"));
        out.push('\n');
    }
    out
}

pub fn create_prompt(query: &str) -> String {
    format!(
        r#"ACCIÓN: CREAR ACTIVO
CONSULTA DEL USUARIO: "{query}"

TAREA: Extrae los datos del activo que el usuario quiere registrar.

RESPONDE ÚNICAMENTE con un JSON con esta forma:
{{
  "action": "crear",
  "data": {{
    "NOMBRE_DEL_ACTIVO": "nombre extraído",
    "TIPO_DE_ACTIVO": "tipo extraído o 'Activo de información'",
    "PROCESO": "proceso extraído o 'General'",
    "DUEÑO_DE_ACTIVO": "dueño extraído o 'No especificado'",
    "DESCRIPCION": "descripción extraída o generada",
    "CONFIDENCIALIDAD": "Bajo|Medio|Alto (por defecto Bajo)",
    "DISPONIBILIDAD": "Bajo|Medio|Alto (por defecto Medio)",
    "INTEGRIDAD": "Bajo|Medio|Alto (por defecto Medio)",
    "CRITICIDAD_TOTAL_DEL_ACTIVO": "Bajo|Medio|Alto (por defecto Bajo)",
    "FORMATO": "formato extraído o 'Digital'",
    "MEDIO_DE_CONSERVACIÓN": "Digital|Físico|Híbrido (por defecto Digital)",
    "IDIOMA": "Español"
  }},
  "instructions": "Resumen de lo que se va a crear"
}}
"#
    )
}

pub fn edit_prompt(query: &str, inventory: &[Asset]) -> String {
    format!(
        r#"ACCIÓN: EDITAR ACTIVO
CONSULTA DEL USUARIO: "{query}"

INVENTARIO ({total} activos):
{records}
TAREA: Identifica el activo que el usuario quiere editar y los cambios pedidos.
Incluye en "changes" solo los campos que cambian.

RESPONDE ÚNICAMENTE con un JSON con esta forma:
{{
  "action": "editar",
  "data": {{
    "id": 123,
    "changes": {{
      "CRITICIDAD_TOTAL_DEL_ACTIVO": "nuevo valor"
    }}
  }},
  "instructions": "Resumen de los cambios"
}}
"#,
        total = inventory.len(),
        records = snapshot(inventory, EDIT_SNAPSHOT, Detail::Edit),
    )
}

pub fn delete_prompt(query: &str, inventory: &[Asset]) -> String {
    format!(
        r#"ACCIÓN: ELIMINAR ACTIVO
CONSULTA DEL USUARIO: "{query}"

INVENTARIO ({total} activos):
{records}
TAREA: Identifica el activo que el usuario quiere eliminar por nombre, tipo o proceso.

RESPONDE ÚNICAMENTE con un JSON con esta forma:
{{
  "action": "eliminar",
  "data": {{
    "id": 123,
    "name": "nombre del activo encontrado"
  }},
  "instructions": "Confirmación de la eliminación"
}}
"#,
        total = inventory.len(),
        records = snapshot(inventory, LOOKUP_SNAPSHOT, Detail::Lookup),
    )
}

pub fn consult_prompt(query: &str, inventory: &[Asset]) -> String {
    format!(
        r#"ACCIÓN: CONSULTAR INVENTARIO
CONSULTA DEL USUARIO: "{query}"

INVENTARIO ({total} activos):
{records}
TAREA: Responde la consulta de forma clara y concisa (máximo 500 caracteres),
con cifras concretas.

RESPONDE ÚNICAMENTE con un JSON con esta forma:
{{
  "message": "respuesta para el usuario",
  "type": "info"
}}
"#,
        total = inventory.len(),
        records = snapshot(inventory, LOOKUP_SNAPSHOT, Detail::Full),
    )
}

pub fn report_prompt(query: &str, inventory_json: &str, total: usize) -> String {
    format!(
        r#"IMPORTANTE: Responde ÚNICAMENTE con un JSON válido, sin texto adicional.

TAREA: Filtra los activos del inventario según la consulta del usuario.
LÍMITE: Devuelve como máximo {REPORT_MAX_RECORDS} activos, los más relevantes primero.

CONSULTA DEL USUARIO: "{query}"

INVENTARIO ({total} activos):
{inventory_json}

Devuelve los activos seleccionados completos, con los mismos campos que recibiste.
Estructura exacta:
{{
  "filteredProducts": [activos seleccionados],
  "reportTitle": "Título del reporte",
  "reportDescription": "Qué contiene el reporte",
  "criteria": ["criterio 1", "criterio 2"]
}}

RESPUESTA (SOLO JSON):"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventario_types::AssetFields;

    fn assets(n: i64) -> Vec<Asset> {
        (1..=n)
            .map(|i| Asset::new(i, AssetFields { name: Some(format!("Activo {i}")), ..Default::default() }))
            .collect()
    }

    #[test]
    fn test_snapshot_sizes() {
        let inventory = assets(60);
        let edit = edit_prompt("x", &inventory);
        assert!(edit.contains("INVENTARIO (60 activos)"));
        assert!(edit.contains("ID: 30,"));
        assert!(!edit.contains("ID: 31,"));

        let delete = delete_prompt("x", &inventory);
        assert!(delete.contains("ID: 50,"));
        assert!(!delete.contains("ID: 51,"));
        assert!(!delete.contains("Criticidad"));

        let consult = consult_prompt("x", &inventory);
        assert!(consult.contains("Lugar Consulta: Sin datos"));
    }

    #[test]
    fn test_create_prompt_embeds_query() {
        let p = create_prompt("laptop Dell para TI");
        assert!(p.contains("\"laptop Dell para TI\""));
        assert!(p.contains("\"action\": \"crear\""));
    }
}
