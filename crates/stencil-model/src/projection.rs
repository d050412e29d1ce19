use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RowData;

/// Derives the display id used for a column in projections: the name
/// lower-cased with spaces replaced by underscores.
///
/// This is a display convenience, not a stored identity. Distinct names can
/// collide ("Item Code" and "item_code" both map to `item_code`), so
/// consumers must not rely on uniqueness.
pub fn column_display_id(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProjection {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetProjection {
    pub id: i64,
    pub name: String,
    pub columns: Vec<ColumnProjection>,
    /// Raw row payloads in ascending `row_number` order.
    pub rows: Vec<RowData>,
}

/// The nested, read-oriented view of a template assembled from its
/// relational storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateProjection {
    pub id: Uuid,
    pub sheets: Vec<SheetProjection>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One sheet of the export grouping: display name plus rows in canonical
/// order. Headers are not supplied; the exporter derives them from the keys
/// present in the row data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSheet {
    pub name: String,
    pub rows: Vec<RowData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_id_lowercases_and_replaces_spaces() {
        assert_eq!(column_display_id("Item Code"), "item_code");
        assert_eq!(column_display_id("Join Date"), "join_date");
        assert_eq!(column_display_id("price"), "price");
    }

    #[test]
    fn display_id_can_collide_for_distinct_names() {
        assert_eq!(
            column_display_id("Item Code"),
            column_display_id("item_code")
        );
    }
}
