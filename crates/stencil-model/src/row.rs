use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schemaless row payload: an arbitrary key → value mapping. Column metadata
/// is never enforced against it.
pub type RowData = serde_json::Map<String, serde_json::Value>;

/// A persisted row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub row_id: Uuid,
    pub template_id: Uuid,
    pub sheet_no: i64,
    /// Unique within `(template_id, sheet_no)`. Ascending `row_number` is
    /// the canonical row order for projections and export.
    pub row_number: i64,
    pub data: RowData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
