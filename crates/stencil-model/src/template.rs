use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted template: identity plus timestamps. Its shape lives in the
/// sheets and columns it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub template_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A persisted sheet, keyed by `(template_id, sheet_no)`. `sheet_no` is
/// caller-chosen and unique within its template, not globally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMeta {
    pub template_id: Uuid,
    pub sheet_no: i64,
    pub sheet_name: String,
}

/// A persisted column definition. Name uniqueness within a sheet is not
/// enforced; the type tag and required flag are descriptive only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub template_id: Uuid,
    pub sheet_no: i64,
    pub name: String,
    pub column_type: String,
    pub required: bool,
}
