use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rules a submitted template definition must satisfy before anything is
/// persisted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("a template definition must contain at least one sheet")]
    NoSheets,
    #[error("sheet number {0} appears more than once")]
    DuplicateSheetNo(i64),
    #[error("sheet {sheet_no} ({sheet_name:?}) must have at least one column")]
    SheetWithoutColumns { sheet_no: i64, sheet_name: String },
}

/// A column as submitted in a template definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Free-form type tag (e.g. "text", "date"). Descriptive only; row data
    /// is never validated against it.
    #[serde(rename = "type")]
    pub column_type: String,
    /// Advisory flag; not enforced against row data at write time.
    #[serde(default)]
    pub required: bool,
}

/// A sheet as submitted in a template definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDef {
    pub sheet_no: i64,
    pub sheet_name: String,
    pub columns: Vec<ColumnDef>,
}

/// The caller-facing shape of a template: an ordered list of sheets, each
/// with an ordered column list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub sheets: Vec<SheetDef>,
}

impl TemplateDefinition {
    /// Checks the rules enforced before any store mutation: at least one
    /// sheet, pairwise-unique sheet numbers, and at least one column per
    /// sheet.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.sheets.is_empty() {
            return Err(DefinitionError::NoSheets);
        }
        let mut seen = HashSet::new();
        for sheet in &self.sheets {
            if !seen.insert(sheet.sheet_no) {
                return Err(DefinitionError::DuplicateSheetNo(sheet.sheet_no));
            }
            if sheet.columns.is_empty() {
                return Err(DefinitionError::SheetWithoutColumns {
                    sheet_no: sheet.sheet_no,
                    sheet_name: sheet.sheet_name.clone(),
                });
            }
        }
        Ok(())
    }
}
