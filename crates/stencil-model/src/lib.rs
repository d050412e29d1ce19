//! `stencil-model` defines the core data structures for spreadsheet templates.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the SQLite persistence layer (`stencil-storage`)
//! - the template/row services (`stencil-service`)
//! - the XLSX export layer (`stencil-xlsx`) and IPC boundaries via `serde`

mod definition;
mod projection;
mod row;
mod template;

pub use definition::{ColumnDef, DefinitionError, SheetDef, TemplateDefinition};
pub use projection::{
    column_display_id, ColumnProjection, ExportSheet, SheetProjection, TemplateProjection,
};
pub use row::{Row, RowData};
pub use template::{ColumnMeta, SheetMeta, TemplateMeta};
