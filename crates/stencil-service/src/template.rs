use stencil_model::{
    column_display_id, ColumnProjection, ExportSheet, SheetProjection, TemplateDefinition,
    TemplateMeta, TemplateProjection,
};
use stencil_storage::Storage;
use uuid::Uuid;

use crate::error::Result;

/// Orchestrates template lifecycle: validated atomic creation, nested
/// projection reads, explicit cascade deletion.
#[derive(Debug, Clone)]
pub struct TemplateService {
    storage: Storage,
}

impl TemplateService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Validates the definition, then persists the template with all its
    /// sheets and columns as one unit. Nothing is written when validation
    /// fails, and no partially-created template is ever visible to other
    /// callers.
    pub fn create(&self, definition: &TemplateDefinition) -> Result<TemplateMeta> {
        definition.validate()?;
        let meta = self.storage.create_template(definition)?;
        tracing::info!(
            template_id = %meta.template_id,
            sheets = definition.sheets.len(),
            "template created"
        );
        Ok(meta)
    }

    /// Assembles the sheets-with-rows projection: sheets in `sheet_no`
    /// order, each with its columns (definition order, derived display ids)
    /// and its raw row payloads in `row_number` order.
    pub fn fetch(&self, template_id: Uuid) -> Result<TemplateProjection> {
        let meta = self.storage.get_template(template_id)?;

        let mut sheets = Vec::new();
        for sheet in self.storage.list_sheets(template_id)? {
            let columns = self
                .storage
                .list_columns(template_id, sheet.sheet_no)?
                .into_iter()
                .map(|column| ColumnProjection {
                    id: column_display_id(&column.name),
                    name: column.name,
                    column_type: column.column_type,
                    required: column.required,
                })
                .collect();
            let rows = self
                .storage
                .rows_by_sheet(template_id, sheet.sheet_no)?
                .into_iter()
                .map(|row| row.data)
                .collect();
            sheets.push(SheetProjection {
                id: sheet.sheet_no,
                name: sheet.sheet_name,
                columns,
                rows,
            });
        }

        Ok(TemplateProjection {
            id: meta.template_id,
            sheets,
            created_at: meta.created_at,
            modified_at: meta.modified_at,
        })
    }

    /// Deletes the template and everything it owns in one transaction.
    pub fn delete(&self, template_id: Uuid) -> Result<TemplateMeta> {
        let meta = self.storage.delete_template(template_id)?;
        tracing::info!(template_id = %template_id, "template deleted");
        Ok(meta)
    }

    /// All templates, newest first.
    pub fn list(&self) -> Result<Vec<TemplateMeta>> {
        Ok(self.storage.list_templates()?)
    }

    /// The per-sheet grouping handed to the export collaborator: sheet names
    /// with their rows in canonical order. Headers are not supplied; the
    /// exporter derives them from the keys present in the row data.
    pub fn export_sheets(&self, template_id: Uuid) -> Result<Vec<ExportSheet>> {
        self.storage.get_template(template_id)?;

        let mut out = Vec::new();
        for sheet in self.storage.list_sheets(template_id)? {
            let rows = self
                .storage
                .rows_by_sheet(template_id, sheet.sheet_no)?
                .into_iter()
                .map(|row| row.data)
                .collect();
            out.push(ExportSheet {
                name: sheet.sheet_name,
                rows,
            });
        }
        Ok(out)
    }
}
