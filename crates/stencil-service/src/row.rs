use stencil_model::{Row, RowData};
use stencil_storage::Storage;
use uuid::Uuid;

use crate::error::Result;

/// Row lifecycle: single inserts (optionally at an explicit row number),
/// auto-numbered batch appends, wholesale updates, deletion, and ordered
/// reads.
#[derive(Debug, Clone)]
pub struct RowService {
    storage: Storage,
}

impl RowService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Inserts one row after validating that the template and sheet exist.
    ///
    /// An explicit `row_number` must be free within the sheet; a taken
    /// number is a conflict and nothing is written. `None` appends at the
    /// current maximum plus one. This path is distinct from
    /// [`append_batch`], which always auto-assigns.
    ///
    /// [`append_batch`]: RowService::append_batch
    pub fn create(
        &self,
        template_id: Uuid,
        sheet_no: i64,
        data: RowData,
        row_number: Option<i64>,
    ) -> Result<Row> {
        let row = self
            .storage
            .insert_row(template_id, sheet_no, row_number, &data)?;
        tracing::debug!(
            template_id = %template_id,
            sheet_no,
            row_number = row.row_number,
            "row created"
        );
        Ok(row)
    }

    /// Appends a batch of entries to a sheet as one transaction.
    ///
    /// Template and sheet existence are validated once for the whole batch.
    /// Null and empty entries are skipped: they consume no row number and
    /// are not counted. The remaining entries receive strictly consecutive
    /// numbers starting at the sheet's current maximum plus one, in input
    /// order. Returns the accepted count, not the rows themselves; callers
    /// that need them re-read the sheet.
    pub fn append_batch(
        &self,
        template_id: Uuid,
        sheet_no: i64,
        entries: &[Option<RowData>],
    ) -> Result<u64> {
        let accepted: Vec<RowData> = entries
            .iter()
            .filter_map(|entry| entry.as_ref())
            .filter(|data| !data.is_empty())
            .cloned()
            .collect();

        let count = self.storage.append_rows(template_id, sheet_no, &accepted)?;
        tracing::info!(
            template_id = %template_id,
            sheet_no,
            submitted = entries.len(),
            accepted = count,
            "row batch appended"
        );
        Ok(count)
    }

    /// Replaces a row's data wholesale; nothing of the previous mapping
    /// survives.
    pub fn update(&self, row_id: Uuid, data: RowData) -> Result<Row> {
        Ok(self.storage.update_row(row_id, &data)?)
    }

    /// Deletes a row. Terminal and immediate.
    pub fn delete(&self, row_id: Uuid) -> Result<Row> {
        Ok(self.storage.delete_row(row_id)?)
    }

    pub fn get(&self, row_id: Uuid) -> Result<Row> {
        Ok(self.storage.get_row(row_id)?)
    }

    /// Rows of one sheet in ascending `row_number` order, after validating
    /// that the template and the sheet exist.
    pub fn fetch_by_sheet(&self, template_id: Uuid, sheet_no: i64) -> Result<Vec<Row>> {
        self.storage.get_template(template_id)?;
        self.storage.get_sheet(template_id, sheet_no)?;
        Ok(self.storage.rows_by_sheet(template_id, sheet_no)?)
    }

    /// Every row of a template, ordered by sheet then row number.
    pub fn fetch_by_template(&self, template_id: Uuid) -> Result<Vec<Row>> {
        self.storage.get_template(template_id)?;
        Ok(self.storage.rows_by_template(template_id)?)
    }
}
