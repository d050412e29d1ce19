use stencil_model::DefinitionError;
use stencil_storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy exposed to the surrounding glue.
///
/// Validation errors are raised before any store mutation. Not-found errors
/// abort the whole operation (including batches) as soon as the missing
/// reference is detected. Conflicts cover caller-visible uniqueness
/// violations. Everything else is an internal store failure; the enclosing
/// transaction has already rolled back in full, so callers see no partial
/// effect.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] DefinitionError),
    #[error("template not found: {0}")]
    TemplateNotFound(Uuid),
    #[error("sheet {sheet_no} not found in template {template_id}")]
    SheetNotFound { template_id: Uuid, sheet_no: i64 },
    #[error("row not found: {0}")]
    RowNotFound(Uuid),
    #[error("row number {row_number} already exists in sheet {sheet_no}")]
    RowNumberTaken { sheet_no: i64, row_number: i64 },
    #[error("storage error: {0}")]
    Storage(StorageError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::TemplateNotFound(_)
                | ServiceError::SheetNotFound { .. }
                | ServiceError::RowNotFound(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::RowNumberTaken { .. })
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TemplateNotFound(id) => ServiceError::TemplateNotFound(id),
            StorageError::SheetNotFound {
                template_id,
                sheet_no,
            } => ServiceError::SheetNotFound {
                template_id,
                sheet_no,
            },
            StorageError::RowNotFound(id) => ServiceError::RowNotFound(id),
            StorageError::DuplicateRowNumber {
                sheet_no,
                row_number,
            } => ServiceError::RowNumberTaken {
                sheet_no,
                row_number,
            },
            other => ServiceError::Storage(other),
        }
    }
}
