//! Template and row services over `stencil-storage`.
//!
//! The services own everything the store does not: definition validation
//! before any mutation, the two row-numbering policies, batch accounting,
//! the nested sheets-with-rows projection, and the per-sheet grouping handed
//! to the export collaborator. Callers classify failures through
//! [`ServiceError`]'s predicates instead of matching storage internals.

mod error;
mod row;
mod template;

pub use error::{Result, ServiceError};
pub use row::RowService;
pub use template::TemplateService;
