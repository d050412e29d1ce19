//! XLSX export for populated templates.
//!
//! Renders the per-sheet row grouping produced by the services into a
//! minimal, valid XLSX package. The exporter owns file formatting only; the
//! grouping contract (sheet order, row order) belongs to the caller, and the
//! caller never inspects the produced bytes.

mod write;

pub use write::{write_workbook, ExportError};
