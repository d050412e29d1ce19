//! SQLite-backed storage for Stencil templates.
//!
//! This crate is intentionally self-contained so it can sit behind any
//! request-handling glue. It exposes:
//! - SQLite schema creation on open
//! - Atomic template creation (template + sheets + columns as one unit)
//! - Explicit cascade deletion (rows, columns, sheets, template)
//! - Row insertion with in-transaction row-number assignment
//! - Batched transactional row appends
//! - Ordered, sheet-scoped row reads

mod schema;
pub mod storage;

pub use storage::{Storage, StorageError};
