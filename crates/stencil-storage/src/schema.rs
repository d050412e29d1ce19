use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    // Ensure foreign keys are enforced (disabled by default in SQLite).
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS templates (
          template_id TEXT PRIMARY KEY,
          created_at TEXT NOT NULL,
          modified_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sheets (
          template_id TEXT NOT NULL REFERENCES templates(template_id),
          sheet_no INTEGER NOT NULL,
          sheet_name TEXT NOT NULL,
          PRIMARY KEY (template_id, sheet_no)
        );

        CREATE TABLE IF NOT EXISTS columns (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          template_id TEXT NOT NULL,
          sheet_no INTEGER NOT NULL,
          name TEXT NOT NULL,
          column_type TEXT NOT NULL,
          required INTEGER NOT NULL DEFAULT 0,
          FOREIGN KEY (template_id, sheet_no) REFERENCES sheets(template_id, sheet_no)
        );

        CREATE TABLE IF NOT EXISTS rows (
          row_id TEXT PRIMARY KEY,
          template_id TEXT NOT NULL,
          sheet_no INTEGER NOT NULL,
          row_number INTEGER NOT NULL,
          data JSON NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          FOREIGN KEY (template_id, sheet_no) REFERENCES sheets(template_id, sheet_no)
        );

        -- No two rows in the same sheet may share a row_number.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_rows_sheet_row_number
          ON rows(template_id, sheet_no, row_number);

        CREATE INDEX IF NOT EXISTS idx_columns_sheet ON columns(template_id, sheet_no);
        "#,
    )?;

    Ok(())
}
