use crate::schema;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stencil_model::{ColumnMeta, Row, RowData, SheetMeta, TemplateDefinition, TemplateMeta};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("template not found: {0}")]
    TemplateNotFound(Uuid),
    #[error("sheet {sheet_no} not found in template {template_id}")]
    SheetNotFound { template_id: Uuid, sheet_no: i64 },
    #[error("row not found: {0}")]
    RowNotFound(Uuid),
    #[error("row number {row_number} already exists in sheet {sheet_no}")]
    DuplicateRowNumber { sheet_no: i64, row_number: i64 },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// SQLite-backed store for templates, sheets, columns, and rows.
///
/// The connection is shared behind a mutex. Every logical unit of work
/// (template creation, row insert, batch append, cascade delete) runs inside
/// a single transaction: fully committed or fully rolled back, with nothing
/// partial visible to other handles.
#[derive(Debug, Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Opens a database by URI, e.g. `file:name?mode=memory&cache=shared`
    /// for a shared in-memory database reachable from several handles.
    pub fn open_uri(uri: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(uri, flags)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persists a definition as one transaction: the template row, then every
    /// sheet and its columns. The generated template id is re-checked against
    /// the store and regenerated on collision.
    pub fn create_template(&self, definition: &TemplateDefinition) -> Result<TemplateMeta> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        let mut template_id = Uuid::now_v7();
        while template_exists(&tx, template_id)? {
            template_id = Uuid::now_v7();
        }

        let now = Utc::now();
        tx.execute(
            "INSERT INTO templates (template_id, created_at, modified_at) VALUES (?1, ?2, ?3)",
            params![template_id.to_string(), now.to_rfc3339(), now.to_rfc3339()],
        )?;

        for sheet in &definition.sheets {
            tx.execute(
                "INSERT INTO sheets (template_id, sheet_no, sheet_name) VALUES (?1, ?2, ?3)",
                params![template_id.to_string(), sheet.sheet_no, &sheet.sheet_name],
            )?;
            for column in &sheet.columns {
                tx.execute(
                    r#"
                    INSERT INTO columns (template_id, sheet_no, name, column_type, required)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        template_id.to_string(),
                        sheet.sheet_no,
                        &column.name,
                        &column.column_type,
                        column.required,
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(TemplateMeta {
            template_id,
            created_at: now,
            modified_at: now,
        })
    }

    pub fn get_template(&self, template_id: Uuid) -> Result<TemplateMeta> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        get_template(&conn, template_id)
    }

    /// All templates, newest first.
    pub fn list_templates(&self) -> Result<Vec<TemplateMeta>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT template_id, created_at, modified_at FROM templates ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], template_meta_from_sql)?;

        let mut templates = Vec::new();
        for template in rows {
            templates.push(template?);
        }
        Ok(templates)
    }

    /// Deletes a template and everything it owns (rows, then columns, then
    /// sheets, then the template itself) in one transaction.
    pub fn delete_template(&self, template_id: Uuid) -> Result<TemplateMeta> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        let meta = get_template(&tx, template_id)?;
        let id = template_id.to_string();
        tx.execute("DELETE FROM rows WHERE template_id = ?1", params![id])?;
        tx.execute("DELETE FROM columns WHERE template_id = ?1", params![id])?;
        tx.execute("DELETE FROM sheets WHERE template_id = ?1", params![id])?;
        tx.execute("DELETE FROM templates WHERE template_id = ?1", params![id])?;

        tx.commit()?;
        Ok(meta)
    }

    pub fn get_sheet(&self, template_id: Uuid, sheet_no: i64) -> Result<SheetMeta> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        get_sheet(&conn, template_id, sheet_no)
    }

    /// Sheets of a template in ascending `sheet_no` order (submission order).
    pub fn list_sheets(&self, template_id: Uuid) -> Result<Vec<SheetMeta>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT template_id, sheet_no, sheet_name
            FROM sheets
            WHERE template_id = ?1
            ORDER BY sheet_no
            "#,
        )?;
        let rows = stmt.query_map(params![template_id.to_string()], |r| {
            let id: String = r.get(0)?;
            Ok(SheetMeta {
                template_id: parse_uuid(&id)?,
                sheet_no: r.get(1)?,
                sheet_name: r.get(2)?,
            })
        })?;

        let mut sheets = Vec::new();
        for sheet in rows {
            sheets.push(sheet?);
        }
        Ok(sheets)
    }

    /// Columns of a sheet in definition order.
    pub fn list_columns(&self, template_id: Uuid, sheet_no: i64) -> Result<Vec<ColumnMeta>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT template_id, sheet_no, name, column_type, required
            FROM columns
            WHERE template_id = ?1 AND sheet_no = ?2
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![template_id.to_string(), sheet_no], |r| {
            let id: String = r.get(0)?;
            Ok(ColumnMeta {
                template_id: parse_uuid(&id)?,
                sheet_no: r.get(1)?,
                name: r.get(2)?,
                column_type: r.get(3)?,
                required: r.get(4)?,
            })
        })?;

        let mut columns = Vec::new();
        for column in rows {
            columns.push(column?);
        }
        Ok(columns)
    }

    /// Inserts one row. With `Some(n)` the caller-supplied number must be
    /// free within the sheet; `None` appends at the current maximum plus one
    /// (1 for an empty sheet). The number is resolved and the row inserted
    /// inside the same transaction as the existence checks, so concurrent
    /// writers cannot interleave between the max-read and the write.
    pub fn insert_row(
        &self,
        template_id: Uuid,
        sheet_no: i64,
        row_number: Option<i64>,
        data: &RowData,
    ) -> Result<Row> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        ensure_template(&tx, template_id)?;
        ensure_sheet(&tx, template_id, sheet_no)?;

        let row_number = match row_number {
            Some(requested) => {
                if row_number_taken(&tx, template_id, sheet_no, requested)? {
                    return Err(StorageError::DuplicateRowNumber {
                        sheet_no,
                        row_number: requested,
                    });
                }
                requested
            }
            None => next_row_number(&tx, template_id, sheet_no)?,
        };

        let now = Utc::now();
        let row = insert_row(&tx, template_id, sheet_no, row_number, data, now)?;
        touch_template_modified(&tx, template_id, now)?;

        tx.commit()?;
        Ok(row)
    }

    /// Appends a batch of rows with strictly consecutive numbers starting at
    /// the sheet's current maximum plus one, in slice order, as one
    /// transaction. Returns how many rows were staged; every slice element
    /// consumes a number and is counted, so callers filter blank entries
    /// before calling.
    pub fn append_rows(&self, template_id: Uuid, sheet_no: i64, rows: &[RowData]) -> Result<u64> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        ensure_template(&tx, template_id)?;
        ensure_sheet(&tx, template_id, sheet_no)?;

        let start = next_row_number(&tx, template_id, sheet_no)?;
        let now = Utc::now();
        for (offset, data) in rows.iter().enumerate() {
            insert_row(&tx, template_id, sheet_no, start + offset as i64, data, now)?;
        }
        if !rows.is_empty() {
            touch_template_modified(&tx, template_id, now)?;
        }

        tx.commit()?;
        Ok(rows.len() as u64)
    }

    pub fn get_row(&self, row_id: Uuid) -> Result<Row> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        get_row(&conn, row_id)
    }

    /// Replaces a row's data wholesale and refreshes its `updated_at`.
    pub fn update_row(&self, row_id: Uuid, data: &RowData) -> Result<Row> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        let mut row = get_row(&tx, row_id)?;
        let now = Utc::now();
        tx.execute(
            "UPDATE rows SET data = ?1, updated_at = ?2 WHERE row_id = ?3",
            params![
                serde_json::Value::Object(data.clone()),
                now.to_rfc3339(),
                row_id.to_string()
            ],
        )?;
        touch_template_modified(&tx, row.template_id, now)?;

        tx.commit()?;
        row.data = data.clone();
        row.updated_at = now;
        Ok(row)
    }

    /// Removes a row. Deletion is terminal; there is no soft-delete state.
    pub fn delete_row(&self, row_id: Uuid) -> Result<Row> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        let row = get_row(&tx, row_id)?;
        tx.execute(
            "DELETE FROM rows WHERE row_id = ?1",
            params![row_id.to_string()],
        )?;
        touch_template_modified(&tx, row.template_id, Utc::now())?;

        tx.commit()?;
        Ok(row)
    }

    /// Rows of one sheet in ascending `row_number` order, the canonical
    /// order every projection and export builds on.
    pub fn rows_by_sheet(&self, template_id: Uuid, sheet_no: i64) -> Result<Vec<Row>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT row_id, template_id, sheet_no, row_number, data, created_at, updated_at
            FROM rows
            WHERE template_id = ?1 AND sheet_no = ?2
            ORDER BY row_number
            "#,
        )?;
        let rows = stmt.query_map(params![template_id.to_string(), sheet_no], row_from_sql)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Every row of a template, grouped by sheet then row order.
    pub fn rows_by_template(&self, template_id: Uuid) -> Result<Vec<Row>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT row_id, template_id, sheet_no, row_number, data, created_at, updated_at
            FROM rows
            WHERE template_id = ?1
            ORDER BY sheet_no, row_number
            "#,
        )?;
        let rows = stmt.query_map(params![template_id.to_string()], row_from_sql)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn template_exists(conn: &Connection, template_id: Uuid) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM templates WHERE template_id = ?1",
            params![template_id.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn ensure_template(conn: &Connection, template_id: Uuid) -> Result<()> {
    if template_exists(conn, template_id)? {
        Ok(())
    } else {
        Err(StorageError::TemplateNotFound(template_id))
    }
}

fn get_template(conn: &Connection, template_id: Uuid) -> Result<TemplateMeta> {
    let row = conn
        .query_row(
            "SELECT template_id, created_at, modified_at FROM templates WHERE template_id = ?1",
            params![template_id.to_string()],
            template_meta_from_sql,
        )
        .optional()?;
    row.ok_or(StorageError::TemplateNotFound(template_id))
}

fn get_sheet(conn: &Connection, template_id: Uuid, sheet_no: i64) -> Result<SheetMeta> {
    let row = conn
        .query_row(
            r#"
            SELECT template_id, sheet_no, sheet_name
            FROM sheets
            WHERE template_id = ?1 AND sheet_no = ?2
            "#,
            params![template_id.to_string(), sheet_no],
            |r| {
                let id: String = r.get(0)?;
                Ok(SheetMeta {
                    template_id: parse_uuid(&id)?,
                    sheet_no: r.get(1)?,
                    sheet_name: r.get(2)?,
                })
            },
        )
        .optional()?;
    row.ok_or(StorageError::SheetNotFound {
        template_id,
        sheet_no,
    })
}

fn ensure_sheet(conn: &Connection, template_id: Uuid, sheet_no: i64) -> Result<()> {
    get_sheet(conn, template_id, sheet_no).map(|_| ())
}

fn row_number_taken(
    conn: &Connection,
    template_id: Uuid,
    sheet_no: i64,
    row_number: i64,
) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            r#"
            SELECT 1 FROM rows
            WHERE template_id = ?1 AND sheet_no = ?2 AND row_number = ?3
            "#,
            params![template_id.to_string(), sheet_no, row_number],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn next_row_number(conn: &Connection, template_id: Uuid, sheet_no: i64) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(row_number) FROM rows WHERE template_id = ?1 AND sheet_no = ?2",
        params![template_id.to_string(), sheet_no],
        |r| r.get(0),
    )?;
    Ok(max.map_or(1, |m| m + 1))
}

fn insert_row(
    conn: &Connection,
    template_id: Uuid,
    sheet_no: i64,
    row_number: i64,
    data: &RowData,
    now: DateTime<Utc>,
) -> Result<Row> {
    let row = Row {
        row_id: Uuid::now_v7(),
        template_id,
        sheet_no,
        row_number,
        data: data.clone(),
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        r#"
        INSERT INTO rows (row_id, template_id, sheet_no, row_number, data, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            row.row_id.to_string(),
            row.template_id.to_string(),
            row.sheet_no,
            row.row_number,
            serde_json::Value::Object(row.data.clone()),
            row.created_at.to_rfc3339(),
            row.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(row)
}

fn get_row(conn: &Connection, row_id: Uuid) -> Result<Row> {
    let row = conn
        .query_row(
            r#"
            SELECT row_id, template_id, sheet_no, row_number, data, created_at, updated_at
            FROM rows
            WHERE row_id = ?1
            "#,
            params![row_id.to_string()],
            row_from_sql,
        )
        .optional()?;
    row.ok_or(StorageError::RowNotFound(row_id))
}

fn touch_template_modified(
    conn: &Connection,
    template_id: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE templates SET modified_at = ?1 WHERE template_id = ?2",
        params![now.to_rfc3339(), template_id.to_string()],
    )?;
    Ok(())
}

fn template_meta_from_sql(r: &rusqlite::Row<'_>) -> rusqlite::Result<TemplateMeta> {
    let id: String = r.get(0)?;
    let created_at: String = r.get(1)?;
    let modified_at: String = r.get(2)?;
    Ok(TemplateMeta {
        template_id: parse_uuid(&id)?,
        created_at: parse_timestamp(&created_at)?,
        modified_at: parse_timestamp(&modified_at)?,
    })
}

fn row_from_sql(r: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let row_id: String = r.get(0)?;
    let template_id: String = r.get(1)?;
    let data: serde_json::Value = r.get(4)?;
    let data = match data {
        serde_json::Value::Object(map) => map,
        _ => return Err(rusqlite::Error::InvalidQuery),
    };
    let created_at: String = r.get(5)?;
    let updated_at: String = r.get(6)?;
    Ok(Row {
        row_id: parse_uuid(&row_id)?,
        template_id: parse_uuid(&template_id)?,
        sheet_no: r.get(2)?,
        row_number: r.get(3)?,
        data,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_uuid(raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| rusqlite::Error::InvalidQuery)
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}
