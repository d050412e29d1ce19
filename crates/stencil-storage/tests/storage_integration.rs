use pretty_assertions::assert_eq;
use serde_json::json;
use stencil_model::{ColumnDef, RowData, SheetDef, TemplateDefinition};
use stencil_storage::{Storage, StorageError};
use uuid::Uuid;

fn definition() -> TemplateDefinition {
    TemplateDefinition {
        sheets: vec![
            SheetDef {
                sheet_no: 1,
                sheet_name: "Sales Data".to_string(),
                columns: vec![
                    ColumnDef {
                        name: "Date".to_string(),
                        column_type: "date".to_string(),
                        required: true,
                    },
                    ColumnDef {
                        name: "Product".to_string(),
                        column_type: "text".to_string(),
                        required: false,
                    },
                ],
            },
            SheetDef {
                sheet_no: 2,
                sheet_name: "Inventory".to_string(),
                columns: vec![ColumnDef {
                    name: "Item Code".to_string(),
                    column_type: "text".to_string(),
                    required: true,
                }],
            },
        ],
    }
}

fn row_data(value: serde_json::Value) -> RowData {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[test]
fn template_round_trip_shared_memory() {
    // Use a shared in-memory database so we can open a second handle and
    // simulate another request handler seeing the committed state.
    let uri = "file:template_round_trip?mode=memory&cache=shared";

    let storage1 = Storage::open_uri(uri).expect("open storage");
    let template = storage1
        .create_template(&definition())
        .expect("create template");

    let storage2 = Storage::open_uri(uri).expect("open second storage");
    let sheets = storage2
        .list_sheets(template.template_id)
        .expect("list sheets");
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].sheet_name, "Sales Data");
    assert_eq!(sheets[1].sheet_name, "Inventory");

    let columns = storage2
        .list_columns(template.template_id, 1)
        .expect("list columns");
    assert_eq!(
        columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["Date", "Product"]
    );
    assert!(columns[0].required);
    assert_eq!(columns[1].column_type, "text");

    std::mem::drop(storage1);
}

#[test]
fn explicit_row_numbers_list_in_ascending_order() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    for number in [1, 3, 2] {
        storage
            .insert_row(
                template.template_id,
                1,
                Some(number),
                &row_data(json!({"Product": format!("P{number}")})),
            )
            .expect("insert row");
    }

    let rows = storage
        .rows_by_sheet(template.template_id, 1)
        .expect("rows by sheet");
    assert_eq!(
        rows.iter().map(|r| r.row_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn auto_numbering_appends_after_current_max() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    storage
        .insert_row(
            template.template_id,
            1,
            Some(5),
            &row_data(json!({"Product": "explicit"})),
        )
        .expect("insert explicit");
    let appended = storage
        .insert_row(
            template.template_id,
            1,
            None,
            &row_data(json!({"Product": "appended"})),
        )
        .expect("insert appended");
    assert_eq!(appended.row_number, 6);

    // An empty sheet starts numbering at 1.
    let first = storage
        .insert_row(template.template_id, 2, None, &row_data(json!({"Item Code": "ITEM001"})))
        .expect("insert into empty sheet");
    assert_eq!(first.row_number, 1);
}

#[test]
fn duplicate_row_number_is_rejected_without_writing() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    storage
        .insert_row(template.template_id, 1, Some(1), &row_data(json!({"a": 1})))
        .expect("insert row");
    let err = storage
        .insert_row(template.template_id, 1, Some(1), &row_data(json!({"b": 2})))
        .expect_err("duplicate");

    match err {
        StorageError::DuplicateRowNumber {
            sheet_no,
            row_number,
        } => {
            assert_eq!(sheet_no, 1);
            assert_eq!(row_number, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let rows = storage
        .rows_by_sheet(template.template_id, 1)
        .expect("rows by sheet");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].data, row_data(json!({"a": 1})));
}

#[test]
fn batch_append_assigns_consecutive_numbers() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    storage
        .insert_row(template.template_id, 1, Some(2), &row_data(json!({"seed": true})))
        .expect("seed row");

    let batch = vec![
        row_data(json!({"Product": "A"})),
        row_data(json!({"Product": "B"})),
        row_data(json!({"Product": "C"})),
    ];
    let accepted = storage
        .append_rows(template.template_id, 1, &batch)
        .expect("append rows");
    assert_eq!(accepted, 3);

    let rows = storage
        .rows_by_sheet(template.template_id, 1)
        .expect("rows by sheet");
    assert_eq!(
        rows.iter().map(|r| r.row_number).collect::<Vec<_>>(),
        vec![2, 3, 4, 5]
    );
}

#[test]
fn batch_append_on_missing_references_is_not_found() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    let err = storage
        .append_rows(Uuid::now_v7(), 1, &[row_data(json!({"a": 1}))])
        .expect_err("unknown template");
    assert!(matches!(err, StorageError::TemplateNotFound(_)));

    let err = storage
        .append_rows(template.template_id, 99, &[row_data(json!({"a": 1}))])
        .expect_err("unknown sheet");
    match err {
        StorageError::SheetNotFound { sheet_no, .. } => assert_eq!(sheet_no, 99),
        other => panic!("unexpected error: {other:?}"),
    }

    let rows = storage
        .rows_by_sheet(template.template_id, 1)
        .expect("rows by sheet");
    assert!(rows.is_empty());
}

#[test]
fn update_replaces_data_wholesale() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    let row = storage
        .insert_row(template.template_id, 1, None, &row_data(json!({"a": 1})))
        .expect("insert row");
    let updated = storage
        .update_row(row.row_id, &row_data(json!({"b": 2})))
        .expect("update row");
    assert_eq!(updated.data, row_data(json!({"b": 2})));

    let reloaded = storage.get_row(row.row_id).expect("reload row");
    assert_eq!(reloaded.data, row_data(json!({"b": 2})));
    assert!(reloaded.data.get("a").is_none());
    assert!(reloaded.updated_at > reloaded.created_at);
}

#[test]
fn delete_row_is_terminal() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    let row = storage
        .insert_row(template.template_id, 1, None, &row_data(json!({"a": 1})))
        .expect("insert row");
    storage.delete_row(row.row_id).expect("delete row");

    let err = storage.get_row(row.row_id).expect_err("row gone");
    assert!(matches!(err, StorageError::RowNotFound(_)));
}

#[test]
fn delete_template_cascades_to_everything_it_owns() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");
    let row = storage
        .insert_row(template.template_id, 1, None, &row_data(json!({"a": 1})))
        .expect("insert row");

    storage
        .delete_template(template.template_id)
        .expect("delete template");

    let err = storage
        .get_template(template.template_id)
        .expect_err("template gone");
    assert!(matches!(err, StorageError::TemplateNotFound(_)));
    let err = storage.get_row(row.row_id).expect_err("row gone");
    assert!(matches!(err, StorageError::RowNotFound(_)));
    assert!(storage
        .list_sheets(template.template_id)
        .expect("list sheets")
        .is_empty());
    assert!(storage
        .list_columns(template.template_id, 1)
        .expect("list columns")
        .is_empty());
}

#[test]
fn row_mutations_touch_template_modified_at() {
    let storage = Storage::open_in_memory().expect("open storage");
    let template = storage
        .create_template(&definition())
        .expect("create template");

    storage
        .insert_row(template.template_id, 1, None, &row_data(json!({"a": 1})))
        .expect("insert row");

    let reloaded = storage
        .get_template(template.template_id)
        .expect("reload template");
    assert_eq!(reloaded.created_at, template.created_at);
    assert!(reloaded.modified_at > template.modified_at);
}

#[test]
fn templates_list_newest_first() {
    let storage = Storage::open_in_memory().expect("open storage");
    let first = storage
        .create_template(&definition())
        .expect("create first");
    let second = storage
        .create_template(&definition())
        .expect("create second");

    let listed = storage.list_templates().expect("list templates");
    assert_eq!(
        listed.iter().map(|t| t.template_id).collect::<Vec<_>>(),
        vec![second.template_id, first.template_id]
    );
}

#[test]
fn persists_to_a_file_on_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("templates.db");

    let template_id = {
        let storage = Storage::open_path(&path).expect("open storage");
        let template = storage
            .create_template(&definition())
            .expect("create template");
        storage
            .insert_row(template.template_id, 1, None, &row_data(json!({"Product": "A"})))
            .expect("insert row");
        template.template_id
    };

    let storage = Storage::open_path(&path).expect("reopen storage");
    let rows = storage.rows_by_sheet(template_id, 1).expect("rows by sheet");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].data, row_data(json!({"Product": "A"})));
}
