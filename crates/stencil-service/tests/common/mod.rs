use stencil_model::{ColumnDef, RowData, SheetDef, TemplateDefinition};
use stencil_service::{RowService, TemplateService};
use stencil_storage::Storage;

pub fn services() -> (TemplateService, RowService) {
    let storage = Storage::open_in_memory().expect("open storage");
    (
        TemplateService::new(storage.clone()),
        RowService::new(storage),
    )
}

pub fn row_data(value: serde_json::Value) -> RowData {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

fn column(name: &str, column_type: &str, required: bool) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        column_type: column_type.to_string(),
        required,
    }
}

/// A realistic three-sheet workbook shape: sales, employees, inventory.
pub fn sample_definition() -> TemplateDefinition {
    TemplateDefinition {
        sheets: vec![
            SheetDef {
                sheet_no: 1,
                sheet_name: "Sales Data".to_string(),
                columns: vec![
                    column("Date", "date", true),
                    column("Product", "text", true),
                    column("Units", "number", false),
                    column("Price", "number", false),
                ],
            },
            SheetDef {
                sheet_no: 2,
                sheet_name: "Employee Info".to_string(),
                columns: vec![
                    column("Employee ID", "text", true),
                    column("Name", "text", true),
                    column("Department", "text", false),
                ],
            },
            SheetDef {
                sheet_no: 3,
                sheet_name: "Inventory".to_string(),
                columns: vec![
                    column("Item Code", "text", true),
                    column("Quantity", "number", false),
                    column("Status", "text", false),
                ],
            },
        ],
    }
}
