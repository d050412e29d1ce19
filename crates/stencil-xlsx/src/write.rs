use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};

use stencil_model::{ExportSheet, RowData};
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Writes one worksheet per export sheet into an XLSX byte buffer.
///
/// Column headers are derived from the keys present in the row data, in
/// first-seen order across the sheet's rows; cells are written as inline
/// strings, numbers, or booleans. Part ordering is deterministic.
pub fn write_workbook(sheets: &[ExportSheet]) -> Result<Vec<u8>, ExportError> {
    let parts = build_parts(sheets);

    let cursor = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(cursor);
    let options =
        FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in &parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn build_parts(sheets: &[ExportSheet]) -> BTreeMap<String, Vec<u8>> {
    let mut parts = BTreeMap::new();

    parts.insert(
        "_rels/.rels".to_string(),
        package_rels_xml().into_bytes(),
    );
    parts.insert(
        "[Content_Types].xml".to_string(),
        content_types_xml(sheets.len()).into_bytes(),
    );
    parts.insert(
        "xl/workbook.xml".to_string(),
        workbook_xml(sheets).into_bytes(),
    );
    parts.insert(
        "xl/_rels/workbook.xml.rels".to_string(),
        workbook_rels_xml(sheets.len()).into_bytes(),
    );
    parts.insert("xl/styles.xml".to_string(), styles_xml().into_bytes());

    for (idx, sheet) in sheets.iter().enumerate() {
        parts.insert(
            format!("xl/worksheets/sheet{}.xml", idx + 1),
            worksheet_xml(sheet).into_bytes(),
        );
    }

    parts
}

fn package_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>
"#
    .to_owned()
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    for idx in 0..sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            idx + 1
        ));
    }
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

fn workbook_xml(sheets: &[ExportSheet]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    xml.push_str("<sheets>");
    for (idx, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_attr(&sheet.name),
            idx + 1,
            idx + 1
        ));
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for idx in 0..sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            idx + 1,
            idx + 1
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn styles_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    xml.push('\n');
    xml.push_str(r#"  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#);
    xml.push('\n');
    xml.push_str(r#"  <fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#);
    xml.push('\n');
    xml.push_str(r#"  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#);
    xml.push('\n');
    xml.push_str(r#"  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
    xml.push('\n');
    xml.push_str(r#"  <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#);
    xml.push('\n');
    xml.push_str(r#"  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    xml.push('\n');
    xml.push_str("</styleSheet>\n");
    xml
}

fn worksheet_xml(sheet: &ExportSheet) -> String {
    let headers = derive_headers(&sheet.rows);

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str("<sheetData>");

    if !headers.is_empty() {
        xml.push_str(r#"<row r="1">"#);
        for (col, header) in headers.iter().enumerate() {
            push_inline_string_cell(&mut xml, 1, col, header);
        }
        xml.push_str("</row>");
    }

    for (row_idx, data) in sheet.rows.iter().enumerate() {
        let row_ref = row_idx + 2;
        xml.push_str(&format!(r#"<row r="{row_ref}">"#));
        for (col, header) in headers.iter().enumerate() {
            match data.get(header) {
                None | Some(serde_json::Value::Null) => {}
                Some(serde_json::Value::Number(n)) => push_number_cell(&mut xml, row_ref, col, n),
                Some(serde_json::Value::Bool(b)) => push_bool_cell(&mut xml, row_ref, col, *b),
                Some(serde_json::Value::String(s)) => {
                    push_inline_string_cell(&mut xml, row_ref, col, s)
                }
                // Nested arrays/objects degrade to their JSON text.
                Some(other) => push_inline_string_cell(&mut xml, row_ref, col, &other.to_string()),
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData>");
    xml.push_str("</worksheet>");
    xml
}

/// Header order is the first-seen order of keys across the sheet's rows.
fn derive_headers(rows: &[RowData]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

fn push_inline_string_cell(xml: &mut String, row: usize, col: usize, value: &str) {
    xml.push_str(&format!(
        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
        cell_ref(row, col),
        escape_text(value)
    ));
}

fn push_number_cell(xml: &mut String, row: usize, col: usize, value: &serde_json::Number) {
    xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref(row, col), value));
}

fn push_bool_cell(xml: &mut String, row: usize, col: usize, value: bool) {
    xml.push_str(&format!(
        r#"<c r="{}" t="b"><v>{}</v></c>"#,
        cell_ref(row, col),
        if value { 1 } else { 0 }
    ));
}

/// A1-style reference for a 1-based row and 0-based column index.
fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", col_letters(col), row)
}

fn col_letters(mut col: usize) -> String {
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('\"', "&quot;")
        .replace('\'', "&apos;")
}
