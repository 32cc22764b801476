use std::io::{Cursor, Read, Write};

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use sheet_tables::ingestion::{
    analyze_sheet, process, read_sheet, split_tables, ProcessOptions, SheetFallback, SheetSelector,
};
use sheet_tables::types::{ColumnType, Value};

/// Sheets:
/// - `Sales`: two tables separated by a blank row
/// - `Raw`: one all-numeric row (no header)
/// - `Headers`: a single all-text row
/// - `Empty`: nothing
/// - `Dates`: a date column
fn report_xlsx() -> Vec<u8> {
    let mut wb = Workbook::new();

    let ws = wb.add_worksheet();
    ws.set_name("Sales").unwrap();
    ws.write_string(0, 0, "region").unwrap();
    ws.write_string(0, 1, "amount").unwrap();
    ws.write_string(1, 0, "north").unwrap();
    ws.write_number(1, 1, 10).unwrap();
    ws.write_string(2, 0, "south").unwrap();
    ws.write_number(2, 1, 12.5).unwrap();
    ws.write_string(4, 0, "month").unwrap();
    ws.write_string(4, 1, "target").unwrap();
    ws.write_string(5, 0, "jan").unwrap();
    ws.write_number(5, 1, 100).unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Raw").unwrap();
    ws.write_number(0, 0, 1).unwrap();
    ws.write_number(0, 1, 2).unwrap();
    ws.write_number(0, 2, 3).unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Headers").unwrap();
    ws.write_string(0, 0, "a").unwrap();
    ws.write_string(0, 1, "b").unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Empty").unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Dates").unwrap();
    let fmt = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    let noon = ExcelDateTime::from_ymd(2024, 1, 5).unwrap().and_hms(12, 0, 0).unwrap();
    ws.write_string(0, 0, "when").unwrap();
    ws.write_string(0, 1, "what").unwrap();
    ws.write_datetime_with_format(1, 0, &noon, &fmt).unwrap();
    ws.write_string(1, 1, "launch").unwrap();

    wb.save_to_buffer().unwrap()
}

/// Three sheets where the middle one (`Broken`) has a truncated worksheet part: the workbook
/// opens, but that sheet cannot be decoded.
fn workbook_with_broken_sheet() -> Vec<u8> {
    let mut wb = Workbook::new();
    for name in ["Before", "Broken", "After"] {
        let ws = wb.add_worksheet();
        ws.set_name(name).unwrap();
        ws.write_string(0, 0, "id").unwrap();
        ws.write_number(1, 0, 1).unwrap();
    }
    let bytes = wb.save_to_buffer().unwrap();

    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let name = file.name().to_string();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        if name == "xl/worksheets/sheet2.xml" {
            content = br#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c></row><row r="2"><c r="A2"#.to_vec();
        }
        out.start_file(name, SimpleFileOptions::default()).unwrap();
        out.write_all(&content).unwrap();
    }
    out.finish().unwrap().into_inner()
}

#[test]
fn undecodable_sheet_does_not_abort_its_siblings() {
    let bytes = workbook_with_broken_sheet();
    let outcomes = process(&bytes, None, &ProcessOptions::default()).unwrap();

    let names: Vec<&str> = outcomes.iter().map(|o| o.sheet_name.as_str()).collect();
    assert_eq!(names, vec!["Before", "Broken", "After"]);

    let broken = &outcomes[1];
    assert!(broken.error.as_deref().unwrap().contains("Broken"));
    assert!(broken.structure.error.is_some());
    assert_eq!(broken.tables.len(), 1);
    assert!(broken.tables[0].is_degenerate());
    assert_eq!(broken.tables[0].sheet_name, "Broken");

    for ok in [&outcomes[0], &outcomes[2]] {
        assert!(ok.error.is_none());
        assert_eq!(ok.tables.len(), 1);
        assert_eq!(ok.tables[0].columns, vec!["id"]);
        assert_eq!(ok.tables[0].data[0].get("id"), Some(&Value::Int64(1)));
    }
}

#[test]
fn split_tables_keeps_real_segments_around_a_broken_sheet() {
    let bytes = workbook_with_broken_sheet();
    let tables = split_tables(&bytes, None, &ProcessOptions::default());

    let summary: Vec<(&str, bool)> = tables
        .iter()
        .map(|t| (t.sheet_name.as_str(), t.is_degenerate()))
        .collect();
    assert_eq!(summary, vec![("Before", false), ("Broken", true), ("After", false)]);
    assert_eq!(tables[2].rows_count, 1);
}

#[test]
fn process_all_sheets_in_order() {
    let bytes = report_xlsx();
    let outcomes = process(&bytes, None, &ProcessOptions::default()).unwrap();

    let names: Vec<&str> = outcomes.iter().map(|o| o.sheet_name.as_str()).collect();
    assert_eq!(names, vec!["Sales", "Raw", "Headers", "Empty", "Dates"]);
    assert!(outcomes.iter().all(|o| o.error.is_none()));

    let sales = &outcomes[0];
    assert_eq!(sales.tables.len(), 2);
    assert_eq!((sales.tables[0].start_row, sales.tables[0].end_row), (0, 3));
    assert_eq!(sales.tables[0].columns, vec!["region", "amount"]);
    assert_eq!(sales.tables[0].rows_count, 2);
    assert_eq!(sales.tables[0].data[1].get("amount"), Some(&Value::Float64(12.5)));
    assert_eq!((sales.tables[1].start_row, sales.tables[1].end_row), (4, 6));
    assert_eq!(sales.tables[1].columns, vec!["month", "target"]);
    assert_eq!(sales.tables[1].data[0].get("target"), Some(&Value::Int64(100)));

    let raw = &outcomes[1];
    assert_eq!(raw.tables[0].columns, vec!["Column 1", "Column 2", "Column 3"]);
    assert_eq!(raw.tables[0].rows_count, 1);

    let headers = &outcomes[2];
    assert_eq!(headers.tables.len(), 1);
    assert_eq!(headers.tables[0].rows_count, 0);

    let empty = &outcomes[3];
    assert!(empty.tables.is_empty());
    assert!(!empty.structure.has_data);
}

#[test]
fn process_selected_sheet_only() {
    let bytes = report_xlsx();
    let sel = SheetSelector::from("Raw");
    let outcomes = process(&bytes, Some(&sel), &ProcessOptions::default()).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].sheet_name, "Raw");
    assert_eq!(outcomes[0].structure.columns(), vec!["Column 1", "Column 2", "Column 3"]);
}

#[test]
fn missing_sheet_is_reported_per_sheet_not_fatal() {
    let bytes = report_xlsx();
    let sel = SheetSelector::from("Nope");
    let outcomes = process(&bytes, Some(&sel), &ProcessOptions::default()).unwrap();

    assert_eq!(outcomes.len(), 1);
    let o = &outcomes[0];
    assert_eq!(o.sheet_name, "Nope");
    assert!(o.error.as_deref().unwrap().contains("sheet 'Nope' not found"));
    assert!(o.structure.error.is_some());
    assert!(!o.structure.has_data);
    assert!(o.tables[0].is_degenerate());
}

#[test]
fn first_sheet_fallback_is_opt_in() {
    let bytes = report_xlsx();
    let sel = SheetSelector::from("Nope");
    let opts = ProcessOptions {
        sheet_fallback: SheetFallback::FirstSheet,
        ..Default::default()
    };
    let outcomes = process(&bytes, Some(&sel), &opts).unwrap();
    assert_eq!(outcomes[0].sheet_name, "Sales");
    assert!(outcomes[0].error.is_none());
}

#[test]
fn unreadable_workbook_fails_whole_request() {
    let err = process(b"\x00\x01garbage", None, &ProcessOptions::default()).unwrap_err();
    assert!(matches!(err, sheet_tables::SheetError::UnreadableWorkbook { .. }));
}

#[test]
fn split_tables_never_fails() {
    let tables = split_tables(b"garbage", Some(&SheetSelector::Index(0)), &ProcessOptions::default());
    assert_eq!(tables.len(), 1);
    assert!(tables[0].is_degenerate());
    assert_eq!(tables[0].sheet_name, "0");
    assert_eq!(tables[0].rows_count, 0);
    assert!(tables[0].columns.is_empty());
    assert!(tables[0].data.is_empty());

    let tables = split_tables(b"garbage", None, &ProcessOptions::default());
    assert_eq!(tables.len(), 1);
    assert!(tables[0].is_degenerate());
}

#[test]
fn split_tables_across_all_sheets() {
    let bytes = report_xlsx();
    let tables = split_tables(&bytes, None, &ProcessOptions::default());

    let summary: Vec<(&str, usize)> = tables
        .iter()
        .map(|t| (t.sheet_name.as_str(), t.table_index))
        .collect();
    assert_eq!(
        summary,
        vec![("Sales", 0), ("Sales", 1), ("Raw", 0), ("Headers", 0), ("Dates", 0)]
    );
}

#[test]
fn read_sheet_returns_flat_records_when_present() {
    let bytes = report_xlsx();
    let read = read_sheet(&bytes, &SheetSelector::from("Sales"), &ProcessOptions::default()).unwrap();

    assert!(!read.is_empty);
    assert!(!read.multiple_tables);
    assert!(read.tables.is_none());
    let data = read.data.unwrap();
    assert_eq!(data.len(), 5);
    assert_eq!(data[0].get("region"), Some(&Value::from("north")));
    assert_eq!(data[2].get("region"), Some(&Value::Null));
    assert_eq!(data[3].get("amount"), Some(&Value::from("target")));
}

#[test]
fn read_sheet_falls_back_to_segmentation_when_flat_read_is_empty() {
    let bytes = report_xlsx();
    let read = read_sheet(&bytes, &SheetSelector::from("Headers"), &ProcessOptions::default()).unwrap();

    assert!(read.is_empty);
    assert!(read.multiple_tables);
    assert!(read.data.is_none());
    let tables = read.tables.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].columns, vec!["a", "b"]);

    let read = read_sheet(&bytes, &SheetSelector::from("Empty"), &ProcessOptions::default()).unwrap();
    assert_eq!(read.tables, Some(Vec::new()));
}

#[test]
fn analyze_sheet_reports_types_and_never_fails() {
    let bytes = report_xlsx();
    let report = analyze_sheet(&bytes, &SheetSelector::from("Dates"), &ProcessOptions::default());
    assert!(report.has_data);
    assert_eq!(report.profile("when").unwrap().column_type, ColumnType::Datetime);

    let failed = analyze_sheet(&bytes, &SheetSelector::Index(42), &ProcessOptions::default());
    assert!(!failed.has_data);
    assert!(failed.error.unwrap().contains("out of range"));
}

#[test]
fn segment_serializes_with_one_schema() {
    let bytes = report_xlsx();
    let sel = SheetSelector::from("Dates");
    let tables = split_tables(&bytes, Some(&sel), &ProcessOptions::default());

    let value = serde_json::to_value(&tables[0]).unwrap();
    assert_eq!(
        value,
        json!({
            "sheet_name": "Dates",
            "table_index": 0,
            "start_row": 0,
            "end_row": 2,
            "columns": ["when", "what"],
            "rows_count": 1,
            "header_promoted": true,
            "data": [{"when": "2024-01-05T12:00:00", "what": "launch"}],
        })
    );

    let broken = split_tables(&bytes, Some(&SheetSelector::from("Nope")), &ProcessOptions::default());
    let value = serde_json::to_value(&broken[0]).unwrap();
    assert!(value["error"].as_str().unwrap().contains("not found"));
    assert_eq!(value["data"], json!([]));
    assert_eq!(value["rows_count"], json!(0));
}

#[test]
fn structure_report_serializes_column_maps_in_order() {
    let bytes = report_xlsx();
    let report = analyze_sheet(&bytes, &SheetSelector::from("Sales"), &ProcessOptions::default());
    let text = serde_json::to_string(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["columns"], json!(["region", "amount"]));
    assert_eq!(value["rows_count"], json!(5));
    assert_eq!(value["columns_count"], json!(2));
    assert_eq!(value["has_data"], json!(true));
    assert_eq!(value["missing_values"], json!({"region": 1, "amount": 1}));
    assert_eq!(value["dtypes"]["region"], json!("mixed"));
    assert!(value.get("error").is_none());
    assert!(text.find("\"region\"").unwrap() < text.find("\"amount\"").unwrap());
}
