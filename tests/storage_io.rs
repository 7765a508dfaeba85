use bdl_rs::models::{JoinedRecord, Observation};
use bdl_rs::reshape::{WideRow, WideTable};
use bdl_rs::storage;
use std::fs;
use tempfile::tempdir;

fn table() -> WideTable {
    WideTable {
        index_columns: vec!["unit_id".into(), "unit_name".into()],
        category_columns: vec!["2022".into(), "2023".into()],
        rows: vec![
            WideRow {
                index: vec![Some("U1".into()), Some("Town".into())],
                cells: vec![Some(100.0), Some(110.5)],
            },
            WideRow {
                index: vec![Some("U2".into()), Some("Gmina, wieś".into())],
                cells: vec![None, Some(3.0)],
            },
        ],
    }
}

#[test]
fn wide_csv_starts_with_bom_and_has_no_row_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out/all_data.csv");
    storage::save_wide_csv(&table(), &path, true).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let txt = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(
        txt,
        "unit_id,unit_name,2022,2023\nU1,Town,100,110.5\nU2,\"Gmina, wieś\",,3\n"
    );
}

#[test]
fn wide_csv_without_bom_is_plain_utf8() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("all_data.csv");
    storage::save_wide_csv(&table(), &path, false).unwrap();
    let txt = fs::read_to_string(&path).unwrap();
    assert!(txt.starts_with("unit_id,unit_name,"));
    assert_eq!(txt.lines().count(), 3);
}

#[test]
fn long_csv_has_one_line_per_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("long.csv");
    let rec = JoinedRecord {
        observation: Observation {
            unit_id: "U1".into(),
            unit_name: "Town".into(),
            variable_id: "7".into(),
            year: 2020,
            value: Some(1.25),
        },
        variable_name: None,
        variable_unit: None,
        variable_subject_id: None,
    };
    storage::save_long_csv(&[rec.clone(), rec], &path).unwrap();
    let txt = fs::read_to_string(&path).unwrap();
    let mut lines = txt.lines();
    assert_eq!(
        lines.next().unwrap(),
        "unit_id,unit_name,variable_id,year,value,variable_name,variable_unit,variable_subject_id"
    );
    assert_eq!(lines.next().unwrap(), "U1,Town,7,2020,1.25,,,");
    assert_eq!(txt.lines().count(), 3);
}

// Cells starting with '=', '+' or '@' are executed as formulas by spreadsheet tools.
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inj.csv");
    let t = WideTable {
        index_columns: vec!["unit_id".into(), "unit_name".into()],
        category_columns: vec!["=HYPERLINK(\"http://evil\")".into()],
        rows: vec![WideRow {
            index: vec![Some("U1".into()), Some("@foo".into())],
            cells: vec![Some(1.0)],
        }],
    };
    storage::save_wide_csv(&t, &path, false).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert!(headers[2].starts_with('\''), "header not prefixed: {}", &headers[2]);
    let row = rdr.records().next().unwrap().unwrap();
    assert_eq!(&row[1], "'@foo");
    assert_eq!(&row[2], "1");
}

#[test]
fn unwritable_path_is_io_error() {
    let dir = tempdir().unwrap();
    // A regular file where a directory is expected.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let err = storage::save_wide_csv(&table(), blocker.join("all_data.csv"), true).unwrap_err();
    assert!(matches!(err, bdl_rs::Error::Io { .. }), "got {err:?}");
}
