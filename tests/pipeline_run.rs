mod common;

use bdl_rs::config::Config;
use bdl_rs::{Error, IdSource, Pipeline, PivotSpec};
use common::FakeSource;
use std::fs;
use tempfile::tempdir;

const KRAKOW: &str = r#"{
  "unitId": "011212001011", "unitName": "Kraków",
  "results": [
    {"id": 1, "values": [{"year": "2023", "val": 802583}]},
    {"id": 2, "values": [{"year": "2023", "val": 32685}]}
  ]
}"#;

const TARNOW: &str = r#"{
  "unitId": "011216201011", "unitName": "Tarnów",
  "results": [
    {"id": 1, "values": [{"year": "2023", "val": 105922}]}
  ]
}"#;

fn source() -> FakeSource {
    FakeSource::new()
        .with_variable(r#"{"id":1,"subjectId":"P2137","n1":"ludność","n2":"ogółem","measureUnitName":"osoba"}"#)
        .with_variable(r#"{"id":2,"subjectId":"P1","n1":"powierzchnia","measureUnitName":"ha"}"#)
        .with_unit("011212001011", KRAKOW)
        .with_unit("011216201011", TARNOW)
}

fn config(dir: &std::path::Path) -> Config {
    Config {
        unit_ids: IdSource::Inline(vec!["011212001011".into(), "011216201011".into()]),
        variable_ids: IdSource::Inline(vec!["1".into(), "2".into()]),
        years: vec![2023],
        catalog_path: dir.join("data/variables.csv"),
        output_path: dir.join("data/all_data.csv"),
        long_output_path: Some(dir.join("data/long.csv")),
        ..Config::default()
    }
}

#[test]
fn full_run_writes_catalog_and_wide_table() {
    let dir = tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.pivot = PivotSpec::by_variable_label();
    let pipeline = Pipeline::new(source(), cfg);
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.catalog.len(), 2);
    assert_eq!(summary.observations, 3);
    assert_eq!(summary.table.rows.len(), 2);

    let bytes = fs::read(dir.path().join("data/all_data.csv")).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let txt = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let lines: Vec<&str> = txt.lines().collect();
    assert_eq!(
        lines,
        vec![
            "unit_name,unit_id,[P1/2] powierzchnia [ha],[P2137/1] ludność - ogółem [osoba]",
            "Kraków,011212001011,32685,802583",
            "Tarnów,011216201011,,105922",
        ]
    );

    assert!(dir.path().join("data/variables.csv").exists());
    let long = fs::read_to_string(dir.path().join("data/long.csv")).unwrap();
    assert_eq!(long.lines().count(), 4);
}

#[test]
fn default_layout_handles_several_years_per_variable() {
    let dir = tempdir().unwrap();
    let src = FakeSource::new()
        .with_variable(r#"{"id":1,"subjectId":"P1","n1":"ludnosc","measureUnitName":"osoba"}"#)
        .with_unit(
            "U1",
            r#"{"unitId":"U1","unitName":"Town","results":[
                {"id":1,"values":[{"year":"2022","val":100},{"year":"2023","val":110}]}
            ]}"#,
        );
    let defaults = Config::default();
    let cfg = Config {
        unit_ids: IdSource::Inline(vec!["U1".into()]),
        variable_ids: IdSource::Inline(vec!["1".into()]),
        catalog_path: dir.path().join("variables.csv"),
        output_path: dir.path().join("all_data.csv"),
        ..defaults
    };
    assert!(cfg.years.is_empty());

    let pipeline = Pipeline::new(src, cfg);
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.observations, 2);
    assert_eq!(summary.table.melt().len(), 2);
    assert_eq!(pipeline.source().unit_requests()[0].2, Vec::<i32>::new());

    let bytes = fs::read(dir.path().join("all_data.csv")).unwrap();
    let txt = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let lines: Vec<&str> = txt.lines().collect();
    assert_eq!(
        lines,
        vec![
            "unit_name,unit_id,year,[P1/1] ludnosc [osoba]",
            "Town,U1,2022,100",
            "Town,U1,2023,110",
        ]
    );
}

#[test]
fn every_unit_gets_the_catalog_ids_and_year_filter() {
    let dir = tempdir().unwrap();
    let pipeline = Pipeline::new(source(), config(dir.path()));
    pipeline.run().unwrap();

    let requests = pipeline.source().unit_requests();
    assert_eq!(requests.len(), 2);
    for (i, unit) in ["011212001011", "011216201011"].iter().enumerate() {
        assert_eq!(requests[i].0, *unit);
        assert_eq!(requests[i].1, vec!["1", "2"]);
        assert_eq!(requests[i].2, vec![2023]);
    }
    assert_eq!(pipeline.source().variable_calls(), vec!["1", "2"]);
}

#[test]
fn failing_unit_aborts_without_output() {
    let dir = tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.unit_ids = IdSource::Inline(vec!["011212001011".into(), "missing".into()]);
    let err = Pipeline::new(source(), cfg).run().unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(!dir.path().join("data/all_data.csv").exists());
    // the catalog is persisted before any unit is fetched
    assert!(dir.path().join("data/variables.csv").exists());
}

#[test]
fn year_layout_with_many_variables_reports_duplicate_keys() {
    let dir = tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.pivot = PivotSpec::by_year();
    let err = Pipeline::new(source(), cfg).run().unwrap_err();
    assert!(matches!(err, Error::Integrity { .. }), "got {err:?}");
}
