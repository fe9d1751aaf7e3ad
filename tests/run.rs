//! Integration tests running the bundled example model end-to-end.
use serde::Deserialize;
use solshade::input::load_model;
use solshade::simulation;
use std::path::PathBuf;

/// Get the path to the bundled example model.
fn get_model_dir() -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "models", "rooftop"]
        .iter()
        .collect()
}

#[derive(Debug, Deserialize)]
struct SunRow {
    #[allow(dead_code)]
    date: String,
    hour: f64,
    azimuth: f64,
    elevation: f64,
    is_daylight: bool,
}

#[derive(Debug, Deserialize)]
struct CellRow {
    intensity: f64,
    bucket: String,
    opacity: f64,
}

#[test]
fn test_run_produces_consistent_outputs() {
    let model = load_model(&get_model_dir()).unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    simulation::run(&model, output_dir.path()).unwrap();

    // The sun track stays within its documented ranges and includes both
    // night and daylight moments across the simulated day
    let mut reader = csv::Reader::from_path(output_dir.path().join("sun_positions.csv")).unwrap();
    let sun_rows: Vec<SunRow> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(sun_rows.len(), 34, "half-hour steps from 05:00 to 22:00");
    for row in &sun_rows {
        assert!((0.0..360.0).contains(&row.azimuth), "azimuth {}", row.azimuth);
        assert!(row.elevation >= 0.0);
        assert!((0.0..24.0).contains(&row.hour));
    }
    assert!(sun_rows.iter().any(|r| r.is_daylight));
    assert!(sun_rows.iter().any(|r| !r.is_daylight));
    // Clamped elevation stays zero while the sun is down
    assert!(
        sun_rows
            .iter()
            .filter(|r| !r.is_daylight)
            .all(|r| r.elevation == 0.0)
    );

    // Per-cell shade: every intensity is a five-sample fraction in [0, 1]
    let mut reader = csv::Reader::from_path(output_dir.path().join("cell_shade.csv")).unwrap();
    let cell_rows: Vec<CellRow> = reader.deserialize().map(Result::unwrap).collect();
    let cells = 9 * 18 * 6;
    assert_eq!(cell_rows.len(), sun_rows.len() * cells);
    for row in &cell_rows {
        assert!((0.0..=1.0).contains(&row.intensity));
        let fifths = row.intensity * 5.0;
        assert!(
            (fifths - fifths.round()).abs() < 1e-9,
            "intensity {} is not a multiple of 1/5",
            row.intensity
        );
        assert!((0.0..=1.0).contains(&row.opacity));
        assert!(!row.bucket.is_empty());
    }
    // The parapets and chimney shade at least part of the array at the low
    // sun angles of early morning and evening
    assert!(cell_rows.iter().any(|r| r.intensity > 0.0));
    assert!(cell_rows.iter().any(|r| r.intensity == 0.0));

    // Placements are written for the renderer
    let mut reader =
        csv::Reader::from_path(output_dir.path().join("panel_placements.csv")).unwrap();
    assert_eq!(reader.records().count(), 9);
    let mut reader =
        csv::Reader::from_path(output_dir.path().join("connector_placements.csv")).unwrap();
    // Two rails after each of the two connected rows
    assert_eq!(reader.records().count(), 4);
}
