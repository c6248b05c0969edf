mod common;

use ndarray::array;

use common::test_grid;
use lakewatch_core::analysis::reclassify::{reclassify, water_table, ReclassRule, ReclassTable};
use lakewatch_core::analysis::zonal::{zonal_histogram, ClassValue, Zone, ZoneDef};
use lakewatch_core::raster::Raster;

// ---------------------------------------------------------------------------
// reclassify
// ---------------------------------------------------------------------------

#[test]
fn test_water_table_boundaries() {
    let ndwi = Raster::new(array![[-0.5f32, 0.0], [0.0001, 1.0], [-1.0, 1.5]]);
    let classes = reclassify(&ndwi, &water_table());
    assert_eq!(classes.get(0, 0), Some(0.0));
    // Upper bound is inclusive, lower bound exclusive.
    assert_eq!(classes.get(0, 1), Some(0.0));
    assert_eq!(classes.get(1, 0), Some(1.0));
    assert_eq!(classes.get(1, 1), Some(1.0));
    // Outside every range: the value passes through unchanged.
    assert_eq!(classes.get(2, 0), Some(-1.0));
    assert_eq!(classes.get(2, 1), Some(1.5));
}

#[test]
fn test_reclassify_nodata_for_missing() {
    let ndwi = Raster::new(array![[-1.0f32, 1.5, 0.5]]);
    let mut table = water_table();
    table.nodata_for_missing = true;
    let classes = reclassify(&ndwi, &table);
    assert_eq!(classes.get(0, 0), None);
    assert_eq!(classes.get(0, 1), None);
    assert_eq!(classes.get(0, 2), Some(1.0));
}

#[test]
fn test_reclass_table_from_json_defaults_to_passthrough() {
    let json = r#"{"rules": [{"min": -1.0, "max": 0.0, "value": 0.0}]}"#;
    let table: ReclassTable = serde_json::from_str(json).unwrap();
    assert!(!table.nodata_for_missing);
    assert_eq!(table.rules.len(), 1);
}

#[test]
fn test_reclassify_keeps_nodata() {
    let ndwi = Raster::new(array![[f32::NAN, 0.4]]);
    let classes = reclassify(&ndwi, &water_table());
    assert_eq!(classes.get(0, 0), None);
    assert_eq!(classes.get(0, 1), Some(1.0));
}

#[test]
fn test_reclassify_first_rule_wins() {
    let table = ReclassTable::new(vec![
        ReclassRule { min: 0.0, max: 10.0, value: 1.0 },
        ReclassRule { min: 5.0, max: 10.0, value: 2.0 },
    ]);
    let classes = reclassify(&Raster::filled((1, 1), 7.0), &table);
    assert_eq!(classes.get(0, 0), Some(1.0));
}

// ---------------------------------------------------------------------------
// zonal_histogram
// ---------------------------------------------------------------------------

#[test]
fn test_zonal_histogram_counts_per_zone() {
    let grid = test_grid(2, 4);
    let classes = Raster::new(array![[1.0f32, 1.0, 0.0, f32::NAN], [1.0, 0.0, 0.0, 0.0]]);
    let zones: Vec<Zone> = [
        ZoneDef {
            name: "west".into(),
            exterior: vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]],
        },
        ZoneDef {
            name: "east".into(),
            exterior: vec![[2.0, 0.0], [4.0, 0.0], [4.0, 2.0], [2.0, 2.0]],
        },
    ]
    .iter()
    .map(Zone::from)
    .collect();

    let histograms = zonal_histogram(&classes, &grid, &zones).unwrap();
    assert_eq!(histograms.len(), 2);

    let west = &histograms[0];
    assert_eq!(west.zone, "west");
    assert_eq!(west.counts.get(&ClassValue(1.0)), Some(&3));
    assert_eq!(west.counts.get(&ClassValue(0.0)), Some(&1));
    assert_eq!(west.nodata, 0);

    let east = &histograms[1];
    assert_eq!(east.counts.get(&ClassValue(0.0)), Some(&3));
    assert_eq!(east.counts.get(&ClassValue(1.0)), None);
    assert_eq!(east.nodata, 1);
    assert_eq!(east.total(), 4);
}

#[test]
fn test_zonal_histogram_counts_unmatched_values_separately() {
    let grid = test_grid(1, 3);
    let ndwi = Raster::new(array![[-1.0f32, 0.4, 1.5]]);
    let zones = vec![Zone::from(&ZoneDef {
        name: "all".into(),
        exterior: vec![[0.0, 0.0], [3.0, 0.0], [3.0, 1.0], [0.0, 1.0]],
    })];

    let classes = reclassify(&ndwi, &water_table());
    let histograms = zonal_histogram(&classes, &grid, &zones).unwrap();
    let all = &histograms[0];
    assert_eq!(all.counts.get(&ClassValue(-1.0)), Some(&1));
    assert_eq!(all.counts.get(&ClassValue(1.0)), Some(&1));
    assert_eq!(all.counts.get(&ClassValue(1.5)), Some(&1));
    assert_eq!(all.nodata, 0);
}

#[test]
fn test_zonal_histogram_shape_mismatch() {
    let grid = test_grid(2, 2);
    let zones = vec![Zone::from(&ZoneDef {
        name: "z".into(),
        exterior: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
    })];
    assert!(zonal_histogram(&Raster::filled((3, 3), 1.0), &grid, &zones).is_err());
}

#[test]
fn test_zone_defs_from_json() {
    let json = r#"[{"name": "dam", "exterior": [[0, 0], [1, 0], [1, 1]]}]"#;
    let defs: Vec<ZoneDef> = serde_json::from_str(json).unwrap();
    assert_eq!(defs[0].name, "dam");
    assert_eq!(defs[0].exterior.len(), 3);
}
