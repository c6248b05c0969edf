mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_relative_eq;
use chrono::Datelike;
use ndarray::Array2;

use common::{date, landsat_scene, s2_config, s2_scene, test_grid, utc};
use lakewatch_core::composite::{Composite, CompositeBands, Compositor, RunMode};
use lakewatch_core::consts::SENTINEL2_CLOUD_BIT;
use lakewatch_core::error::{LakewatchError, Result};
use lakewatch_core::mask::SensorKind;
use lakewatch_core::pipeline::{run_pipeline, run_pipeline_reported, PipelineStage, ProgressReporter};
use lakewatch_core::raster::{GeoTransform, GridSpec, Raster};
use lakewatch_core::region::StudyRegion;
use lakewatch_core::scene::Scene;
use lakewatch_core::store::{InMemoryStore, SceneQuery, SceneStore};
use lakewatch_core::window::generate_windows;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn index_band(composite: &Composite) -> &Raster {
    match &composite.bands {
        CompositeBands::Index(r) => r,
        CompositeBands::Rgb(_) => panic!("expected index composite"),
    }
}

/// Fails every query for windows starting in `month`.
struct FailingMonthStore {
    inner: InMemoryStore,
    month: u32,
}

impl SceneStore for FailingMonthStore {
    fn query(&self, query: &SceneQuery<'_>) -> Result<Vec<Scene>> {
        if query.window.start.month() == self.month {
            return Err(LakewatchError::Query("archive unreachable".into()));
        }
        self.inner.query(query)
    }
}

#[derive(Default)]
struct CountingReporter {
    stages: AtomicUsize,
    advanced: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.fetch_add(1, Ordering::Relaxed);
    }

    fn advance(&self, _items_done: usize) {
        self.advanced.fetch_add(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn test_sentinel2_single_window_ndwi() {
    let grid = test_grid(4, 4);
    let config = s2_config(grid, 0);
    let store = InMemoryStore::new(vec![s2_scene(
        "S2A_20180115",
        utc(2018, 1, 15),
        grid,
        3000.0,
        750.0,
        5.0,
    )]);

    let report = run_pipeline(&config, &store).unwrap();
    assert!(report.is_success());
    assert_eq!(report.series.len(), 1);

    let composite = &report.series[0];
    assert_eq!(composite.name, "MDAS_NDWI_2018-01-01_S2");
    assert_eq!(composite.scene_count, 1);
    let ndwi = index_band(composite);
    assert_eq!(ndwi.valid_count(), 16);
    for v in ndwi.data.iter() {
        assert_relative_eq!(*v, 0.6, epsilon = 1e-5);
    }
}

#[test]
fn test_cloudy_scene_above_threshold_gives_empty_composite() {
    let grid = test_grid(4, 4);
    let mut config = s2_config(grid, 0);
    config.cloud_threshold = 1.0;
    let store = InMemoryStore::new(vec![s2_scene(
        "S2A_20180115",
        utc(2018, 1, 15),
        grid,
        3000.0,
        750.0,
        5.0,
    )]);

    let report = run_pipeline(&config, &store).unwrap();
    assert!(report.is_success());
    let composite = &report.series[0];
    assert_eq!(composite.scene_count, 0);
    assert!(composite.is_empty());
    assert_eq!(report.empty_composites().count(), 1);
}

#[test]
fn test_cloud_threshold_is_strict() {
    let grid = test_grid(2, 2);
    let mut config = s2_config(grid, 0);
    config.cloud_threshold = 5.0;
    let store = InMemoryStore::new(vec![s2_scene("a", utc(2018, 1, 3), grid, 3000.0, 750.0, 5.0)]);
    let report = run_pipeline(&config, &store).unwrap();
    assert!(report.series[0].is_empty());
}

#[test]
fn test_median_across_scenes_and_windows() {
    let grid = test_grid(3, 3);
    let config = s2_config(grid, 2);
    let store = InMemoryStore::new(vec![
        // January: NDWI 0.6, 0.2, and a cloudy scene excluded by metadata.
        s2_scene("jan-a", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0),
        s2_scene("jan-b", utc(2018, 1, 20), grid, 3000.0, 2000.0, 2.0),
        s2_scene("jan-c", utc(2018, 1, 25), grid, 9000.0, 10.0, 80.0),
        // March only.
        s2_scene("mar-a", utc(2018, 3, 2), grid, 1000.0, 3000.0, 0.0),
    ]);

    let report = run_pipeline(&config, &store).unwrap();
    assert_eq!(report.series.len(), 3);

    let names: Vec<&str> = report.series.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "MDAS_NDWI_2018-01-01_S2",
            "MDAS_NDWI_2018-02-01_S2",
            "MDAS_NDWI_2018-03-01_S2",
        ]
    );

    let jan = index_band(&report.series[0]);
    assert_relative_eq!(jan.get(1, 1).unwrap(), 0.4, epsilon = 1e-5);
    assert_eq!(report.series[0].scene_count, 2);
    assert!(report.series[1].is_empty());
    let mar = index_band(&report.series[2]);
    assert_relative_eq!(mar.get(0, 0).unwrap(), -0.5, epsilon = 1e-5);
}

#[test]
fn test_pixel_cloud_mask_falls_back_to_other_scenes() {
    let grid = test_grid(2, 2);
    let config = s2_config(grid, 0);
    let mut quality = Array2::zeros((2, 2));
    quality[[0, 0]] = SENTINEL2_CLOUD_BIT;
    let store = InMemoryStore::new(vec![
        s2_scene("a", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0).with_quality(quality.clone()),
        s2_scene("b", utc(2018, 1, 9), grid, 3000.0, 2000.0, 1.0).with_quality(quality),
        s2_scene("c", utc(2018, 1, 12), grid, 1000.0, 3000.0, 1.0),
    ]);

    let report = run_pipeline(&config, &store).unwrap();
    let ndwi = index_band(&report.series[0]);
    // Only scene c sees pixel (0, 0).
    assert_relative_eq!(ndwi.get(0, 0).unwrap(), -0.5, epsilon = 1e-5);
    // Elsewhere: median of [0.6, 0.2, -0.5].
    assert_relative_eq!(ndwi.get(1, 1).unwrap(), 0.2, epsilon = 1e-5);
}

#[test]
fn test_composites_clipped_to_region() {
    let grid = test_grid(4, 4);
    let mut config = s2_config(grid, 0);
    // Triangle over the lower-left half of the 4x4 grid.
    config.region.exterior = vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
    let store = InMemoryStore::new(vec![s2_scene("a", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0)]);

    let report = run_pipeline(&config, &store).unwrap();
    let ndwi = index_band(&report.series[0]);
    assert_eq!(ndwi.dim(), (4, 4));
    // Row 3 is the bottom row: its first pixel centre (0.5, 0.5) is inside.
    assert!(ndwi.get(3, 0).is_some());
    // Top-right pixel centre (3.5, 3.5) is outside.
    assert!(ndwi.get(0, 3).is_none());
    assert!(ndwi.valid_count() < 16);
}

#[test]
fn test_run_is_idempotent() {
    let grid = test_grid(3, 3);
    let config = s2_config(grid, 1);
    let store = InMemoryStore::new(vec![
        s2_scene("a", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0),
        s2_scene("b", utc(2018, 1, 9), grid, 2000.0, 500.0, 1.0),
        s2_scene("c", utc(2018, 2, 9), grid, 2500.0, 900.0, 1.0),
    ]);

    let first = run_pipeline(&config, &store).unwrap();
    let second = run_pipeline(&config, &store).unwrap();
    assert_eq!(first.series.len(), second.series.len());
    for (a, b) in first.series.iter().zip(second.series.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.grid, b.grid);
        assert_eq!(index_band(a).valid, index_band(b).valid);
        assert_eq!(index_band(a).to_nan_filled().iter().filter(|v| v.is_finite()).count(), 9);
        for (x, y) in index_band(a).data.iter().zip(index_band(b).data.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}

#[test]
fn test_names_unique_across_series() {
    let grid = test_grid(2, 2);
    let config = s2_config(grid, 11);
    let store = InMemoryStore::default();
    let report = run_pipeline(&config, &store).unwrap();
    assert_eq!(report.series.len(), 12);
    let names: HashSet<&str> = report.series.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names.len(), 12);
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[test]
fn test_window_failure_is_isolated() {
    let grid = test_grid(2, 2);
    let config = s2_config(grid, 3);
    let store = FailingMonthStore {
        inner: InMemoryStore::new(vec![s2_scene("a", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0)]),
        month: 3,
    };

    let report = run_pipeline(&config, &store).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.series.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "MDAS_NDWI_2018-03-01_S2");
    assert_eq!(report.failures[0].window.start, date(2018, 3, 1));
    assert!(report.failures[0].error.contains("archive unreachable"));
}

#[test]
fn test_scene_off_grid_fails_its_window() {
    let grid = test_grid(2, 2);
    let config = s2_config(grid, 1);
    let shifted = GridSpec::new(2, 2, GeoTransform::new(0.5, 2.0, 1.0, -1.0));
    let store = InMemoryStore::new(vec![
        s2_scene("ok", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0),
        s2_scene("off", utc(2018, 2, 5), shifted, 3000.0, 750.0, 1.0),
    ]);

    let report = run_pipeline(&config, &store).unwrap();
    assert_eq!(report.series.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].window.start, date(2018, 2, 1));
}

#[test]
fn test_missing_band_fails_window() {
    let grid = test_grid(2, 2);
    let config = s2_config(grid, 0);
    let mut scene = s2_scene("a", utc(2018, 1, 5), grid, 3000.0, 750.0, 1.0);
    scene.bands.remove("B11");
    let report = run_pipeline(&config, &InMemoryStore::new(vec![scene])).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("B11"));
}

#[test]
fn test_invalid_config_aborts_before_windows() {
    let grid = test_grid(2, 2);
    let mut config = s2_config(grid, 2);
    config.window_count = -1;
    let reporter = Arc::new(CountingReporter::default());
    let err = run_pipeline_reported(&config, &InMemoryStore::default(), reporter.clone());
    assert!(matches!(err, Err(LakewatchError::Config(_))));
    assert_eq!(reporter.advanced.load(Ordering::Relaxed), 0);
}

#[test]
fn test_reporter_sees_every_window() {
    let grid = test_grid(2, 2);
    let config = s2_config(grid, 5);
    let reporter = Arc::new(CountingReporter::default());
    run_pipeline_reported(&config, &InMemoryStore::default(), reporter.clone()).unwrap();
    assert_eq!(reporter.stages.load(Ordering::Relaxed), 2);
    assert_eq!(reporter.advanced.load(Ordering::Relaxed), 6);
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

#[test]
fn test_compositor_drops_out_of_window_scenes() {
    let grid = test_grid(2, 2);
    let region = StudyRegion::from_ring(&common::grid_region(&grid).exterior).unwrap();
    let compositor = Compositor::new(&SensorKind::LandsatSr, RunMode::default(), &region, grid).unwrap();
    let window = generate_windows(date(1993, 1, 1), 0).unwrap()[0];

    let scenes = vec![
        landsat_scene("in", utc(1993, 1, 10), grid, 0.3, 0.1, 0.0),
        landsat_scene("out", utc(1993, 2, 10), grid, 0.1, 0.3, 0.0),
    ];
    let composite = compositor.composite(&window, &scenes).unwrap();
    assert_eq!(composite.scene_count, 1);
    assert_relative_eq!(index_band(&composite).get(0, 0).unwrap(), 0.5, epsilon = 1e-6);
    assert!(composite.name.is_empty());
}

#[test]
fn test_compositor_rgb_mode() {
    let grid = test_grid(2, 2);
    let region = StudyRegion::from_ring(&common::grid_region(&grid).exterior).unwrap();
    let mode = RunMode::Rgb {
        bands: ["B3".into(), "B2".into(), "B1".into()],
        pan: None,
    };
    let compositor = Compositor::new(&SensorKind::LandsatSr, mode.clone(), &region, grid).unwrap();
    let window = generate_windows(date(1993, 1, 1), 0).unwrap()[0];
    let scene = Scene::new("rgb", utc(1993, 1, 10), grid)
        .with_band("B1", Raster::filled((2, 2), 0.1))
        .with_band("B2", Raster::filled((2, 2), 0.2))
        .with_band("B3", Raster::filled((2, 2), 0.3));

    let composite = compositor.composite(&window, &[scene]).unwrap();
    let rasters = composite.bands.rasters();
    assert_eq!(rasters.len(), 3);
    assert_relative_eq!(rasters[0].get(0, 0).unwrap(), 0.3);
    assert_relative_eq!(rasters[2].get(1, 1).unwrap(), 0.1);
    assert_eq!(composite.bands.band_names(&mode), vec!["B3", "B2", "B1"]);
}

#[test]
fn test_compositor_rejects_disjoint_region() {
    let grid = test_grid(2, 2);
    let region = StudyRegion::from_ring(&[[10.0, 10.0], [11.0, 10.0], [11.0, 11.0]]).unwrap();
    assert!(Compositor::new(&SensorKind::LandsatSr, RunMode::default(), &region, grid).is_err());
}
