#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ndarray::Array2;

use lakewatch_core::pipeline::config::{PipelineConfig, RegionConfig};
use lakewatch_core::raster::{GeoTransform, GridSpec, Raster};
use lakewatch_core::scene::Scene;

/// Grid with unit pixels covering x in [0, cols], y in [0, rows].
pub fn test_grid(rows: usize, cols: usize) -> GridSpec {
    GridSpec::new(rows, cols, GeoTransform::new(0.0, rows as f64, 1.0, -1.0))
}

/// Rectangle covering the whole grid.
pub fn grid_region(grid: &GridSpec) -> RegionConfig {
    let (w, h) = (grid.cols as f64, grid.rows as f64);
    RegionConfig {
        exterior: vec![[0.0, h], [0.0, 0.0], [w, 0.0], [w, h]],
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
}

/// Sentinel-2 style scene with constant B3/B11 digital numbers and a clear
/// quality band.
pub fn s2_scene(
    id: &str,
    acquired: DateTime<Utc>,
    grid: GridSpec,
    green: f32,
    swir: f32,
    cloud_cover: f64,
) -> Scene {
    let shape = grid.shape();
    Scene::new(id, acquired, grid)
        .with_band("B3", Raster::filled(shape, green))
        .with_band("B11", Raster::filled(shape, swir))
        .with_quality(Array2::zeros(shape))
        .with_property("CLOUDY_PIXEL_PERCENTAGE", cloud_cover)
}

/// Landsat SR style scene with constant B2/B5 reflectance.
pub fn landsat_scene(
    id: &str,
    acquired: DateTime<Utc>,
    grid: GridSpec,
    green: f32,
    swir: f32,
    cloud_cover: f64,
) -> Scene {
    let shape = grid.shape();
    Scene::new(id, acquired, grid)
        .with_band("B2", Raster::filled(shape, green))
        .with_band("B5", Raster::filled(shape, swir))
        .with_quality(Array2::zeros(shape))
        .with_property("CLOUD_COVER", cloud_cover)
}

/// Sentinel-2 preset moved onto a small test grid.
pub fn s2_config(grid: GridSpec, window_count: i64) -> PipelineConfig {
    let mut config = PipelineConfig::sentinel2_ndwi();
    config.window_count = window_count;
    config.region = grid_region(&grid);
    config.grid = grid;
    config.export.scale = grid.transform.cell_size();
    config
}
