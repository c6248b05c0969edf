use approx::assert_relative_eq;
use ndarray::{array, Array2};

use lakewatch_core::error::LakewatchError;
use lakewatch_core::index::normalized_difference;
use lakewatch_core::raster::Raster;

#[test]
fn test_ndwi_formula() {
    let green = Raster::filled((2, 2), 0.3);
    let swir = Raster::filled((2, 2), 0.075);
    let ndwi = normalized_difference(&green, &swir).unwrap();
    for v in ndwi.data.iter() {
        assert_relative_eq!(*v, 0.6, epsilon = 1e-6);
    }
    assert_eq!(ndwi.valid_count(), 4);
}

#[test]
fn test_ndwi_zero_sum_is_nodata() {
    let green = Raster::new(array![[0.0f32, 0.2], [-0.1, 0.5]]);
    let swir = Raster::new(array![[0.0f32, 0.2], [0.1, 0.5]]);
    let ndwi = normalized_difference(&green, &swir).unwrap();
    assert_eq!(ndwi.get(0, 0), None);
    assert_eq!(ndwi.get(1, 0), None);
    assert_relative_eq!(ndwi.get(0, 1).unwrap(), 0.0);
}

#[test]
fn test_ndwi_propagates_nodata() {
    let mut green = Raster::filled((2, 2), 0.4);
    green.valid[[0, 1]] = false;
    let swir = Raster::new(array![[0.1f32, 0.1], [f32::NAN, 0.1]]);
    let ndwi = normalized_difference(&green, &swir).unwrap();
    assert_eq!(ndwi.get(0, 1), None);
    assert_eq!(ndwi.get(1, 0), None);
    assert_relative_eq!(ndwi.get(0, 0).unwrap(), 0.6, epsilon = 1e-6);
}

#[test]
fn test_ndwi_not_clamped() {
    // Negative reflectance can push the ratio past [-1, 1].
    let green = Raster::filled((1, 1), 0.3);
    let swir = Raster::filled((1, 1), -0.1);
    let ndwi = normalized_difference(&green, &swir).unwrap();
    assert_relative_eq!(ndwi.get(0, 0).unwrap(), 2.0, epsilon = 1e-6);
}

#[test]
fn test_ndwi_shape_mismatch() {
    let a = Raster::filled((2, 2), 0.1);
    let b = Raster::filled((3, 2), 0.1);
    assert!(matches!(
        normalized_difference(&a, &b),
        Err(LakewatchError::GridMismatch { .. })
    ));
}

#[test]
fn test_ndwi_parallel_path_matches_values() {
    // 256x256 crosses the row-parallel threshold.
    let mut green = Array2::<f32>::from_elem((256, 256), 0.5);
    green[[100, 200]] = 0.0;
    let swir = Array2::<f32>::from_elem((256, 256), 0.25);
    let ndwi = normalized_difference(&Raster::new(green), &Raster::new(swir)).unwrap();
    assert_relative_eq!(ndwi.get(0, 0).unwrap(), 1.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(ndwi.get(100, 200).unwrap(), -1.0, epsilon = 1e-6);
    assert_eq!(ndwi.valid_count(), 256 * 256);
}
