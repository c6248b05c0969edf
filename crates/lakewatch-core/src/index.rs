use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::Result;
use crate::raster::{check_shape, Raster};
use crate::scene::Scene;

/// Normalized difference `(a - b) / (a + b)`.
///
/// A pixel is no-data when either input is no-data, when `a + b == 0`, or
/// when the quotient is not finite. Values are not clamped to `[-1, 1]`.
pub fn normalized_difference(a: &Raster, b: &Raster) -> Result<Raster> {
    check_shape(a.dim(), b.dim())?;
    let (h, w) = a.dim();

    let pixel = |row: usize, col: usize| -> Option<f32> {
        let (x, y) = (a.get(row, col)?, b.get(row, col)?);
        let sum = x + y;
        if sum == 0.0 {
            return None;
        }
        let nd = (x - y) / sum;
        nd.is_finite().then_some(nd)
    };

    let mut data = Array2::<f32>::from_elem((h, w), f32::NAN);
    let mut valid = Array2::<bool>::from_elem((h, w), false);

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<Option<f32>>> = (0..h)
            .into_par_iter()
            .map(|row| (0..w).map(|col| pixel(row, col)).collect())
            .collect();
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, value) in row_data.into_iter().enumerate() {
                if let Some(v) = value {
                    data[[row, col]] = v;
                    valid[[row, col]] = true;
                }
            }
        }
    } else {
        for row in 0..h {
            for col in 0..w {
                if let Some(v) = pixel(row, col) {
                    data[[row, col]] = v;
                    valid[[row, col]] = true;
                }
            }
        }
    }

    Raster::with_validity(data, valid)
}

/// Normalized difference water index of a (masked) scene.
pub fn compute_ndwi(scene: &Scene, green_band: &str, swir_band: &str) -> Result<Raster> {
    let green = scene.band(green_band)?;
    let swir = scene.band(swir_band)?;
    normalized_difference(green, swir)
}
