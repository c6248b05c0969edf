use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::Result;
use crate::raster::{check_shape, Raster};

/// Per-pixel median over a stack of rasters, ignoring no-data.
///
/// For a pixel with `k` valid contributions the output is the median of
/// those `k` values (mean of the two middle values when `k` is even); with
/// `k = 0` the pixel is no-data. An empty stack yields an all-no-data raster
/// of `shape`.
///
/// Uses `select_nth_unstable` for O(k) median without a full sort.
/// Parallelizes at the row level for images >= 256x256.
pub fn median_stack(rasters: &[Raster], shape: (usize, usize)) -> Result<Raster> {
    for raster in rasters {
        check_shape(shape, raster.dim())?;
    }
    if rasters.is_empty() {
        return Ok(Raster::nodata(shape));
    }

    let (h, w) = shape;
    let n = rasters.len();
    let mut data = Array2::<f32>::from_elem(shape, f32::NAN);
    let mut valid = Array2::<bool>::from_elem(shape, false);

    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        // Row-parallel: each row allocates its own pixel_values
        let rows: Vec<Vec<Option<f32>>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut pixel_values = Vec::with_capacity(n);
                (0..w)
                    .map(|col| pixel_median(rasters, row, col, &mut pixel_values))
                    .collect()
            })
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
        let mut pixel_values = Vec::with_capacity(n);
        for row in 0..h {
            for col in 0..w {
                if let Some(v) = pixel_median(rasters, row, col, &mut pixel_values) {
                    data[[row, col]] = v;
                    valid[[row, col]] = true;
                }
            }
        }
    }

    Raster::with_validity(data, valid)
}

fn pixel_median(
    rasters: &[Raster],
    row: usize,
    col: usize,
    pixel_values: &mut Vec<f32>,
) -> Option<f32> {
    pixel_values.clear();
    pixel_values.extend(rasters.iter().filter_map(|r| r.get(row, col)));
    compute_median(pixel_values)
}

/// Median of a value set, `None` when empty.
pub fn compute_median(pixel_values: &mut [f32]) -> Option<f32> {
    let n = pixel_values.len();
    if n == 0 {
        None
    } else if n == 1 {
        Some(pixel_values[0])
    } else if n % 2 == 1 {
        let mid = n / 2;
        Some(
            *pixel_values
                .select_nth_unstable_by(mid, |a, b| a.total_cmp(b))
                .1,
        )
    } else {
        let mid = n / 2;
        pixel_values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        pixel_values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        Some((pixel_values[mid - 1] + pixel_values[mid]) / 2.0)
    }
}
