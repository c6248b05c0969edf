use ndarray::{s, Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{LakewatchError, Result};

/// Affine georeferencing for a north-up pixel grid.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is normally negative (rows run south).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Geographic coordinates of the centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Fractional pixel coordinates (col, row) of a geographic point.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Cell size, assuming square pixels.
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// Shape and georeferencing of a pixel grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize, transform: GeoTransform) -> Self {
        Self {
            rows,
            cols,
            transform,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Sub-grid starting at (row0, col0), origin shifted accordingly.
    pub fn crop(&self, row0: usize, col0: usize, rows: usize, cols: usize) -> GridSpec {
        let t = &self.transform;
        GridSpec::new(
            rows,
            cols,
            GeoTransform::new(
                t.origin_x + col0 as f64 * t.pixel_width,
                t.origin_y + row0 as f64 * t.pixel_height,
                t.pixel_width,
                t.pixel_height,
            ),
        )
    }

    /// Grid covering the same extent with pixels of size `scale`.
    pub fn resampled(&self, scale: f64) -> GridSpec {
        let t = &self.transform;
        let width = self.cols as f64 * t.pixel_width.abs();
        let height = self.rows as f64 * t.pixel_height.abs();
        let cols = ((width / scale).round() as usize).max(1);
        let rows = ((height / scale).round() as usize).max(1);
        GridSpec::new(
            rows,
            cols,
            GeoTransform::new(
                t.origin_x,
                t.origin_y,
                scale * t.pixel_width.signum(),
                scale * t.pixel_height.signum(),
            ),
        )
    }
}

/// Per-pixel validity, `true` = pixel retained.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask(Array2<bool>);

impl Mask {
    pub fn new(valid: Array2<bool>) -> Self {
        Self(valid)
    }

    pub fn all_valid(shape: (usize, usize)) -> Self {
        Self(Array2::from_elem(shape, true))
    }

    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.0[[row, col]]
    }

    pub fn valid_count(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    /// Pixel-wise AND with another mask of the same shape.
    pub fn intersect(&mut self, other: &Mask) -> Result<()> {
        check_shape(self.dim(), other.dim())?;
        Zip::from(&mut self.0).and(&other.0).for_each(|a, &b| *a &= b);
        Ok(())
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.0
    }
}

/// A single band of `f32` pixels with an explicit validity bitmap.
///
/// Values behind an invalid pixel are kept as-is but never read by
/// arithmetic or reductions.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    /// Pixel data, row-major, shape = (rows, cols)
    pub data: Array2<f32>,
    pub valid: Array2<bool>,
}

impl Raster {
    /// Wrap pixel data; non-finite values are marked invalid.
    pub fn new(data: Array2<f32>) -> Self {
        let valid = data.mapv(f32::is_finite);
        Self { data, valid }
    }

    pub fn with_validity(data: Array2<f32>, valid: Array2<bool>) -> Result<Self> {
        check_shape(data.dim(), valid.dim())?;
        Ok(Self { data, valid })
    }

    /// A raster where every pixel is no-data.
    pub fn nodata(shape: (usize, usize)) -> Self {
        Self {
            data: Array2::from_elem(shape, f32::NAN),
            valid: Array2::from_elem(shape, false),
        }
    }

    pub fn filled(shape: (usize, usize), value: f32) -> Self {
        Self::new(Array2::from_elem(shape, value))
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if self.valid[[row, col]] {
            Some(self.data[[row, col]])
        } else {
            None
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    pub fn is_all_nodata(&self) -> bool {
        !self.valid.iter().any(|&v| v)
    }

    pub fn validity(&self) -> Mask {
        Mask::new(self.valid.clone())
    }

    /// Invalidate every pixel the mask rejects. Values are untouched.
    pub fn apply_mask(&mut self, mask: &Mask) -> Result<()> {
        check_shape(self.dim(), mask.dim())?;
        Zip::from(&mut self.valid)
            .and(mask.as_array())
            .for_each(|v, &m| *v &= m);
        Ok(())
    }

    /// Divide every value by `divisor`, keeping validity.
    pub fn scaled(&self, divisor: f32) -> Raster {
        Raster {
            data: self.data.mapv(|v| v / divisor),
            valid: self.valid.clone(),
        }
    }

    pub fn crop(&self, row0: usize, col0: usize, rows: usize, cols: usize) -> Raster {
        let window = s![row0..row0 + rows, col0..col0 + cols];
        Raster {
            data: self.data.slice(window).to_owned(),
            valid: self.valid.slice(window).to_owned(),
        }
    }

    /// Pixel data with every no-data pixel replaced by NaN.
    pub fn to_nan_filled(&self) -> Array2<f32> {
        let mut out = self.data.clone();
        Zip::from(&mut out)
            .and(&self.valid)
            .for_each(|v, &ok| {
                if !ok {
                    *v = f32::NAN;
                }
            });
        out
    }
}

pub(crate) fn check_shape(expected: (usize, usize), found: (usize, usize)) -> Result<()> {
    if expected != found {
        return Err(LakewatchError::GridMismatch { expected, found });
    }
    Ok(())
}
