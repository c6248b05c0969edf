use geo::{BoundingRect, Coord, Intersects, LineString, Point, Polygon};
use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{LakewatchError, Result};
use crate::raster::{GridSpec, Mask};

/// Pixel window `(row0, col0, rows, cols)` inside a grid.
pub type PixelWindow = (usize, usize, usize, usize);

/// The fixed study area every composite is clipped to.
#[derive(Clone, Debug, PartialEq)]
pub struct StudyRegion {
    polygon: Polygon<f64>,
}

impl StudyRegion {
    pub fn new(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// Build a region from an exterior ring of `[x, y]` vertices.
    ///
    /// The ring does not need to be closed. Fewer than three distinct
    /// vertices is a configuration error.
    pub fn from_ring(ring: &[[f64; 2]]) -> Result<Self> {
        let mut distinct: Vec<[f64; 2]> = Vec::new();
        for vertex in ring {
            if !vertex.iter().all(|v| v.is_finite()) {
                return Err(LakewatchError::Config(format!(
                    "region vertex {vertex:?} is not finite"
                )));
            }
            if !distinct.contains(vertex) {
                distinct.push(*vertex);
            }
        }
        if distinct.len() < 3 {
            return Err(LakewatchError::Config(format!(
                "region needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }
        let coords: Vec<Coord<f64>> = ring.iter().map(|&[x, y]| Coord { x, y }).collect();
        Ok(Self::new(Polygon::new(LineString::from(coords), vec![])))
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn intersects(&self, footprint: &Polygon<f64>) -> bool {
        self.polygon.intersects(footprint)
    }

    /// Pixel window of the region's bounding box, intersected with the grid.
    ///
    /// Returns `None` when the region lies entirely outside the grid.
    pub fn clip_window(&self, grid: &GridSpec) -> Option<PixelWindow> {
        let rect = self.polygon.bounding_rect()?;
        let t = &grid.transform;
        let (c0, r0) = t.geo_to_pixel(rect.min().x, rect.min().y);
        let (c1, r1) = t.geo_to_pixel(rect.max().x, rect.max().y);

        let col_start = c0.min(c1).floor().max(0.0) as usize;
        let col_end = (c0.max(c1).ceil().max(0.0) as usize).min(grid.cols);
        let row_start = r0.min(r1).floor().max(0.0) as usize;
        let row_end = (r0.max(r1).ceil().max(0.0) as usize).min(grid.rows);

        if col_start >= col_end || row_start >= row_end {
            return None;
        }
        Some((row_start, col_start, row_end - row_start, col_end - col_start))
    }

    /// Mask retaining pixels whose centre lies inside (or on) the region.
    pub fn clip_mask(&self, grid: &GridSpec) -> Mask {
        let (rows, cols) = grid.shape();
        let t = grid.transform;
        let inside = |row: usize, col: usize| {
            let (x, y) = t.pixel_center(col, row);
            self.polygon.intersects(&Point::new(x, y))
        };

        if rows * cols >= PARALLEL_PIXEL_THRESHOLD {
            let row_flags: Vec<Vec<bool>> = (0..rows)
                .into_par_iter()
                .map(|row| (0..cols).map(|col| inside(row, col)).collect())
                .collect();

            let mut valid = Array2::from_elem((rows, cols), false);
            for (row, flags) in row_flags.into_iter().enumerate() {
                for (col, flag) in flags.into_iter().enumerate() {
                    valid[[row, col]] = flag;
                }
            }
            Mask::new(valid)
        } else {
            Mask::new(Array2::from_shape_fn((rows, cols), |(row, col)| {
                inside(row, col)
            }))
        }
    }
}

/// Polygon covering the full extent of a grid.
pub fn extent_polygon(grid: &GridSpec) -> Polygon<f64> {
    let t = &grid.transform;
    let x0 = t.origin_x;
    let y0 = t.origin_y;
    let x1 = x0 + grid.cols as f64 * t.pixel_width;
    let y1 = y0 + grid.rows as f64 * t.pixel_height;
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )
}
