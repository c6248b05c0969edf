use std::cmp::Ordering;
use std::collections::BTreeMap;

use geo::{Coord, Intersects, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raster::{check_shape, GridSpec, Raster};

/// Named polygon as read from a zones file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub name: String,
    pub exterior: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub name: String,
    pub polygon: Polygon<f64>,
}

impl From<&ZoneDef> for Zone {
    fn from(def: &ZoneDef) -> Self {
        let coords: Vec<Coord<f64>> = def.exterior.iter().map(|&[x, y]| Coord { x, y }).collect();
        Self {
            name: def.name.clone(),
            polygon: Polygon::new(LineString::from(coords), vec![]),
        }
    }
}

/// A pixel value used as a histogram key, ordered with `f32::total_cmp`.
#[derive(Clone, Copy, Debug)]
pub struct ClassValue(pub f32);

impl PartialEq for ClassValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClassValue {}

impl PartialOrd for ClassValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for ClassValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel counts per distinct value inside one zone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneHistogram {
    pub zone: String,
    pub counts: BTreeMap<ClassValue, usize>,
    pub nodata: usize,
}

impl ZoneHistogram {
    pub fn total(&self) -> usize {
        self.counts.values().sum::<usize>() + self.nodata
    }
}

/// Count the values of every pixel whose centre falls in each zone.
pub fn zonal_histogram(raster: &Raster, grid: &GridSpec, zones: &[Zone]) -> Result<Vec<ZoneHistogram>> {
    check_shape(grid.shape(), raster.dim())?;
    let (rows, cols) = grid.shape();

    let histograms = zones
        .iter()
        .map(|zone| {
            let mut hist = ZoneHistogram {
                zone: zone.name.clone(),
                ..Default::default()
            };
            for row in 0..rows {
                for col in 0..cols {
                    let (x, y) = grid.transform.pixel_center(col, row);
                    if !zone.polygon.intersects(&Point::new(x, y)) {
                        continue;
                    }
                    match raster.get(row, col) {
                        Some(v) => *hist.counts.entry(ClassValue(v)).or_insert(0) += 1,
                        None => hist.nodata += 1,
                    }
                }
            }
            hist
        })
        .collect();
    Ok(histograms)
}
