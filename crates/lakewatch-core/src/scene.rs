use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use geo::Polygon;
use ndarray::Array2;

use crate::error::{LakewatchError, Result};
use crate::raster::{check_shape, GridSpec, Raster};
use crate::region::extent_polygon;

/// One satellite observation as served by a scene store.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub id: String,
    pub acquired: DateTime<Utc>,
    pub footprint: Polygon<f64>,
    /// Numeric metadata such as `CLOUD_COVER` or `CLOUDY_PIXEL_PERCENTAGE`.
    pub properties: BTreeMap<String, f64>,
    pub bands: BTreeMap<String, Raster>,
    /// Bit-encoded per-pixel quality flags.
    pub quality: Array2<u16>,
    pub grid: GridSpec,
}

impl Scene {
    /// An empty scene covering `grid`: no bands, all-clear quality flags.
    pub fn new(id: impl Into<String>, acquired: DateTime<Utc>, grid: GridSpec) -> Self {
        Self {
            id: id.into(),
            acquired,
            footprint: extent_polygon(&grid),
            properties: BTreeMap::new(),
            bands: BTreeMap::new(),
            quality: Array2::zeros(grid.shape()),
            grid,
        }
    }

    pub fn with_band(mut self, name: impl Into<String>, band: Raster) -> Self {
        self.bands.insert(name.into(), band);
        self
    }

    pub fn with_quality(mut self, quality: Array2<u16>) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_footprint(mut self, footprint: Polygon<f64>) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn band(&self, name: &str) -> Result<&Raster> {
        self.bands
            .get(name)
            .ok_or_else(|| LakewatchError::MissingBand {
                scene: self.id.clone(),
                band: name.to_string(),
            })
    }

    pub fn property(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }

    /// Check that the quality band and every spectral band match the grid.
    pub fn validate(&self) -> Result<()> {
        let shape = self.grid.shape();
        if shape.0 == 0 || shape.1 == 0 {
            return Err(LakewatchError::InvalidDimensions {
                width: shape.1,
                height: shape.0,
            });
        }
        check_shape(shape, self.quality.dim())?;
        for band in self.bands.values() {
            check_shape(shape, band.dim())?;
        }
        Ok(())
    }
}
