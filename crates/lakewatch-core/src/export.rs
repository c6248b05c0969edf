use std::path::PathBuf;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::composite::Composite;
use crate::consts::{DEFAULT_CRS, EPSILON};
use crate::error::{LakewatchError, Result};
use crate::io::geotiff::write_geotiff;
use crate::raster::{GridSpec, Raster};

/// Output sample type. Composites are always written as floating point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelType {
    #[default]
    Float32,
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
        }
    }
}

fn default_crs() -> String {
    DEFAULT_CRS.to_string()
}

/// Parameters handed to the export collaborator with every composite.
///
/// `folder` and `scale` have no defaults; a config without them does not
/// load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportParams {
    /// Destination folder name.
    pub folder: String,
    /// Output resolution in CRS units.
    pub scale: f64,
    #[serde(default = "default_crs")]
    pub crs: String,
    #[serde(default)]
    pub pixel_type: PixelType,
}

impl ExportParams {
    /// Parameters in the default CRS with float32 pixels.
    pub fn new(folder: impl Into<String>, scale: f64) -> Self {
        Self {
            folder: folder.into(),
            scale,
            crs: default_crs(),
            pixel_type: PixelType::Float32,
        }
    }
}

/// Where an export collaborator put a composite.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportReceipt {
    pub name: String,
    pub location: PathBuf,
}

/// A composite the collaborator refused or failed to persist.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default)]
pub struct ExportReport {
    pub receipts: Vec<ExportReceipt>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// File one adapter outcome under receipts or failures.
    pub fn record(&mut self, composite: &Composite, outcome: Result<ExportReceipt>) {
        match outcome {
            Ok(receipt) => {
                info!(name = %receipt.name, location = %receipt.location.display(), "Exported composite");
                self.receipts.push(receipt);
            }
            Err(e) => {
                warn!(name = %composite.name, error = %e, "Export failed");
                self.failures.push(ExportFailure {
                    name: composite.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Bulk export collaborator.
///
/// Retries, queuing and completion tracking belong to the implementation;
/// the pipeline only hands over a finished composite and its parameters.
pub trait ExportAdapter: Send + Sync {
    fn export(&self, composite: &Composite, params: &ExportParams) -> Result<ExportReceipt>;
}

/// Hand every composite to `adapter`, collecting failures per composite
/// instead of stopping at the first one.
pub fn export_series(
    series: &[Composite],
    adapter: &dyn ExportAdapter,
    params: &ExportParams,
) -> ExportReport {
    let mut report = ExportReport::default();
    for composite in series {
        report.record(composite, adapter.export(composite, params));
    }
    report
}

/// Writes each composite to `{root}/{folder}/{name}.tif`.
#[derive(Clone, Debug)]
pub struct GeoTiffExporter {
    root: PathBuf,
}

impl GeoTiffExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExportAdapter for GeoTiffExporter {
    fn export(&self, composite: &Composite, params: &ExportParams) -> Result<ExportReceipt> {
        let export_error = |reason: String| LakewatchError::Export {
            name: composite.name.clone(),
            reason,
        };
        if composite.name.is_empty() {
            return Err(export_error("composite has no name".to_string()));
        }
        if !(params.scale.is_finite() && params.scale > 0.0) {
            return Err(export_error(format!("invalid scale {}", params.scale)));
        }

        let folder = self.root.join(&params.folder);
        std::fs::create_dir_all(&folder)?;
        let location = folder.join(format!("{}.tif", composite.name));

        let source = &composite.grid;
        let rasters = composite.bands.rasters();
        if (source.transform.cell_size() - params.scale).abs() < EPSILON {
            write_geotiff(&location, &rasters, source, &params.crs)?;
        } else {
            let target = source.resampled(params.scale);
            let resampled: Vec<Raster> = rasters
                .iter()
                .map(|r| resample_nearest(r, source, &target))
                .collect();
            let refs: Vec<&Raster> = resampled.iter().collect();
            write_geotiff(&location, &refs, &target, &params.crs)?;
        }

        Ok(ExportReceipt {
            name: composite.name.clone(),
            location,
        })
    }
}

/// Nearest-neighbour resampling between two grids covering the same area.
pub fn resample_nearest(raster: &Raster, from: &GridSpec, to: &GridSpec) -> Raster {
    let (rows, cols) = to.shape();
    let mut data = Array2::<f32>::from_elem((rows, cols), f32::NAN);
    let mut valid = Array2::<bool>::from_elem((rows, cols), false);

    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = to.transform.pixel_center(col, row);
            let (src_col, src_row) = from.transform.geo_to_pixel(x, y);
            if src_col < 0.0 || src_row < 0.0 {
                continue;
            }
            let (src_col, src_row) = (src_col.floor() as usize, src_row.floor() as usize);
            if src_row >= from.rows || src_col >= from.cols {
                continue;
            }
            if let Some(v) = raster.get(src_row, src_col) {
                data[[row, col]] = v;
                valid[[row, col]] = true;
            }
        }
    }

    Raster { data, valid }
}
