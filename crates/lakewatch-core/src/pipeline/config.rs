use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::composite::RunMode;
use crate::error::{LakewatchError, Result};
use crate::export::ExportParams;
use crate::mask::SensorKind;
use crate::raster::{GeoTransform, GridSpec};
use crate::region::StudyRegion;

/// Everything a run needs, supplied once and validated before any window
/// is processed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// First day of the first window.
    pub start: NaiveDate,
    /// Number of months to advance past `start`; the run covers
    /// `window_count + 1` windows.
    pub window_count: i64,
    #[serde(default)]
    pub sensor: SensorKind,
    #[serde(default)]
    pub mode: RunMode,
    /// Scenes must report cloud cover strictly below this percentage.
    pub cloud_threshold: f64,
    /// Cloud-cover metadata property; defaults to the sensor's own.
    #[serde(default)]
    pub cloud_attribute: Option<String>,
    pub region: RegionConfig,
    /// Analysis grid shared by every scene.
    pub grid: GridSpec,
    pub naming: NamingConfig,
    pub export: ExportParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Exterior ring as `[x, y]` pairs, in grid CRS units.
    pub exterior: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Prefix such as `MDAS_NDWI_`.
    pub area: String,
    /// Suffix such as `_L5`.
    pub sensor: String,
}

impl PipelineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn cloud_attribute(&self) -> &str {
        self.cloud_attribute
            .as_deref()
            .unwrap_or_else(|| self.sensor.default_cloud_attribute())
    }

    pub fn study_region(&self) -> Result<StudyRegion> {
        StudyRegion::from_ring(&self.region.exterior)
    }

    /// Reject every configuration the pipeline cannot run.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(LakewatchError::Config(msg));

        if self.window_count < 0 {
            return fail(format!("window_count must be >= 0, got {}", self.window_count));
        }
        if !self.cloud_threshold.is_finite() || self.cloud_threshold < 0.0 {
            return fail(format!(
                "cloud_threshold must be a non-negative number, got {}",
                self.cloud_threshold
            ));
        }
        if self.cloud_attribute().trim().is_empty() {
            return fail("cloud_attribute must not be empty".to_string());
        }

        let bands: Vec<&String> = match &self.mode {
            RunMode::Index { green, swir } => {
                if green.trim().is_empty() || swir.trim().is_empty() {
                    return fail("index band names must not be empty".to_string());
                }
                if green == swir {
                    return fail(format!("index bands must differ, both are {green}"));
                }
                vec![green, swir]
            }
            RunMode::Rgb { bands, pan } => {
                if bands.iter().chain(pan).any(|b| b.trim().is_empty()) {
                    return fail("RGB band names must not be empty".to_string());
                }
                bands.iter().chain(pan).collect()
            }
        };
        if let SensorKind::LandsatToa { band_prefix } = &self.sensor {
            if let Some(band) = bands.iter().find(|b| !b.starts_with(band_prefix.as_str())) {
                return fail(format!(
                    "band {band} is dropped by the Landsat TOA mask (prefix {band_prefix})"
                ));
            }
        }

        if let SensorKind::Sentinel2Sr { quantification } = &self.sensor {
            if !quantification.is_finite() || *quantification <= 0.0 {
                return fail(format!("quantification must be positive, got {quantification}"));
            }
        }

        let t = &self.grid.transform;
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return fail("grid must have at least one row and column".to_string());
        }
        if t.pixel_width == 0.0 || t.pixel_height == 0.0 {
            return fail("grid pixel size must be non-zero".to_string());
        }

        let region = self.study_region()?;
        let Some((r0, c0, rows, cols)) = region.clip_window(&self.grid) else {
            return fail("study region does not overlap the analysis grid".to_string());
        };

        if self.naming.area.is_empty() || self.naming.sensor.is_empty() {
            return fail("naming.area and naming.sensor must be set".to_string());
        }
        if self.export.folder.trim().is_empty() {
            return fail("export.folder must be set".to_string());
        }
        if !self.export.scale.is_finite() || self.export.scale <= 0.0 {
            return fail(format!("export.scale must be positive, got {}", self.export.scale));
        }
        if self.export.crs.trim().is_empty() {
            return fail("export.crs must not be empty".to_string());
        }

        let output = self.grid.crop(r0, c0, rows, cols);
        let exported = output.resampled(self.export.scale);
        if (output.rows >= 2 && exported.rows < 2) || (output.cols >= 2 && exported.cols < 2) {
            return fail(format!(
                "export.scale {} collapses the {}x{} composite grid to {}x{}",
                self.export.scale, output.rows, output.cols, exported.rows, exported.cols
            ));
        }
        Ok(())
    }

    /// Monthly Landsat 5 NDWI over the Mosul Dam reservoir, 1993.
    pub fn landsat5_ndwi() -> Self {
        mosul_ndwi(
            (1993, 1, 1),
            SensorKind::LandsatSr,
            ("B2", "B5"),
            "_L5",
            LANDSAT_PIXEL,
        )
    }

    /// Landsat 7 shares the Landsat 5 bands and mask, 2000.
    pub fn landsat7_ndwi() -> Self {
        mosul_ndwi(
            (2000, 1, 1),
            SensorKind::LandsatSr,
            ("B2", "B5"),
            "_L7",
            LANDSAT_PIXEL,
        )
    }

    /// Monthly Landsat 8 NDWI, 2018.
    pub fn landsat8_ndwi() -> Self {
        mosul_ndwi(
            (2018, 1, 1),
            SensorKind::Landsat8Sr,
            ("B3", "B6"),
            "_L8",
            LANDSAT_PIXEL,
        )
    }

    /// Landsat 8 TOA true colour, pansharpened with B8 and exported at the
    /// panchromatic resolution.
    pub fn landsat8_pansharpened_rgb() -> Self {
        let mut config = mosul_ndwi(
            (2018, 1, 1),
            SensorKind::landsat_toa(),
            ("B3", "B6"),
            "_L8",
            LANDSAT_PAN_PIXEL,
        );
        config.mode = RunMode::Rgb {
            bands: ["B4".to_string(), "B3".to_string(), "B2".to_string()],
            pan: Some("B8".to_string()),
        };
        config.naming.area = "MDAS_RGBA_".to_string();
        config
    }

    /// Monthly Sentinel-2 NDWI over the same reservoir, 2018.
    pub fn sentinel2_ndwi() -> Self {
        mosul_ndwi(
            (2018, 1, 1),
            SensorKind::sentinel2(),
            ("B3", "B11"),
            "_S2",
            SENTINEL2_PIXEL,
        )
    }
}

// Roughly 30 m, 15 m and 20 m in degrees at the reservoir's latitude.
const LANDSAT_PIXEL: f64 = 0.00027;
const LANDSAT_PAN_PIXEL: f64 = 0.000135;
const SENTINEL2_PIXEL: f64 = 0.00018;

fn mosul_ndwi(
    (year, month, day): (i32, u32, u32),
    sensor: SensorKind,
    (green, swir): (&str, &str),
    sensor_label: &str,
    pixel: f64,
) -> PipelineConfig {
    PipelineConfig {
        start: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        window_count: 11,
        cloud_attribute: Some(sensor.default_cloud_attribute().to_string()),
        sensor,
        mode: RunMode::Index {
            green: green.to_string(),
            swir: swir.to_string(),
        },
        cloud_threshold: 10.0,
        region: mosul_region(),
        grid: mosul_grid(pixel),
        naming: NamingConfig {
            area: "MDAS_NDWI_".to_string(),
            sensor: sensor_label.to_string(),
        },
        export: ExportParams::new("geeMDASEmerginSites", pixel),
    }
}

const MOSUL_WEST: f64 = 42.37340669234754;
const MOSUL_EAST: f64 = 43.00237397750379;
const MOSUL_SOUTH: f64 = 36.55681953712725;
const MOSUL_NORTH: f64 = 37.07573420709028;

fn mosul_region() -> RegionConfig {
    RegionConfig {
        exterior: vec![
            [MOSUL_WEST, MOSUL_NORTH],
            [MOSUL_WEST, MOSUL_SOUTH],
            [MOSUL_EAST, MOSUL_SOUTH],
            [MOSUL_EAST, MOSUL_NORTH],
        ],
    }
}

fn mosul_grid(pixel: f64) -> GridSpec {
    let cols = ((MOSUL_EAST - MOSUL_WEST) / pixel).ceil() as usize;
    let rows = ((MOSUL_NORTH - MOSUL_SOUTH) / pixel).ceil() as usize;
    GridSpec::new(
        rows,
        cols,
        GeoTransform::new(MOSUL_WEST, MOSUL_NORTH, pixel, -pixel),
    )
}
