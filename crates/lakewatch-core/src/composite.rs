use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{EPSILON, NDWI_BAND_NAME, PARALLEL_SCENE_THRESHOLD};
use crate::error::{LakewatchError, Result};
use crate::index::compute_ndwi;
use crate::mask::{CloudMask, SensorKind};
use crate::pansharpen::pansharpen;
use crate::raster::{GridSpec, Mask, Raster};
use crate::region::{PixelWindow, StudyRegion};
use crate::scene::Scene;
use crate::stack::median::median_stack;
use crate::window::DateWindow;

/// What each composite carries. Chosen once per run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RunMode {
    /// Normalized difference water index from a green and a SWIR band.
    Index { green: String, swir: String },
    /// Fixed red/green/blue band triple, no index computed. With `pan` set
    /// the triple is HSV-pansharpened with that band before reduction.
    Rgb {
        bands: [String; 3],
        #[serde(default)]
        pan: Option<String>,
    },
}

impl Default for RunMode {
    fn default() -> Self {
        Self::Index {
            green: "B2".to_string(),
            swir: "B5".to_string(),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index { green, swir } => write!(f, "NDWI ({green}, {swir})"),
            Self::Rgb {
                bands: [r, g, b],
                pan: None,
            } => write!(f, "RGB ({r}, {g}, {b})"),
            Self::Rgb {
                bands: [r, g, b],
                pan: Some(pan),
            } => write!(f, "RGB ({r}, {g}, {b}) sharpened with {pan}"),
        }
    }
}

/// Pixel content of a composite.
#[derive(Clone, Debug, PartialEq)]
pub enum CompositeBands {
    Index(Raster),
    Rgb([Raster; 3]),
}

impl CompositeBands {
    pub fn rasters(&self) -> Vec<&Raster> {
        match self {
            Self::Index(r) => vec![r],
            Self::Rgb(rgb) => rgb.iter().collect(),
        }
    }

    /// Band names in output order.
    pub fn band_names(&self, mode: &RunMode) -> Vec<String> {
        match (self, mode) {
            (Self::Rgb(_), RunMode::Rgb { bands, .. }) => bands.to_vec(),
            _ => vec![NDWI_BAND_NAME.to_string()],
        }
    }
}

/// One window reduced to a single image.
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    pub window: DateWindow,
    /// Deterministic identifier, also the export file stem.
    pub name: String,
    pub bands: CompositeBands,
    /// Grid of the clipped extent.
    pub grid: GridSpec,
    /// Scenes that contributed after the window check.
    pub scene_count: usize,
}

impl Composite {
    pub fn named(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// True when no pixel carries data, e.g. because no scene matched.
    pub fn is_empty(&self) -> bool {
        self.bands.rasters().iter().all(|r| r.is_all_nodata())
    }

    pub fn valid_pixels(&self) -> usize {
        self.bands
            .rasters()
            .first()
            .map(|r| r.valid_count())
            .unwrap_or(0)
    }
}

/// Masks, indexes, clips, and median-reduces the scenes of one window.
pub struct Compositor {
    mask: Box<dyn CloudMask>,
    mode: RunMode,
    grid: GridSpec,
    clip_window: PixelWindow,
    clip_mask: Mask,
}

impl Compositor {
    /// Fails when the study region does not overlap the analysis grid.
    pub fn new(
        sensor: &SensorKind,
        mode: RunMode,
        region: &StudyRegion,
        grid: GridSpec,
    ) -> Result<Self> {
        let clip_window = region.clip_window(&grid).ok_or_else(|| {
            LakewatchError::Config("study region does not overlap the analysis grid".into())
        })?;
        let (r0, c0, rows, cols) = clip_window;
        let cropped = grid.crop(r0, c0, rows, cols);
        let clip_mask = region.clip_mask(&cropped);
        Ok(Self {
            mask: sensor.cloud_mask(),
            mode,
            grid,
            clip_window,
            clip_mask,
        })
    }

    pub fn mode(&self) -> &RunMode {
        &self.mode
    }

    /// Grid of every composite this compositor produces.
    pub fn output_grid(&self) -> GridSpec {
        let (r0, c0, rows, cols) = self.clip_window;
        self.grid.crop(r0, c0, rows, cols)
    }

    /// Reduce `scenes` into the composite for `window`.
    ///
    /// Scenes acquired outside the window are dropped. Each pixel of the
    /// result is the median of its valid contributions; pixels with none
    /// are no-data. The returned composite is unnamed.
    pub fn composite(&self, window: &DateWindow, scenes: &[Scene]) -> Result<Composite> {
        let in_window: Vec<&Scene> = scenes
            .iter()
            .filter(|scene| {
                let inside = window.contains(&scene.acquired);
                if !inside {
                    warn!(
                        scene = %scene.id,
                        acquired = %scene.acquired,
                        window = %window,
                        "Dropping scene acquired outside its window"
                    );
                }
                inside
            })
            .collect();

        let prepared: Vec<Vec<Raster>> = if in_window.len() >= PARALLEL_SCENE_THRESHOLD {
            in_window
                .par_iter()
                .map(|scene| self.prepare_scene(scene))
                .collect::<Result<_>>()?
        } else {
            in_window
                .iter()
                .map(|scene| self.prepare_scene(scene))
                .collect::<Result<_>>()?
        };

        let output_grid = self.output_grid();
        let shape = output_grid.shape();

        // Median reduction is the barrier: it needs every scene of the window.
        let reduce = |band: usize| -> Result<Raster> {
            let stack: Vec<Raster> = prepared.iter().map(|bands| bands[band].clone()).collect();
            median_stack(&stack, shape)
        };
        let bands = match self.mode {
            RunMode::Index { .. } => CompositeBands::Index(reduce(0)?),
            RunMode::Rgb { .. } => CompositeBands::Rgb([reduce(0)?, reduce(1)?, reduce(2)?]),
        };

        let composite = Composite {
            window: *window,
            name: String::new(),
            bands,
            grid: output_grid,
            scene_count: in_window.len(),
        };
        debug!(
            window = %window,
            scenes = composite.scene_count,
            valid_pixels = composite.valid_pixels(),
            "Composite reduced"
        );
        Ok(composite)
    }

    /// Mask one scene, derive its output bands, and clip them to the region.
    fn prepare_scene(&self, scene: &Scene) -> Result<Vec<Raster>> {
        scene.validate()?;
        self.check_grid(scene)?;

        let masked = self.mask.apply(scene)?;
        let bands = match &self.mode {
            RunMode::Index { green, swir } => vec![compute_ndwi(&masked, green, swir)?],
            RunMode::Rgb { bands, pan: None } => bands
                .iter()
                .map(|name| masked.band(name).cloned())
                .collect::<Result<Vec<_>>>()?,
            RunMode::Rgb {
                bands: [r, g, b],
                pan: Some(pan),
            } => {
                let rgb = [masked.band(r)?, masked.band(g)?, masked.band(b)?];
                pansharpen(rgb, masked.band(pan)?)?.to_vec()
            }
        };

        let (r0, c0, rows, cols) = self.clip_window;
        bands
            .into_iter()
            .map(|band| {
                let mut clipped = band.crop(r0, c0, rows, cols);
                clipped.apply_mask(&self.clip_mask)?;
                Ok(clipped)
            })
            .collect()
    }

    fn check_grid(&self, scene: &Scene) -> Result<()> {
        if scene.grid.shape() != self.grid.shape() {
            return Err(LakewatchError::GridMismatch {
                expected: self.grid.shape(),
                found: scene.grid.shape(),
            });
        }
        let (a, b) = (&scene.grid.transform, &self.grid.transform);
        let tolerance = self.grid.transform.cell_size() * 1e-6 + EPSILON;
        let aligned = (a.origin_x - b.origin_x).abs() < tolerance
            && (a.origin_y - b.origin_y).abs() < tolerance
            && (a.pixel_width - b.pixel_width).abs() < tolerance
            && (a.pixel_height - b.pixel_height).abs() < tolerance;
        if !aligned {
            return Err(LakewatchError::Query(format!(
                "scene {} is not on the analysis grid",
                scene.id
            )));
        }
        Ok(())
    }
}
