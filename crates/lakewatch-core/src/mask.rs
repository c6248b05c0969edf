use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_TOA_BAND_PREFIX, LANDSAT_SR_CLOUD_BIT, LANDSAT_SR_CLOUD_CONFIDENCE_BIT,
    LANDSAT_SR_SHADOW_BIT, LANDSAT_TOA_CLOUD_BIT, SENTINEL2_CIRRUS_BIT, SENTINEL2_CLOUD_BIT,
    SENTINEL2_QUANTIFICATION,
};
use crate::error::Result;
use crate::raster::{check_shape, Mask};
use crate::scene::Scene;

/// Sensor-specific cloud masking.
///
/// `mask` only derives validity from the quality band; it never touches
/// pixel values. `apply` folds that mask into every band of a copy of the
/// scene and performs the sensor's band preparation.
pub trait CloudMask: Send + Sync {
    fn name(&self) -> &'static str;

    fn mask(&self, scene: &Scene) -> Result<Mask>;

    fn apply(&self, scene: &Scene) -> Result<Scene> {
        let mask = self.mask(scene)?;
        masked_copy(scene, &mask)
    }
}

/// Landsat 4-7 surface reflectance (`pixel_qa`).
///
/// A pixel is rejected for high-confidence cloud (bits 5 and 7) or cloud
/// shadow (bit 3), and wherever any band of the scene is already no-data,
/// which removes the ragged edge pixels that only some bands cover.
#[derive(Clone, Debug, Default)]
pub struct LandsatSrMask;

impl CloudMask for LandsatSrMask {
    fn name(&self) -> &'static str {
        "Landsat SR"
    }

    fn mask(&self, scene: &Scene) -> Result<Mask> {
        let mut mask = quality_mask(scene, |qa| {
            let cloud = qa & LANDSAT_SR_CLOUD_BIT != 0 && qa & LANDSAT_SR_CLOUD_CONFIDENCE_BIT != 0;
            let shadow = qa & LANDSAT_SR_SHADOW_BIT != 0;
            cloud || shadow
        })?;
        for band in scene.bands.values() {
            mask.intersect(&band.validity())?;
        }
        debug!(scene = %scene.id, valid = mask.valid_count(), "Landsat SR mask");
        Ok(mask)
    }
}

/// Landsat 8 surface reflectance (`pixel_qa`): cloud (bit 5) or cloud
/// shadow (bit 3), no confidence bit and no edge intersection.
#[derive(Clone, Debug, Default)]
pub struct Landsat8SrMask;

impl CloudMask for Landsat8SrMask {
    fn name(&self) -> &'static str {
        "Landsat 8 SR"
    }

    fn mask(&self, scene: &Scene) -> Result<Mask> {
        let mask = quality_mask(scene, |qa| {
            qa & LANDSAT_SR_CLOUD_BIT != 0 || qa & LANDSAT_SR_SHADOW_BIT != 0
        })?;
        debug!(scene = %scene.id, valid = mask.valid_count(), "Landsat 8 SR mask");
        Ok(mask)
    }
}

/// Landsat top-of-atmosphere (`BQA`): bit 4 marks cloud.
///
/// Only bands whose name starts with `band_prefix` survive `apply`.
#[derive(Clone, Debug)]
pub struct LandsatToaMask {
    pub band_prefix: String,
}

impl Default for LandsatToaMask {
    fn default() -> Self {
        Self {
            band_prefix: DEFAULT_TOA_BAND_PREFIX.to_string(),
        }
    }
}

impl CloudMask for LandsatToaMask {
    fn name(&self) -> &'static str {
        "Landsat TOA"
    }

    fn mask(&self, scene: &Scene) -> Result<Mask> {
        let mask = quality_mask(scene, |qa| qa & LANDSAT_TOA_CLOUD_BIT != 0)?;
        debug!(scene = %scene.id, valid = mask.valid_count(), "Landsat TOA mask");
        Ok(mask)
    }

    fn apply(&self, scene: &Scene) -> Result<Scene> {
        let mask = self.mask(scene)?;
        let mut masked = masked_copy(scene, &mask)?;
        masked
            .bands
            .retain(|name, _| name.starts_with(&self.band_prefix));
        Ok(masked)
    }
}

/// Sentinel-2 surface reflectance (`QA60`): bit 10 is opaque cloud, bit 11
/// cirrus.
///
/// `apply` also divides every band by `quantification` to bring digital
/// numbers into unit reflectance.
#[derive(Clone, Debug)]
pub struct Sentinel2SrMask {
    pub quantification: f32,
}

impl Default for Sentinel2SrMask {
    fn default() -> Self {
        Self {
            quantification: SENTINEL2_QUANTIFICATION,
        }
    }
}

impl CloudMask for Sentinel2SrMask {
    fn name(&self) -> &'static str {
        "Sentinel-2 SR"
    }

    fn mask(&self, scene: &Scene) -> Result<Mask> {
        let mask = quality_mask(scene, |qa| {
            qa & SENTINEL2_CLOUD_BIT != 0 || qa & SENTINEL2_CIRRUS_BIT != 0
        })?;
        debug!(scene = %scene.id, valid = mask.valid_count(), "Sentinel-2 SR mask");
        Ok(mask)
    }

    fn apply(&self, scene: &Scene) -> Result<Scene> {
        let mask = self.mask(scene)?;
        let mut masked = masked_copy(scene, &mask)?;
        for band in masked.bands.values_mut() {
            *band = band.scaled(self.quantification);
        }
        Ok(masked)
    }
}

/// Sensor family selector, chosen once per run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SensorKind {
    #[default]
    LandsatSr,
    Landsat8Sr,
    LandsatToa { band_prefix: String },
    Sentinel2Sr { quantification: f32 },
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LandsatSr => write!(f, "Landsat SR"),
            Self::Landsat8Sr => write!(f, "Landsat 8 SR"),
            Self::LandsatToa { band_prefix } => write!(f, "Landsat TOA (bands {band_prefix}*)"),
            Self::Sentinel2Sr { quantification } => {
                write!(f, "Sentinel-2 SR (/{quantification})")
            }
        }
    }
}

impl SensorKind {
    pub fn sentinel2() -> Self {
        Self::Sentinel2Sr {
            quantification: SENTINEL2_QUANTIFICATION,
        }
    }

    pub fn landsat_toa() -> Self {
        Self::LandsatToa {
            band_prefix: DEFAULT_TOA_BAND_PREFIX.to_string(),
        }
    }

    /// Metadata property holding the scene-level cloud percentage.
    pub fn default_cloud_attribute(&self) -> &'static str {
        match self {
            Self::LandsatSr | Self::Landsat8Sr | Self::LandsatToa { .. } => "CLOUD_COVER",
            Self::Sentinel2Sr { .. } => "CLOUDY_PIXEL_PERCENTAGE",
        }
    }

    pub fn cloud_mask(&self) -> Box<dyn CloudMask> {
        match self {
            Self::LandsatSr => Box::new(LandsatSrMask),
            Self::Landsat8Sr => Box::new(Landsat8SrMask),
            Self::LandsatToa { band_prefix } => Box::new(LandsatToaMask {
                band_prefix: band_prefix.clone(),
            }),
            Self::Sentinel2Sr { quantification } => Box::new(Sentinel2SrMask {
                quantification: *quantification,
            }),
        }
    }
}

/// Build a mask from the quality band; `is_bad` flags rejected pixels.
fn quality_mask(scene: &Scene, is_bad: impl Fn(u16) -> bool) -> Result<Mask> {
    check_shape(scene.grid.shape(), scene.quality.dim())?;
    let mut valid = Array2::from_elem(scene.quality.dim(), true);
    Zip::from(&mut valid)
        .and(&scene.quality)
        .for_each(|v, &qa| *v = !is_bad(qa));
    Ok(Mask::new(valid))
}

fn masked_copy(scene: &Scene, mask: &Mask) -> Result<Scene> {
    let mut masked = scene.clone();
    for band in masked.bands.values_mut() {
        band.apply_mask(mask)?;
    }
    Ok(masked)
}
