use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LakewatchError, Result};
use crate::raster::GridSpec;
use crate::scene::Scene;
use crate::store::{SceneQuery, SceneStore};

use super::geotiff::{read_band, read_quality};

/// File name looked up when a catalog directory is given.
pub const CATALOG_FILE_NAME: &str = "catalog.json";

/// One scene as described in `catalog.json`. Paths are relative to the
/// catalog directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub acquired: DateTime<Utc>,
    #[serde(default)]
    pub properties: BTreeMap<String, f64>,
    /// Exterior ring of the footprint; defaults to the raster extent.
    #[serde(default)]
    pub footprint: Option<Vec<[f64; 2]>>,
    pub bands: BTreeMap<String, PathBuf>,
    pub quality: PathBuf,
    /// Band value marking missing pixels, in addition to NaN.
    #[serde(default)]
    pub nodata: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub scenes: Vec<CatalogEntry>,
}

/// Scene store backed by a directory of single-band TIFFs and a JSON index.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    root: PathBuf,
    catalog: Catalog,
}

impl CatalogStore {
    /// Open a catalog from `catalog.json` or from a directory containing it.
    pub fn open(path: &Path) -> Result<Self> {
        let file = if path.is_dir() {
            path.join(CATALOG_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        let root = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let contents = std::fs::read_to_string(&file)?;
        let catalog: Catalog = serde_json::from_str(&contents)?;
        info!(
            scenes = catalog.scenes.len(),
            path = %file.display(),
            "Opened scene catalog"
        );
        Ok(Self { root, catalog })
    }

    pub fn from_catalog(root: PathBuf, catalog: Catalog) -> Self {
        Self { root, catalog }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.catalog.scenes
    }

    /// Load every raster of an entry into a [`Scene`].
    pub fn load(&self, entry: &CatalogEntry) -> Result<Scene> {
        let quality = read_quality(&self.root.join(&entry.quality))?;
        let shape = quality.dim();

        let mut bands = BTreeMap::new();
        let mut transform = None;
        for (name, rel) in &entry.bands {
            let (raster, band_transform) = read_band(&self.root.join(rel), entry.nodata)?;
            transform = transform.or(band_transform);
            bands.insert(name.clone(), raster);
        }

        let grid = GridSpec::new(shape.0, shape.1, transform.unwrap_or_default());
        let mut scene = Scene::new(entry.id.clone(), entry.acquired, grid).with_quality(quality);
        scene.bands = bands;
        scene.properties = entry.properties.clone();
        if let Some(ring) = &entry.footprint {
            scene.footprint = ring_polygon(ring);
        }
        scene.validate()?;
        Ok(scene)
    }

    /// Metadata-only pre-filter: date and cloud cover, plus footprint when
    /// the catalog states one.
    fn may_match(&self, entry: &CatalogEntry, query: &SceneQuery<'_>) -> bool {
        let clear_enough = entry
            .properties
            .get(query.cloud_attribute)
            .is_some_and(|&cover| cover < query.cloud_threshold);
        let footprint_ok = match &entry.footprint {
            Some(ring) => query.region.intersects(&ring_polygon(ring)),
            None => true,
        };
        clear_enough && query.window.contains(&entry.acquired) && footprint_ok
    }
}

impl SceneStore for CatalogStore {
    fn query(&self, query: &SceneQuery<'_>) -> Result<Vec<Scene>> {
        let mut scenes = Vec::new();
        for entry in self.entries() {
            if !self.may_match(entry, query) {
                continue;
            }
            let scene = self.load(entry).map_err(|e| {
                LakewatchError::Query(format!("failed to load scene {}: {e}", entry.id))
            })?;
            if query.matches(&scene) {
                scenes.push(scene);
            }
        }
        debug!(window = %query.window, matched = scenes.len(), "Catalog scene query");
        Ok(scenes)
    }
}

fn ring_polygon(ring: &[[f64; 2]]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|&[x, y]| Coord { x, y }).collect();
    Polygon::new(LineString::from(coords), vec![])
}
