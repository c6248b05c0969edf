/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum scene count to mask and index scenes in parallel.
pub const PARALLEL_SCENE_THRESHOLD: usize = 4;

/// Small epsilon used when comparing pixel sizes.
pub const EPSILON: f64 = 1e-10;

/// CRS used for export when none is configured.
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Name of the single band carried by index composites.
pub const NDWI_BAND_NAME: &str = "NDWI";

/// Landsat SR `pixel_qa`: cloud shadow bit.
pub const LANDSAT_SR_SHADOW_BIT: u16 = 1 << 3;

/// Landsat SR `pixel_qa`: cloud bit.
pub const LANDSAT_SR_CLOUD_BIT: u16 = 1 << 5;

/// Landsat SR `pixel_qa`: high cloud confidence bit.
pub const LANDSAT_SR_CLOUD_CONFIDENCE_BIT: u16 = 1 << 7;

/// Landsat TOA `BQA`: cloud bit.
pub const LANDSAT_TOA_CLOUD_BIT: u16 = 1 << 4;

/// Sentinel-2 `QA60`: opaque cloud bit.
pub const SENTINEL2_CLOUD_BIT: u16 = 1 << 10;

/// Sentinel-2 `QA60`: cirrus bit.
pub const SENTINEL2_CIRRUS_BIT: u16 = 1 << 11;

/// Sentinel-2 L2A reflectance quantification value.
pub const SENTINEL2_QUANTIFICATION: f32 = 10_000.0;

/// Band name prefix kept by the Landsat TOA mask (spectral bands only).
pub const DEFAULT_TOA_BAND_PREFIX: &str = "B";

/// GeoTIFF ModelPixelScaleTag.
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;

/// GeoTIFF ModelTiepointTag.
pub const TAG_MODEL_TIEPOINT: u16 = 33922;

/// GeoTIFF GeoKeyDirectoryTag.
pub const TAG_GEO_KEY_DIRECTORY: u16 = 34735;

/// GDAL no-data tag (ASCII).
pub const TAG_GDAL_NODATA: u16 = 42113;
