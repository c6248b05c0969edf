use thiserror::Error;

#[derive(Error, Debug)]
pub enum LakewatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Grid mismatch: expected {expected:?}, found {found:?}")]
    GridMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Scene {scene} has no band named {band}")]
    MissingBand { scene: String, band: String },

    #[error("Scene query failed: {0}")]
    Query(String),

    #[error("Export of {name} failed: {reason}")]
    Export { name: String, reason: String },

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LakewatchError>;
