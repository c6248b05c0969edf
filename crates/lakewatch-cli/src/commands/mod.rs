pub mod config;
pub mod histogram;
pub mod info;
pub mod run;
pub mod windows;

use clap::ValueEnum;
use lakewatch_core::pipeline::config::PipelineConfig;

/// Built-in run configurations.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Preset {
    /// Landsat 5 surface reflectance NDWI, 1993
    Landsat5,
    /// Landsat 7 surface reflectance NDWI, 2000
    Landsat7,
    /// Landsat 8 surface reflectance NDWI, 2018
    Landsat8,
    /// Landsat 8 TOA true colour pansharpened with B8, 2018
    Landsat8Pan,
    /// Sentinel-2 surface reflectance NDWI, 2018
    Sentinel2,
}

impl Preset {
    pub fn config(self) -> PipelineConfig {
        match self {
            Self::Landsat5 => PipelineConfig::landsat5_ndwi(),
            Self::Landsat7 => PipelineConfig::landsat7_ndwi(),
            Self::Landsat8 => PipelineConfig::landsat8_ndwi(),
            Self::Landsat8Pan => PipelineConfig::landsat8_pansharpened_rgb(),
            Self::Sentinel2 => PipelineConfig::sentinel2_ndwi(),
        }
    }
}
