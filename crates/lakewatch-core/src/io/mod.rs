pub mod catalog;
pub mod geotiff;
