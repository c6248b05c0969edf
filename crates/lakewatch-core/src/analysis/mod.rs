pub mod reclassify;
pub mod zonal;
