pub mod analysis;
pub mod composite;
pub mod consts;
pub mod error;
pub mod export;
pub mod index;
pub mod io;
pub mod mask;
pub mod naming;
pub mod pansharpen;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod scene;
pub mod stack;
pub mod store;
pub mod window;
