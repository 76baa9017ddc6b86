pub(crate) mod controller;
pub(crate) mod raster;
pub(crate) mod viewport;
