pub mod clahe;
pub mod compare;
pub mod equalize;
pub mod error;
pub mod exif_orientation;
pub mod histogram;
pub mod io;
pub mod pipeline;
