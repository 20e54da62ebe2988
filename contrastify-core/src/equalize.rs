/// Global histogram equalization:
/// one histogram over the whole image, one CDF-derived lookup table, one remap.

use image::GrayImage;
use log::debug;

use crate::histogram::{Histogram, Lut};

pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let hist = Histogram::from_image(image);
    let lut = Lut::from_histogram(&hist);
    debug!(
        "equalize {}x{}: {} populated levels, identity={}",
        image.width(),
        image.height(),
        hist.populated_levels(),
        lut.is_identity()
    );
    lut.apply(image)
}
