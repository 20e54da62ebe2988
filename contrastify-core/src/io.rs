//! Decode/encode of 8-bit grayscale images.
//!
//! - `load_gray`: any format the `image` crate reads, EXIF-oriented, reduced to one channel.
//! - `save_gray`: format picked from the extension; never creates directories.
//! - `ensure_dir`: create an output directory up front.

use image::{DynamicImage, GrayImage, Luma};
use log::debug;
use std::fs;
use std::path::Path;

use crate::error::{ContrastError, Result};
use crate::exif_orientation::apply_exif_orientation;

pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).map_err(|source| ContrastError::DecodeError {
        path: path.to_path_buf(),
        source,
    })?;
    let img = apply_exif_orientation(img, path);
    debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(to_gray(img))
}

/// Reduce a decoded image to one 8-bit channel. Gray inputs keep their samples
/// (16-bit ones are rescaled); color inputs go through BT.601 luma.
pub fn to_gray(img: DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray,
        gray @ (DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)) => gray.into_luma8(),
        other => bt601_luma(&other),
    }
}

/// BT.601 integer formula: gray = (R*4899 + G*9617 + B*1868 + 8192) >> 14
fn bt601_luma(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let val = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        Luma([val.min(255) as u8])
    })
}

pub fn save_gray(image: &GrayImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| ContrastError::EncodeError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("encoded {} ({}x{})", path.display(), image.width(), image.height());
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ContrastError::DirectoryError {
        path: path.to_path_buf(),
        source,
    })
}
