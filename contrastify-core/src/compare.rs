/// Pixel-by-pixel comparison of two gray images of equal size.

use image::{GrayImage, Luma};

use crate::error::{invalid_parameter, Result};

/// Differences are amplified by this factor in the visual diff.
const DIFF_GAIN: u32 = 4;

#[derive(Debug, Clone)]
pub struct ImageDiff {
    pub width: u32,
    pub height: u32,
    pub exact_matches: u64,
    pub mean_abs_error: f64,
    pub max_error: u8,
    pub diff: Option<GrayImage>,
}

impl ImageDiff {
    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn match_percentage(&self) -> f64 {
        let total = self.total_pixels();
        if total == 0 {
            return 100.0;
        }
        self.exact_matches as f64 / total as f64 * 100.0
    }

    pub fn is_identical(&self) -> bool {
        self.exact_matches == self.total_pixels()
    }
}

pub fn compare(a: &GrayImage, b: &GrayImage, with_diff: bool) -> Result<ImageDiff> {
    if a.dimensions() != b.dimensions() {
        let (wa, ha) = a.dimensions();
        let (wb, hb) = b.dimensions();
        return Err(invalid_parameter(format!(
            "images have different dimensions: {wa}x{ha} vs {wb}x{hb}"
        )));
    }

    let (width, height) = a.dimensions();
    let mut exact_matches = 0u64;
    let mut sum_abs_error = 0u64;
    let mut max_error = 0u8;

    for (&pa, &pb) in a.as_raw().iter().zip(b.as_raw().iter()) {
        let d = pa.abs_diff(pb);
        if d == 0 {
            exact_matches += 1;
        }
        sum_abs_error += d as u64;
        max_error = max_error.max(d);
    }

    let total = width as u64 * height as u64;
    let mean_abs_error = if total == 0 {
        0.0
    } else {
        sum_abs_error as f64 / total as f64
    };

    let diff = with_diff.then(|| {
        GrayImage::from_fn(width, height, |x, y| {
            let d = a.get_pixel(x, y)[0].abs_diff(b.get_pixel(x, y)[0]) as u32;
            Luma([(d * DIFF_GAIN).min(255) as u8])
        })
    });

    Ok(ImageDiff {
        width,
        height,
        exact_matches,
        mean_abs_error,
        max_error,
        diff,
    })
}
