/// CLAHE (Contrast Limited Adaptive Histogram Equalization)
///
/// - Divide the image into a rows x cols grid of equally sized tiles
///   (edge tiles are filled by mirroring the image, BORDER_REFLECT_101 style)
/// - Per-tile histogram, clipped at `clip_limit` times the uniform bin height,
///   excess redistributed over all bins
/// - Per-tile equalization LUT, bilinear interpolation between the four
///   nearest tile centers, clamped to the edge tiles at the borders

use image::GrayImage;
use log::debug;
use rayon::prelude::*;

use crate::error::{invalid_parameter, Result};
use crate::histogram::{round_to_level, Histogram, Lut, LEVELS};

/// Tile grid and clip limit.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaheParams {
    pub rows: u32,
    pub cols: u32,
    pub clip_limit: f64,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            clip_limit: 2.0,
        }
    }
}

impl ClaheParams {
    pub fn new(rows: u32, cols: u32, clip_limit: f64) -> Self {
        Self {
            rows,
            cols,
            clip_limit,
        }
    }

    /// Return a copy with a different clip limit.
    pub fn with_clip_limit(mut self, clip_limit: f64) -> Self {
        self.clip_limit = clip_limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(invalid_parameter(format!(
                "tile grid must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        // also rejects NaN
        if !(self.clip_limit > 0.0) {
            return Err(invalid_parameter(format!(
                "clip limit must be positive, got {}",
                self.clip_limit
            )));
        }
        Ok(())
    }

    /// `validate` plus a bound against the image: more tiles than pixels is
    /// rejected, which keeps the per-tile table allocation proportional to the image.
    pub fn validate_for(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        let tiles = self.rows as u64 * self.cols as u64;
        let pixels = width as u64 * height as u64;
        if tiles > pixels {
            return Err(invalid_parameter(format!(
                "tile grid {}x{} has more tiles than the {}x{} image has pixels",
                self.rows, self.cols, width, height
            )));
        }
        Ok(())
    }

    /// Absolute bin ceiling for a tile of `tile_pixels` samples (at least 1).
    /// An infinite clip limit saturates to `u32::MAX`, i.e. no clipping.
    pub fn clip_ceiling(&self, tile_pixels: usize) -> u32 {
        ((self.clip_limit * tile_pixels as f64) / LEVELS as f64).max(1.0) as u32
    }
}

pub fn clahe(image: &GrayImage, params: &ClaheParams) -> Result<GrayImage> {
    params.validate()?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(image.clone());
    }
    params.validate_for(width, height)?;

    let w = width as usize;
    let h = height as usize;
    let tiles_x = params.cols as usize;
    let tiles_y = params.rows as usize;

    // Every tile gets the same size; the grid may overhang the image and the
    // overhang is read back mirrored.
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);
    let ceiling = params.clip_ceiling(tile_w * tile_h);
    let gray = image.as_raw().as_slice();

    debug!(
        "clahe {w}x{h}: {tiles_y}x{tiles_x} tiles of {tile_w}x{tile_h}, ceiling {ceiling}"
    );

    let luts: Vec<Lut> = (0..tiles_x * tiles_y)
        .into_par_iter()
        .map(|i| {
            let tile = Tile {
                x0: (i % tiles_x) * tile_w,
                y0: (i / tiles_x) * tile_h,
                w: tile_w,
                h: tile_h,
            };
            tile_lut(gray, w, h, &tile, ceiling)
        })
        .collect();

    let columns = blend_axis(w, tile_w, tiles_x);
    let rows = blend_axis(h, tile_h, tiles_y);

    let mut output = GrayImage::new(width, height);
    let out: &mut [u8] = &mut output;
    out.par_chunks_mut(w)
        .zip(gray.par_chunks(w))
        .zip(rows.par_iter())
        .for_each(|((out_row, in_row), ry)| {
            let top = &luts[ry.lo * tiles_x..(ry.lo + 1) * tiles_x];
            let bottom = &luts[ry.hi * tiles_x..(ry.hi + 1) * tiles_x];

            for ((dst, &val), cx) in out_row.iter_mut().zip(in_row.iter()).zip(columns.iter()) {
                let tl = top[cx.lo].map(val) as f64;
                let tr = top[cx.hi].map(val) as f64;
                let bl = bottom[cx.lo].map(val) as f64;
                let br = bottom[cx.hi].map(val) as f64;

                let upper = tl * (1.0 - cx.weight) + tr * cx.weight;
                let lower = bl * (1.0 - cx.weight) + br * cx.weight;
                *dst = round_to_level(upper * (1.0 - ry.weight) + lower * ry.weight);
            }
        });

    Ok(output)
}

struct Tile {
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
}

fn tile_lut(gray: &[u8], w: usize, h: usize, tile: &Tile, ceiling: u32) -> Lut {
    let pixels = (tile.y0..tile.y0 + tile.h).flat_map(|y| {
        let row = reflect101(y, h) * w;
        (tile.x0..tile.x0 + tile.w).map(move |x| gray[row + reflect101(x, w)])
    });
    let mut hist = Histogram::from_pixels(pixels);

    // A flat tile keeps its level; clipping would otherwise smear it.
    if hist.populated_levels() <= 1 {
        return Lut::identity();
    }

    hist.clip(ceiling);
    Lut::from_histogram(&hist)
}

/// Neighbouring tile indices along one axis and the weight of the `hi` tile.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Blend {
    lo: usize,
    hi: usize,
    weight: f64,
}

/// Position of every pixel along one axis relative to the tile centers
/// (centers sit at `t * tile + tile / 2`). Indices and weights clamp at the edges.
fn blend_axis(len: usize, tile: usize, tiles: usize) -> Vec<Blend> {
    (0..len)
        .map(|i| {
            let f = (i as f64 - tile as f64 / 2.0) / tile as f64;
            let lo = (f.floor() as i64).clamp(0, tiles as i64 - 1) as usize;
            let hi = (lo + 1).min(tiles - 1);
            let weight = (f - lo as f64).clamp(0.0, 1.0);
            Blend { lo, hi, weight }
        })
        .collect()
}

/// Mirror an index into `0..size` without repeating the edge sample
/// (`dcb|abcd|cba`), wrapping as often as needed for grids wider than the image.
#[inline]
fn reflect101(idx: usize, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let period = 2 * (size - 1);
    let i = idx % period;
    if i < size {
        i
    } else {
        period - i
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equalize::equalize_histogram;
    use crate::error::ContrastError;
    use image::Luma;

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]))
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(0, 5), 0);
        assert_eq!(reflect101(4, 5), 4);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(9, 5), 1);
        assert_eq!(reflect101(7, 1), 0);
    }

    #[test]
    fn test_uniform_image_unchanged() {
        let gray = GrayImage::from_pixel(64, 64, Luma([128]));
        let result = clahe(&gray, &ClaheParams::default()).unwrap();
        assert_eq!(result, gray);
    }

    #[test]
    fn test_dimensions_preserved_uneven_grid() {
        let gray = gradient(37, 23);
        let result = clahe(&gray, &ClaheParams::new(5, 3, 2.0)).unwrap();
        assert_eq!(result.dimensions(), (37, 23));
    }

    #[test]
    fn test_grid_wider_than_image() {
        // 8 columns over 3 pixels: one-pixel tiles, the overhang is mirrored
        let gray = gradient(3, 40);
        let result = clahe(&gray, &ClaheParams::default()).unwrap();
        assert_eq!(result.dimensions(), (3, 40));
    }

    #[test]
    fn test_more_tiles_than_pixels_rejected() {
        let gray = gradient(3, 2);
        let err = clahe(&gray, &ClaheParams::default()).unwrap_err();
        assert!(matches!(err, ContrastError::InvalidParameterError(_)), "{err}");

        let huge = ClaheParams::new(65536, 65536, 2.0);
        assert!(huge.validate().is_ok());
        assert!(huge.validate_for(640, 480).is_err());
        assert!(ClaheParams::new(8, 8, 2.0).validate_for(8, 8).is_ok());
    }

    #[test]
    fn test_single_tile_unclipped_matches_global() {
        let gray = gradient(40, 30);
        let params = ClaheParams::new(1, 1, f64::INFINITY);
        assert_eq!(clahe(&gray, &params).unwrap(), equalize_histogram(&gray));
    }

    #[test]
    fn test_corner_uses_own_tile_only() {
        // four quadrants with different level ranges
        let gray = GrayImage::from_fn(32, 32, |x, y| {
            let base = match (x < 16, y < 16) {
                (true, true) => 20,
                (false, true) => 80,
                (true, false) => 140,
                (false, false) => 200,
            };
            Luma([base + ((x * 3 + y) % 40) as u8])
        });
        let params = ClaheParams::new(2, 2, f64::INFINITY);
        let result = clahe(&gray, &params).unwrap();

        let quadrant = GrayImage::from_fn(16, 16, |x, y| *gray.get_pixel(x, y));
        let expected = equalize_histogram(&quadrant);
        assert_eq!(result.get_pixel(0, 0), expected.get_pixel(0, 0));
    }

    #[test]
    fn test_clip_limit_reduces_contrast() {
        let gray = GrayImage::from_fn(64, 64, |x, y| Luma([100 + ((x + y) % 16) as u8]));
        let clipped = clahe(&gray, &ClaheParams::new(1, 1, 1.0)).unwrap();
        let unclipped = clahe(&gray, &ClaheParams::new(1, 1, f64::INFINITY)).unwrap();

        let range = |img: &GrayImage| {
            let hist = Histogram::from_image(img);
            hist.max_level().unwrap() - hist.min_level().unwrap()
        };
        assert!(range(&clipped) < range(&unclipped));
        assert_eq!(range(&unclipped), 255);
    }

    #[test]
    fn test_invalid_params() {
        let gray = gradient(8, 8);
        assert!(clahe(&gray, &ClaheParams::new(0, 8, 2.0)).is_err());
        assert!(clahe(&gray, &ClaheParams::new(8, 0, 2.0)).is_err());
        assert!(clahe(&gray, &ClaheParams::default().with_clip_limit(0.0)).is_err());
        assert!(clahe(&gray, &ClaheParams::default().with_clip_limit(-1.0)).is_err());
        assert!(clahe(&gray, &ClaheParams::default().with_clip_limit(f64::NAN)).is_err());
    }

    #[test]
    fn test_clip_ceiling() {
        let params = ClaheParams::default();
        assert_eq!(params.clip_ceiling(64 * 64), 32);
        assert_eq!(params.clip_ceiling(4), 1);
        assert_eq!(params.with_clip_limit(f64::INFINITY).clip_ceiling(16), u32::MAX);
    }

    #[test]
    fn test_blend_axis_clamps_edges() {
        let spans = blend_axis(16, 8, 2);
        assert_eq!(spans[0], Blend { lo: 0, hi: 1, weight: 0.0 });
        assert_eq!(spans[4], Blend { lo: 0, hi: 1, weight: 0.0 });
        assert_eq!(spans[8], Blend { lo: 0, hi: 1, weight: 0.5 });
        assert_eq!(spans[15].lo, 1);
        assert_eq!(spans[15].hi, 1);
    }
}
