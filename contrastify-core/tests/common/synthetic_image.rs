use image::{GrayImage, Luma};

/// Left half black, right half white.
pub fn split_u8(width: u32, height: u32) -> GrayImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    GrayImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Dim, low-contrast ramp confined to `base..base + span`.
pub fn low_contrast_u8(width: u32, height: u32, base: u8, span: u8) -> GrayImage {
    assert!(span > 0, "span must be positive");
    GrayImage::from_fn(width, height, |x, y| {
        Luma([base + ((x + 2 * y) % span as u32) as u8])
    })
}

/// Deterministic pseudo-random noise (xorshift), full 0..=255 range.
pub fn noise_u8(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed.max(1);
    GrayImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Luma([(state >> 24) as u8])
    })
}
