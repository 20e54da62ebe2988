//! 256-bin intensity histograms and the CDF-derived lookup tables built from them.
//!
//! Both the global equalizer and every CLAHE tile go through the same path:
//! count -> (optionally clip) -> cumulate -> remap through a `Lut`.

use image::GrayImage;

/// Number of intensity levels of an 8-bit sample.
pub const LEVELS: usize = 256;

const MAX_LEVEL: f64 = (LEVELS - 1) as f64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; LEVELS],
    total: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            counts: [0; LEVELS],
            total: 0,
        }
    }
}

impl Histogram {
    pub fn from_pixels<I: IntoIterator<Item = u8>>(pixels: I) -> Self {
        let mut hist = Self::default();
        for v in pixels {
            hist.counts[v as usize] += 1;
            hist.total += 1;
        }
        hist
    }

    pub fn from_image(image: &GrayImage) -> Self {
        Self::from_pixels(image.as_raw().iter().copied())
    }

    pub fn counts(&self) -> &[u32; LEVELS] {
        &self.counts
    }

    /// Number of samples counted (the sum of all bins).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Running sum of the bins: `cdf[k]` is the number of samples with level <= k.
    pub fn cdf(&self) -> [u64; LEVELS] {
        let mut cdf = [0u64; LEVELS];
        let mut sum = 0u64;
        for (c, &count) in cdf.iter_mut().zip(self.counts.iter()) {
            sum += count as u64;
            *c = sum;
        }
        cdf
    }

    /// Smallest nonzero cumulative count, `None` for an empty histogram.
    pub fn cdf_min(&self) -> Option<u64> {
        self.counts.iter().find(|&&c| c > 0).map(|&c| c as u64)
    }

    pub fn populated_levels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn min_level(&self) -> Option<u8> {
        self.counts.iter().position(|&c| c > 0).map(|i| i as u8)
    }

    pub fn max_level(&self) -> Option<u8> {
        self.counts.iter().rposition(|&c| c > 0).map(|i| i as u8)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let weighted: u64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(level, &c)| level as u64 * c as u64)
            .sum();
        Some(weighted as f64 / self.total as f64)
    }

    /// Variance of the bin counts around the uniform height `total / 256`.
    pub fn bin_variance(&self) -> f64 {
        let uniform = self.total as f64 / LEVELS as f64;
        self.counts
            .iter()
            .map(|&c| {
                let d = c as f64 - uniform;
                d * d
            })
            .sum::<f64>()
            / LEVELS as f64
    }

    /// Largest distance between the normalized CDF and the linear ramp `(k + 1) / 256`.
    /// Zero for a perfectly flat histogram; an empty histogram reports zero.
    pub fn cdf_deviation(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        self.cdf()
            .iter()
            .enumerate()
            .map(|(k, &c)| (c as f64 / total - (k + 1) as f64 / LEVELS as f64).abs())
            .fold(0.0, f64::max)
    }

    /// Cap every bin at `ceiling` and hand the clipped excess back to all bins:
    /// a whole batch to each bin, then the residual one by one at a fixed stride.
    /// The total is unchanged. Returns the number of clipped samples.
    pub fn clip(&mut self, ceiling: u32) -> u64 {
        let mut clipped = 0u64;
        for c in self.counts.iter_mut() {
            if *c > ceiling {
                clipped += (*c - ceiling) as u64;
                *c = ceiling;
            }
        }
        if clipped == 0 {
            return 0;
        }

        let batch = (clipped / LEVELS as u64) as u32;
        let mut residual = (clipped % LEVELS as u64) as usize;
        for c in self.counts.iter_mut() {
            *c += batch;
        }

        if residual > 0 {
            let step = (LEVELS / residual).max(1);
            let mut i = 0;
            while i < LEVELS && residual > 0 {
                self.counts[i] += 1;
                i += step;
                residual -= 1;
            }
        }

        clipped
    }
}

/// Round half up and saturate into the 8-bit range.
#[inline]
pub(crate) fn round_to_level(value: f64) -> u8 {
    (value + 0.5).floor().clamp(0.0, MAX_LEVEL) as u8
}

/// Intensity lookup table: `lut[v]` is the output level for input level `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lut([u8; LEVELS]);

impl Default for Lut {
    fn default() -> Self {
        Self::identity()
    }
}

impl Lut {
    pub fn identity() -> Self {
        let mut table = [0u8; LEVELS];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        Lut(table)
    }

    /// Equalization mapping `round((C(v) - C_min) / (N - C_min) * 255)`.
    ///
    /// A histogram with a single populated level (or none) gives the identity,
    /// so flat regions pass through untouched instead of dividing by zero.
    pub fn from_histogram(hist: &Histogram) -> Self {
        let total = hist.total();
        let cdf_min = match hist.cdf_min() {
            Some(m) if m < total => m,
            _ => return Self::identity(),
        };

        let denom = (total - cdf_min) as f64;
        let cdf = hist.cdf();
        let mut table = [0u8; LEVELS];
        for (v, &c) in table.iter_mut().zip(cdf.iter()) {
            *v = round_to_level(c.saturating_sub(cdf_min) as f64 / denom * MAX_LEVEL);
        }
        Lut(table)
    }

    #[inline]
    pub fn map(&self, level: u8) -> u8 {
        self.0[level as usize]
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &v)| i == v as usize)
    }

    /// Remap every pixel into a new image of the same dimensions.
    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let mut out = image.clone();
        for p in out.iter_mut() {
            *p = self.0[*p as usize];
        }
        out
    }
}
