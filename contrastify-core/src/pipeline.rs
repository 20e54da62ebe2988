/// Full enhancement pipeline:
/// load gray image -> global equalization -> CLAHE -> save both results

use image::GrayImage;
use log::info;
use std::path::{Path, PathBuf};

use crate::clahe::{clahe, ClaheParams};
use crate::equalize::equalize_histogram;
use crate::error::Result;
use crate::io::{load_gray, save_gray};

/// Processing parameters and output file names.
#[derive(Debug, Clone)]
pub struct EnhanceParams {
    pub clahe: ClaheParams,
    pub equalized_name: String,
    pub clahe_name: String,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            clahe: ClaheParams::default(),
            equalized_name: "equalized.png".to_string(),
            clahe_name: "clahe.png".to_string(),
        }
    }
}

impl EnhanceParams {
    /// Return a copy with different CLAHE parameters.
    pub fn with_clahe(mut self, clahe: ClaheParams) -> Self {
        self.clahe = clahe;
        self
    }

    pub fn output_paths(&self, output_dir: &Path) -> EnhanceOutputs {
        EnhanceOutputs {
            equalized: output_dir.join(&self.equalized_name),
            clahe: output_dir.join(&self.clahe_name),
        }
    }
}

/// Both transforms of one input image.
#[derive(Debug, Clone)]
pub struct Enhanced {
    pub equalized: GrayImage,
    pub clahe: GrayImage,
}

/// Where `enhance_file` wrote its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceOutputs {
    pub equalized: PathBuf,
    pub clahe: PathBuf,
}

/// Run both transforms in memory.
pub fn enhance(image: &GrayImage, params: &ClaheParams) -> Result<Enhanced> {
    let equalized = equalize_histogram(image);
    let clahe = clahe(image, params)?;
    Ok(Enhanced { equalized, clahe })
}

/// Load `input`, write the equalized and the CLAHE result into `output_dir`.
pub fn enhance_file(input: &Path, output_dir: &Path, params: &EnhanceParams) -> Result<EnhanceOutputs> {
    let image = load_gray(input)?;
    info!(
        "Loaded {} ({}x{})",
        input.display(),
        image.width(),
        image.height()
    );
    save_enhanced(&image, output_dir, params)
}

/// Transform an already decoded image and write both results into `output_dir`.
///
/// The equalized file is written before CLAHE runs; if CLAHE or its save fails,
/// the first file stays on disk.
pub fn save_enhanced(image: &GrayImage, output_dir: &Path, params: &EnhanceParams) -> Result<EnhanceOutputs> {
    let outputs = params.output_paths(output_dir);

    let equalized = equalize_histogram(image);
    save_gray(&equalized, &outputs.equalized)?;
    info!("Done: {}", outputs.equalized.display());

    let enhanced = clahe(image, &params.clahe)?;
    save_gray(&enhanced, &outputs.clahe)?;
    info!("Done: {}", outputs.clahe.display());

    Ok(outputs)
}
