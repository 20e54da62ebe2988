use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contrastify_core::clahe::ClaheParams;
use contrastify_core::compare::compare;
use contrastify_core::histogram::Histogram;
use contrastify_core::io::{ensure_dir, load_gray, save_gray};
use contrastify_core::pipeline::{save_enhanced, EnhanceParams};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "contrastify-cli",
    about = "Histogram equalization and CLAHE for grayscale images"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the globally equalized and the CLAHE version of an image
    Enhance {
        /// Input image path (decoded as 8-bit grayscale)
        input: PathBuf,

        /// Output directory, created if missing
        #[arg(long, short, default_value = "results")]
        output_dir: PathBuf,

        /// CLAHE clip limit (multiple of the uniform bin height)
        #[arg(long, default_value_t = 2.0)]
        clip_limit: f64,

        /// CLAHE tile grid rows
        #[arg(long, default_value_t = 8)]
        tile_rows: u32,

        /// CLAHE tile grid columns
        #[arg(long, default_value_t = 8)]
        tile_cols: u32,

        /// File name of the globally equalized result
        #[arg(long, default_value = "equalized.png")]
        equalized_name: String,

        /// File name of the CLAHE result
        #[arg(long, default_value = "clahe.png")]
        clahe_name: String,

        /// Number of worker threads for CLAHE (default: num_cpus)
        #[arg(long, short)]
        jobs: Option<usize>,
    },

    /// Print histogram statistics of an image
    Stats {
        /// Image path
        input: PathBuf,
    },

    /// Compare two grayscale images pixel-by-pixel
    Compare {
        /// First image
        image_a: PathBuf,

        /// Second image
        image_b: PathBuf,

        /// Save visual diff to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn cmd_enhance(input: &Path, output_dir: &Path, params: &EnhanceParams) -> Result<()> {
    info!(
        "Processing: {} -> {}",
        input.display(),
        output_dir.display()
    );
    info!(
        "CLAHE: {}x{} tiles, clip limit {}",
        params.clahe.rows, params.clahe.cols, params.clahe.clip_limit
    );

    // decode first so a bad input leaves no output directory behind
    let image = load_gray(input)?;
    params.clahe.validate_for(image.width(), image.height())?;
    ensure_dir(output_dir)?;

    let outputs = save_enhanced(&image, output_dir, params)
        .with_context(|| format!("enhancing {}", input.display()))?;
    info!(
        "Wrote {} and {}",
        outputs.equalized.display(),
        outputs.clahe.display()
    );
    Ok(())
}

fn cmd_stats(input: &Path) -> Result<()> {
    let gray = load_gray(input)?;
    let hist = Histogram::from_image(&gray);

    println!("Image: {}", input.display());
    println!("Dimensions: {}x{}", gray.width(), gray.height());
    println!("Total pixels: {}", hist.total());
    match (hist.min_level(), hist.max_level(), hist.mean()) {
        (Some(lo), Some(hi), Some(mean)) => {
            println!("Range: {}..={}", lo, hi);
            println!("Mean: {:.2}", mean);
        }
        _ => println!("Range: empty"),
    }
    println!("Populated levels: {}", hist.populated_levels());
    println!("Bin variance: {:.2}", hist.bin_variance());
    println!("CDF deviation from linear: {:.4}", hist.cdf_deviation());
    Ok(())
}

fn cmd_compare(image_a: &Path, image_b: &Path, diff_output: Option<&Path>) -> Result<()> {
    let a = load_gray(image_a)?;
    let b = load_gray(image_b)?;
    let report = compare(&a, &b, diff_output.is_some())?;

    println!(
        "Image comparison: {} vs {}",
        image_a.display(),
        image_b.display()
    );
    println!("Dimensions: {}x{}", report.width, report.height);
    println!("Total pixels: {}", report.total_pixels());
    println!(
        "Exact matches: {} ({:.2}%)",
        report.exact_matches,
        report.match_percentage()
    );
    println!("MAE: {:.4}", report.mean_abs_error);
    println!("Max error: {}", report.max_error);

    if let (Some(diff), Some(out_path)) = (&report.diff, diff_output) {
        save_gray(diff, out_path)?;
        println!("Visual diff saved to: {}", out_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Enhance {
            input,
            output_dir,
            clip_limit,
            tile_rows,
            tile_cols,
            equalized_name,
            clahe_name,
            jobs,
        } => {
            if let Some(n) = jobs {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build_global()
                    .context("configuring worker threads")?;
            }

            let params = EnhanceParams {
                clahe: ClaheParams::new(tile_rows, tile_cols, clip_limit),
                equalized_name,
                clahe_name,
            };
            params.clahe.validate()?;
            cmd_enhance(&input, &output_dir, &params)?;
        }

        Commands::Stats { input } => {
            cmd_stats(&input)?;
        }

        Commands::Compare {
            image_a,
            image_b,
            output,
        } => {
            cmd_compare(&image_a, &image_b, output.as_deref())?;
        }
    }

    Ok(())
}
