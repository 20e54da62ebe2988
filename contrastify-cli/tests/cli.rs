use contrastify_core::io::save_gray;
use image::{GrayImage, Luma};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_contrastify-cli"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to spawn contrastify-cli")
}

fn write_ramp(path: &Path) {
    let gray = GrayImage::from_fn(32, 32, |x, y| Luma([60 + ((x + y) % 30) as u8]));
    save_gray(&gray, path).unwrap();
}

#[test]
fn enhance_succeeds_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp(&dir.path().join("scan.png"));

    let out = run(&["enhance", "scan.png"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("results/equalized.png").is_file());
    assert!(dir.path().join("results/clahe.png").is_file());
}

#[test]
fn missing_input_fails_without_output_dir() {
    let dir = tempfile::tempdir().unwrap();

    let out = run(&["enhance", "nope.png"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to decode"));
    assert!(!dir.path().join("results").exists());
}

#[test]
fn corrupt_input_fails_without_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.png"), b"not an image").unwrap();

    let out = run(&["enhance", "broken.png", "--output-dir", "out"], dir.path());
    assert!(!out.status.success());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unencodable_output_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp(&dir.path().join("scan.png"));

    let out = run(
        &["enhance", "scan.png", "--clahe-name", "clahe.unknownext"],
        dir.path(),
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to encode"));
    // the equalized result was written before the failing save
    assert!(dir.path().join("results/equalized.png").is_file());
}

#[test]
fn invalid_tile_grid_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp(&dir.path().join("scan.png"));

    let zero = run(&["enhance", "scan.png", "--tile-rows", "0"], dir.path());
    assert!(!zero.status.success());

    let huge = run(
        &["enhance", "scan.png", "--tile-rows", "65536", "--tile-cols", "65536"],
        dir.path(),
    );
    assert!(!huge.status.success());
    assert!(String::from_utf8_lossy(&huge.stderr).contains("invalid parameter"));
    assert!(!dir.path().join("results").exists());
}

#[test]
fn stats_reports_range() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp(&dir.path().join("scan.png"));

    let out = run(&["stats", "scan.png"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Dimensions: 32x32"), "{stdout}");
    assert!(stdout.contains("Range: 60..=89"), "{stdout}");
}
