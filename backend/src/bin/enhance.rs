//! `enhance` CLI - run the enhancement pipeline on one image and write it out
//! as PNG, JPEG, WEBP and single-frame APNG.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_enhancer::models::params::{
    DEFAULT_CLAHE_CLIP, DEFAULT_DENOISE_COLOR, DEFAULT_DENOISE_LUMA, DEFAULT_SATURATION,
    DEFAULT_SHARPEN_AMOUNT, DEFAULT_SHARPEN_SIGMA,
};
use image_enhancer::{render, write_bundle, EnhanceParams, SizeSpec};

/// Enhance an image (denoise, balance, contrast, sharpen, upscale) and export
/// it in multiple formats.
#[derive(Parser, Debug)]
#[command(name = "enhance")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the input image.
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// Output directory.
    #[arg(long = "out", default_value = "outputs", value_name = "DIR")]
    out_dir: PathBuf,

    /// Upscale factor [default: 2.0].
    #[arg(long, group = "size", value_name = "FLOAT")]
    scale: Option<f64>,

    /// Target width; height follows the aspect ratio.
    #[arg(long, group = "size", value_name = "INT")]
    width: Option<u32>,

    /// Target height; width follows the aspect ratio.
    #[arg(long, group = "size", value_name = "INT")]
    height: Option<u32>,

    /// Denoise strength for luma.
    #[arg(long, default_value_t = DEFAULT_DENOISE_LUMA, value_name = "FLOAT")]
    denoise_luma: f32,

    /// Denoise strength for color.
    #[arg(long, default_value_t = DEFAULT_DENOISE_COLOR, value_name = "FLOAT")]
    denoise_color: f32,

    /// CLAHE clip limit.
    #[arg(long, default_value_t = DEFAULT_CLAHE_CLIP, value_name = "FLOAT")]
    clahe_clip: f64,

    /// Unsharp mask amount.
    #[arg(long, default_value_t = DEFAULT_SHARPEN_AMOUNT, value_name = "FLOAT")]
    sharpen_amount: f32,

    /// Unsharp mask sigma.
    #[arg(long, default_value_t = DEFAULT_SHARPEN_SIGMA, value_name = "FLOAT")]
    sharpen_sigma: f32,

    /// Saturation factor.
    #[arg(long, default_value_t = DEFAULT_SATURATION, value_name = "FLOAT")]
    saturation: f32,

    /// Log each pipeline stage.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn params(&self) -> EnhanceParams {
        EnhanceParams {
            size: SizeSpec::from_options(self.scale, self.width, self.height),
            denoise_luma: self.denoise_luma,
            denoise_color: self.denoise_color,
            clahe_clip: self.clahe_clip,
            sharpen_amount: self.sharpen_amount,
            sharpen_sigma: self.sharpen_sigma,
            saturation: self.saturation,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("image_enhancer={log_level},enhance={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(err) = run(&args) {
        eprintln!("{}", failure_message(&err));
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Printed regardless of the log filter, with the whole context chain.
fn failure_message(err: &anyhow::Error) -> String {
    format!("error: {err:#}")
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input image not found: {}", args.input.display());
    }

    let params = args.params();
    params.validate().context("Invalid parameters")?;

    let data = std::fs::read(&args.input)
        .with_context(|| format!("Could not read image: {}", args.input.display()))?;
    let result = render(&data, &params)
        .with_context(|| format!("Failed to enhance {}", args.input.display()))?;

    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let written = write_bundle(&result.bundle, &args.out_dir, &stem)
        .with_context(|| format!("Failed to write outputs to {}", args.out_dir.display()))?;

    println!("Saved:");
    for (format, path) in written {
        println!("  {}: {}", format.key(), path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_flags_are_exclusive() {
        let err = Args::try_parse_from(["enhance", "--in", "a.png", "--scale", "2", "--width", "10"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["enhance", "--in", "a.png"]).unwrap();
        assert_eq!(args.out_dir, PathBuf::from("outputs"));
        assert_eq!(args.params(), EnhanceParams::default());
    }

    #[test]
    fn test_width_flag() {
        let args = Args::try_parse_from(["enhance", "--in", "a.png", "--width", "300"]).unwrap();
        assert_eq!(args.params().size, SizeSpec::TargetWidth(300));
    }

    #[test]
    fn test_missing_input_fails() {
        let args = Args::try_parse_from(["enhance", "--in", "/definitely/not/here.png"]).unwrap();
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("Input image not found"));
    }

    #[test]
    fn test_failure_message_keeps_context() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not a png").unwrap();
        let args = Args::try_parse_from([
            "enhance",
            "--in",
            input.to_str().unwrap(),
            "--out",
            dir.path().join("out").to_str().unwrap(),
        ])
        .unwrap();

        let message = failure_message(&run(&args).unwrap_err());
        assert!(message.starts_with("error: Failed to enhance"), "{}", message);
        assert!(message.contains("unable to decode image"), "{}", message);
        assert!(!dir.path().join("out").exists());
    }
}
