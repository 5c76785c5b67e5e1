use std::path::{Path, PathBuf};

use image::GenericImageView;

use crate::models::bgr::BgrImage;
use crate::models::error::EnhanceError;
use crate::models::output::{OutputBundle, OutputFormat};
use crate::models::params::EnhanceParams;
use crate::services::{encode, pipeline};

/// Result of one decode, enhance and encode run.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub bundle: OutputBundle,
    pub width: u32,
    pub height: u32,
}

/// Decode any supported container into the pipeline's BGR layout.
pub fn load_image(data: &[u8]) -> Result<BgrImage, EnhanceError> {
    let img = image::load_from_memory(data).map_err(EnhanceError::Decode)?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(EnhanceError::EmptyImage);
    }
    Ok(BgrImage::from_dynamic(&img))
}

/// Shared entry point of the CLI and the HTTP handler.
pub fn render(data: &[u8], params: &EnhanceParams) -> Result<RenderResult, EnhanceError> {
    let img = load_image(data)?;
    let enhanced = pipeline::enhance(&img, params)?;
    let bundle = encode::encode_all(&enhanced)?;
    Ok(RenderResult {
        bundle,
        width: enhanced.width(),
        height: enhanced.height(),
    })
}

/// Write `<stem>_enhanced.<ext>` for every payload into `out_dir`, creating
/// the directory if needed. Returns the written paths in format order.
pub fn write_bundle(
    bundle: &OutputBundle,
    out_dir: &Path,
    stem: &str,
) -> Result<Vec<(OutputFormat, PathBuf)>, EnhanceError> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(bundle.len());
    for format in OutputFormat::ALL {
        if let Some(bytes) = bundle.get(format) {
            let path = out_dir.join(format!("{}_enhanced.{}", stem, format.extension()));
            std::fs::write(&path, bytes)?;
            written.push((format, path));
        }
    }
    Ok(written)
}
