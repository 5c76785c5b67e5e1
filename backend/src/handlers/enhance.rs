use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::models::error::AppError;
use crate::models::output::EnhanceResponse;
use crate::models::params::{EnhanceParams, SizeSpec};
use crate::services::render;
use crate::AppState;

// ---------------------------------------------------------------------------
// POST /api/enhance
// ---------------------------------------------------------------------------

/// Form fields accepted next to the uploaded file. Anything absent falls
/// back to the pipeline default.
#[derive(Debug, Default)]
pub struct EnhanceForm {
    pub scale: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub denoise_luma: Option<f32>,
    pub denoise_color: Option<f32>,
    pub clahe_clip: Option<f64>,
    pub sharpen_amount: Option<f32>,
    pub sharpen_sigma: Option<f32>,
    pub saturation: Option<f32>,
}

impl EnhanceForm {
    /// Record one text field. Unknown names are ignored; blank values count
    /// as absent.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        match name {
            "scale" => self.scale = Some(parse_field(name, value)?),
            "width" => self.width = Some(parse_field(name, value)?),
            "height" => self.height = Some(parse_field(name, value)?),
            "denoise_luma" => self.denoise_luma = Some(parse_field(name, value)?),
            "denoise_color" => self.denoise_color = Some(parse_field(name, value)?),
            "clahe_clip" => self.clahe_clip = Some(parse_field(name, value)?),
            "sharpen_amount" => self.sharpen_amount = Some(parse_field(name, value)?),
            "sharpen_sigma" => self.sharpen_sigma = Some(parse_field(name, value)?),
            "saturation" => self.saturation = Some(parse_field(name, value)?),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
        Ok(())
    }

    /// `scale` only counts when neither `width` nor `height` was sent.
    pub fn into_params(self) -> EnhanceParams {
        let defaults = EnhanceParams::default();
        EnhanceParams {
            size: SizeSpec::from_options(self.scale, self.width, self.height),
            denoise_luma: self.denoise_luma.unwrap_or(defaults.denoise_luma),
            denoise_color: self.denoise_color.unwrap_or(defaults.denoise_color),
            clahe_clip: self.clahe_clip.unwrap_or(defaults.clahe_clip),
            sharpen_amount: self.sharpen_amount.unwrap_or(defaults.sharpen_amount),
            sharpen_sigma: self.sharpen_sigma.unwrap_or(defaults.sharpen_sigma),
            saturation: self.saturation.unwrap_or(defaults.saturation),
        }
    }
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|_| AppError::ValidationError(format!("Field '{}' has invalid value '{}'", name, value)))
}

/// Body-limit violations surface as multipart errors; keep their 413.
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge(e.body_text())
    } else {
        AppError::ValidationError(format!("Multipart error: {}", e.body_text()))
    }
}

pub async fn enhance_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<EnhanceResponse>, AppError> {
    let mut form = EnhanceForm::default();
    let mut file: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let data = field
                .bytes()
                .await
                .map_err(multipart_error)?;
            if data.len() as u64 > state.config.max_upload_bytes {
                return Err(AppError::FileTooLarge(format!(
                    "File size {} exceeds maximum allowed",
                    data.len()
                )));
            }
            file = Some(data);
        } else {
            let text = field
                .text()
                .await
                .map_err(multipart_error)?;
            form.set(&name, &text)?;
        }
    }

    let data = file.ok_or(AppError::MissingFile)?;
    let params = form.into_params();
    params.validate()?;
    tracing::info!(size_bytes = data.len(), size = ?params.size, "enhance request");

    let result = tokio::task::spawn_blocking(move || render::render(&data, &params))
        .await
        .map_err(|e| AppError::Internal(format!("Task panicked: {}", e)))??;

    Ok(Json(EnhanceResponse::from(&result.bundle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_width_overrides_scale() {
        let mut form = EnhanceForm::default();
        form.set("scale", "3").unwrap();
        form.set("width", "300").unwrap();
        let params = form.into_params();
        assert_eq!(params.size, SizeSpec::TargetWidth(300));
        assert_eq!(params.size.resolve(100, 50), (300, 150));
    }

    #[test]
    fn test_form_defaults() {
        let params = EnhanceForm::default().into_params();
        assert_eq!(params, EnhanceParams::default());
    }

    #[test]
    fn test_form_rejects_garbage_and_ignores_unknown() {
        let mut form = EnhanceForm::default();
        assert!(form.set("denoise_luma", "lots").is_err());
        assert!(form.set("favourite_colour", "blue").is_ok());
        assert!(form.set("saturation", "  ").is_ok());
        assert!(form.saturation.is_none());
        form.set("saturation", "1.5").unwrap();
        assert_eq!(form.into_params().saturation, 1.5);
    }
}
