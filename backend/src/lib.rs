//! Fixed image enhancement pipeline shared by the `enhance` CLI and the HTTP
//! service.
//!
//! ```no_run
//! use image_enhancer::{enhance, BgrImage, EnhanceParams};
//!
//! # fn main() -> Result<(), image_enhancer::EnhanceError> {
//! let img = BgrImage::filled(64, 48, [128, 128, 128]);
//! let out = enhance(&img, &EnhanceParams::default())?;
//! assert_eq!(out.dimensions(), (128, 96));
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod handlers;
pub mod models;
pub mod services;

pub use app::{build_router, AppState};
pub use models::bgr::BgrImage;
pub use models::error::EnhanceError;
pub use models::output::{OutputBundle, OutputFormat};
pub use models::params::{EnhanceParams, SizeSpec};
pub use services::encode::encode_all;
pub use services::pipeline::enhance;
pub use services::render::{load_image, render, write_bundle, RenderResult};
