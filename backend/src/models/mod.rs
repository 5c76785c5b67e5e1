pub mod config;
pub mod error;
pub mod bgr;
pub mod output;
pub mod params;
