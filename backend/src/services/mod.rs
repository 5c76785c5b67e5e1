pub mod clahe;
pub mod colorspace;
pub mod denoise;
pub mod encode;
pub mod pipeline;
pub mod render;
pub mod spatial;
pub mod tone;
