pub mod arguments;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod model;
pub mod pipeline;
pub mod video;

pub use arguments::Arguments;
pub use config::{Config, EncoderConfig, UpscalerConfig};
pub use error::Error;
pub use ffmpeg::{EncodeJob, Ffmpeg, MediaTool};
pub use model::{Model, Upscaler};
pub use pipeline::{Pipeline, RunReport};
pub use video::Video;
