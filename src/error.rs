use std::time::Duration;

use crate::upload::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum CropperError {
    #[error("missing mount point `{0}`")]
    MissingMount(String),

    #[error("image is smaller than {width}*{height}")]
    ImageTooSmall { width: f32, height: f32 },

    #[error("viewport {width}x{height} leaves no usable area")]
    ViewportTooSmall { width: f32, height: f32 },

    #[error("output size {width}x{height} exceeds {max} pixels per side")]
    OutputTooLarge { width: f32, height: f32, max: u32 },

    #[error("must have action")]
    MissingAction,

    #[error("no image source configured")]
    MissingSource,

    #[error("image load timed out after {0:?}")]
    LoadTimeout(Duration),

    #[error("image load task failed: {0}")]
    LoadTask(String),

    #[error("no image has been loaded yet")]
    NotLoaded,

    #[error("cropper has been disposed")]
    Disposed,

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
