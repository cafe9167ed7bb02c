//! Fixed-ratio image cropping: fit a source image into a viewport, move and
//! resize a crop box over it with the pointer, and export one resized raster
//! per requested output size.

pub mod config;
pub mod crop_box;
pub mod cropper;
pub mod error;
pub mod export;
pub mod fit;
pub mod geometry;
pub mod interaction;
pub mod loader;
pub mod overlay;
pub mod units;
pub mod upload;

pub use config::CropperOptions;
pub use crop_box::{CornerPoints, CropBox, ResizeDelta};
pub use cropper::{Cropper, MountPoints};
pub use error::CropperError;
pub use export::{Blob, ExportFormat, ExportPolicy, ExportedImage, OutputSpec};
pub use interaction::{CursorStyle, GestureMode, Interaction};
pub use loader::ImageSource;
pub use overlay::Frame;
pub use units::{DevicePixelRatio, DevicePoint, LogicalPoint, logical};
pub use upload::{UploadError, UploadRequest};
