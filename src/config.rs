//! Widget construction options and fixed constants.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CropperError;
use crate::export::{ExportFormat, ExportPolicy, OutputSpec};

/// Hit-target threshold around each corner, in logical pixels. Also the
/// device-pixel inset the fitter keeps free around the source image.
pub const CHECKED_AREA_SIZE: f32 = 10.0;

/// Smallest crop box width, in device pixels.
pub const MIN_BOX_SIZE: f32 = 10.0;

pub const DASH_LENGTH: f32 = 2.0;
pub const HANDLE_RADIUS: f32 = 3.0;

/// RGBA colours used by the overlay.
pub const CROPPER_COLOR: [u8; 4] = [0x5C, 0x98, 0xEA, 0xFF];
pub const GRID_COLOR: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
pub const SHADE_COLOR: [u8; 4] = [0x00, 0x00, 0x00, 0x66];

pub const DEFAULT_IMAGE_WRAPPER: &str = ".view-images";

/// Options recognized at construction. Keys are camelCase on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropperOptions {
    /// Mount point for the editing surface. Required.
    pub container: Option<String>,
    /// Mount point for the export previews.
    pub image_wrapper: Option<String>,
    /// File path or http(s) URL of the source image.
    pub url: Option<String>,
    /// Initial crop box width in logical pixels.
    pub box_width: Option<f32>,
    pub sizes: Vec<OutputSpec>,
    /// Upload endpoint.
    pub action: Option<String>,
    /// Extra fields merged into the upload payload.
    pub data: Map<String, Value>,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub device_pixel_ratio: f32,
    pub load_timeout_ms: u64,
    pub export_policy: ExportPolicy,
    pub export_format: ExportFormat,
}

impl Default for CropperOptions {
    fn default() -> Self {
        Self {
            container: None,
            image_wrapper: None,
            url: None,
            box_width: None,
            sizes: Vec::new(),
            action: None,
            data: Map::new(),
            canvas_width: 400.0,
            canvas_height: 400.0,
            device_pixel_ratio: 1.0,
            load_timeout_ms: 10_000,
            export_policy: ExportPolicy::default(),
            export_format: ExportFormat::default(),
        }
    }
}

impl CropperOptions {
    pub fn from_json_str(json: &str) -> Result<Self, CropperError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CropperError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn image_wrapper(&self) -> &str {
        self.image_wrapper.as_deref().unwrap_or(DEFAULT_IMAGE_WRAPPER)
    }

    /// Ratio of the first requested size, or 1 without sizes.
    pub fn aspect_ratio(&self) -> f32 {
        self.sizes
            .first()
            .filter(|size| size.width > 0.0 && size.height > 0.0)
            .map(|size| size.width / size.height)
            .unwrap_or(1.0)
    }

    /// Requested box width, falling back to the first size's width.
    pub fn initial_box_width(&self) -> Option<f32> {
        self.box_width
            .filter(|width| *width > 0.0)
            .or_else(|| self.sizes.first().map(|size| size.width))
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}
