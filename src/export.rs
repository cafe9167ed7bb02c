//! Cuts the crop region out of the natural-resolution image and renders
//! one raster per requested output size.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::Deserialize;

use crate::error::CropperError;
use crate::geometry::DeviceRect;
use crate::units::DevicePixelRatio;

const JPEG_QUALITY: u8 = 100;

/// Largest rendered side, in device pixels.
pub const MAX_OUTPUT_SIDE: u32 = 16_384;

/// Requested output size in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct OutputSpec {
    pub width: f32,
    pub height: f32,
}

impl OutputSpec {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel size of the rendered raster, never below 1x1 and never above
    /// `MAX_OUTPUT_SIDE` on either side.
    pub fn pixel_size(&self, ratio: DevicePixelRatio) -> Result<(u32, u32), CropperError> {
        let width = ratio.length_to_device(self.width).round().max(1.0);
        let height = ratio.length_to_device(self.height).round().max(1.0);

        let max = MAX_OUTPUT_SIDE as f32;
        if !(width <= max && height <= max) {
            return Err(CropperError::OutputTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_OUTPUT_SIDE,
            });
        }
        Ok((width as u32, height as u32))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
        }
    }

    fn encode(self, image: &DynamicImage) -> Result<Vec<u8>, CropperError> {
        let mut bytes = Cursor::new(Vec::new());
        match self {
            ExportFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))?;
            }
            ExportFormat::Png => image.write_to(&mut bytes, ImageFormat::Png)?,
        }
        Ok(bytes.into_inner())
    }
}

/// When exports are regenerated during a drag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportPolicy {
    #[default]
    EveryMove,
    OnRelease,
}

/// Encoded image bytes plus their media type.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub spec: OutputSpec,
    pub image: DynamicImage,
    pub blob: Blob,
}

impl ExportedImage {
    /// Size the preview is shown at, in logical pixels.
    pub fn display_size(&self) -> (f32, f32) {
        (self.spec.width, self.spec.height)
    }
}

/// Maps the crop box back onto the natural image. Rounded and clamped so the
/// region is at least one pixel and lies within the image.
pub fn source_region(
    crop: &DeviceRect,
    source: &DeviceRect,
    natural: (u32, u32),
) -> (u32, u32, u32, u32) {
    let (natural_width, natural_height) = (natural.0 as f32, natural.1 as f32);
    let scale_x = natural_width / source.width;
    let scale_y = natural_height / source.height;

    let x = ((crop.x - source.x) * scale_x).round().max(0.0) as u32;
    let y = ((crop.y - source.y) * scale_y).round().max(0.0) as u32;
    let width = (crop.width * scale_x).round().max(1.0) as u32;
    let height = (crop.height * scale_y).round().max(1.0) as u32;

    let x = x.min(natural.0.saturating_sub(1));
    let y = y.min(natural.1.saturating_sub(1));
    let width = width.min(natural.0 - x).max(1);
    let height = height.min(natural.1 - y).max(1);

    (x, y, width, height)
}

pub fn export_all(
    crop: &DeviceRect,
    image: &DynamicImage,
    source: &DeviceRect,
    specs: &[OutputSpec],
    ratio: DevicePixelRatio,
    format: ExportFormat,
) -> Result<Vec<ExportedImage>, CropperError> {
    let (x, y, width, height) = source_region(crop, source, image.dimensions());
    let region = image.crop_imm(x, y, width, height);

    specs
        .iter()
        .map(|spec| {
            let (out_width, out_height) = spec.pixel_size(ratio)?;
            let rendered = region.resize_exact(out_width, out_height, FilterType::Triangle);
            let bytes = format.encode(&rendered)?;

            Ok(ExportedImage {
                spec: *spec,
                image: rendered,
                blob: Blob {
                    bytes,
                    mime: format.mime(),
                },
            })
        })
        .collect()
}
