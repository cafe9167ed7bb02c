//! Letterboxed placement of the source image inside the viewport.

use crate::config::CHECKED_AREA_SIZE;
use crate::error::CropperError;
use crate::geometry::DeviceRect;
use crate::units::DevicePixelRatio;

/// Logical size of the editing surface plus its device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub ratio: DevicePixelRatio,
}

impl Viewport {
    pub fn new(width: f32, height: f32, ratio: DevicePixelRatio) -> Self {
        Self {
            width,
            height,
            ratio,
        }
    }

    pub fn device_size(&self) -> (f32, f32) {
        (
            self.ratio.length_to_device(self.width),
            self.ratio.length_to_device(self.height),
        )
    }

    /// Device size minus the hit-target inset.
    pub fn usable_size(&self) -> (f32, f32) {
        let (width, height) = self.device_size();
        (width - CHECKED_AREA_SIZE, height - CHECKED_AREA_SIZE)
    }

    /// Usable size, failing when either side is empty or negative.
    pub fn checked_usable_size(&self) -> Result<(f32, f32), CropperError> {
        let (width, height) = self.usable_size();
        if width > 0.0 && height > 0.0 {
            Ok((width, height))
        } else {
            Err(CropperError::ViewportTooSmall {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Two-phase clamp keeping `width / height == ratio`: width first, then
/// height. The order matters when both bounds are exceeded.
pub fn clamp_to_bounds(
    mut width: f32,
    mut height: f32,
    ratio: f32,
    max_width: f32,
    max_height: f32,
) -> (f32, f32) {
    if width > max_width {
        width = max_width;
        height = width / ratio;
    }
    if height > max_height {
        height = max_height;
        width = height * ratio;
    }
    (width, height)
}

/// Scales the image uniformly into the usable viewport area and centres it.
pub fn fit_source(natural: (u32, u32), viewport: &Viewport) -> Result<DeviceRect, CropperError> {
    let (natural_width, natural_height) = (natural.0 as f32, natural.1 as f32);
    let (usable_width, usable_height) = viewport.checked_usable_size()?;

    if natural_width < usable_width && natural_height < usable_height {
        return Err(CropperError::ImageTooSmall {
            width: usable_width,
            height: usable_height,
        });
    }

    let ratio = natural_width / natural_height;
    let (width, height) = clamp_to_bounds(
        natural_width,
        natural_height,
        ratio,
        usable_width,
        usable_height,
    );

    let x = (usable_width - width + CHECKED_AREA_SIZE) / 2.0;
    let y = (usable_height - height + CHECKED_AREA_SIZE) / 2.0;

    log::debug!(
        "fitted {}x{} source into {:.1}x{:.1} at ({:.1}, {:.1})",
        natural.0,
        natural.1,
        width,
        height,
        x,
        y
    );

    Ok(DeviceRect::new(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn viewport(width: f32, height: f32) -> Viewport {
        Viewport::new(width, height, DevicePixelRatio::default())
    }

    #[test]
    fn landscape_source_is_width_bound() {
        let rect = fit_source((800, 600), &viewport(400.0, 400.0)).unwrap();

        assert_relative_eq!(rect.width, 390.0);
        assert_relative_eq!(rect.height, 292.5);
        assert_relative_eq!(rect.x, 5.0);
        assert_relative_eq!(rect.y, 53.75);
    }

    #[test]
    fn portrait_source_is_height_bound() {
        let rect = fit_source((300, 1000), &viewport(400.0, 400.0)).unwrap();

        assert_relative_eq!(rect.height, 390.0);
        assert_relative_eq!(rect.width, 117.0);
        assert_relative_eq!(rect.y, 5.0);
        assert_relative_eq!(rect.x, (390.0 - 117.0 + 10.0) / 2.0);
    }

    #[test]
    fn width_clamp_can_be_overridden_by_height_clamp() {
        // 1000x900 -> width clamp gives 390x351, wider viewport keeps it
        // but a short one forces the second phase.
        let rect = fit_source((1000, 900), &viewport(400.0, 300.0)).unwrap();

        assert_relative_eq!(rect.height, 290.0);
        assert_relative_eq!(rect.width, 290.0 * 1000.0 / 900.0, max_relative = 1e-5);
    }

    #[test]
    fn device_ratio_scales_usable_area() {
        let scaled = Viewport::new(400.0, 400.0, DevicePixelRatio::new(2.0));
        let rect = fit_source((1600, 1600), &scaled).unwrap();

        assert_relative_eq!(rect.width, 790.0);
        assert_relative_eq!(rect.x, 5.0);
    }

    #[test]
    fn small_source_is_rejected() {
        let result = fit_source((200, 100), &viewport(400.0, 400.0));

        match result {
            Err(CropperError::ImageTooSmall { width, height }) => {
                assert_eq!((width, height), (390.0, 390.0));
            }
            other => panic!("expected size error, got {other:?}"),
        }
    }

    #[test]
    fn viewport_without_usable_area_is_rejected() {
        for (width, height) in [(5.0, 400.0), (400.0, 10.0), (0.0, 0.0), (f32::NAN, 400.0)] {
            let result = fit_source((800, 600), &viewport(width, height));
            assert!(
                matches!(result, Err(CropperError::ViewportTooSmall { .. })),
                "{width}x{height} -> {result:?}"
            );
        }
    }

    #[test]
    fn fitted_rect_touches_one_bound() {
        for natural in [(800, 600), (391, 2000), (5000, 390), (390, 390)] {
            let rect = fit_source(natural, &viewport(400.0, 400.0)).unwrap();
            assert!(rect.width <= 390.0 + 1e-3 && rect.height <= 390.0 + 1e-3);
            assert!(
                (rect.width - 390.0).abs() < 1e-3 || (rect.height - 390.0).abs() < 1e-3,
                "{natural:?} -> {rect:?}"
            );
        }
    }

    #[test]
    fn clamp_preserves_ratio() {
        let (width, height) = clamp_to_bounds(500.0, 250.0, 2.0, 300.0, 100.0);
        assert_relative_eq!(width, 200.0);
        assert_relative_eq!(height, 100.0);
    }
}
