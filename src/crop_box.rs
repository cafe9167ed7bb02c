//! Fixed-ratio crop rectangle living inside the fitted source rectangle.
//!
//! All stored coordinates are device pixels. `resize` takes logical deltas
//! and converts them on entry.

use crate::config::MIN_BOX_SIZE;
use crate::fit::clamp_to_bounds;
use crate::geometry::DeviceRect;
use crate::units::{DevicePixelRatio, DevicePoint, LogicalPoint, LogicalVec, device};

/// Corners in fixed order: top-left, top-right, bottom-left, bottom-right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerPoints {
    pub top_left: DevicePoint,
    pub top_right: DevicePoint,
    pub bottom_left: DevicePoint,
    pub bottom_right: DevicePoint,
}

impl CornerPoints {
    pub fn from_rect(rect: &DeviceRect) -> Self {
        Self {
            top_left: device(rect.x, rect.y),
            top_right: device(rect.right(), rect.y),
            bottom_left: device(rect.x, rect.bottom()),
            bottom_right: device(rect.right(), rect.bottom()),
        }
    }

    pub fn to_array(&self) -> [DevicePoint; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }
}

/// Position offset plus size delta, in logical pixels.
///
/// Height only drives the resize when it is non-zero and strictly larger
/// than the width delta; every gesture mode shapes its deltas accordingly.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResizeDelta {
    pub offset: LogicalVec,
    pub size: LogicalVec,
}

impl ResizeDelta {
    pub fn new(offset_x: f32, offset_y: f32, width_delta: f32, height_delta: f32) -> Self {
        Self {
            offset: LogicalVec::new(offset_x, offset_y),
            size: LogicalVec::new(width_delta, height_delta),
        }
    }

    pub fn translate(offset: LogicalVec) -> Self {
        Self {
            offset,
            size: LogicalVec::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CropBox {
    rect: DeviceRect,
    aspect_ratio: f32,
    bounds: DeviceRect,
    corners: CornerPoints,
}

impl CropBox {
    /// Centres a box of `requested_width` logical pixels inside `bounds`.
    pub fn initialize(
        bounds: DeviceRect,
        aspect_ratio: f32,
        requested_width: f32,
        scale: DevicePixelRatio,
    ) -> Self {
        let aspect_ratio = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };

        let width = scale.length_to_device(requested_width);
        let (width, height) = clamp_size(width, width / aspect_ratio, aspect_ratio, &bounds);

        let x = bounds.x + (bounds.width - width) / 2.0;
        let y = bounds.y + (bounds.height - height) / 2.0;

        let mut crop_box = Self {
            rect: DeviceRect::new(x, y, width, height),
            aspect_ratio,
            bounds,
            corners: CornerPoints::default(),
        };
        crop_box.clamp_position();
        crop_box.recompute_corner_points();
        crop_box
    }

    pub fn resize(&mut self, delta: ResizeDelta, scale: DevicePixelRatio) {
        let offset = scale.vec_to_device(delta.offset);
        let size = scale.vec_to_device(delta.size);
        let ratio = self.aspect_ratio;

        let mut width = self.rect.width + size.x;
        let mut height = width / ratio;
        if size.y != 0.0 && size.y - size.x > 0.0 {
            height = self.rect.height + size.y;
            width = height * ratio;
        }

        let (width, height) = clamp_size(width, height, ratio, &self.bounds);

        self.rect = DeviceRect::new(self.rect.x + offset.x, self.rect.y + offset.y, width, height);
        self.clamp_position();
        self.recompute_corner_points();

        log::debug!("crop box resized to {:?}", self.rect);
    }

    pub fn recompute_corner_points(&mut self) {
        self.corners = CornerPoints::from_rect(&self.rect);
    }

    /// True iff the logical point lies strictly inside the box.
    pub fn contains_point(&self, point: LogicalPoint, scale: DevicePixelRatio) -> bool {
        self.rect.contains_strict(scale.to_device(point))
    }

    /// Maps the box into new bounds, keeping its relative position and width.
    pub fn refit(&mut self, bounds: DeviceRect) {
        let old = self.bounds;
        let factor = if old.width > 0.0 {
            bounds.width / old.width
        } else {
            1.0
        };

        let width = self.rect.width * factor;
        let (width, height) = clamp_size(width, width / self.aspect_ratio, self.aspect_ratio, &bounds);
        let x = bounds.x + (self.rect.x - old.x) * factor;
        let y = bounds.y + (self.rect.y - old.y) * factor;

        self.bounds = bounds;
        self.rect = DeviceRect::new(x, y, width, height);
        self.clamp_position();
        self.recompute_corner_points();
    }

    pub fn snapshot(&self) -> CropBox {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: CropBox) {
        *self = snapshot;
    }

    pub fn rect(&self) -> DeviceRect {
        self.rect
    }

    pub fn bounds(&self) -> DeviceRect {
        self.bounds
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn corner_points(&self) -> &CornerPoints {
        &self.corners
    }

    /// Far edges are pulled back onto the bounds, near edges pushed forward.
    fn clamp_position(&mut self) {
        let bounds = self.bounds;
        let rect = &mut self.rect;

        rect.x = rect.x.max(bounds.x);
        rect.y = rect.y.max(bounds.y);

        if rect.x + rect.width > bounds.right() {
            rect.x = bounds.right() - rect.width;
        }
        if rect.y + rect.height > bounds.bottom() {
            rect.y = bounds.bottom() - rect.height;
        }
    }
}

fn clamp_size(width: f32, height: f32, ratio: f32, bounds: &DeviceRect) -> (f32, f32) {
    let (width, height) = if width < MIN_BOX_SIZE {
        (MIN_BOX_SIZE, MIN_BOX_SIZE / ratio)
    } else {
        (width, height)
    };
    clamp_to_bounds(width, height, ratio, bounds.width, bounds.height)
}
