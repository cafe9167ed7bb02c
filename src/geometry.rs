//! Drawing primitives in device space. Pure functions, no state.

use crate::units::{DevicePoint, DeviceVec, device};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DeviceRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min(&self) -> DevicePoint {
        device(self.x, self.y)
    }

    pub fn max(&self) -> DevicePoint {
        device(self.right(), self.bottom())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Open-interval containment: points on the border are outside.
    pub fn contains_strict(&self, point: DevicePoint) -> bool {
        self.x < point.x && point.x < self.right() && self.y < point.y && point.y < self.bottom()
    }

    /// Closed-interval containment of another rectangle.
    pub fn encloses(&self, other: &DeviceRect, tolerance: f32) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: DevicePoint,
    pub end: DevicePoint,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: DevicePoint,
    pub radius: f32,
}

/// Traversal direction of a closed rectangle path, in screen coordinates
/// (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

pub fn line(start: DevicePoint, end: DevicePoint) -> Segment {
    Segment { start, end }
}

/// Splits `start..end` into `floor(length / dash_length)` equal steps and
/// keeps every other step, starting with the first one. The final step
/// point is never emitted, so the tail of the line may stay blank.
pub fn dashed_line(start: DevicePoint, end: DevicePoint, dash_length: f32) -> Vec<Segment> {
    let delta = end - start;
    let length = (delta.x * delta.x + delta.y * delta.y).sqrt();
    if dash_length <= 0.0 || !length.is_finite() {
        return Vec::new();
    }

    let steps = (length / dash_length).floor() as usize;
    if steps == 0 {
        return Vec::new();
    }

    let step = DeviceVec::new(delta.x / steps as f32, delta.y / steps as f32);
    let point_at = |i: usize| start + DeviceVec::new(step.x * i as f32, step.y * i as f32);

    (0..steps)
        .step_by(2)
        .filter(|i| i + 1 < steps)
        .map(|i| line(point_at(i), point_at(i + 1)))
        .collect()
}

pub fn arc(center: DevicePoint, radius: f32) -> Circle {
    Circle { center, radius }
}

/// Closed rectangle path starting at the top-left corner.
pub fn rect_path(rect: &DeviceRect, winding: Winding) -> [DevicePoint; 4] {
    let DeviceRect {
        x,
        y,
        width,
        height,
    } = *rect;

    match winding {
        Winding::Clockwise => [
            device(x, y),
            device(x + width, y),
            device(x + width, y + height),
            device(x, y + height),
        ],
        Winding::CounterClockwise => [
            device(x, y),
            device(x, y + height),
            device(x + width, y + height),
            device(x + width, y),
        ],
    }
}

/// Twice the signed area of a polygon; positive for clockwise paths in
/// screen coordinates.
pub fn signed_area(points: &[DevicePoint]) -> f32 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum()
}
