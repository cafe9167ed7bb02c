//! Logical (layout) pixels versus device (framebuffer) pixels.
//!
//! Every stored rectangle lives in device space. Pointer input arrives in
//! logical space and is converted once, on entry, through [`DevicePixelRatio`].

use std::ops::{Add, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LogicalPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LogicalVec {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DevicePoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceVec {
    pub x: f32,
    pub y: f32,
}

pub fn logical(x: f32, y: f32) -> LogicalPoint {
    LogicalPoint { x, y }
}

pub fn device(x: f32, y: f32) -> DevicePoint {
    DevicePoint { x, y }
}

impl LogicalVec {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl DeviceVec {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Sub for LogicalPoint {
    type Output = LogicalVec;

    fn sub(self, rhs: Self) -> LogicalVec {
        LogicalVec::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<DeviceVec> for DevicePoint {
    type Output = DevicePoint;

    fn add(self, rhs: DeviceVec) -> DevicePoint {
        device(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for DevicePoint {
    type Output = DeviceVec;

    fn sub(self, rhs: Self) -> DeviceVec {
        DeviceVec::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Number of device pixels per logical pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DevicePixelRatio(f32);

impl Default for DevicePixelRatio {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DevicePixelRatio {
    /// Non-finite or non-positive ratios fall back to 1.
    pub fn new(ratio: f32) -> Self {
        if ratio.is_finite() && ratio > 0.0 {
            Self(ratio)
        } else {
            Self(1.0)
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    pub fn to_device(self, point: LogicalPoint) -> DevicePoint {
        device(point.x * self.0, point.y * self.0)
    }

    pub fn to_logical(self, point: DevicePoint) -> LogicalPoint {
        logical(point.x / self.0, point.y / self.0)
    }

    pub fn vec_to_device(self, vec: LogicalVec) -> DeviceVec {
        DeviceVec::new(vec.x * self.0, vec.y * self.0)
    }

    /// Scales a bare logical length.
    pub fn length_to_device(self, length: f32) -> f32 {
        length * self.0
    }

    pub fn length_to_logical(self, length: f32) -> f32 {
        length / self.0
    }
}
