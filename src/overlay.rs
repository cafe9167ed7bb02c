//! Display list for one frame of the editing surface.
//!
//! The host paints, in order: the source image into `source`, the `shade`
//! region with a non-zero fill (outer path clockwise, inner path
//! counter-clockwise, so the box stays clear), the `border`, the dashed
//! `grid` and finally the corner `handles`.

use crate::config::{CROPPER_COLOR, DASH_LENGTH, GRID_COLOR, HANDLE_RADIUS, SHADE_COLOR};
use crate::crop_box::CropBox;
use crate::geometry::{Circle, DeviceRect, Segment, Winding, arc, dashed_line, line, rect_path};
use crate::units::{DevicePoint, device};

#[derive(Clone, Debug, PartialEq)]
pub struct Shade {
    pub outer: [DevicePoint; 4],
    pub inner: [DevicePoint; 4],
    pub color: [u8; 4],
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub source: DeviceRect,
    pub shade: Shade,
    pub border: Vec<Segment>,
    pub border_color: [u8; 4],
    pub grid: Vec<Segment>,
    pub grid_color: [u8; 4],
    pub handles: Vec<Circle>,
    pub handle_color: [u8; 4],
}

impl Frame {
    pub fn build(source: DeviceRect, crop_box: &CropBox) -> Self {
        let rect = crop_box.rect();
        let corners = crop_box.corner_points();

        let border = vec![
            line(corners.top_left, corners.top_right),
            line(corners.top_right, corners.bottom_right),
            line(corners.bottom_right, corners.bottom_left),
            line(corners.bottom_left, corners.top_left),
        ];

        Frame {
            source,
            shade: Shade {
                outer: rect_path(&source, Winding::Clockwise),
                inner: rect_path(&rect, Winding::CounterClockwise),
                color: SHADE_COLOR,
            },
            border,
            border_color: CROPPER_COLOR,
            grid: thirds_grid(&rect),
            grid_color: GRID_COLOR,
            handles: corners
                .to_array()
                .into_iter()
                .map(|corner| arc(corner, HANDLE_RADIUS))
                .collect(),
            handle_color: CROPPER_COLOR,
        }
    }
}

/// Two vertical and two horizontal dashed lines at the box thirds.
fn thirds_grid(rect: &DeviceRect) -> Vec<Segment> {
    let third_w = rect.width / 3.0;
    let third_h = rect.height / 3.0;

    [1.0, 2.0]
        .into_iter()
        .flat_map(|n| {
            let x = rect.x + third_w * n;
            let y = rect.y + third_h * n;
            let vertical = dashed_line(device(x, rect.y), device(x, rect.bottom()), DASH_LENGTH);
            let horizontal = dashed_line(device(rect.x, y), device(rect.right(), y), DASH_LENGTH);
            vertical.into_iter().chain(horizontal)
        })
        .collect()
}
