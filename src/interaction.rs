//! Pointer state machine: hover classification, drag sessions and cursors.

use crate::config::CHECKED_AREA_SIZE;
use crate::crop_box::{CropBox, ResizeDelta};
use crate::units::{DevicePixelRatio, LogicalPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureMode {
    Move,
    ResizeNw,
    ResizeNe,
    ResizeSw,
    ResizeSe,
}

impl GestureMode {
    /// Turns a logical pointer delta into box changes. Corner resizes follow
    /// the horizontal component only; the opposite corner stays put.
    pub fn resize_delta(self, dx: f32, dy: f32) -> ResizeDelta {
        match self {
            GestureMode::Move => ResizeDelta::new(dx, dy, 0.0, 0.0),
            GestureMode::ResizeSe => ResizeDelta::new(0.0, 0.0, dx, dx),
            GestureMode::ResizeSw => ResizeDelta::new(dx, 0.0, -dx, -dx),
            GestureMode::ResizeNe => ResizeDelta::new(0.0, -dx, dx, dx),
            GestureMode::ResizeNw => ResizeDelta::new(dx, dx, -dx, -dx),
        }
    }

    pub fn cursor(self) -> CursorStyle {
        match self {
            GestureMode::Move => CursorStyle::Move,
            GestureMode::ResizeNw => CursorStyle::NwResize,
            GestureMode::ResizeNe => CursorStyle::NeResize,
            GestureMode::ResizeSw => CursorStyle::SwResize,
            GestureMode::ResizeSe => CursorStyle::SeResize,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    Move,
    NwResize,
    NeResize,
    SwResize,
    SeResize,
}

#[derive(Clone, Debug)]
pub struct DragSession {
    pub mode: GestureMode,
    pub anchor: LogicalPoint,
    snapshot: CropBox,
}

#[derive(Clone, Debug, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Hovering(GestureMode),
    Dragging(DragSession),
}

/// Corner hits win over the box body. Corners are checked bottom-right,
/// bottom-left, top-right, top-left.
pub fn classify(point: LogicalPoint, crop_box: &CropBox, scale: DevicePixelRatio) -> Option<GestureMode> {
    let corners = crop_box.corner_points();
    let candidates = [
        (corners.bottom_right, GestureMode::ResizeSe),
        (corners.bottom_left, GestureMode::ResizeSw),
        (corners.top_right, GestureMode::ResizeNe),
        (corners.top_left, GestureMode::ResizeNw),
    ];

    candidates
        .into_iter()
        .find(|(corner, _)| {
            let corner = scale.to_logical(*corner);
            (point.x - corner.x).abs() < CHECKED_AREA_SIZE
                && (point.y - corner.y).abs() < CHECKED_AREA_SIZE
        })
        .map(|(_, mode)| mode)
        .or_else(|| {
            crop_box
                .contains_point(point, scale)
                .then_some(GestureMode::Move)
        })
}

impl Interaction {
    pub fn mode(&self) -> Option<GestureMode> {
        match self {
            Interaction::Idle => None,
            Interaction::Hovering(mode) => Some(*mode),
            Interaction::Dragging(session) => Some(session.mode),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Interaction::Dragging(_))
    }

    pub fn cursor(&self) -> CursorStyle {
        self.mode().map(GestureMode::cursor).unwrap_or_default()
    }

    /// Reclassifies the pointer. The mode is locked while dragging.
    pub fn hover(&mut self, point: LogicalPoint, crop_box: &CropBox, scale: DevicePixelRatio) {
        if self.is_dragging() {
            return;
        }
        *self = match classify(point, crop_box, scale) {
            Some(mode) => Interaction::Hovering(mode),
            None => Interaction::Idle,
        };
    }

    /// Starts a drag when the pointer is over the box or a corner.
    pub fn press(&mut self, point: LogicalPoint, crop_box: &CropBox, scale: DevicePixelRatio) -> bool {
        self.hover(point, crop_box, scale);
        let Interaction::Hovering(mode) = *self else {
            return false;
        };

        log::debug!("drag started: {mode:?} at ({}, {})", point.x, point.y);
        *self = Interaction::Dragging(DragSession {
            mode,
            anchor: point,
            snapshot: crop_box.snapshot(),
        });
        true
    }

    /// Applies the delta since the previous pointer position. Returns true
    /// when the box was touched.
    pub fn drag(&mut self, point: LogicalPoint, crop_box: &mut CropBox, scale: DevicePixelRatio) -> bool {
        let Interaction::Dragging(session) = self else {
            return false;
        };

        let delta = point - session.anchor;
        session.anchor = point;
        if delta.x == 0.0 && delta.y == 0.0 {
            return false;
        }

        crop_box.resize(session.mode.resize_delta(delta.x, delta.y), scale);
        true
    }

    /// Ends the drag. The box keeps its state.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        *self = Interaction::Idle;
        was_dragging
    }

    /// Ends the drag and restores the box as it was at press time.
    pub fn cancel(&mut self, crop_box: &mut CropBox) -> bool {
        match std::mem::take(self) {
            Interaction::Dragging(session) => {
                crop_box.restore(session.snapshot);
                true
            }
            _ => false,
        }
    }
}
