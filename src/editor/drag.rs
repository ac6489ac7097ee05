//! Drag-to-reposition state machine.
//!
//! Pointer coordinates are in the render surface's local pixel space. A drag
//! converts the pointer delta into a percentage of the surface size, adds it
//! to the position the field had when the drag began, clamps into
//! `[0, 100]` and rounds to one decimal.
//!
//! ```text
//!   Idle ──begin──▶ Dragging { field, origin, original } ──end/cancel──▶ Idle
//!                      │  ▲
//!                      └──┘ move (local repaint only)
//! ```

use crate::template::clamp_percent;

/// Pointer position in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size of the surface the page is displayed on, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        field_id: String,
        origin: Point,
        /// Field position (x%, y%) when the drag began.
        original: (f32, f32),
        surface: Surface,
    },
}

/// Pixel delta as a percentage of a surface dimension.
/// A degenerate surface yields no movement.
pub fn delta_to_percent(delta_px: f32, dimension_px: f32) -> f32 {
    if !(dimension_px.is_finite() && dimension_px > 0.0) {
        return 0.0;
    }
    delta_px / dimension_px * 100.0
}

pub fn round_one_decimal(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// New field position for a pointer at `current` during a drag.
pub fn dragged_position(
    original: (f32, f32),
    origin: Point,
    current: Point,
    surface: Surface,
) -> (f32, f32) {
    let axis = |start: f32, delta_px: f32, dim: f32| {
        let moved = start + delta_to_percent(delta_px, dim);
        if moved.is_nan() {
            start
        } else {
            round_one_decimal(clamp_percent(moved))
        }
    };
    (
        axis(original.0, current.x - origin.x, surface.width),
        axis(original.1, current.y - origin.y, surface.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_to_percent() {
        assert_eq!(delta_to_percent(100.0, 1000.0), 10.0);
        assert_eq!(delta_to_percent(-50.0, 500.0), -10.0);
        assert_eq!(delta_to_percent(30.0, 0.0), 0.0);
    }

    #[test]
    fn test_dragged_position_rounds() {
        let surface = Surface::new(600.0, 400.0);
        let pos = dragged_position((50.0, 50.0), Point::new(0.0, 0.0), Point::new(20.0, 1.0), surface);
        // 20/600 = 3.333% ; 1/400 = 0.25%
        assert_eq!(pos, (53.3, 50.3));
    }

    #[test]
    fn test_dragged_position_clamps() {
        let surface = Surface::new(800.0, 600.0);
        let far = dragged_position(
            (10.0, 90.0),
            Point::new(400.0, 300.0),
            Point::new(-1.0e6, 1.0e6),
            surface,
        );
        assert_eq!(far, (0.0, 100.0));

        let inf = dragged_position(
            (10.0, 90.0),
            Point::new(0.0, 0.0),
            Point::new(f32::INFINITY, f32::NEG_INFINITY),
            surface,
        );
        assert_eq!(inf, (100.0, 0.0));
    }

    #[test]
    fn test_nan_pointer_keeps_position() {
        let pos = dragged_position(
            (12.5, 40.0),
            Point::new(0.0, 0.0),
            Point::new(f32::NAN, 0.0),
            Surface::new(100.0, 100.0),
        );
        assert_eq!(pos, (12.5, 40.0));
    }
}
