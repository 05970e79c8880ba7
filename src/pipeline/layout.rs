//! Geometry of a sideways sheet.
//!
//! Lines are laid out in the *rotated frame*: a landscape coordinate system
//! whose width is the portrait page's height. The first baseline sits one
//! margin in from the frame's top-left corner and each following line is
//! one leading lower. [`to_page`] maps a frame point back onto the portrait
//! page for the chosen [`Rotation`].

use crate::config::{ConversionConfig, Rotation};

/// A baseline origin in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Where each line of one sheet starts, in rotated-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetLayout {
    /// Baseline origin of the first line.
    pub origin: Point,
    /// Distance between consecutive baselines.
    pub leading: f32,
}

impl SheetLayout {
    pub fn from_config(config: &ConversionConfig) -> Self {
        let (_, frame_h) = config.frame();
        Self {
            origin: Point {
                x: config.margin,
                y: frame_h - config.margin,
            },
            leading: config.leading,
        }
    }

    /// Baseline origin of the `index`-th line on a sheet (0-based).
    pub fn line_origin(&self, index: usize) -> Point {
        Point {
            x: self.origin.x,
            y: self.origin.y - index as f32 * self.leading,
        }
    }
}

/// Map a rotated-frame point onto a portrait page of size `page_w × page_h`.
///
/// * counter-clockwise: translate by `(page_w, 0)` then rotate +90°,
///   giving `(page_w - y, x)`.
/// * clockwise: translate by `(0, page_h)` then rotate -90°, giving
///   `(y, page_h - x)`.
pub fn to_page(p: Point, rotation: Rotation, page_w: f32, page_h: f32) -> Point {
    match rotation {
        Rotation::CounterClockwise => Point {
            x: page_w - p.y,
            y: p.x,
        },
        Rotation::Clockwise => Point {
            x: p.y,
            y: page_h - p.x,
        },
    }
}
