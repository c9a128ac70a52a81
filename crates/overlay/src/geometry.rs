//! Client/document coordinates and viewport clamping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rectangle in client (viewport) coordinates, as returned for a selection range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Visible area of the page plus how far it is scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn scrolled(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    pub fn to_document(&self, client: Point) -> Point {
        Point::new(client.x + self.scroll_x, client.y + self.scroll_y)
    }

    pub fn to_client(&self, document: Point) -> Point {
        Point::new(document.x - self.scroll_x, document.y - self.scroll_y)
    }

    /// Keep a box of `size` whose top-left is `pos` (document coords) fully
    /// visible, at least `inset` away from every edge.
    pub fn clamp(&self, pos: Point, size: Size, inset: f64) -> Point {
        Point::new(
            clamp_axis(pos.x, self.scroll_x, self.width, size.width, inset),
            clamp_axis(pos.y, self.scroll_y, self.height, size.height, inset),
        )
    }
}

fn clamp_axis(value: f64, scroll: f64, extent: f64, size: f64, inset: f64) -> f64 {
    let min = scroll + inset;
    let max = scroll + extent - size - inset;
    // Popup larger than the viewport: pin to the leading edge.
    if max < min {
        return min;
    }
    value.clamp(min, max)
}

/// Top-left for a popup hanging `margin` below `anchor`, in document coords.
pub fn anchor_below(anchor: Rect, margin: f64, viewport: &Viewport) -> Point {
    viewport.to_document(Point::new(anchor.left, anchor.bottom + margin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_below_adds_scroll() {
        let vp = Viewport::new(1000.0, 800.0).scrolled(0.0, 500.0);
        let pos = anchor_below(Rect::new(100.0, 50.0, 300.0, 70.0), 10.0, &vp);
        assert_eq!(pos, Point::new(100.0, 580.0));
    }

    #[test]
    fn test_clamp_shifts_left_and_up() {
        let vp = Viewport::new(1000.0, 800.0);
        let size = Size::new(360.0, 240.0);
        let pos = vp.clamp(Point::new(900.0, 700.0), size, 10.0);
        assert_eq!(pos, Point::new(630.0, 550.0));
    }

    #[test]
    fn test_clamp_minimum_inset() {
        let vp = Viewport::new(1000.0, 800.0).scrolled(20.0, 300.0);
        let pos = vp.clamp(Point::new(-50.0, 0.0), Size::new(100.0, 100.0), 10.0);
        assert_eq!(pos, Point::new(30.0, 310.0));
    }

    #[test]
    fn test_oversized_popup_pins_to_inset() {
        let vp = Viewport::new(300.0, 200.0);
        let pos = vp.clamp(Point::new(50.0, 50.0), Size::new(400.0, 400.0), 10.0);
        assert_eq!(pos, Point::new(10.0, 10.0));
    }
}
