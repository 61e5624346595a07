/// Axis-aligned rectangles for hit and hurt boxes.

use glam::Vec2;

/// `(x, y)` is the top-left corner; y grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// This rectangle moved by `offset` (local → world).
    #[inline]
    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect { x: self.x + offset.x, y: self.y + offset.y, ..*self }
    }

    /// Overlap test with inclusive edges: rectangles that only touch count.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.right() < other.x || self.x > other.right() {
            return false;
        }
        if self.bottom() < other.y || self.y > other.bottom() {
            return false;
        }
        true
    }
}
