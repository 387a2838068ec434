//! Integer axis-aligned rectangles
//!
//! All arena geometry (walls, vehicles, pickups, bullet hit boxes) is
//! expressed in whole arena units so that snapshots round-trip exactly.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with its origin at the top-left corner
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    #[inline]
    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn set_right(&mut self, right: i32) {
        self.x = right - self.w;
    }

    pub fn set_bottom(&mut self, bottom: i32) {
        self.y = bottom - self.h;
    }

    /// Strict overlap test; rectangles that only share an edge do not collide
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.w <= 0 || self.h <= 0 || other.w <= 0 || other.h <= 0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow (or shrink, with negative amounts) around the same centre
    pub fn inflate(&self, dw: i32, dh: i32) -> Rect {
        Rect {
            x: self.x - dw / 2,
            y: self.y - dh / 2,
            w: self.w + dw,
            h: self.h + dh,
        }
    }

    /// Keep the rectangle fully inside `[0, width] x [0, height]`
    pub fn clamp_within(&mut self, width: i32, height: i32) {
        self.x = self.x.clamp(0, (width - self.w).max(0));
        self.y = self.y.clamp(0, (height - self.h).max(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.center_x(), 25);
        assert_eq!(r.center_y(), 40);
    }

    #[test]
    fn test_intersects_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_empty_never_intersects() {
        let a = Rect::new(0, 0, 0, 10);
        let b = Rect::new(-5, -5, 20, 20);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_inflate_keeps_center() {
        let r = Rect::new(100, 100, 26, 26).inflate(80, 80);
        assert_eq!(r, Rect::new(60, 60, 106, 106));
        assert_eq!(r.center_x(), 113);
    }

    #[test]
    fn test_set_far_edges() {
        let mut r = Rect::new(0, 0, 38, 38);
        r.set_right(100);
        r.set_bottom(50);
        assert_eq!((r.x, r.y), (62, 12));
    }

    #[test]
    fn test_clamp_within() {
        let mut r = Rect::new(-5, 590, 38, 38);
        r.clamp_within(900, 600);
        assert_eq!((r.x, r.y), (0, 562));
    }
}
