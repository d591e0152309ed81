//! Integer rectangles and the split arithmetic partitions are built from.
//!
//! Every split floors the first share and hands the remainder to the last
//! piece, so recomputing a child from its parent always reproduces the same
//! rect.

use serde::{Deserialize, Serialize};

use crate::layout_engine::graph::{Orientation, SplitAxis, SplitDescriptor, SplitKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self { Self { x, y, w, h } }

    pub fn right(&self) -> i32 { self.x + self.w }

    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn area(&self) -> i64 { self.w as i64 * self.h as i64 }

    /// Position along `orientation` (x for horizontal, y for vertical).
    pub fn start(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    pub fn extent(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.w,
            Orientation::Vertical => self.h,
        }
    }

    pub fn split_h(&self, ratio: f64) -> (Rect, Rect) {
        let first = floor_share(self.w, ratio);
        (
            Rect::new(self.x, self.y, first, self.h),
            Rect::new(self.x + first, self.y, self.w - first, self.h),
        )
    }

    pub fn split_v(&self, ratio: f64) -> (Rect, Rect) {
        let first = floor_share(self.h, ratio);
        (
            Rect::new(self.x, self.y, self.w, first),
            Rect::new(self.x, self.y + first, self.w, self.h - first),
        )
    }

    /// Binary split along `axis`. A `None` axis stacks both halves on the
    /// whole rect.
    pub fn split(&self, axis: SplitAxis, ratio: f64) -> (Rect, Rect) {
        match axis {
            SplitAxis::Horizontal => self.split_h(ratio),
            SplitAxis::Vertical => self.split_v(ratio),
            SplitAxis::None => (*self, *self),
        }
    }

    pub fn split_h_n(&self, n: usize) -> Vec<Rect> {
        (0..n.max(1)).map(|i| self.nth_share(SplitAxis::Horizontal, n, i)).collect()
    }

    pub fn split_v_n(&self, n: usize) -> Vec<Rect> {
        (0..n.max(1)).map(|i| self.nth_share(SplitAxis::Vertical, n, i)).collect()
    }

    /// Rect of child `index` under a proportional split, without building
    /// its sibling.
    pub fn resize(&self, axis: SplitAxis, ratio: f64, index: usize) -> Rect {
        let (first, second) = self.split(axis, ratio);
        if index == 0 { first } else { second }
    }

    /// Rect of child `index` out of `n` equal shares.
    pub fn resize_n(&self, axis: SplitAxis, n: usize, index: usize) -> Rect {
        self.nth_share(axis, n, index)
    }

    /// Rect of child `index` under `split`.
    pub fn child_rect(&self, split: &SplitDescriptor, index: usize) -> Rect {
        match split.kind {
            SplitKind::Proportional { ratio } => self.resize(split.axis, ratio, index),
            SplitKind::Equal { count } => self.resize_n(split.axis, count, index),
        }
    }

    fn nth_share(&self, axis: SplitAxis, n: usize, index: usize) -> Rect {
        let Some(orientation) = axis.orientation() else {
            return *self;
        };
        let n = n.max(1) as i32;
        let index = (index as i32).min(n - 1);
        let extent = self.extent(orientation);
        let base = extent / n;
        let (offset, size) = if index == n - 1 {
            ((n - 1) * base, extent - (n - 1) * base)
        } else {
            (index * base, base)
        };
        match orientation {
            Orientation::Horizontal => Rect::new(self.x + offset, self.y, size, self.h),
            Orientation::Vertical => Rect::new(self.x, self.y + offset, self.w, size),
        }
    }

    pub fn midpoint(&self) -> (i32, i32) { (self.x + self.w / 2, self.y + self.h / 2) }

    /// Manhattan distance from the midpoint to `(x, y)`.
    pub fn distance_to(&self, x: i32, y: i32) -> i32 {
        let (mx, my) = self.midpoint();
        (mx - x).abs() + (my - y).abs()
    }

    /// True when `self` and `other` share an edge perpendicular to
    /// `orientation` (within `slack` units) and overlap along the other axis.
    pub fn adjacency_check(&self, other: &Rect, orientation: Orientation, slack: i32) -> bool {
        if self == other {
            return false;
        }
        let cross = orientation.flip();
        let touching = (self.start(orientation) - (other.start(orientation) + other.extent(orientation)))
            .abs()
            <= slack
            || (other.start(orientation) - (self.start(orientation) + self.extent(orientation)))
                .abs()
                <= slack;
        let (a0, a1) = (self.start(cross), self.start(cross) + self.extent(cross));
        let (b0, b1) = (other.start(cross), other.start(cross) + other.extent(cross));
        touching && a0 < b1 && b0 < a1
    }

    /// Shrinks the rect by the given margins, never below zero extent.
    pub fn inset(&self, left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect::new(
            self.x + left,
            self.y + top,
            (self.w - left - right).max(0),
            (self.h - top - bottom).max(0),
        )
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{}) {}x{}", self.x, self.y, self.w, self.h)
    }
}

fn floor_share(extent: i32, ratio: f64) -> i32 { (extent as f64 * ratio).floor() as i32 }
