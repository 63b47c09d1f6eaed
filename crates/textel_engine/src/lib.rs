#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::return_self_not_must_use
)]

mod position;
pub use position::*;

mod color;
pub use color::*;

mod cell;
pub use cell::*;

mod document;
pub use document::*;

mod selection;
pub use selection::*;

mod error;
pub use error::*;

pub mod paint;

pub mod editor;

pub type EngineResult<T> = anyhow::Result<T>;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(width: {}, height: {})", self.width, self.height)
    }
}

impl PartialEq for Size {
    fn eq(&self, other: &Size) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Size { width, height }
    }
}

impl From<(i32, i32)> for Size {
    fn from(value: (i32, i32)) -> Self {
        Size {
            width: value.0,
            height: value.1,
        }
    }
}

impl From<(usize, usize)> for Size {
    fn from(value: (usize, usize)) -> Self {
        Size {
            width: value.0 as i32,
            height: value.1 as i32,
        }
    }
}

impl From<Position> for Size {
    fn from(value: Position) -> Self {
        Size {
            width: value.x,
            height: value.y,
        }
    }
}

/// An axis-aligned rectangle in cell coordinates. The start may be negative
/// and the size may be zero; a zero or negative size means the region is
/// empty. Used both as a patch extent and as a selection extent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: Position,
    pub size: Size,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(x:{}, y:{}, width: {}, height: {})",
            self.start.x, self.start.y, self.size.width, self.size.height
        )
    }
}

impl Region {
    pub fn new(start: impl Into<Position>, size: impl Into<Size>) -> Self {
        Self {
            start: start.into(),
            size: size.into(),
        }
    }

    pub fn from(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            start: Position::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn top_left(&self) -> Position {
        self.start
    }

    pub fn bottom_right(&self) -> Position {
        Position {
            x: self.start.x + self.size.width,
            y: self.start.y + self.size.height,
        }
    }

    pub fn offset(&self) -> Position {
        self.start
    }

    /// Left/top inclusive, right/bottom exclusive.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.start.x <= x && x < self.start.x + self.size.width && self.start.y <= y && y < self.start.y + self.size.height
    }

    pub fn contains_point(&self, point: impl Into<Position>) -> bool {
        let point = point.into();
        self.contains(point.x, point.y)
    }

    pub fn get_width(&self) -> i32 {
        self.size.width
    }

    pub fn get_height(&self) -> i32 {
        self.size.height
    }

    pub fn get_size(&self) -> Size {
        self.size
    }

    pub fn left(&self) -> i32 {
        self.start.x
    }

    pub fn right(&self) -> i32 {
        self.bottom_right().x
    }

    pub fn top(&self) -> i32 {
        self.start.y
    }

    pub fn bottom(&self) -> i32 {
        self.bottom_right().y
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0 || self.size.height <= 0
    }

    /// Componentwise clamp; disjoint regions yield a zero-size result.
    pub fn intersect(&self, other: &Region) -> Region {
        let min = self.start.max(other.start);
        let max = self.bottom_right().min(other.bottom_right());
        Region {
            start: min,
            size: Size::new((max.x - min.x).max(0), (max.y - min.y).max(0)),
        }
    }

    /// Minimal enclosing region covering both. An empty operand is the
    /// identity, so dirty extents can accumulate from an empty seed.
    pub fn union(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let min = self.start.min(other.start);
        let max = self.bottom_right().max(other.bottom_right());
        Region {
            start: min,
            size: (max - min).into(),
        }
    }

    /// Insets the region by the given margins.
    pub fn shrink(&self, top: i32, right: i32, bottom: i32, left: i32) -> Region {
        Region {
            start: Position::new(self.start.x + left, self.start.y + top),
            size: Size::new(self.size.width - left - right, self.size.height - top - bottom),
        }
    }

    pub fn x_range(&self) -> std::ops::Range<i32> {
        self.start.x..self.bottom_right().x
    }

    pub fn y_range(&self) -> std::ops::Range<i32> {
        self.start.y..self.bottom_right().y
    }
}

impl std::ops::Add<Position> for Region {
    type Output = Region;

    fn add(self, rhs: Position) -> Region {
        Region {
            start: self.start + rhs,
            size: self.size,
        }
    }
}

impl std::ops::Sub<Position> for Region {
    type Output = Region;

    fn sub(self, rhs: Position) -> Region {
        Region {
            start: self.start - rhs,
            size: self.size,
        }
    }
}

/// Read-only view of a cell grid. This is the seam the rendering and
/// persistence layers consume; they never go through the selection or
/// undo machinery.
pub trait CellPane {
    fn get_cell(&self, pos: Position) -> Cell;
    fn get_width(&self) -> i32;
    fn get_height(&self) -> i32;

    fn get_size(&self) -> Size {
        Size::new(self.get_width(), self.get_height())
    }

    fn get_rectangle(&self) -> Region {
        Region::from(0, 0, self.get_width(), self.get_height())
    }
}
