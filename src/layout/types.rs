use serde::Serialize;

use crate::config::DisplayMode;
use crate::ir::NodeId;

pub type Point = (f32, f32);

/// Byte offset ↔ (row, column) mapping for one wrap width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
}

impl Grid {
    /// A zero width is clamped to one column.
    pub fn new(columns: u32) -> Self {
        Self {
            columns: columns.max(1),
        }
    }

    pub fn columns(self) -> u32 {
        self.columns
    }

    pub fn row(self, offset: u32) -> u32 {
        offset / self.columns
    }

    pub fn col(self, offset: u32) -> u32 {
        offset % self.columns
    }

    pub fn offset(self, row: u32, col: u32) -> u32 {
        row.saturating_mul(self.columns).saturating_add(col)
    }

    /// Rows needed to show `size` bytes starting at 0.
    pub fn rows_for(self, size: u32) -> u32 {
        if size == 0 { 0 } else { self.row(size - 1) + 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaddingSide {
    OuterLeft,
    OuterRight,
    OuterTop,
    OuterBottom,
    InnerLeft,
    InnerRight,
    InnerTop,
    InnerBottom,
}

impl PaddingSide {
    pub const ALL: [PaddingSide; 8] = [
        Self::OuterLeft,
        Self::OuterRight,
        Self::OuterTop,
        Self::OuterBottom,
        Self::InnerLeft,
        Self::InnerRight,
        Self::InnerTop,
        Self::InnerBottom,
    ];
}

/// Nesting depth per side, in padding units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Paddings([u32; 8]);

impl Paddings {
    pub fn get(&self, side: PaddingSide) -> u32 {
        self.0[side as usize]
    }

    pub fn set(&mut self, side: PaddingSide, value: u32) {
        self.0[side as usize] = value;
    }

    /// All sides, in `PaddingSide::ALL` order.
    pub fn values(&self) -> &[u32; 8] {
        &self.0
    }

    pub fn outer_left(&self) -> u32 {
        self.get(PaddingSide::OuterLeft)
    }
    pub fn outer_right(&self) -> u32 {
        self.get(PaddingSide::OuterRight)
    }
    pub fn outer_top(&self) -> u32 {
        self.get(PaddingSide::OuterTop)
    }
    pub fn outer_bottom(&self) -> u32 {
        self.get(PaddingSide::OuterBottom)
    }
    pub fn inner_left(&self) -> u32 {
        self.get(PaddingSide::InnerLeft)
    }
    pub fn inner_right(&self) -> u32 {
        self.get(PaddingSide::InnerRight)
    }
    pub fn inner_top(&self) -> u32 {
        self.get(PaddingSide::InnerTop)
    }
    pub fn inner_bottom(&self) -> u32 {
        self.get(PaddingSide::InnerBottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShapeKind {
    Simple,
    Split,
    Blob,
}

/// Outline of a node on the canvas.
///
/// * `Simple`: top-left corner and (width, height).
/// * `Split`: outer-left/top, first-row start/bottom, last-column end/second-row top,
///   outer-right/bottom, and the two row heights.
/// * `Blob`: the eight polygon corners, clockwise from the first byte's top-left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    Simple([Point; 2]),
    Split([Point; 5]),
    Blob([Point; 8]),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Simple(_) => ShapeKind::Simple,
            Self::Split(_) => ShapeKind::Split,
            Self::Blob(_) => ShapeKind::Blob,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            Self::Simple(p) => p,
            Self::Split(p) => p,
            Self::Blob(p) => p,
        }
    }
}

/// Axis-aligned rectangle: x, y, width, height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelLayout {
    pub text: String,
    /// Full label before truncation.
    pub full_text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeGeometry {
    pub id: NodeId,
    pub paddings: Paddings,
    pub shape: Shape,
    pub label: Option<LabelLayout>,
}

#[derive(Debug, Clone)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub mode: DisplayMode,
    pub cell_width: f32,
    pub cell_height: f32,
    pub max_padding_h: u32,
    pub max_padding_v: u32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub width: f32,
    pub height: f32,
    /// Indexed by arena position; `None` for nodes that take no grid space.
    pub nodes: Vec<Option<NodeGeometry>>,
}

impl GridLayout {
    pub fn grid(&self) -> Grid {
        Grid::new(self.columns)
    }

    pub fn geometry(&self, id: NodeId) -> Option<&NodeGeometry> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Byte offset of the cell under a canvas point, if the point is on the grid.
    pub fn offset_at(&self, x: f32, y: f32) -> Option<u32> {
        if x < self.margin_left || y < self.margin_top {
            return None;
        }
        let column = ((x - self.margin_left) / self.cell_width) as u32;
        let row = ((y - self.margin_top) / self.cell_height) as u32;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(self.grid().offset(row, column))
    }
}
