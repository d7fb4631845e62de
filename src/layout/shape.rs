use super::types::{Grid, Paddings, Point, Shape};

/// Canvas metrics shared by every shape of one layout pass.
#[derive(Debug, Clone, Copy)]
pub(super) struct CellMetrics {
    pub cell_width: f32,
    pub cell_height: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub padding_unit: f32,
}

/// Outline of `[offset, end)` on the wrapped grid. `end` is exclusive and
/// saturates at `u32::MAX`, so the span must be non-empty.
pub(super) fn compute_shape(
    grid: Grid,
    metrics: &CellMetrics,
    paddings: &Paddings,
    offset: u32,
    end: u32,
) -> Shape {
    let columns = grid.columns();
    let w = metrics.cell_width;
    let h = metrics.cell_height;
    let left = metrics.margin_left;
    let top = metrics.margin_top;
    let px = |units: u32| units as f32 * metrics.padding_unit;

    let size = end.saturating_sub(offset).max(1);
    let last = end.saturating_sub(1).max(offset);
    let start_row = grid.row(offset);
    let start_col = grid.col(offset);
    let last_row = grid.row(last);
    let last_col = grid.col(last);

    let inner_right = px(paddings.inner_right());
    let inner_left = px(paddings.inner_left());
    let outer_top = px(paddings.outer_top());
    let outer_bottom = px(paddings.outer_bottom());

    if start_row == last_row {
        return Shape::Simple([
            (
                left + inner_left + start_col as f32 * w,
                top + outer_top + start_row as f32 * h,
            ),
            (
                size as f32 * w - (inner_left + inner_right),
                h - (outer_top + outer_bottom),
            ),
        ]);
    }

    let outer_left = px(paddings.outer_left());
    let outer_right = px(paddings.outer_right());
    let inner_top = px(paddings.inner_top());
    let inner_bottom = px(paddings.inner_bottom());

    let x0 = left + outer_left;
    let x1 = left + inner_left + start_col as f32 * w;
    let x2 = left - inner_right + (last_col + 1) as f32 * w;
    let x3 = left - outer_right + columns as f32 * w;

    if size <= columns {
        return Shape::Split([
            (x0, top + outer_top + start_row as f32 * h),
            (x1, top - inner_bottom + (start_row + 1) as f32 * h),
            (x2, top + inner_top + (start_row + 1) as f32 * h),
            (x3, top - outer_bottom + (start_row + 2) as f32 * h),
            (h - (outer_top + inner_bottom), h - (inner_top + outer_bottom)),
        ]);
    }

    let y0 = top + outer_top + start_row as f32 * h;
    let y1 = top + inner_top + (start_row + 1) as f32 * h;
    let y2 = top - inner_bottom + last_row as f32 * h;
    let y3 = top - outer_bottom + (last_row + 1) as f32 * h;
    Shape::Blob([
        (x1, y0),
        (x3, y0),
        (x3, y2),
        (x2, y2),
        (x2, y3),
        (x0, y3),
        (x0, y1),
        (x1, y1),
    ])
}

impl Shape {
    /// Containment test specialised per outline; edges count as inside.
    pub fn contains(&self, point: Point) -> bool {
        let (x, y) = point;
        match self {
            Shape::Simple(p) => {
                x >= p[0].0 && x <= p[0].0 + p[1].0 && y >= p[0].1 && y <= p[0].1 + p[1].1
            }
            Shape::Split(p) => {
                let top_row = x >= p[1].0 && x <= p[3].0 && y >= p[0].1 && y <= p[0].1 + p[4].0;
                let bottom_row = x >= p[0].0 && x <= p[2].0 && y >= p[2].1 && y <= p[2].1 + p[4].1;
                top_row || bottom_row
            }
            Shape::Blob(p) => {
                let bounds = x >= p[5].0 && x <= p[1].0 && y >= p[0].1 && y <= p[4].1;
                let outside_top_left = x <= p[5].0 || x >= p[0].0 || y <= p[0].1 || y >= p[6].1;
                let outside_bottom_right = x <= p[3].0 || x >= p[1].0 || y <= p[2].1 || y >= p[4].1;
                bounds && outside_top_left && outside_bottom_right
            }
        }
    }

    /// Closed outline for drawing; a split box yields its two row rectangles.
    pub fn outlines(&self) -> Vec<Vec<Point>> {
        match self {
            Shape::Simple([origin, size]) => vec![rect_outline(origin.0, origin.1, size.0, size.1)],
            Shape::Split(p) => vec![
                rect_outline(p[1].0, p[0].1, p[3].0 - p[1].0, p[4].0),
                rect_outline(p[0].0, p[2].1, p[2].0 - p[0].0, p[4].1),
            ],
            Shape::Blob(p) => vec![p.to_vec()],
        }
    }
}

fn rect_outline(x: f32, y: f32, width: f32, height: f32) -> Vec<Point> {
    vec![(x, y), (x + width, y), (x + width, y + height), (x, y + height)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::ShapeKind;

    fn metrics() -> CellMetrics {
        CellMetrics {
            cell_width: 25.0,
            cell_height: 25.0,
            margin_left: 50.0,
            margin_top: 25.0,
            padding_unit: 5.0,
        }
    }

    fn shape(columns: u32, offset: u32, size: u32) -> Shape {
        let end = offset.saturating_add(size);
        compute_shape(Grid::new(columns), &metrics(), &Paddings::default(), offset, end)
    }

    #[test]
    fn classification_follows_rows_and_width() {
        assert_eq!(shape(4, 0, 4).kind(), ShapeKind::Simple);
        assert_eq!(shape(4, 2, 2).kind(), ShapeKind::Simple);
        assert_eq!(shape(4, 2, 3).kind(), ShapeKind::Split);
        assert_eq!(shape(4, 2, 4).kind(), ShapeKind::Split);
        assert_eq!(shape(4, 2, 10).kind(), ShapeKind::Blob);
        assert_eq!(shape(4, 0, 8).kind(), ShapeKind::Blob);
    }

    #[test]
    fn simple_box_without_padding_fills_cells() {
        let Shape::Simple(p) = shape(4, 5, 2) else {
            panic!("expected a simple box");
        };
        assert_eq!(p[0], (75.0, 50.0));
        assert_eq!(p[1], (50.0, 25.0));
        assert!(shape(4, 5, 2).contains((80.0, 60.0)));
        assert!(!shape(4, 5, 2).contains((130.0, 60.0)));
    }

    #[test]
    fn split_box_covers_both_partial_rows() {
        let split = shape(4, 2, 4);
        let Shape::Split(p) = &split else {
            panic!("expected a split box");
        };
        assert_eq!(p[4], (25.0, 25.0));
        // bytes 2..4 on row 0, 4..6 on row 1
        assert!(split.contains((50.0 + 2.5 * 25.0, 30.0)));
        assert!(split.contains((50.0 + 0.5 * 25.0, 60.0)));
        assert!(!split.contains((50.0 + 0.5 * 25.0, 30.0)));
        assert!(!split.contains((50.0 + 3.5 * 25.0, 60.0)));
    }

    #[test]
    fn blob_excludes_cells_before_start_and_after_end() {
        // bytes 2..10: rows 0 and 2 are partial
        let blob = shape(4, 2, 8);
        assert!(blob.contains((50.0 + 2.5 * 25.0, 30.0)));
        assert!(blob.contains((50.0 + 0.5 * 25.0, 60.0)));
        assert!(blob.contains((50.0 + 0.5 * 25.0, 90.0)));
        assert!(!blob.contains((50.0 + 0.5 * 25.0, 30.0)));
        assert!(!blob.contains((50.0 + 3.5 * 25.0, 85.0)));
    }

    #[test]
    fn span_saturates_at_address_space_end() {
        let grid = Grid::new(256);
        let tail = compute_shape(grid, &metrics(), &Paddings::default(), 0xFFFF_FFF0, u32::MAX);
        let Shape::Simple([origin, extent]) = &tail else {
            panic!("expected a simple box, got {:?}", tail.kind());
        };
        // bytes 240..255 of the last row
        assert_eq!(origin.0, 50.0 + 240.0 * 25.0);
        assert_eq!(extent.0, 15.0 * 25.0);
        assert_eq!(shape(256, u32::MAX - 1, 0x20).kind(), ShapeKind::Simple);
    }

    #[test]
    fn padding_insets_the_outline() {
        let mut paddings = Paddings::default();
        for side in crate::layout::types::PaddingSide::ALL {
            paddings.set(side, 1);
        }
        let Shape::Simple(p) = compute_shape(Grid::new(4), &metrics(), &paddings, 0, 4) else {
            panic!("expected a simple box");
        };
        assert_eq!(p[0], (55.0, 30.0));
        assert_eq!(p[1], (90.0, 15.0));
    }
}
