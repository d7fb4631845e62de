//! Picks the rectangle a node's label is centred in.
//!
//! Simple boxes use their own rectangle. Split boxes use the wider of their
//! two rows. Blobs prefer the band of full-width rows; when there is none,
//! the wider of the two partial rows wins.

use crate::config::LayoutConfig;

use super::text::fit_text;
use super::types::{Grid, LabelLayout, Rect, Shape};

pub(super) fn label_rect(grid: Grid, shape: &Shape, offset: u32, end: u32) -> Rect {
    match shape {
        Shape::Simple([origin, extent]) => Rect::new(origin.0, origin.1, extent.0, extent.1),
        Shape::Split(p) => {
            let top_width = p[3].0 - p[1].0;
            let bottom_width = p[2].0 - p[0].0;
            if top_width >= bottom_width {
                Rect::new(p[1].0, p[0].1, top_width, p[4].0)
            } else {
                Rect::new(p[0].0, p[2].1, bottom_width, p[4].1)
            }
        }
        Shape::Blob(p) => {
            let start_row = grid.row(offset);
            let last_row = grid.row(end.saturating_sub(1).max(offset));
            let start_col = grid.col(offset);
            let end_col = grid.col(end);

            if start_row + 1 == last_row && start_col != 0 && end_col != 0 {
                // no full row
                if grid.columns() - start_col >= end_col {
                    Rect::new(p[0].0, p[0].1, p[2].0 - p[0].0, p[2].1 - p[0].1)
                } else {
                    Rect::new(p[6].0, p[6].1, p[4].0 - p[6].0, p[4].1 - p[6].1)
                }
            } else {
                let start_y = if start_col == 0 { p[0].1 } else { p[6].1 };
                let end_y = if end_col == 0 { p[5].1 } else { p[2].1 };
                Rect::new(p[5].0, start_y, p[1].0 - p[5].0, end_y - start_y)
            }
        }
    }
}

/// Label centred in `bounds`, or `None` when the rectangle is too small to read.
pub(super) fn place_label(text: &str, bounds: Rect, config: &LayoutConfig) -> Option<LabelLayout> {
    if bounds.width < config.label_min_width || bounds.height < config.label_min_height {
        return None;
    }
    let (fitted, width) = fit_text(text, bounds.width, config);
    let (x, y) = bounds.center();
    Some(LabelLayout {
        text: fitted,
        full_text: text.to_string(),
        x,
        y,
        width,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::shape::{CellMetrics, compute_shape};
    use crate::layout::types::Paddings;

    fn shape(grid: Grid, offset: u32, end: u32) -> Shape {
        let metrics = CellMetrics {
            cell_width: 25.0,
            cell_height: 25.0,
            margin_left: 50.0,
            margin_top: 25.0,
            padding_unit: 5.0,
        };
        compute_shape(grid, &metrics, &Paddings::default(), offset, end)
    }

    #[test]
    fn split_label_uses_wider_row() {
        let grid = Grid::new(4);
        // one byte on row 0, three on row 1
        let rect = label_rect(grid, &shape(grid, 3, 7), 3, 7);
        assert_eq!(rect, Rect::new(50.0, 50.0, 75.0, 25.0));
        // three bytes on row 0, one on row 1
        let rect = label_rect(grid, &shape(grid, 1, 5), 1, 5);
        assert_eq!(rect, Rect::new(75.0, 25.0, 75.0, 25.0));
    }

    #[test]
    fn blob_label_centres_on_full_rows() {
        let grid = Grid::new(4);
        let rect = label_rect(grid, &shape(grid, 2, 10), 2, 10);
        assert_eq!(rect, Rect::new(50.0, 50.0, 100.0, 25.0));
        let rect = label_rect(grid, &shape(grid, 0, 12), 0, 12);
        assert_eq!(rect, Rect::new(50.0, 25.0, 100.0, 75.0));
    }

    #[test]
    fn blob_without_full_row_uses_longer_partial_row() {
        let grid = Grid::new(8);
        // 6 bytes on row 0 (cols 2..8), 5 bytes on row 1
        let rect = label_rect(grid, &shape(grid, 2, 13), 2, 13);
        assert_eq!(rect, Rect::new(100.0, 25.0, 150.0, 25.0));
        // 2 bytes on row 0, 7 bytes on row 1
        let rect = label_rect(grid, &shape(grid, 6, 15), 6, 15);
        assert_eq!(rect, Rect::new(50.0, 50.0, 175.0, 25.0));
    }

    #[test]
    fn tiny_rectangles_get_no_label() {
        let config = LayoutConfig {
            fast_text_metrics: true,
            ..Default::default()
        };
        assert!(place_label("x", Rect::new(0.0, 0.0, 14.0, 25.0), &config).is_none());
        let label = place_label("x", Rect::new(0.0, 0.0, 25.0, 25.0), &config).unwrap();
        assert_eq!((label.x, label.y), (12.5, 12.5));
        assert_eq!(label.text, "x");
    }
}
