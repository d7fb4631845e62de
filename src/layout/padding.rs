use crate::config::DisplayMode;
use crate::ir::{LayoutTree, NodeId};

use super::types::{Grid, PaddingSide, Paddings};

pub(super) struct PaddingPass {
    pub paddings: Vec<Paddings>,
    pub max_h: u32,
    pub max_v: u32,
}

/// Per-node nesting depths plus the tree-wide maxima that size one cell.
pub(super) fn compute_paddings(tree: &LayoutTree, grid: Grid, mode: DisplayMode) -> PaddingPass {
    let mut pass = PaddingPass {
        paddings: vec![Paddings::default(); tree.arena_len()],
        max_h: 0,
        max_v: 0,
    };
    if mode == DisplayMode::Stack {
        for child in tree.children(tree.root()) {
            pass.prepare_stack(tree, grid, *child);
        }
    }
    pass
}

impl PaddingPass {
    fn prepare_stack(&mut self, tree: &LayoutTree, grid: Grid, id: NodeId) {
        let node = tree.node(id);
        let Some(parent_id) = node.parent else {
            return;
        };
        let parent = tree.node(parent_id);
        if node.size == 0 || parent.size == 0 {
            return;
        }
        let columns = grid.columns();

        let parent_end = parent.end();
        let parent_last = parent_end - 1;
        let parent_start_row = grid.row(parent.offset);
        let parent_start_col = grid.col(parent.offset);
        let parent_last_row = grid.row(parent_last);
        let parent_end_col = grid.col(parent_end);

        let end = node.end();
        let last = end - 1;
        let start_col = grid.col(node.offset);
        let start_row = grid.row(node.offset);
        let last_row = grid.row(last);
        let end_col = grid.col(end);
        let end_row = grid.row(end);

        let pp = self.paddings[parent_id.index()];
        let mut p = Paddings::default();

        p.set(PaddingSide::OuterLeft, 1 + pp.outer_left());
        p.set(PaddingSide::OuterRight, 1 + pp.outer_right());

        let inner_left = if start_col == 0 {
            pp.outer_left()
        } else if node.offset == parent.offset {
            pp.inner_left()
        } else {
            0
        };
        p.set(PaddingSide::InnerLeft, 1 + inner_left);

        let inner_right = if end_col == 0 {
            pp.outer_right()
        } else if end == parent_end {
            pp.inner_right()
        } else {
            0
        };
        p.set(PaddingSide::InnerRight, 1 + inner_right);

        let outer_top = if start_row == parent_start_row {
            pp.outer_top()
        } else if parent_start_col != 0 && node.offset <= parent.offset.saturating_add(columns) {
            pp.inner_top()
        } else {
            0
        };
        p.set(PaddingSide::OuterTop, 1 + outer_top);

        let inner_top = if parent_start_col != 0 && start_row == parent_start_row {
            pp.inner_top()
        } else {
            0
        };
        p.set(PaddingSide::InnerTop, 1 + inner_top);

        let outer_bottom = if last_row == parent_last_row {
            pp.outer_bottom()
        } else if parent_end_col != 0
            && parent_last.checked_sub(columns).is_some_and(|limit| last >= limit)
        {
            pp.inner_bottom()
        } else {
            0
        };
        p.set(PaddingSide::OuterBottom, 1 + outer_bottom);

        let inner_bottom = if parent_end_col != 0 && last_row == parent_last_row {
            pp.inner_bottom()
        } else {
            0
        };
        p.set(PaddingSide::InnerBottom, 1 + inner_bottom);

        // Opposing sides add up when they shrink the same cell, otherwise the larger wins.
        let (padding_h, padding_v) = if start_row == last_row {
            let h = if node.size == 1 {
                p.inner_left() + p.inner_right()
            } else {
                p.inner_left().max(p.inner_right())
            };
            (h, p.outer_top() + p.outer_bottom())
        } else {
            let top_h = if start_col + 1 == columns {
                p.inner_left() + p.outer_right()
            } else {
                p.inner_left().max(p.outer_right())
            };
            let bottom_h = if start_col == 0 {
                p.outer_left() + p.inner_right()
            } else {
                p.outer_left().max(p.inner_right())
            };

            let outer_top_inner_bottom = if end_col != 0 && end_row == start_row + 1 {
                p.outer_top() + p.inner_bottom()
            } else {
                p.outer_top().max(p.inner_bottom())
            };
            let inner_top_outer_bottom = if start_col != 0 && last_row <= start_row + 1 {
                p.inner_top() + p.outer_bottom()
            } else {
                p.inner_top().max(p.outer_bottom())
            };
            let inner_top_inner_bottom = if end_col != 0
                && start_col != 0
                && node.size < columns.saturating_mul(2)
                && last_row == start_row + 2
            {
                p.inner_top() + p.inner_bottom()
            } else {
                p.inner_top().max(p.inner_bottom())
            };
            (
                top_h.max(bottom_h),
                outer_top_inner_bottom
                    .max(inner_top_outer_bottom)
                    .max(inner_top_inner_bottom),
            )
        };

        self.max_h = self.max_h.max(padding_h);
        self.max_v = self.max_v.max(padding_v);
        self.paddings[id.index()] = p;

        for child in tree.children(id) {
            self.prepare_stack(tree, grid, *child);
        }
    }
}
