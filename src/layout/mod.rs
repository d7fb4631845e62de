mod label_placement;
mod padding;
mod shape;
mod text;
pub mod types;

pub use types::*;

use crate::config::{DisplayMode, LayoutConfig};
use crate::ir::{LayoutTree, NodeId};
use log::debug;

use label_placement::{label_rect, place_label};
use padding::compute_paddings;
use shape::{CellMetrics, compute_shape};

/// Geometry for every node of `tree` on a grid `columns` bytes wide.
///
/// A pure function of its inputs: expansion state does not affect the
/// result, only which of the computed shapes are drawn and hit.
pub fn compute_layout(
    tree: &LayoutTree,
    columns: u32,
    mode: DisplayMode,
    config: &LayoutConfig,
) -> GridLayout {
    let grid = Grid::new(columns);
    let pass = compute_paddings(tree, grid, mode);

    let cell_width = config.base_cell_width + config.padding_unit * pass.max_h as f32;
    let cell_height = config.base_cell_height + config.padding_unit * pass.max_v as f32;
    let rows = grid.rows_for(tree.node(tree.root()).size);
    let metrics = CellMetrics {
        cell_width,
        cell_height,
        margin_left: config.margin_left,
        margin_top: config.margin_top,
        padding_unit: config.padding_unit,
    };

    let mut nodes: Vec<Option<NodeGeometry>> = vec![None; tree.arena_len()];
    for id in tree.descendants(tree.root()) {
        nodes[id.index()] = node_geometry(tree, id, grid, &metrics, &pass.paddings, config);
    }

    debug!(
        "layout: {} columns x {} rows, max padding {}h/{}v, cell {}x{}",
        grid.columns(),
        rows,
        pass.max_h,
        pass.max_v,
        cell_width,
        cell_height
    );

    GridLayout {
        columns: grid.columns(),
        rows,
        mode,
        cell_width,
        cell_height,
        max_padding_h: pass.max_h,
        max_padding_v: pass.max_v,
        margin_left: config.margin_left,
        margin_top: config.margin_top,
        width: config.margin_left + config.margin_right + grid.columns() as f32 * cell_width,
        height: config.margin_top + config.margin_bottom + rows as f32 * cell_height,
        nodes,
    }
}

fn node_geometry(
    tree: &LayoutTree,
    id: NodeId,
    grid: Grid,
    metrics: &CellMetrics,
    paddings: &[Paddings],
    config: &LayoutConfig,
) -> Option<NodeGeometry> {
    let node = tree.node(id);
    if node.size == 0 {
        return None;
    }
    let node_paddings = paddings[id.index()];
    let shape = compute_shape(grid, metrics, &node_paddings, node.offset, node.end());
    let bounds = label_rect(grid, &shape, node.offset, node.end());
    let label = place_label(node.label(), bounds, config);
    Some(NodeGeometry {
        id,
        paddings: node_paddings,
        shape,
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Category, LayoutNode};

    fn sample() -> (LayoutTree, NodeId, NodeId) {
        let mut root = LayoutNode::new(Category::Root);
        root.size = 12;
        root.align = 4;
        let mut tree = LayoutTree::new(root, Vec::new());
        let mut a = LayoutNode::new(Category::SimpleField);
        a.field_name = "a".to_string();
        a.size = 2;
        let a = tree.append_child(tree.root(), a);
        let mut b = LayoutNode::new(Category::ComplexField);
        b.field_name = "b".to_string();
        b.offset = 2;
        b.size = 10;
        let b = tree.append_child(tree.root(), b);
        (tree, a, b)
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..Default::default()
        }
    }

    #[test]
    fn canvas_scales_with_max_padding() {
        let (tree, _, _) = sample();
        let layout = compute_layout(&tree, 4, DisplayMode::Stack, &config());
        assert_eq!(layout.rows, 3);
        assert!(layout.max_padding_h >= 1);
        assert_eq!(
            layout.cell_width,
            25.0 + 5.0 * layout.max_padding_h as f32
        );
        assert_eq!(layout.width, 100.0 + 4.0 * layout.cell_width);
        assert_eq!(layout.height, 50.0 + 3.0 * layout.cell_height);
    }

    #[test]
    fn flat_mode_uses_base_cells() {
        let (tree, _, _) = sample();
        let layout = compute_layout(&tree, 4, DisplayMode::Flat, &config());
        assert_eq!((layout.cell_width, layout.cell_height), (25.0, 25.0));
        assert_eq!((layout.max_padding_h, layout.max_padding_v), (0, 0));
    }

    #[test]
    fn shapes_follow_classification() {
        let (tree, a, b) = sample();
        let layout = compute_layout(&tree, 4, DisplayMode::Stack, &config());
        assert_eq!(layout.geometry(a).unwrap().shape.kind(), ShapeKind::Simple);
        assert_eq!(layout.geometry(b).unwrap().shape.kind(), ShapeKind::Blob);
        assert_eq!(layout.geometry(tree.root()).unwrap().shape.kind(), ShapeKind::Blob);
    }

    #[test]
    fn zero_columns_are_clamped() {
        let (tree, _, _) = sample();
        let layout = compute_layout(&tree, 0, DisplayMode::Stack, &config());
        assert_eq!(layout.columns, 1);
        assert_eq!(layout.rows, 12);
    }

    #[test]
    fn cell_lookup_round_trips() {
        let (tree, _, _) = sample();
        let layout = compute_layout(&tree, 4, DisplayMode::Flat, &config());
        assert_eq!(layout.offset_at(50.0 + 25.0 + 1.0, 25.0 + 25.0 + 1.0), Some(5));
        assert_eq!(layout.offset_at(10.0, 30.0), None);
        assert_eq!(layout.offset_at(50.0 + 4.0 * 25.0 + 1.0, 30.0), None);
        assert_eq!(layout.offset_at(60.0, 25.0 + 3.0 * 25.0 + 1.0), None);
    }

    #[test]
    fn member_ending_past_address_space_saturates() {
        let mut root = LayoutNode::new(Category::Root);
        root.size = u32::MAX;
        let mut tree = LayoutTree::new(root, Vec::new());
        let mut big = LayoutNode::new(Category::SimpleField);
        big.field_name = "big".to_string();
        big.size = 0xFFFF_FFF0;
        tree.append_child(tree.root(), big);
        let mut x = LayoutNode::new(Category::SimpleField);
        x.field_name = "x".to_string();
        x.offset = 0xFFFF_FFF0;
        x.size = 0x20;
        let x = tree.append_child(tree.root(), x);
        crate::normalize::normalize(&mut tree);

        let layout = compute_layout(&tree, 256, DisplayMode::Stack, &config());
        assert_eq!(layout.rows, 0x100_0000);
        let geometry = layout.geometry(x).unwrap();
        assert_eq!(geometry.shape.kind(), ShapeKind::Simple);
    }

    #[test]
    fn labels_fall_back_to_category_name() {
        let mut root = LayoutNode::new(Category::Root);
        root.size = 64;
        let mut tree = LayoutTree::new(root, Vec::new());
        let mut vptr = LayoutNode::new(Category::VTablePointer);
        vptr.size = 8;
        let vptr = tree.append_child(tree.root(), vptr);
        let layout = compute_layout(&tree, 8, DisplayMode::Flat, &config());
        let label = layout.geometry(vptr).unwrap().label.as_ref().unwrap();
        assert_eq!(label.full_text, "VTablePointer");
    }
}
