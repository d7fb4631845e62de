use crate::config::DisplayMode;
use crate::view::LayoutView;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub columns: u32,
    pub rows: u32,
    pub mode: DisplayMode,
    pub cell_width: f32,
    pub cell_height: f32,
    pub max_padding_h: u32,
    pub max_padding_v: u32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: usize,
    pub parent: Option<usize>,
    pub label: String,
    pub category: String,
    pub offset: u32,
    pub size: u32,
    pub real_size: u32,
    pub expanded: bool,
    pub shape: Option<String>,
    pub points: Vec<[f32; 2]>,
    pub paddings: Vec<u32>,
    pub label_text: Option<String>,
}

impl LayoutDump {
    /// Snapshot of every node the view currently draws. `None` without a tree.
    pub fn from_view(view: &LayoutView) -> Option<Self> {
        let tree = view.tree()?;
        let layout = view.layout()?;

        let nodes = view
            .drawn_nodes()
            .into_iter()
            .map(|id| {
                let node = tree.node(id);
                let geometry = layout.geometry(id);
                NodeDump {
                    id: id.index(),
                    parent: node.parent.map(|p| p.index()),
                    label: node.label().to_string(),
                    category: format!("{:?}", node.category),
                    offset: node.offset,
                    size: node.size,
                    real_size: node.real_size,
                    expanded: node.is_expanded,
                    shape: geometry.map(|g| format!("{:?}", g.shape.kind())),
                    points: geometry
                        .map(|g| g.shape.points().iter().map(|(x, y)| [*x, *y]).collect())
                        .unwrap_or_default(),
                    paddings: geometry
                        .map(|g| g.paddings.values().to_vec())
                        .unwrap_or_default(),
                    label_text: geometry
                        .and_then(|g| g.label.as_ref())
                        .map(|label| label.text.clone()),
                }
            })
            .collect();

        Some(LayoutDump {
            columns: layout.columns,
            rows: layout.rows,
            mode: layout.mode,
            cell_width: layout.cell_width,
            cell_height: layout.cell_height,
            max_padding_h: layout.max_padding_h,
            max_padding_v: layout.max_padding_v,
            width: layout.width,
            height: layout.height,
            nodes,
        })
    }
}

pub fn write_layout_dump(path: &Path, view: &LayoutView) -> anyhow::Result<()> {
    let dump = LayoutDump::from_view(view)
        .ok_or_else(|| anyhow::anyhow!("no layout loaded"))?;
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::{Category, LayoutNode, LayoutTree};
    use crate::normalize::normalize;

    #[test]
    fn dump_lists_drawn_nodes() {
        let mut root = LayoutNode::new(Category::Root);
        root.size = 8;
        root.align = 8;
        let mut tree = LayoutTree::new(root, Vec::new());
        let mut vptr = LayoutNode::new(Category::VTablePointer);
        vptr.size = 8;
        tree.append_child(tree.root(), vptr);
        normalize(&mut tree);

        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        let mut view = LayoutView::new(config);
        assert!(LayoutDump::from_view(&view).is_none());
        view.set_tree(Some(tree));

        let dump = LayoutDump::from_view(&view).unwrap();
        assert_eq!(dump.columns, 8);
        assert_eq!(dump.rows, 1);
        assert_eq!(dump.nodes.len(), 2);
        assert_eq!(dump.nodes[1].category, "VTablePointer");
        assert_eq!(dump.nodes[1].shape.as_deref(), Some("Simple"));
        assert_eq!(dump.nodes[1].paddings.len(), 8);

        let json = serde_json::to_string(&dump).unwrap();
        assert!(json.contains("\"mode\":\"stack\""));
    }
}
