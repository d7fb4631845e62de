//! The rendering surface a host drives: it owns one normalized tree, the
//! display settings and the geometry derived from both, and answers
//! hit-tests and expand/collapse requests.

use log::debug;

use crate::config::{
    Config, DisplayAlignment, DisplayMode, GridBase, MAX_COLUMNS, resolve_columns,
};
use crate::describe::describe;
use crate::ir::{LayoutTree, NodeId};
use crate::layout::{GridLayout, compute_layout};
use crate::render::render_svg;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    /// Several overlapping members: the caller has to pick one, by index.
    NeedsChoice(Vec<String>),
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct LayoutView {
    config: Config,
    tree: Option<LayoutTree>,
    layout: Option<GridLayout>,
    alignment: DisplayAlignment,
    custom_alignment: u32,
    columns: u32,
    mode: DisplayMode,
    grid_base: GridBase,
    hover: Option<NodeId>,
}

impl LayoutView {
    pub fn new(config: Config) -> Self {
        let viewer = config.viewer.clone();
        let custom_alignment = viewer.custom_alignment.clamp(1, MAX_COLUMNS);
        Self {
            config,
            tree: None,
            layout: None,
            alignment: viewer.alignment,
            custom_alignment,
            columns: resolve_columns(viewer.alignment, custom_alignment, 4),
            mode: viewer.mode,
            grid_base: viewer.grid_base,
            hover: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> Option<&LayoutTree> {
        self.tree.as_ref()
    }

    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn alignment(&self) -> DisplayAlignment {
        self.alignment
    }

    pub fn grid_base(&self) -> GridBase {
        self.grid_base
    }

    pub fn hover(&self) -> Option<NodeId> {
        self.hover
    }

    /// Replaces the displayed tree. Struct alignment re-derives the column count.
    pub fn set_tree(&mut self, tree: Option<LayoutTree>) {
        self.tree = tree;
        self.hover = None;
        if self.alignment == DisplayAlignment::Struct
            && let Some(tree) = &self.tree
        {
            let struct_align = tree.node(tree.root()).align;
            self.columns = resolve_columns(self.alignment, self.custom_alignment, struct_align);
        }
        self.relayout();
    }

    /// Sets a custom wrap width. Returns whether the column count changed.
    pub fn set_columns(&mut self, columns: u32) -> bool {
        self.alignment = DisplayAlignment::Custom;
        self.custom_alignment = columns.clamp(1, MAX_COLUMNS);
        self.apply_columns(self.custom_alignment)
    }

    pub fn set_alignment(&mut self, alignment: DisplayAlignment) -> bool {
        self.alignment = alignment;
        let struct_align = match &self.tree {
            Some(tree) => tree.node(tree.root()).align,
            None => self.columns,
        };
        self.apply_columns(resolve_columns(alignment, self.custom_alignment, struct_align))
    }

    fn apply_columns(&mut self, columns: u32) -> bool {
        if columns == self.columns {
            return false;
        }
        self.columns = columns;
        self.relayout();
        true
    }

    /// Switching to stack mode resets expansion to the root's members.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        if mode == DisplayMode::Stack {
            self.reset_expansion();
        }
        self.relayout();
    }

    pub fn set_grid_base(&mut self, base: GridBase) {
        self.grid_base = base;
    }

    fn relayout(&mut self) {
        self.layout = self
            .tree
            .as_ref()
            .map(|tree| compute_layout(tree, self.columns, self.mode, &self.config.layout));
    }

    fn reset_expansion(&mut self) {
        if let Some(tree) = &mut self.tree {
            let root = tree.root();
            tree.collapse(root);
            tree.expand(root, None);
        }
    }

    /// Deepest visible node under a canvas point.
    pub fn node_at(&self, x: f32, y: f32) -> Option<NodeId> {
        let tree = self.tree.as_ref()?;
        let layout = self.layout.as_ref()?;
        let offset = layout.offset_at(x, y)?;
        self.find_node(tree, layout, tree.root(), (x, y), offset)
    }

    fn find_node(
        &self,
        tree: &LayoutTree,
        layout: &GridLayout,
        id: NodeId,
        point: (f32, f32),
        offset: u32,
    ) -> Option<NodeId> {
        let node = tree.node(id);
        let inside = node.offset <= offset && offset < node.end();
        let geometry = layout.geometry(id)?;
        if !inside || !geometry.shape.contains(point) {
            return None;
        }
        for child in tree.visible_children(id) {
            if let Some(found) = self.find_node(tree, layout, *child, point, offset) {
                return Some(found);
            }
        }
        // flat mode never draws expanded nodes
        if self.mode == DisplayMode::Stack || !node.is_expanded {
            Some(id)
        } else {
            None
        }
    }

    /// Collapses an expanded node, otherwise expands it. Overlapping members
    /// with no `index` come back as a choice list instead.
    pub fn toggle_expand(&mut self, id: NodeId, index: Option<usize>) -> ToggleOutcome {
        let Some(tree) = &mut self.tree else {
            return ToggleOutcome::Unchanged;
        };
        if tree.get(id).is_none() {
            return ToggleOutcome::Unchanged;
        }
        let node = tree.node(id);
        if node.is_expanded {
            tree.collapse(id);
            debug!("collapsed {}", tree.node(id).label());
            return ToggleOutcome::Collapsed;
        }
        if node.category.is_shared_memory() && node.children.len() > 1 && index.is_none() {
            let labels = node
                .children
                .iter()
                .map(|child| tree.node(*child).label().to_string())
                .collect();
            return ToggleOutcome::NeedsChoice(labels);
        }
        if tree.expand(id, index) {
            debug!("expanded {}", tree.node(id).label());
            ToggleOutcome::Expanded
        } else {
            ToggleOutcome::Unchanged
        }
    }

    /// Expands every node except overlapping members, which need a choice.
    pub fn expand_all(&mut self) {
        if let Some(tree) = &mut self.tree {
            let root = tree.root();
            tree.expand_all(root);
        }
    }

    /// Back to the root's members only.
    pub fn collapse_all(&mut self) {
        self.reset_expansion();
    }

    /// Returns whether the hovered node changed.
    pub fn set_hover(&mut self, id: Option<NodeId>) -> bool {
        if self.hover == id {
            return false;
        }
        self.hover = id;
        true
    }

    pub fn describe(&self, id: NodeId) -> Option<String> {
        let tree = self.tree.as_ref()?;
        tree.get(id)?;
        Some(describe(tree, id))
    }

    /// Nodes in draw order: parents before children in stack mode, only
    /// unexpanded nodes in flat mode.
    pub fn drawn_nodes(&self) -> Vec<NodeId> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let node = tree.node(id);
            if self.mode == DisplayMode::Stack || !node.is_expanded {
                out.push(id);
            }
            for child in tree.visible_children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Visible nodes that carry a label: the unexpanded ones.
    pub fn labelled_nodes(&self) -> Vec<NodeId> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        self.drawn_nodes()
            .into_iter()
            .filter(|id| !tree.node(*id).is_expanded)
            .collect()
    }

    pub fn render_svg(&self) -> String {
        render_svg(self)
    }
}
