use serde::Serialize;

/// Index of a node inside a [`LayoutTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Root,
    SimpleField,
    Bitfield,
    ComplexField,
    PrimaryVirtualBase,
    VirtualBase,
    PrimaryNonVirtualBase,
    NonVirtualBase,
    VTablePointer,
    VFTablePointer,
    VBTablePointer,
    VtorDisplacement,
    Union,
    SharedMemory,
}

impl Category {
    pub fn from_byte(value: u8) -> Option<Self> {
        let category = match value {
            0 => Self::Root,
            1 => Self::SimpleField,
            2 => Self::Bitfield,
            3 => Self::ComplexField,
            4 => Self::PrimaryVirtualBase,
            5 => Self::VirtualBase,
            6 => Self::PrimaryNonVirtualBase,
            7 => Self::NonVirtualBase,
            8 => Self::VTablePointer,
            9 => Self::VFTablePointer,
            10 => Self::VBTablePointer,
            11 => Self::VtorDisplacement,
            12 => Self::Union,
            13 => Self::SharedMemory,
            _ => return None,
        };
        Some(category)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::SimpleField => "SimpleField",
            Self::Bitfield => "Bitfield",
            Self::ComplexField => "ComplexField",
            Self::PrimaryVirtualBase => "PrimaryVirtualBase",
            Self::VirtualBase => "VirtualBase",
            Self::PrimaryNonVirtualBase => "PrimaryNonVirtualBase",
            Self::NonVirtualBase => "NonVirtualBase",
            Self::VTablePointer => "VTablePointer",
            Self::VFTablePointer => "VFTablePointer",
            Self::VBTablePointer => "VBTablePointer",
            Self::VtorDisplacement => "VtorDisplacement",
            Self::Union => "Union",
            Self::SharedMemory => "SharedMemory",
        }
    }

    pub fn is_base(self) -> bool {
        matches!(
            self,
            Self::PrimaryVirtualBase
                | Self::VirtualBase
                | Self::PrimaryNonVirtualBase
                | Self::NonVirtualBase
        )
    }

    /// Union and synthetic shared-memory nodes: children overlap on purpose.
    pub fn is_shared_memory(self) -> bool {
        matches!(self, Self::Union | Self::SharedMemory)
    }
}

/// Source position; `file` indexes the tree's file table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub type_name: String,
    pub field_name: String,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
    pub real_size: u32,
    pub category: Category,
    pub type_location: Option<Location>,
    pub field_location: Option<Location>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub extra: Vec<NodeId>,
    pub background: &'static str,
    pub is_expanded: bool,
    pub expansion_index: Option<usize>,
}

impl LayoutNode {
    pub fn new(category: Category) -> Self {
        Self {
            type_name: String::new(),
            field_name: String::new(),
            offset: 0,
            size: 0,
            align: 0,
            real_size: 0,
            category,
            type_location: None,
            field_location: None,
            parent: None,
            children: Vec::new(),
            extra: Vec::new(),
            background: crate::theme::category_background(category),
            is_expanded: false,
            expansion_index: None,
        }
    }

    /// Bytes of `size` not covered by real content.
    pub fn padding(&self) -> u32 {
        self.size.saturating_sub(self.real_size)
    }

    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.size)
    }

    /// Name, then type, then category: whatever identifies the node best.
    pub fn label(&self) -> &str {
        if !self.field_name.is_empty() {
            &self.field_name
        } else if !self.type_name.is_empty() {
            &self.type_name
        } else {
            self.category.display_name()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutTree {
    nodes: Vec<LayoutNode>,
    root: NodeId,
    files: Vec<String>,
    pub(crate) absolute_offsets: bool,
}

impl LayoutTree {
    pub fn new(root: LayoutNode, files: Vec<String>) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
            files,
            absolute_offsets: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn file_name(&self, location: &Location) -> Option<&str> {
        self.files.get(location.file).map(String::as_str)
    }

    pub fn node(&self, id: NodeId) -> &LayoutNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut LayoutNode {
        &mut self.nodes[id.0]
    }

    /// Id for an arena index handed out earlier, e.g. across an FFI boundary.
    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(id.0)
    }

    /// Arena size, including nodes that are no longer reachable from the root.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a detached node to the arena.
    pub fn insert(&mut self, node: LayoutNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Adds `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, mut node: LayoutNode) -> NodeId {
        node.parent = Some(parent);
        let id = self.insert(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Pre-order walk over every node reachable through `children`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Children currently shown for `id`, honouring collapse and single-child selection.
    pub fn visible_children(&self, id: NodeId) -> &[NodeId] {
        let node = &self.nodes[id.0];
        if !node.is_expanded {
            return &[];
        }
        match node.expansion_index {
            Some(index) => node
                .children
                .get(index)
                .map(std::slice::from_ref)
                .unwrap_or(&[]),
            None => &node.children,
        }
    }

    /// Collapsed → Expanded. Shared memory with several children needs `index`.
    pub fn expand(&mut self, id: NodeId, index: Option<usize>) -> bool {
        let node = &mut self.nodes[id.0];
        let count = node.children.len();
        if count == 0 {
            return false;
        }
        if count == 1 {
            node.is_expanded = true;
            node.expansion_index = None;
            return true;
        }
        match index {
            Some(index) if index < count => {
                node.is_expanded = true;
                node.expansion_index = Some(index);
                true
            }
            Some(_) => false,
            None if node.category.is_shared_memory() => false,
            None => {
                node.is_expanded = true;
                node.expansion_index = None;
                true
            }
        }
    }

    /// Collapses `id` and every descendant. Returns whether `id` was expanded.
    pub fn collapse(&mut self, id: NodeId) -> bool {
        if !self.nodes[id.0].is_expanded {
            return false;
        }
        for current in self.descendants(id) {
            let node = &mut self.nodes[current.0];
            node.is_expanded = false;
            node.expansion_index = None;
        }
        true
    }

    /// Expands top-down; shared memory with several children stays collapsed.
    pub fn expand_all(&mut self, id: NodeId) {
        if self.nodes[id.0].children.is_empty() {
            return;
        }
        if !self.nodes[id.0].is_expanded {
            self.expand(id, None);
        }
        let visible = self.visible_children(id).to_vec();
        for child in visible {
            self.expand_all(child);
        }
    }

    /// Parent chain from the direct parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            out.push(parent);
            current = self.nodes[parent.0].parent;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, offset: u32, size: u32) -> LayoutNode {
        let mut node = LayoutNode::new(Category::SimpleField);
        node.field_name = name.to_string();
        node.offset = offset;
        node.size = size;
        node
    }

    #[test]
    fn label_falls_back_to_type_then_category() {
        let mut node = LayoutNode::new(Category::VTablePointer);
        assert_eq!(node.label(), "VTablePointer");
        node.type_name = "int".to_string();
        assert_eq!(node.label(), "int");
        node.field_name = "x".to_string();
        assert_eq!(node.label(), "x");
    }

    #[test]
    fn shared_memory_requires_choice() {
        let mut root = LayoutNode::new(Category::Root);
        root.size = 8;
        let mut tree = LayoutTree::new(root, Vec::new());
        let mut shared = LayoutNode::new(Category::SharedMemory);
        shared.size = 8;
        let shared = tree.append_child(tree.root(), shared);
        tree.append_child(shared, field("a", 0, 4));
        tree.append_child(shared, field("b", 0, 8));

        assert!(!tree.expand(shared, None));
        assert!(!tree.expand(shared, Some(2)));
        assert!(tree.expand(shared, Some(1)));
        assert_eq!(tree.visible_children(shared).len(), 1);
    }

    #[test]
    fn single_child_always_expands_fully() {
        let mut tree = LayoutTree::new(LayoutNode::new(Category::Root), Vec::new());
        let mut union = LayoutNode::new(Category::Union);
        union.size = 4;
        let union = tree.append_child(tree.root(), union);
        tree.append_child(union, field("only", 0, 4));
        assert!(tree.expand(union, Some(0)));
        assert_eq!(tree.node(union).expansion_index, None);
    }

    #[test]
    fn collapse_resets_subtree() {
        let mut tree = LayoutTree::new(LayoutNode::new(Category::Root), Vec::new());
        let outer = tree.append_child(tree.root(), field("outer", 0, 8));
        let inner = tree.append_child(outer, field("inner", 0, 8));
        tree.append_child(inner, field("leaf", 0, 4));
        tree.expand_all(tree.root());
        assert!(tree.node(inner).is_expanded);

        assert!(tree.collapse(outer));
        assert!(!tree.node(outer).is_expanded);
        assert!(!tree.node(inner).is_expanded);
        assert!(!tree.collapse(outer));
    }
}
