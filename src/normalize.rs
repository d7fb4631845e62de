//! Rewrites a freshly decoded tree into a coherent, displayable one.
//!
//! Every structural fix-up consumes a child list and returns the rewritten
//! list; nothing iterates a list it is mutating. The passes run top-down,
//! per node, before descending into the (possibly rewritten) children:
//!
//! 1. union detection from the type spelling,
//! 2. zero-size children moved to `extra`,
//! 3. bitfield absorption and merging,
//! 4. grouping of siblings that start at the same offset into a synthetic
//!    shared-memory node.
//!
//! A final bottom-up pass rebases offsets to absolute, computes real sizes
//! and assigns category colours. The normalizer never fails.

use log::debug;

use crate::ir::{Category, LayoutNode, LayoutTree, NodeId};
use crate::theme::category_background;

pub const SHARED_MEMORY_NAME: &str = "Shared Memory";
pub const MERGED_BITFIELD_NAME: &str = "Bitfield";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeStats {
    pub unions: usize,
    pub empty_members: usize,
    pub merged_bitfields: usize,
    pub shared_groups: usize,
}

pub fn normalize(tree: &mut LayoutTree) -> NormalizeStats {
    let mut stats = NormalizeStats::default();
    let root = tree.root();
    fix_overlaps(tree, root, &mut stats);

    let rebase = !tree.absolute_offsets;
    finalize_node(tree, root, None, rebase);
    tree.absolute_offsets = true;

    if !tree.node(root).is_expanded {
        tree.expand(root, None);
    }
    debug!(
        "normalized tree: {} unions, {} empty members, {} merged bitfields, {} shared groups",
        stats.unions, stats.empty_members, stats.merged_bitfields, stats.shared_groups
    );
    stats
}

fn fix_overlaps(tree: &mut LayoutTree, id: NodeId, stats: &mut NormalizeStats) {
    if detect_union(tree.node_mut(id)) {
        stats.unions += 1;
    }

    if !tree.node(id).category.is_shared_memory() {
        let children = std::mem::take(&mut tree.node_mut(id).children);
        let (children, empty) = split_empty_members(tree, children);
        stats.empty_members += empty.len();
        tree.node_mut(id).extra.extend(empty);
        let children = merge_bitfields(tree, children, stats);
        let children = group_shared_memory(tree, id, children, stats);
        tree.node_mut(id).children = children;
    }

    let children = tree.children(id).to_vec();
    for child in children {
        fix_overlaps(tree, child, stats);
    }
}

fn is_union_type(type_name: &str) -> bool {
    match type_name.strip_prefix("union") {
        Some(rest) => !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

fn detect_union(node: &mut LayoutNode) -> bool {
    if node.category != Category::Union && is_union_type(&node.type_name) {
        node.category = Category::Union;
        return true;
    }
    false
}

/// Zero-size members (empty bases, unrepresentable fields) take no grid space.
fn split_empty_members(tree: &LayoutTree, children: Vec<NodeId>) -> (Vec<NodeId>, Vec<NodeId>) {
    children
        .into_iter()
        .partition(|child| tree.node(*child).size != 0)
}

fn merge_bitfields(
    tree: &mut LayoutTree,
    children: Vec<NodeId>,
    stats: &mut NormalizeStats,
) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::with_capacity(children.len());
    for id in children {
        if tree.node(id).category == Category::Bitfield {
            absorb_bit_ranges(tree, id);
            if let Some(&prev) = out.last() {
                let previous = tree.node(prev);
                let current = tree.node(id);
                if previous.category == Category::Bitfield && current.offset <= previous.end() {
                    merge_bitfield_into(tree, id, prev);
                    stats.merged_bitfields += 1;
                    continue;
                }
            }
        }
        out.push(id);
    }
    out
}

/// Moves the bit ranges of a bitfield into `extra`, labelled like their owner.
fn absorb_bit_ranges(tree: &mut LayoutTree, id: NodeId) {
    let node = tree.node(id);
    if node.children.is_empty() && !node.extra.is_empty() {
        return;
    }
    let type_name = node.type_name.clone();
    let field_name = node.field_name.clone();
    let category = node.category;

    let mut ranges = std::mem::take(&mut tree.node_mut(id).children);
    if ranges.is_empty() {
        let mut whole = LayoutNode::new(category);
        whole.size = node_storage_bits(tree.node(id));
        whole.parent = Some(id);
        ranges.push(tree.insert(whole));
    }
    for range in &ranges {
        let entry = tree.node_mut(*range);
        entry.type_name = type_name.clone();
        entry.field_name = field_name.clone();
        entry.category = category;
    }
    tree.node_mut(id).extra.extend(ranges);
}

fn node_storage_bits(node: &LayoutNode) -> u32 {
    node.size.saturating_mul(8)
}

fn merge_bitfield_into(tree: &mut LayoutTree, source: NodeId, target: NodeId) {
    let ranges = std::mem::take(&mut tree.node_mut(source).extra);
    for range in &ranges {
        tree.node_mut(*range).parent = Some(target);
    }
    let source_end = tree.node(source).end();
    let target_node = tree.node_mut(target);
    target_node.extra.extend(ranges);
    if source_end > target_node.end() {
        target_node.size = source_end - target_node.offset;
    }
    if target_node.extra.len() > 1 {
        target_node.field_name = MERGED_BITFIELD_NAME.to_string();
    }
    tree.node_mut(source).parent = None;
}

fn group_shared_memory(
    tree: &mut LayoutTree,
    parent: NodeId,
    children: Vec<NodeId>,
    stats: &mut NormalizeStats,
) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::with_capacity(children.len());
    for id in children {
        let Some(&prev) = out.last() else {
            out.push(id);
            continue;
        };
        if tree.node(prev).offset != tree.node(id).offset {
            out.push(id);
            continue;
        }

        let shared = if tree.node(prev).category == Category::SharedMemory {
            prev
        } else {
            let first = tree.node(prev);
            let mut node = LayoutNode::new(Category::SharedMemory);
            node.field_name = SHARED_MEMORY_NAME.to_string();
            node.offset = first.offset;
            node.size = first.size;
            node.parent = Some(parent);
            let shared = tree.insert(node);

            let first = tree.node_mut(prev);
            first.offset = 0;
            first.parent = Some(shared);
            tree.node_mut(shared).children.push(prev);
            if let Some(slot) = out.last_mut() {
                *slot = shared;
            }
            stats.shared_groups += 1;
            shared
        };

        let incoming_size = tree.node(id).size;
        let incoming = tree.node_mut(id);
        incoming.offset = 0;
        incoming.parent = Some(shared);
        let group = tree.node_mut(shared);
        group.size = group.size.max(incoming_size);
        group.children.push(id);
    }
    out
}

/// Bottom-up: absolute offsets, real sizes and colours.
fn finalize_node(tree: &mut LayoutTree, id: NodeId, parent_offset: Option<u32>, rebase: bool) {
    if rebase && let Some(parent_offset) = parent_offset {
        let node = tree.node_mut(id);
        node.offset = node.offset.saturating_add(parent_offset);
    }
    let node = tree.node_mut(id);
    node.background = category_background(node.category);
    let offset = node.offset;

    let children = tree.children(id).to_vec();
    for child in &children {
        finalize_node(tree, *child, Some(offset), rebase);
    }

    let node = tree.node(id);
    let real_size = if children.is_empty() {
        node.size
    } else if node.category.is_shared_memory() {
        children
            .iter()
            .map(|child| tree.node(*child).real_size)
            .max()
            .unwrap_or(0)
    } else {
        let mut total = 0u32;
        let mut cursor = node.offset;
        for child in &children {
            let child = tree.node(*child);
            if cursor <= child.offset {
                total = total.saturating_add(child.real_size);
            }
            cursor = cursor.max(child.end());
        }
        total
    };
    let node = tree.node_mut(id);
    node.real_size = real_size.min(node.size);
}
