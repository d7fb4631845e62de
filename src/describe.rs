use std::fmt::Write;

use crate::ir::{Category, LayoutNode, LayoutTree, NodeId};

/// Small values print plainly, larger ones with their hex form.
pub fn format_value(value: u32) -> String {
    if value < 10 {
        value.to_string()
    } else {
        format!("{value} ( 0x{value:X} )")
    }
}

fn type_or_category(node: &LayoutNode) -> &str {
    if node.type_name.is_empty() {
        node.category.display_name()
    } else {
        &node.type_name
    }
}

/// Multi-line tooltip text for a node.
pub fn describe(tree: &LayoutTree, id: NodeId) -> String {
    let node = tree.node(id);
    let mut out = String::new();

    let bit_width = match (node.category, node.extra.as_slice()) {
        (Category::Bitfield, [single]) => format!(" : {}", tree.node(*single).size),
        _ => String::new(),
    };
    if !node.field_name.is_empty() {
        let _ = writeln!(out, "{}", node.field_name);
        let _ = writeln!(out, "{}{}", node.type_name, bit_width);
    } else if !node.type_name.is_empty() {
        let _ = writeln!(out, "{}{}", node.type_name, bit_width);
        let _ = writeln!(out, "{}", node.category.display_name());
    } else {
        let _ = writeln!(out, "{}", node.category.display_name());
    }

    let _ = writeln!(
        out,
        "Offset: {} - Size: {} - Align: {}",
        format_value(node.offset),
        format_value(node.size),
        format_value(node.align)
    );
    if node.real_size != node.size {
        let _ = write!(
            out,
            "Real Size: {} - Padding: {}",
            format_value(node.real_size),
            format_value(node.padding())
        );
        if node.size > 0 {
            let percent = (node.padding() as f32 / node.size as f32 * 100.0) as u32;
            let _ = write!(out, " - {percent}%");
        }
        out.push('\n');
    }
    let local_offset = match node.parent {
        Some(parent) => node.offset - tree.node(parent).offset.min(node.offset),
        None => node.offset,
    };
    if local_offset != node.offset {
        let _ = writeln!(out, "Local Offset: {}", format_value(local_offset));
    }

    write_extra(&mut out, tree, node);

    if let Some(parent) = node.parent {
        out.push_str("Parent Stack\n");
        let _ = writeln!(out, "- {}", type_or_category(tree.node(parent)));
        for ancestor in tree.ancestors(parent) {
            let _ = writeln!(out, "- {}", type_or_category(tree.node(ancestor)));
        }
    }

    if !node.children.is_empty() && node.category != Category::Union {
        out.push_str(if node.is_expanded {
            "Left Mouse Click to Collapse\n"
        } else {
            "Left Mouse Click to Expand\n"
        });
    }

    while out.ends_with('\n') {
        out.pop();
    }
    out
}

fn write_extra(out: &mut String, tree: &LayoutTree, node: &LayoutNode) {
    if node.category == Category::Bitfield {
        if node.extra.len() > 1 {
            out.push_str("Contains:\n");
            for id in &node.extra {
                let entry = tree.node(*id);
                let _ = writeln!(
                    out,
                    "- {}{} : {}",
                    type_or_category(entry),
                    name_suffix(entry),
                    entry.size
                );
            }
        }
    } else if !node.extra.is_empty() {
        out.push_str(if node.category == Category::Union {
            "Contains:\n"
        } else {
            "Empty Base Optimization:\n"
        });
        for id in &node.extra {
            let entry = tree.node(*id);
            let _ = writeln!(
                out,
                "- {}{} ( size: {} )",
                type_or_category(entry),
                name_suffix(entry),
                format_value(entry.size)
            );
        }
    }
}

fn name_suffix(node: &LayoutNode) -> String {
    if node.field_name.is_empty() {
        String::new()
    } else {
        format!(" {}", node.field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn node(category: Category, ty: &str, name: &str, offset: u32, size: u32) -> LayoutNode {
        let mut node = LayoutNode::new(category);
        node.type_name = ty.to_string();
        node.field_name = name.to_string();
        node.offset = offset;
        node.size = size;
        node
    }

    #[test]
    fn values_switch_to_hex_at_ten() {
        assert_eq!(format_value(9), "9");
        assert_eq!(format_value(16), "16 ( 0x10 )");
    }

    #[test]
    fn describes_padding_and_parent_stack() {
        let mut tree = LayoutTree::new(node(Category::Root, "struct Outer", "", 0, 32), Vec::new());
        let inner = tree.append_child(
            tree.root(),
            node(Category::ComplexField, "struct Inner", "inner", 16, 16),
        );
        tree.append_child(inner, node(Category::SimpleField, "char", "c", 0, 1));
        tree.append_child(inner, node(Category::SimpleField, "int", "i", 4, 4));
        normalize(&mut tree);

        let text = describe(&tree, inner);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "inner");
        assert_eq!(lines[1], "struct Inner");
        assert_eq!(lines[2], "Offset: 16 ( 0x10 ) - Size: 16 ( 0x10 ) - Align: 0");
        assert_eq!(lines[3], "Real Size: 5 - Padding: 11 ( 0xB ) - 68%");
        assert!(!text.contains("Local Offset"));
        assert!(text.contains("Parent Stack\n- struct Outer"));
        assert!(text.ends_with("Left Mouse Click to Expand"));
    }

    #[test]
    fn nested_member_shows_local_offset() {
        let mut tree = LayoutTree::new(node(Category::Root, "struct Outer", "", 0, 32), Vec::new());
        let inner = tree.append_child(
            tree.root(),
            node(Category::ComplexField, "struct Inner", "inner", 16, 16),
        );
        let i = tree.append_child(inner, node(Category::SimpleField, "int", "i", 4, 4));
        normalize(&mut tree);

        let text = describe(&tree, i);
        assert!(text.contains("Offset: 20 ( 0x14 )"));
        assert!(text.contains("Local Offset: 4"));
        assert!(text.contains("- struct Inner\n- struct Outer"));
        assert!(!text.contains("Click"));
    }

    #[test]
    fn merged_bitfield_lists_its_members() {
        let mut tree = LayoutTree::new(node(Category::Root, "struct Flags", "", 0, 4), Vec::new());
        tree.append_child(tree.root(), node(Category::Bitfield, "unsigned", "a", 0, 1));
        tree.append_child(tree.root(), node(Category::Bitfield, "unsigned", "b", 0, 1));
        normalize(&mut tree);

        let merged = tree.children(tree.root())[0];
        let text = describe(&tree, merged);
        assert!(text.starts_with("Bitfield\nunsigned\n"));
        assert!(text.contains("Contains:\n- unsigned a : 8\n- unsigned b : 8"));
    }

    #[test]
    fn empty_bases_are_listed() {
        let mut tree = LayoutTree::new(node(Category::Root, "struct D", "", 0, 4), Vec::new());
        tree.append_child(tree.root(), node(Category::NonVirtualBase, "struct Empty", "", 0, 0));
        tree.append_child(tree.root(), node(Category::SimpleField, "int", "x", 0, 4));
        normalize(&mut tree);

        let text = describe(&tree, tree.root());
        assert!(text.starts_with("struct D\nRoot\n"));
        assert!(text.contains("Empty Base Optimization:\n- struct Empty ( size: 0 )"));
        assert!(text.ends_with("Left Mouse Click to Collapse"));
    }
}
