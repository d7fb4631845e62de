use crate::layout::{GridLayout, Point, Shape};
use crate::theme::Theme;
use crate::view::LayoutView;
use anyhow::Result;
use std::path::Path;

/// Draws the current state of `view`: node shapes, the byte grid on top of
/// them, labels, then the hover overlay.
pub fn render_svg(view: &LayoutView) -> String {
    let config = view.config();
    let theme = &config.theme;
    let (Some(tree), Some(layout)) = (view.tree(), view.layout()) else {
        return empty_svg(&config.render.background);
    };

    let width = layout.width.max(1.0);
    let height = layout.height.max(1.0);
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.render.background
    ));

    for id in view.drawn_nodes() {
        let Some(geometry) = layout.geometry(id) else {
            continue;
        };
        svg.push_str(&shape_svg(&geometry.shape, tree.node(id).background, theme));
    }

    svg.push_str(&grid_svg(layout, theme));
    if config.render.draw_axis_labels {
        svg.push_str(&axis_labels_svg(view, layout, theme));
    }

    for id in view.labelled_nodes() {
        let Some(label) = layout.geometry(id).and_then(|g| g.label.as_ref()) else {
            continue;
        };
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            label.x,
            label.y,
            theme.font_family,
            theme.font_size,
            theme.node_text_color,
            escape_xml(&label.text)
        ));
    }

    if let Some(geometry) = view.hover().and_then(|id| layout.geometry(id)) {
        for outline in geometry.shape.outlines() {
            svg.push_str(&format!(
                "<path d=\"{} Z\" fill=\"{}\" fill-opacity=\"{}\" stroke=\"none\"/>",
                points_to_path(&outline),
                theme.overlay_color,
                theme.overlay_opacity
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn empty_svg(background: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1\" height=\"1\" viewBox=\"0 0 1 1\"><rect width=\"100%\" height=\"100%\" fill=\"{background}\"/></svg>"
    )
}

fn shape_svg(shape: &Shape, fill: &str, theme: &Theme) -> String {
    let stroke = format!(
        "stroke=\"{}\" stroke-width=\"{}\"",
        theme.node_border_color, theme.node_border_width
    );
    match shape {
        Shape::Simple([origin, size]) => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\" {stroke}/>",
            origin.0, origin.1, size.0, size.1
        ),
        Shape::Split(p) => {
            // two filled rows, borders drawn as open lines so the wrap stays open
            let mut out = String::new();
            for outline in shape.outlines() {
                out.push_str(&format!(
                    "<path d=\"{} Z\" fill=\"{fill}\" stroke=\"none\"/>",
                    points_to_path(&outline)
                ));
            }
            let top = p[0].1;
            let top_bottom = top + p[4].0;
            let bottom = p[2].1;
            let bottom_bottom = bottom + p[4].1;
            let lines = [
                [(p[1].0, top), (p[3].0, top)],
                [(p[1].0, top), (p[1].0, top_bottom)],
                [(p[1].0, top_bottom), (p[3].0, top_bottom)],
                [(p[0].0, bottom), (p[2].0, bottom)],
                [(p[2].0, bottom), (p[2].0, bottom_bottom)],
                [(p[0].0, bottom_bottom), (p[2].0, bottom_bottom)],
            ];
            for [from, to] in lines {
                out.push_str(&format!(
                    "<path d=\"{}\" fill=\"none\" {stroke}/>",
                    points_to_path(&[from, to])
                ));
            }
            out
        }
        Shape::Blob(points) => format!(
            "<path d=\"{} Z\" fill=\"{fill}\" {stroke}/>",
            points_to_path(points)
        ),
    }
}

fn grid_svg(layout: &GridLayout, theme: &Theme) -> String {
    let left = layout.margin_left;
    let top = layout.margin_top;
    let right = left + layout.columns as f32 * layout.cell_width;
    let bottom = top + layout.rows as f32 * layout.cell_height;

    let mut d = String::new();
    for col in 0..=layout.columns {
        let x = left + col as f32 * layout.cell_width;
        d.push_str(&format!("M {x:.2} {top:.2} L {x:.2} {bottom:.2} "));
    }
    for row in 0..=layout.rows {
        let y = top + row as f32 * layout.cell_height;
        d.push_str(&format!("M {left:.2} {y:.2} L {right:.2} {y:.2} "));
    }
    format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"1\"/>",
        d.trim_end(),
        theme.grid_line_color,
        theme.grid_line_opacity
    )
}

fn axis_labels_svg(view: &LayoutView, layout: &GridLayout, theme: &Theme) -> String {
    let base = view.grid_base();
    let mut out = String::new();
    let text = |x: f32, y: f32, anchor: &str, value: String| {
        format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.font_size,
            theme.grid_label_color,
            escape_xml(&value)
        )
    };

    let header_y = layout.margin_top / 2.0;
    for col in 0..layout.columns {
        let x = layout.margin_left + (col as f32 + 0.5) * layout.cell_width;
        out.push_str(&text(x, header_y, "middle", base.format_column(col)));
    }
    let gutter_x = layout.margin_left - 5.0;
    for row in 0..layout.rows {
        let y = layout.margin_top + (row as f32 + 0.5) * layout.cell_height;
        let offset = row.saturating_mul(layout.columns);
        out.push_str(&text(gutter_x, y, "end", base.format_offset(offset)));
    }
    out
}

fn points_to_path(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, font_family: &str) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = font_family.to_string();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GridBase};
    use crate::ir::{Category, LayoutNode, LayoutTree};
    use crate::normalize::normalize;

    fn view() -> LayoutView {
        let mut root = LayoutNode::new(Category::Root);
        root.type_name = "struct Pair<int, char>".to_string();
        root.size = 8;
        root.align = 4;
        let mut tree = LayoutTree::new(root, Vec::new());
        let mut first = LayoutNode::new(Category::SimpleField);
        first.field_name = "first".to_string();
        first.size = 4;
        tree.append_child(tree.root(), first);
        let mut second = LayoutNode::new(Category::SimpleField);
        second.field_name = "second".to_string();
        second.offset = 4;
        second.size = 4;
        tree.append_child(tree.root(), second);
        normalize(&mut tree);

        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        let mut view = LayoutView::new(config);
        view.set_tree(Some(tree));
        view
    }

    #[test]
    fn render_svg_basic() {
        let view = view();
        let svg = render_svg(&view);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">first</text>"));
        assert!(svg.contains(">second</text>"));
        assert!(svg.contains(">0x4</text>"));
    }

    #[test]
    fn decimal_axis_labels() {
        let mut view = view();
        view.set_grid_base(GridBase::Decimal);
        let svg = render_svg(&view);
        assert!(svg.contains(">4</text>"));
        assert!(!svg.contains(">0x4</text>"));
    }

    #[test]
    fn hover_adds_overlay() {
        let mut view = view();
        let plain = render_svg(&view);
        assert!(!plain.contains("fill-opacity"));
        let first = view.tree().unwrap().children(view.tree().unwrap().root())[0];
        view.set_hover(Some(first));
        assert!(render_svg(&view).contains("fill-opacity"));
    }

    #[test]
    fn empty_view_renders_background_only() {
        let view = LayoutView::new(Config::default());
        let svg = render_svg(&view);
        assert!(svg.contains("<rect"));
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(escape_xml("Pair<int, char>"), "Pair&lt;int, char&gt;");
    }
}
