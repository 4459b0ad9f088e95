use crate::diagram::{
    Diagram, DiagramEdge, DiagramNode, LineStyle, edge_style, kind_caption, node_style,
};
use crate::graph::{DependencyKind, ObjectKind};
use crate::layout::{Layout, LayoutEdge, LayoutEngine, LayoutNode};
use crate::measure::{TextMetrics, body_lines};
use std::collections::HashMap;
use std::fmt::{self, Write};

const LEGEND_ROW: f64 = 20.0;

pub struct SvgRenderer {
    metrics: TextMetrics,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
        }
    }
}

/// Lay out and render a diagram with default settings.
pub fn render_svg(diagram: &Diagram) -> String {
    let layout = LayoutEngine::default().layout(diagram);
    SvgRenderer::default().render(diagram, &layout)
}

impl SvgRenderer {
    pub fn render(&self, diagram: &Diagram, layout: &Layout) -> String {
        let mut svg = String::new();
        // fmt::Write into a String cannot fail.
        let _ = self.write_document(&mut svg, diagram, layout);
        svg
    }

    fn write_document(&self, svg: &mut String, diagram: &Diagram, layout: &Layout) -> fmt::Result {
        let kinds = node_kinds(diagram);
        let categories = diagram.edge_categories();
        let legend_rows = kinds.len() + categories.len();
        let legend_height = if legend_rows == 0 {
            0.0
        } else {
            legend_rows as f64 * LEGEND_ROW + LEGEND_ROW
        };

        let width = layout.width.max(260.0);
        let height = layout.height + legend_height;

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        )?;

        writeln!(
            svg,
            r#"<style>
  .node-border {{ fill: none; stroke: #333; stroke-width: 1.5; }}
  .node-name {{ font-family: monospace; font-size: 14px; font-weight: bold; fill: #fff; }}
  .row-text {{ font-family: monospace; font-size: 12px; fill: #222; }}
  .pk {{ font-weight: bold; }}
  .fk {{ font-style: italic; }}
  .edge {{ stroke-width: 1.5; fill: none; }}
  .edge-label {{ font-family: monospace; font-size: 11px; fill: #555; }}
  .legend-text {{ font-family: monospace; font-size: 12px; fill: #333; }}
</style>"#
        )?;

        writeln!(svg, "<defs>")?;
        for &category in &categories {
            write_marker(svg, category)?;
        }
        writeln!(svg, "</defs>")?;

        let node_map: HashMap<&str, &DiagramNode> =
            diagram.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        // Edges first so nodes are drawn over them.
        for edge in &layout.edges {
            if let Some(diagram_edge) = diagram.edges.get(edge.edge_index) {
                self.render_edge(svg, edge, diagram_edge)?;
            }
        }

        for node in &layout.nodes {
            if let Some(diagram_node) = node_map.get(node.id.as_str()) {
                self.render_node(svg, node, diagram_node)?;
            }
        }

        self.render_legend(svg, &kinds, &categories, layout.height)?;

        writeln!(svg, "</svg>")
    }

    fn render_node(&self, svg: &mut String, layout: &LayoutNode, node: &DiagramNode) -> fmt::Result {
        let x = layout.x;
        let y = layout.y;
        let w = layout.width;
        let header_h = self.metrics.header_height();

        writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="{}" />"#,
            x, y, w, layout.height, node.style.body
        )?;
        writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="{}" />"#,
            x, y, w, header_h, node.style.header
        )?;
        // square off the header's bottom corners
        writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="4" fill="{}" />"#,
            x,
            y + header_h - 4.0,
            w,
            node.style.header
        )?;

        writeln!(
            svg,
            r#"<text class="node-name" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            x + w / 2.0,
            y + header_h / 2.0 + 5.0,
            escape_xml(&node.id)
        )?;

        let mut row_y = y + header_h + self.metrics.padding_y + self.metrics.line_height * 0.7;
        let lines = body_lines(node);
        for (i, line) in lines.iter().enumerate() {
            let mut class = "row-text".to_string();
            if let Some(row) = node.attributes.get(i) {
                if row.markers.iter().any(|m| m == "PK") {
                    class.push_str(" pk");
                }
                if row.markers.iter().any(|m| m.starts_with("FK")) {
                    class.push_str(" fk");
                }
            }

            writeln!(
                svg,
                r#"<text class="{}" x="{}" y="{}">{}</text>"#,
                class,
                x + self.metrics.padding_x,
                row_y,
                escape_xml(line)
            )?;
            row_y += self.metrics.line_height;
        }

        writeln!(
            svg,
            r#"<rect class="node-border" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, layout.height
        )
    }

    fn render_edge(&self, svg: &mut String, layout: &LayoutEdge, edge: &DiagramEdge) -> fmt::Result {
        let points: Vec<String> = layout
            .waypoints
            .iter()
            .map(|(x, y)| format!("{},{}", x, y))
            .collect();

        write!(
            svg,
            r#"<polyline class="edge" points="{}" stroke="{}" marker-end="url(#arrow-{})""#,
            points.join(" "),
            edge.style.color,
            edge.category.as_str()
        )?;
        if let Some(dash) = dash_array(edge.style.line) {
            write!(svg, r#" stroke-dasharray="{}""#, dash)?;
        }
        writeln!(svg, " />")?;

        if let (Some(label), [(x1, y1), .., (x2, y2)]) = (&edge.label, layout.waypoints.as_slice()) {
            writeln!(
                svg,
                r#"<text class="edge-label" x="{}" y="{}" text-anchor="middle">{}</text>"#,
                (x1 + x2) / 2.0,
                (y1 + y2) / 2.0 - 5.0,
                escape_xml(label)
            )?;
        }
        Ok(())
    }

    fn render_legend(
        &self,
        svg: &mut String,
        kinds: &[ObjectKind],
        categories: &[DependencyKind],
        top: f64,
    ) -> fmt::Result {
        let x = 20.0;
        let mut y = top + LEGEND_ROW;

        for &kind in kinds {
            let style = node_style(kind);
            writeln!(
                svg,
                r#"<rect x="{}" y="{}" width="24" height="12" fill="{}" stroke="{}" />"#,
                x,
                y - 10.0,
                style.body,
                style.header
            )?;
            writeln!(
                svg,
                r#"<text class="legend-text" x="{}" y="{}">{}</text>"#,
                x + 32.0,
                y,
                kind_caption(kind)
            )?;
            y += LEGEND_ROW;
        }

        for &category in categories {
            let style = edge_style(category);
            write!(
                svg,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1.5" marker-end="url(#arrow-{})""#,
                x,
                y - 4.0,
                x + 24.0,
                y - 4.0,
                style.color,
                category.as_str()
            )?;
            if let Some(dash) = dash_array(style.line) {
                write!(svg, r#" stroke-dasharray="{}""#, dash)?;
            }
            writeln!(svg, " />")?;
            writeln!(
                svg,
                r#"<text class="legend-text" x="{}" y="{}">{}</text>"#,
                x + 32.0,
                y,
                category.as_str()
            )?;
            y += LEGEND_ROW;
        }
        Ok(())
    }
}

/// Node categories present in the diagram, in canonical order.
fn node_kinds(diagram: &Diagram) -> Vec<ObjectKind> {
    [
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::Procedure,
        ObjectKind::Function,
    ]
    .into_iter()
    .filter(|kind| diagram.nodes.iter().any(|n| n.category == *kind))
    .collect()
}

fn dash_array(line: LineStyle) -> Option<&'static str> {
    match line {
        LineStyle::Solid => None,
        LineStyle::Dashed => Some("6,4"),
        LineStyle::Dotted => Some("2,3"),
    }
}

/// Arrowhead marker matching the Graphviz shape of `category`.
fn write_marker(svg: &mut String, category: DependencyKind) -> fmt::Result {
    let style = edge_style(category);
    let (path, fill) = match style.arrowhead {
        "vee" => ("M0,0 L10,5 L0,10 L4,5 z", style.color),
        "diamond" => ("M0,5 L5,0 L10,5 L5,10 z", style.color),
        "odiamond" => ("M0,5 L5,0 L10,5 L5,10 z", "#fff"),
        _ => ("M0,0 L10,5 L0,10 z", style.color),
    };
    writeln!(
        svg,
        r#"<marker id="arrow-{}" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="{}" fill="{}" stroke="{}" /></marker>"#,
        category.as_str(),
        path,
        fill,
        style.color
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
