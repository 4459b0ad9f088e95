//! Graphviz DOT output for a [`Diagram`].

use crate::diagram::{Diagram, DiagramEdge, DiagramNode, kind_caption};
use crate::graph::ObjectKind;

/// Serialize a diagram as a Graphviz digraph with HTML-like table labels.
pub fn to_dot(diagram: &Diagram) -> String {
    let mut output = String::new();

    output.push_str("digraph schema {\n");
    output.push_str("    rankdir=LR;\n");
    output.push_str("    splines=ortho;\n");
    output.push_str("    node [shape=plaintext];\n");

    for node in &diagram.nodes {
        output.push('\n');
        write_node(&mut output, node);
    }

    if !diagram.edges.is_empty() {
        output.push('\n');
    }
    for edge in &diagram.edges {
        write_edge(&mut output, edge);
    }

    output.push_str("}\n");
    output
}

fn write_node(output: &mut String, node: &DiagramNode) {
    let style = node.style;
    let columns = if node.category == ObjectKind::Table { 3 } else { 1 };

    output.push_str(&format!("    {} [label=<\n", quote_id(&node.id)));
    output.push_str(&format!(
        "        <TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\" BGCOLOR=\"{}\">\n",
        style.body
    ));
    output.push_str(&format!(
        "        <TR><TD COLSPAN=\"{}\" BGCOLOR=\"{}\"><FONT COLOR=\"white\"><B>{}</B></FONT></TD></TR>\n",
        columns,
        style.header,
        escape_html(&node.id)
    ));

    if node.category == ObjectKind::Table {
        output.push_str("        <TR><TD><B>Column</B></TD><TD><B>Type</B></TD><TD><B>Attributes</B></TD></TR>\n");
        for row in &node.attributes {
            output.push_str(&format!(
                "        <TR><TD>{}</TD><TD>{}</TD><TD>{}</TD></TR>\n",
                escape_html(&row.name),
                escape_html(&row.data_type),
                escape_html(&row.markers.join(", "))
            ));
        }
    } else {
        output.push_str(&format!(
            "        <TR><TD>{}</TD></TR>\n",
            kind_caption(node.category)
        ));
    }

    output.push_str("        </TABLE>\n    >];\n");
}

fn write_edge(output: &mut String, edge: &DiagramEdge) {
    output.push_str(&format!(
        "    {} -> {} [color=\"{}\", style={}, arrowhead={}",
        quote_id(&edge.source),
        quote_id(&edge.target),
        edge.style.color,
        edge.style.line.as_str(),
        edge.style.arrowhead
    ));
    if let Some(label) = &edge.label {
        output.push_str(&format!(", label={}", quote_id(label)));
    }
    output.push_str("];\n");
}

fn quote_id(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{DiagramFlags, render_diagram};
    use crate::schema::{ColumnInfo, ForeignKey, Schema, TableInfo};
    use std::collections::BTreeMap;

    fn schema() -> Schema {
        let mut tables = BTreeMap::new();
        tables.insert(
            "users".to_string(),
            TableInfo {
                columns: vec![ColumnInfo::new("id", "int").not_null()],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![],
            },
        );
        tables.insert(
            "posts".to_string(),
            TableInfo {
                columns: vec![ColumnInfo::new("author_id", "int")],
                primary_keys: vec![],
                foreign_keys: vec![ForeignKey {
                    constrained_columns: vec!["author_id".to_string()],
                    referred_table: "users".to_string(),
                    referred_columns: vec!["id".to_string()],
                    name: None,
                }],
            },
        );
        let mut schema = Schema::from_tables(tables);
        schema
            .views
            .insert("recent".to_string(), "SELECT * FROM [posts]".to_string());
        schema
    }

    #[test]
    fn test_graph_header() {
        let dot = to_dot(&render_diagram(&schema(), DiagramFlags::default()));

        assert!(dot.starts_with("digraph schema {\n    rankdir=LR;\n    splines=ortho;\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_table_and_view_labels() {
        let dot = to_dot(&render_diagram(&schema(), DiagramFlags::default()));

        assert!(dot.contains("<TR><TD>id</TD><TD>int</TD><TD>PK, NOT NULL</TD></TR>"));
        assert!(dot.contains("<TR><TD>author_id</TD><TD>int</TD><TD>FK → users</TD></TR>"));
        assert!(dot.contains("BGCOLOR=\"#2ecc71\"><FONT COLOR=\"white\"><B>recent</B>"));
        assert!(dot.contains("<TR><TD>View</TD></TR>"));
    }

    #[test]
    fn test_edges() {
        let dot = to_dot(&render_diagram(&schema(), DiagramFlags::default()));

        assert!(dot.contains(
            "    \"posts\" -> \"users\" [color=\"#e74c3c\", style=solid, arrowhead=normal, label=\"author_id → id\"];\n"
        ));
        assert!(dot.contains(
            "    \"recent\" -> \"posts\" [color=\"#16a085\", style=dashed, arrowhead=vee];\n"
        ));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(quote_id("a\"b"), "\"a\\\"b\"");
        assert_eq!(escape_html("decimal(10,2) <x>"), "decimal(10,2) &lt;x&gt;");
    }
}
