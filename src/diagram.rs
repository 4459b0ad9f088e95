//! Diagram description: styled nodes and edges projected from a schema.

use crate::graph::{DependencyKind, ObjectKind, distinct_definitions, referenced_tables};
use crate::schema::{Schema, TableInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which object categories appear in a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramFlags {
    pub tables: bool,
    pub views: bool,
    pub procedures: bool,
    pub functions: bool,
}

impl Default for DiagramFlags {
    fn default() -> Self {
        Self {
            tables: true,
            views: true,
            procedures: false,
            functions: false,
        }
    }
}

impl DiagramFlags {
    pub fn includes(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Table => self.tables,
            ObjectKind::View => self.views,
            ObjectKind::Procedure => self.procedures,
            ObjectKind::Function => self.functions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    pub header: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeStyle {
    pub color: &'static str,
    pub line: LineStyle,
    /// Graphviz arrowhead shape name.
    pub arrowhead: &'static str,
}

pub fn node_style(kind: ObjectKind) -> NodeStyle {
    let (header, body) = match kind {
        ObjectKind::Table => ("#3498db", "#d6eaf8"),
        ObjectKind::View => ("#2ecc71", "#d5f5e3"),
        ObjectKind::Procedure => ("#9b59b6", "#e8daef"),
        ObjectKind::Function => ("#f1c40f", "#fcf3cf"),
    };
    NodeStyle { header, body }
}

pub fn edge_style(kind: DependencyKind) -> EdgeStyle {
    let (color, line, arrowhead) = match kind {
        DependencyKind::ForeignKey => ("#e74c3c", LineStyle::Solid, "normal"),
        DependencyKind::ViewDependency => ("#16a085", LineStyle::Dashed, "vee"),
        DependencyKind::ProcDependency => ("#8e44ad", LineStyle::Dotted, "diamond"),
        DependencyKind::FuncDependency => ("#d35400", LineStyle::Dotted, "odiamond"),
    };
    EdgeStyle {
        color,
        line,
        arrowhead,
    }
}

/// Caption shown under the name of a non-table node.
pub fn kind_caption(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Table => "Table",
        ObjectKind::View => "View",
        ObjectKind::Procedure => "Stored Procedure",
        ObjectKind::Function => "Function",
    }
}

/// One column row of a table node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRow {
    pub name: String,
    pub data_type: String,
    /// `PK`, `FK → table` and `NOT NULL`, in that order.
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramNode {
    pub id: String,
    pub category: ObjectKind,
    /// Column rows; empty for views and routines.
    pub attributes: Vec<AttributeRow>,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramEdge {
    pub source: String,
    pub target: String,
    pub category: DependencyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Categories present among the edges, in first-seen order.
    pub fn edge_categories(&self) -> Vec<DependencyKind> {
        let mut seen = Vec::new();
        for edge in &self.edges {
            if !seen.contains(&edge.category) {
                seen.push(edge.category);
            }
        }
        seen
    }
}

fn attribute_rows(table: &TableInfo) -> Vec<AttributeRow> {
    table
        .columns
        .iter()
        .map(|column| {
            let mut markers = Vec::new();
            if table.is_primary_key(&column.name) {
                markers.push("PK".to_string());
            }
            for fk in table.foreign_keys_on(&column.name) {
                markers.push(format!("FK → {}", fk.referred_table));
            }
            if !column.nullable {
                markers.push("NOT NULL".to_string());
            }
            AttributeRow {
                name: column.name.clone(),
                data_type: column.data_type.clone(),
                markers,
            }
        })
        .collect()
}

/// Project `schema` into diagram nodes and edges.
///
/// Nodes come tables first, then views, procedures and functions, each in
/// name order. Edges whose endpoints are not both nodes of the diagram are
/// dropped.
pub fn render_diagram(schema: &Schema, flags: DiagramFlags) -> Diagram {
    let mut nodes = Vec::new();

    if flags.tables {
        for (name, table) in &schema.tables {
            nodes.push(DiagramNode {
                id: name.clone(),
                category: ObjectKind::Table,
                attributes: attribute_rows(table),
                style: node_style(ObjectKind::Table),
            });
        }
    }
    let objects = distinct_definitions(schema);
    for &(kind, name, _) in objects.iter().filter(|(kind, _, _)| flags.includes(*kind)) {
        nodes.push(DiagramNode {
            id: name.to_string(),
            category: kind,
            attributes: vec![],
            style: node_style(kind),
        });
    }

    let ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let present = |source: &str, target: &str| ids.contains(source) && ids.contains(target);
    let mut edges = Vec::new();

    if flags.tables {
        for rel in &schema.relationships {
            if !present(&rel.source_table, &rel.target_table) {
                continue;
            }
            // Only the first column pair is shown.
            let label = match (rel.source_columns.first(), rel.target_columns.first()) {
                (Some(s), Some(t)) => Some(format!("{} → {}", s, t)),
                _ => None,
            };
            edges.push(DiagramEdge {
                source: rel.source_table.clone(),
                target: rel.target_table.clone(),
                category: DependencyKind::ForeignKey,
                label,
                style: edge_style(DependencyKind::ForeignKey),
            });
        }
    }

    for &(kind, name, definition) in &objects {
        let Some(category) = DependencyKind::for_referrer(kind) else {
            continue;
        };
        for table in referenced_tables(schema, definition) {
            if present(name, table) {
                edges.push(DiagramEdge {
                    source: name.to_string(),
                    target: table.to_string(),
                    category,
                    label: None,
                    style: edge_style(category),
                });
            }
        }
    }

    Diagram { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnInfo, ForeignKey};
    use std::collections::BTreeMap;

    fn schema() -> Schema {
        let mut tables = BTreeMap::new();
        tables.insert(
            "customers".to_string(),
            TableInfo {
                columns: vec![ColumnInfo::new("id", "int").not_null()],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![],
            },
        );
        tables.insert(
            "orders".to_string(),
            TableInfo {
                columns: vec![
                    ColumnInfo::new("id", "int").not_null(),
                    ColumnInfo::new("customer_id", "int"),
                    ColumnInfo::new("region", "char(2)"),
                ],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![ForeignKey {
                    constrained_columns: vec!["customer_id".to_string(), "region".to_string()],
                    referred_table: "customers".to_string(),
                    referred_columns: vec!["id".to_string(), "region".to_string()],
                    name: None,
                }],
            },
        );
        let mut schema = Schema::from_tables(tables);
        schema
            .views
            .insert("v_orders".to_string(), "SELECT id FROM orders WHERE 1=1".to_string());
        schema
            .stored_procedures
            .insert("p_cleanup".to_string(), "DELETE FROM [orders]".to_string());
        schema
            .functions
            .insert("f_count".to_string(), "SELECT COUNT(*) FROM customers ".to_string());
        schema
    }

    #[test]
    fn test_default_flags() {
        let diagram = render_diagram(&schema(), DiagramFlags::default());
        let ids: Vec<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();

        assert_eq!(ids, vec!["customers", "orders", "v_orders"]);
        assert_eq!(
            diagram.edge_categories(),
            vec![DependencyKind::ForeignKey, DependencyKind::ViewDependency]
        );
    }

    #[test]
    fn test_relationship_label_uses_first_pair() {
        let diagram = render_diagram(&schema(), DiagramFlags::default());
        let fk = &diagram.edges[0];

        assert_eq!(fk.source, "orders");
        assert_eq!(fk.target, "customers");
        assert_eq!(fk.label.as_deref(), Some("customer_id → id"));
        assert_eq!(fk.style.color, "#e74c3c");
        assert_eq!(fk.style.line, LineStyle::Solid);
    }

    #[test]
    fn test_table_rows_carry_markers() {
        let diagram = render_diagram(&schema(), DiagramFlags::default());
        let orders = diagram.node("orders").map(|n| n.attributes.clone()).unwrap_or_default();

        assert_eq!(orders[0].markers, vec!["PK", "NOT NULL"]);
        assert_eq!(orders[1].markers, vec!["FK → customers"]);
        assert_eq!(orders[2].data_type, "char(2)");
    }

    #[test]
    fn test_excluded_endpoints_drop_edges() {
        let flags = DiagramFlags {
            tables: false,
            views: true,
            procedures: true,
            functions: true,
        };
        let diagram = render_diagram(&schema(), flags);

        assert_eq!(diagram.nodes.len(), 3);
        assert!(diagram.edges.is_empty());
    }

    #[test]
    fn test_routine_edges_when_enabled() {
        let flags = DiagramFlags {
            procedures: true,
            functions: true,
            ..DiagramFlags::default()
        };
        let diagram = render_diagram(&schema(), flags);

        let routine_edges: Vec<(&str, &str, &str)> = diagram
            .edges
            .iter()
            .filter(|e| e.category != DependencyKind::ForeignKey)
            .map(|e| (e.source.as_str(), e.target.as_str(), e.style.arrowhead))
            .collect();
        assert_eq!(
            routine_edges,
            vec![
                ("v_orders", "orders", "vee"),
                ("p_cleanup", "orders", "diamond"),
                ("f_count", "customers", "odiamond"),
            ]
        );
        assert_eq!(diagram.node("p_cleanup").map(|n| n.style.header), Some("#9b59b6"));
    }

    #[test]
    fn test_view_named_like_a_table_is_not_drawn() {
        let mut schema = schema();
        schema
            .views
            .insert("customers".to_string(), "SELECT * FROM [orders]".to_string());
        let diagram = render_diagram(&schema, DiagramFlags::default());

        assert_eq!(diagram.nodes.iter().filter(|n| n.id == "customers").count(), 1);
        assert_eq!(diagram.node("customers").map(|n| n.category), Some(ObjectKind::Table));
        assert!(!diagram.edges.iter().any(|e| e.source == "customers"));
    }
}
