//! Level-based placement of diagram nodes.
//!
//! Referenced objects sit on upper levels and their dependants below them, so
//! most edges point upwards. Nodes caught in a dependency cycle cannot be
//! ordered and are pushed to one final level.

use crate::diagram::Diagram;
use crate::measure::{TextMetrics, body_lines};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutNode {
    fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone)]
pub struct LayoutEdge {
    pub from: String,
    pub to: String,
    /// Polyline points from source to target.
    pub waypoints: Vec<(f64, f64)>,
    pub is_self_ref: bool,
    /// Index into `Diagram::edges`.
    pub edge_index: usize,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub width: f64,
    pub height: f64,
}

pub struct LayoutEngine {
    pub(crate) metrics: TextMetrics,
    node_gap_x: f64,
    level_gap: f64,
    margin: f64,
    self_loop: f64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            node_gap_x: 60.0,
            level_gap: 80.0,
            margin: 20.0,
            self_loop: 24.0,
        }
    }
}

/// Group node ids into levels; within a level ids are sorted.
pub fn arrange_levels(diagram: &Diagram) -> Vec<Vec<String>> {
    if diagram.nodes.is_empty() {
        return vec![];
    }

    // Each node's parents are the nodes its edges point at.
    let mut parents: BTreeMap<&str, BTreeSet<&str>> = diagram
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), BTreeSet::new()))
        .collect();
    for edge in diagram.edges.iter().filter(|e| e.source != e.target) {
        if parents.contains_key(edge.target.as_str()) {
            if let Some(deps) = parents.get_mut(edge.source.as_str()) {
                deps.insert(edge.target.as_str());
            }
        }
    }

    let mut levels: BTreeMap<&str, usize> = BTreeMap::new();
    let mut changed = true;
    while changed {
        changed = false;
        for (&node, deps) in &parents {
            if levels.contains_key(node) {
                continue;
            }
            let parent_levels: Vec<usize> = deps.iter().filter_map(|p| levels.get(p).copied()).collect();
            if parent_levels.len() == deps.len() {
                let level = parent_levels.iter().max().map_or(0, |max| max + 1);
                levels.insert(node, level);
                changed = true;
            }
        }
    }

    // Cycles: everything left over goes below the deepest level.
    let next = levels.values().max().map_or(0, |max| max + 1);
    for &node in parents.keys() {
        levels.entry(node).or_insert(next);
    }

    let depth = levels.values().max().copied().unwrap_or(0);
    let mut rows: Vec<Vec<String>> = vec![vec![]; depth + 1];
    for (node, level) in levels {
        rows[level].push(node.to_string());
    }
    rows.into_iter().filter(|r| !r.is_empty()).collect()
}

impl LayoutEngine {
    pub fn layout(&self, diagram: &Diagram) -> Layout {
        let sizes: HashMap<&str, (f64, f64)> = diagram
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), self.metrics.node_size(&n.id, &body_lines(n))))
            .collect();

        let mut nodes = Vec::new();
        let mut y = self.margin;
        let mut width: f64 = 0.0;

        for row in arrange_levels(diagram) {
            let mut x = self.margin;
            let mut row_height: f64 = 0.0;
            for id in row {
                let (w, h) = sizes.get(id.as_str()).copied().unwrap_or_default();
                nodes.push(LayoutNode {
                    id,
                    x,
                    y,
                    width: w,
                    height: h,
                });
                x += w + self.node_gap_x;
                row_height = row_height.max(h);
            }
            width = width.max(x - self.node_gap_x + self.margin + self.self_loop);
            y += row_height + self.level_gap;
        }

        let height = if nodes.is_empty() {
            self.margin * 2.0
        } else {
            y - self.level_gap + self.margin
        };

        let positions: HashMap<&str, &LayoutNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let edges = diagram
            .edges
            .iter()
            .enumerate()
            .filter_map(|(edge_index, edge)| {
                let from = positions.get(edge.source.as_str())?;
                let to = positions.get(edge.target.as_str())?;
                Some(LayoutEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    waypoints: self.route(from, to),
                    is_self_ref: edge.source == edge.target,
                    edge_index,
                })
            })
            .collect();

        Layout {
            nodes,
            edges,
            width: width.max(self.margin * 2.0),
            height,
        }
    }

    fn route(&self, from: &LayoutNode, to: &LayoutNode) -> Vec<(f64, f64)> {
        if from.id == to.id {
            let right = from.x + from.width;
            let top = from.y + from.height * 0.3;
            let bottom = from.y + from.height * 0.7;
            return vec![
                (right, top),
                (right + self.self_loop, top),
                (right + self.self_loop, bottom),
                (right, bottom),
            ];
        }

        if to.bottom() <= from.y {
            vec![(from.center_x(), from.y), (to.center_x(), to.bottom())]
        } else if from.bottom() <= to.y {
            vec![(from.center_x(), from.bottom()), (to.center_x(), to.y)]
        } else if to.x >= from.x {
            let y = from.y + from.height / 2.0;
            vec![(from.x + from.width, y), (to.x, to.y + to.height / 2.0)]
        } else {
            let y = from.y + from.height / 2.0;
            vec![(from.x, y), (to.x + to.width, to.y + to.height / 2.0)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{DiagramFlags, render_diagram};
    use crate::schema::{ColumnInfo, ForeignKey, Schema, TableInfo};

    fn fk(target: &str) -> ForeignKey {
        ForeignKey {
            constrained_columns: vec![format!("{}_id", target)],
            referred_table: target.to_string(),
            referred_columns: vec!["id".to_string()],
            name: None,
        }
    }

    fn schema(tables: &[(&str, &[&str])]) -> Schema {
        let map = tables
            .iter()
            .map(|(name, targets)| {
                let info = TableInfo {
                    columns: vec![ColumnInfo::new("id", "int").not_null()],
                    primary_keys: vec!["id".to_string()],
                    foreign_keys: targets.iter().map(|t| fk(t)).collect(),
                };
                (name.to_string(), info)
            })
            .collect();
        Schema::from_tables(map)
    }

    #[test]
    fn test_referenced_tables_on_upper_levels() {
        let schema = schema(&[
            ("customers", &[]),
            ("orders", &["customers"]),
            ("order_lines", &["orders", "products"]),
            ("products", &[]),
        ]);
        let diagram = render_diagram(&schema, DiagramFlags::default());

        assert_eq!(
            arrange_levels(&diagram),
            vec![
                vec!["customers".to_string(), "products".to_string()],
                vec!["orders".to_string()],
                vec!["order_lines".to_string()],
            ]
        );
    }

    #[test]
    fn test_cycle_goes_to_last_level() {
        let schema = schema(&[("a", &["b"]), ("b", &["a"]), ("root", &[]), ("leaf", &["root"])]);
        let diagram = render_diagram(&schema, DiagramFlags::default());

        assert_eq!(
            arrange_levels(&diagram),
            vec![
                vec!["root".to_string()],
                vec!["leaf".to_string()],
                vec!["a".to_string(), "b".to_string()],
            ]
        );
    }

    #[test]
    fn test_self_reference_does_not_block_level() {
        let schema = schema(&[("employees", &["employees"])]);
        let diagram = render_diagram(&schema, DiagramFlags::default());
        let layout = LayoutEngine::default().layout(&diagram);

        assert_eq!(arrange_levels(&diagram), vec![vec!["employees".to_string()]]);
        assert_eq!(layout.edges.len(), 1);
        assert!(layout.edges[0].is_self_ref);
        assert_eq!(layout.edges[0].waypoints.len(), 4);
    }

    #[test]
    fn test_edges_point_upwards() {
        let schema = schema(&[("customers", &[]), ("orders", &["customers"])]);
        let diagram = render_diagram(&schema, DiagramFlags::default());
        let layout = LayoutEngine::default().layout(&diagram);

        let edge = &layout.edges[0];
        let (_, start_y) = edge.waypoints[0];
        let (_, end_y) = edge.waypoints[1];
        assert!(end_y < start_y);
        assert!(layout.width > 0.0 && layout.height > 0.0);
    }

    #[test]
    fn test_empty_diagram() {
        let layout = LayoutEngine::default().layout(&Diagram::default());
        assert!(layout.nodes.is_empty());
        assert_eq!(layout.height, 40.0);
    }
}
