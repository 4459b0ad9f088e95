//! Size and connectivity metrics of a schema.

use crate::schema::Schema;
use petgraph::algo::connected_components;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMetrics {
    pub table_count: usize,
    pub view_count: usize,
    pub stored_procedure_count: usize,
    pub function_count: usize,
    pub relationship_count: usize,
    pub total_columns: usize,
    pub primary_key_count: usize,
    pub foreign_key_count: usize,
    pub nullable_column_count: usize,
    pub avg_in_degree: f64,
    pub avg_out_degree: f64,
    pub density: f64,
    pub connected_components: usize,
}

/// Compute counts plus degree, density and component metrics.
///
/// Graph metrics use the relationship graph only: every table and every
/// relationship endpoint is a node, and repeated table pairs count once.
pub fn compute_metrics(schema: &Schema) -> SchemaMetrics {
    let mut metrics = SchemaMetrics {
        table_count: schema.tables.len(),
        view_count: schema.views.len(),
        stored_procedure_count: schema.stored_procedures.len(),
        function_count: schema.functions.len(),
        relationship_count: schema.relationships.len(),
        ..SchemaMetrics::default()
    };

    for table in schema.tables.values() {
        metrics.total_columns += table.columns.len();
        metrics.primary_key_count += table.primary_keys.len();
        metrics.foreign_key_count += table
            .foreign_keys
            .iter()
            .map(|fk| fk.constrained_columns.len())
            .sum::<usize>();
        metrics.nullable_column_count += table.columns.iter().filter(|c| c.nullable).count();
    }

    let graph = relationship_graph(schema);
    let nodes = graph.node_count();
    let edges = graph.edge_count();

    if nodes > 0 {
        // Each edge adds one to the in-degree sum and one to the out-degree sum.
        metrics.avg_in_degree = edges as f64 / nodes as f64;
        metrics.avg_out_degree = edges as f64 / nodes as f64;
        metrics.connected_components = connected_components(&graph);
    }
    if nodes > 1 {
        metrics.density = edges as f64 / (nodes * (nodes - 1)) as f64;
    }

    metrics
}

fn relationship_graph(schema: &Schema) -> DiGraphMap<&str, ()> {
    let mut graph = DiGraphMap::new();
    for name in schema.tables.keys() {
        graph.add_node(name.as_str());
    }
    for rel in &schema.relationships {
        graph.add_edge(rel.source_table.as_str(), rel.target_table.as_str(), ());
    }
    graph
}
