//! Dependency graph over schema objects.
//!
//! Foreign keys give table → table edges. Views, procedures and functions get
//! an edge to every table their definition mentions as ` name ` or `[name]`.
//! That detection is a substring heuristic: a table named in a comment is
//! picked up, and a reference without padding or brackets is missed.

use crate::schema::Schema;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    ForeignKey,
    ViewDependency,
    ProcDependency,
    FuncDependency,
}

impl DependencyKind {
    /// Edge category for an object that references a table.
    pub fn for_referrer(kind: ObjectKind) -> Option<Self> {
        match kind {
            ObjectKind::Table => None,
            ObjectKind::View => Some(Self::ViewDependency),
            ObjectKind::Procedure => Some(Self::ProcDependency),
            ObjectKind::Function => Some(Self::FuncDependency),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForeignKey => "foreign_key",
            Self::ViewDependency => "view_dependency",
            Self::ProcDependency => "proc_dependency",
            Self::FuncDependency => "func_dependency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub name: String,
    pub kind: ObjectKind,
}

/// Whether `definition` mentions `table` as ` table ` or `[table]`.
pub fn references_table(definition: &str, table: &str) -> bool {
    definition.contains(&format!(" {} ", table)) || definition.contains(&format!("[{}]", table))
}

/// Tables of `schema` referenced by `definition`, in table-name order.
/// An empty definition references nothing.
pub fn referenced_tables<'a>(
    schema: &'a Schema,
    definition: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    schema
        .tables
        .keys()
        .filter(move |table| !definition.is_empty() && references_table(definition, table))
        .map(String::as_str)
}

/// Routine-like objects of a schema with their definitions.
pub fn definitions(schema: &Schema) -> impl Iterator<Item = (ObjectKind, &str, &str)> {
    let views = schema
        .views
        .iter()
        .map(|(n, d)| (ObjectKind::View, n.as_str(), d.as_str()));
    let procedures = schema
        .stored_procedures
        .iter()
        .map(|(n, d)| (ObjectKind::Procedure, n.as_str(), d.as_str()));
    let functions = schema
        .functions
        .iter()
        .map(|(n, d)| (ObjectKind::Function, n.as_str(), d.as_str()));
    views.chain(procedures).chain(functions)
}

/// [`definitions`] without objects whose name a table or an earlier object
/// already took. Those are left out with a warning.
pub fn distinct_definitions(schema: &Schema) -> Vec<(ObjectKind, &str, &str)> {
    let mut taken: HashSet<&str> = schema.tables.keys().map(String::as_str).collect();
    definitions(schema)
        .filter(|&(kind, name, _)| {
            let fresh = taken.insert(name);
            if !fresh {
                warn!(object = %name, ?kind, "name already used by another schema object, left out");
            }
            fresh
        })
        .collect()
}

pub struct DependencyGraph {
    graph: DiGraph<SchemaObject, DependencyKind>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn build(schema: &Schema) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };

        let objects = distinct_definitions(schema);
        for name in schema.tables.keys() {
            graph.add_node(name, ObjectKind::Table);
        }
        for &(kind, name, _) in &objects {
            graph.add_node(name, kind);
        }

        for rel in &schema.relationships {
            let source = graph.add_node(&rel.source_table, ObjectKind::Table);
            let target = graph.add_node(&rel.target_table, ObjectKind::Table);
            graph.graph.add_edge(source, target, DependencyKind::ForeignKey);
        }

        for &(kind, name, definition) in &objects {
            let Some(category) = DependencyKind::for_referrer(kind) else {
                continue;
            };
            let source = graph.index[name];
            for table in referenced_tables(schema, definition) {
                let target = graph.index[table];
                graph.graph.add_edge(source, target, category);
            }
        }

        debug!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "dependency graph built"
        );
        graph
    }

    /// Existing node for `name`, or a new one of `kind`.
    fn add_node(&mut self, name: &str, kind: ObjectKind) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(SchemaObject {
            name: name.to_string(),
            kind,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn object(&self, name: &str) -> Option<&SchemaObject> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    /// All edges as `(source, target, kind)`, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, DependencyKind)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].name.as_str(),
                self.graph[e.target()].name.as_str(),
                *e.weight(),
            )
        })
    }

    /// Objects that `name` points at.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return vec![];
        };
        let targets: BTreeSet<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].name.as_str())
            .collect();
        targets.into_iter().collect()
    }

    /// Every simple cycle of the foreign-key subgraph.
    pub fn foreign_key_cycles(&self) -> Vec<Vec<String>> {
        self.simple_cycles(|kind| kind == DependencyKind::ForeignKey)
    }

    /// Every simple cycle of the full graph.
    pub fn all_cycles(&self) -> Vec<Vec<String>> {
        self.simple_cycles(|_| true)
    }

    /// Every elementary circuit over the edges accepted by `keep`.
    ///
    /// Parallel edges are collapsed and a self-loop is a one-node cycle. Each
    /// cycle starts at its earliest node in insertion order.
    pub fn simple_cycles(&self, keep: impl Fn(DependencyKind) -> bool) -> Vec<Vec<String>> {
        let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.graph.node_count()];
        for edge in self.graph.edge_references() {
            if keep(*edge.weight()) {
                adjacency[edge.source().index()].insert(edge.target().index());
            }
        }

        let cycles: Vec<Vec<String>> = johnson_cycles(&adjacency)
            .into_iter()
            .map(|cycle| {
                cycle
                    .into_iter()
                    .map(|i| self.graph[NodeIndex::new(i)].name.clone())
                    .collect()
            })
            .collect();

        debug!(cycles = cycles.len(), "cycle enumeration finished");
        cycles
    }
}

/// Render a cycle as `A → B → C`.
pub fn render_cycle(cycle: &[String]) -> String {
    cycle.join(" → ")
}

/// Johnson's elementary circuit enumeration over an adjacency list.
fn johnson_cycles(adjacency: &[BTreeSet<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut cycles = Vec::new();
    let mut start = 0;

    while start < n {
        // Strongly connected components of the subgraph induced by [start, n).
        let sub: DiGraph<(), ()> = DiGraph::from_edges(
            adjacency
                .iter()
                .enumerate()
                .skip(start)
                .flat_map(|(v, ws)| {
                    ws.iter()
                        .filter(|&&w| w >= start)
                        .map(move |&w| (v as u32, w as u32))
                }),
        );

        let component = tarjan_scc(&sub)
            .into_iter()
            .map(|scc| scc.into_iter().map(|i| i.index()).collect::<BTreeSet<usize>>())
            .filter(|scc| {
                scc.iter().all(|&v| v >= start)
                    && (scc.len() > 1 || scc.iter().any(|&v| adjacency[v].contains(&v)))
            })
            .min_by_key(|scc| scc.first().copied().unwrap_or(usize::MAX));

        let Some(component) = component else {
            break;
        };
        let Some(&s) = component.first() else {
            break;
        };

        let mut search = CircuitSearch {
            adjacency,
            component: &component,
            blocked: vec![false; n],
            blocked_by: vec![BTreeSet::new(); n],
            stack: Vec::new(),
            cycles: &mut cycles,
        };
        search.circuit(s, s);

        start = s + 1;
    }

    cycles
}

struct CircuitSearch<'a> {
    adjacency: &'a [BTreeSet<usize>],
    component: &'a BTreeSet<usize>,
    blocked: Vec<bool>,
    blocked_by: Vec<BTreeSet<usize>>,
    stack: Vec<usize>,
    cycles: &'a mut Vec<Vec<usize>>,
}

impl CircuitSearch<'_> {
    fn successors(&self, v: usize) -> Vec<usize> {
        self.adjacency[v]
            .iter()
            .copied()
            .filter(|w| self.component.contains(w))
            .collect()
    }

    fn circuit(&mut self, v: usize, s: usize) -> bool {
        let mut found = false;
        self.stack.push(v);
        self.blocked[v] = true;

        for w in self.successors(v) {
            if w == s {
                self.cycles.push(self.stack.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w, s) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for w in self.successors(v) {
                self.blocked_by[w].insert(v);
            }
        }

        self.stack.pop();
        found
    }

    fn unblock(&mut self, u: usize) {
        self.blocked[u] = false;
        let waiting = std::mem::take(&mut self.blocked_by[u]);
        for w in waiting {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}
