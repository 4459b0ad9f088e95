//! Heuristic schema analysis.
//!
//! Six independent passes produce findings; the result is stable-sorted by
//! severity so that passes keep their relative order within a severity.

mod relationships;
mod routines;
mod structure;

use crate::graph::DependencyGraph;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    PrimaryKey,
    ColumnDefault,
    CompositeKey,
    NamingConvention,
    Index,
    IsolatedTable,
    JunctionTable,
    DependencyCycle,
    Security,
    Performance,
    Reliability,
    Design,
    AnalysisError,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryKey => "primary_key",
            Self::ColumnDefault => "column_default",
            Self::CompositeKey => "composite_key",
            Self::NamingConvention => "naming_convention",
            Self::Index => "index",
            Self::IsolatedTable => "isolated_table",
            Self::JunctionTable => "junction_table",
            Self::DependencyCycle => "dependency_cycle",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Reliability => "reliability",
            Self::Design => "design",
            Self::AnalysisError => "analysis_error",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Affected object, e.g. `table.column` or `a → b`.
    pub subject: String,
    pub message: String,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Inputs shared by every pass.
pub(crate) struct AnalysisContext<'a> {
    pub schema: &'a Schema,
    pub graph: &'a DependencyGraph,
}

type Pass = fn(&AnalysisContext<'_>) -> Vec<Finding>;

const PASSES: [(&str, Pass); 6] = [
    ("structure", structure::check_tables),
    ("relationships", relationships::check_relationships),
    ("cycles", relationships::check_cycles),
    ("procedures", routines::check_procedures),
    ("functions", routines::check_functions),
    ("views", routines::check_views),
];

/// Run every analysis pass and rank the findings, high severity first.
pub fn analyze(schema: &Schema) -> Vec<Finding> {
    run_passes(schema, &PASSES)
}

fn run_passes(schema: &Schema, passes: &[(&str, Pass)]) -> Vec<Finding> {
    let graph = DependencyGraph::build(schema);
    let ctx = AnalysisContext {
        schema,
        graph: &graph,
    };

    let mut findings = Vec::new();
    for &(name, pass) in passes {
        let produced = isolate(name, || pass(&ctx));
        debug!(pass = name, findings = produced.len(), "analysis pass finished");
        findings.extend(produced);
    }

    // Stable: equal severities keep pass order.
    findings.sort_by_key(|f| f.severity);
    findings
}

/// Run `check` for `subject`; a panic becomes an `analysis_error` finding.
pub(crate) fn isolate<F>(subject: &str, check: F) -> Vec<Finding>
where
    F: FnOnce() -> Vec<Finding>,
{
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(findings) => findings,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown failure".to_string());
            warn!(subject, %reason, "analysis check failed, continuing");
            vec![Finding::new(
                FindingKind::AnalysisError,
                Severity::Medium,
                subject,
                format!("Analysis of '{}' failed and was skipped: {}", subject, reason),
            )]
        }
    }
}
