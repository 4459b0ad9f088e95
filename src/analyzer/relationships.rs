//! Relationship-level checks: isolated tables, repeated links and cycles.

use super::{AnalysisContext, Finding, FindingKind, Severity};
use crate::graph::render_cycle;
use std::collections::HashMap;

pub(super) fn check_relationships(ctx: &AnalysisContext<'_>) -> Vec<Finding> {
    let schema = ctx.schema;
    let mut findings = Vec::new();

    for name in schema.tables.keys().filter(|t| !schema.has_relationship(t)) {
        findings.push(Finding::new(
            FindingKind::IsolatedTable,
            Severity::Medium,
            name.as_str(),
            format!(
                "Table '{}' has no relationships with other tables. This might indicate a design issue or an orphaned table.",
                name
            ),
        ));
    }

    // Keyed by ordered (source, target); every repeat after the first is reported.
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    for rel in &schema.relationships {
        let key = (rel.source_table.as_str(), rel.target_table.as_str());
        let count = seen.entry(key).or_insert(0);
        *count += 1;
        if *count > 1 {
            findings.push(Finding::new(
                FindingKind::JunctionTable,
                Severity::Medium,
                format!("{} → {}", key.0, key.1),
                format!(
                    "Tables '{}' and '{}' have multiple relationships. Consider a junction table for cleaner many-to-many modeling.",
                    key.0, key.1
                ),
            ));
        }
    }

    findings
}

pub(super) fn check_cycles(ctx: &AnalysisContext<'_>) -> Vec<Finding> {
    ctx.graph
        .foreign_key_cycles()
        .iter()
        .map(|cycle| {
            let rendered = render_cycle(cycle);
            let message = format!(
                "Detected a dependency cycle: {}. This may cause issues with referential integrity and data insertion. Consider redesigning the schema to eliminate it.",
                rendered
            );
            Finding::new(FindingKind::DependencyCycle, Severity::High, rendered, message)
        })
        .collect()
}
