//! Per-table structural checks.

use super::{AnalysisContext, Finding, FindingKind, Severity, isolate};
use crate::schema::TableInfo;

pub(super) fn check_tables(ctx: &AnalysisContext<'_>) -> Vec<Finding> {
    ctx.schema
        .tables
        .iter()
        .flat_map(|(name, table)| isolate(name, || check_table(name, table)))
        .collect()
}

fn check_table(name: &str, table: &TableInfo) -> Vec<Finding> {
    let mut findings = Vec::new();

    if table.primary_keys.is_empty() {
        findings.push(Finding::new(
            FindingKind::PrimaryKey,
            Severity::High,
            name,
            format!(
                "Table '{}' does not have a primary key. Consider adding one for better data integrity and performance.",
                name
            ),
        ));
    }

    for column in table.columns.iter().filter(|c| !c.nullable && c.default.is_none()) {
        findings.push(Finding::new(
            FindingKind::ColumnDefault,
            Severity::Medium,
            format!("{}.{}", name, column.name),
            format!(
                "Non-nullable column '{}' in table '{}' has no default value. Consider adding a default value for easier data insertion.",
                column.name, name
            ),
        ));
    }

    if table.primary_keys.len() > 2 {
        findings.push(Finding::new(
            FindingKind::CompositeKey,
            Severity::Low,
            name,
            format!(
                "Table '{}' has a complex composite key with {} columns. Consider a surrogate key if appropriate.",
                name,
                table.primary_keys.len()
            ),
        ));
    }

    if table.column("id").is_some() && !table.is_primary_key("id") {
        findings.push(Finding::new(
            FindingKind::NamingConvention,
            Severity::Low,
            format!("{}.id", name),
            format!(
                "Column 'id' in table '{}' is not a primary key. Consider renaming it to avoid confusion.",
                name
            ),
        ));
    }

    for fk in &table.foreign_keys {
        for column in fk.constrained_columns.iter().filter(|c| !table.is_primary_key(c)) {
            findings.push(Finding::new(
                FindingKind::Index,
                Severity::Medium,
                format!("{}.{}", name, column),
                format!(
                    "Consider adding an index on foreign key column '{}' in table '{}' for better query performance.",
                    column, name
                ),
            ));
        }
    }

    findings
}
