//! Plain-text rendering of findings and metrics.

use crate::analyzer::{Finding, Severity};
use crate::metrics::SchemaMetrics;

const NO_FINDINGS: &str = "No recommendations found. The schema looks good!\n";

fn heading(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "High priority",
        Severity::Medium => "Medium priority",
        Severity::Low => "Low priority",
    }
}

/// Findings grouped by severity, high first; empty groups are omitted.
pub fn render_findings(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return NO_FINDINGS.to_string();
    }

    let mut output = String::new();
    for severity in [Severity::High, Severity::Medium, Severity::Low] {
        let group: Vec<&Finding> = findings.iter().filter(|f| f.severity == severity).collect();
        if group.is_empty() {
            continue;
        }

        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("{} ({})\n", heading(severity), group.len()));
        for finding in group {
            output.push_str(&format!("  [{}] {}\n", finding.kind, finding.subject));
            output.push_str(&format!("      {}\n", finding.message));
        }
    }
    output
}

pub fn render_metrics(metrics: &SchemaMetrics) -> String {
    let rows: [(&str, String); 13] = [
        ("Tables", metrics.table_count.to_string()),
        ("Views", metrics.view_count.to_string()),
        ("Stored procedures", metrics.stored_procedure_count.to_string()),
        ("Functions", metrics.function_count.to_string()),
        ("Relationships", metrics.relationship_count.to_string()),
        ("Columns", metrics.total_columns.to_string()),
        ("Primary key columns", metrics.primary_key_count.to_string()),
        ("Foreign key columns", metrics.foreign_key_count.to_string()),
        ("Nullable columns", metrics.nullable_column_count.to_string()),
        ("Average in-degree", format!("{:.2}", metrics.avg_in_degree)),
        ("Average out-degree", format!("{:.2}", metrics.avg_out_degree)),
        ("Density", format!("{:.4}", metrics.density)),
        ("Connected components", metrics.connected_components.to_string()),
    ];

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut output = String::new();
    for (label, value) in rows {
        output.push_str(&format!("{:<width$}  {}\n", label, value, width = width));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FindingKind;

    #[test]
    fn test_no_findings() {
        assert_eq!(render_findings(&[]), NO_FINDINGS);
    }

    #[test]
    fn test_findings_grouped_by_severity() {
        let findings = vec![
            Finding::new(FindingKind::PrimaryKey, Severity::High, "logs", "no key"),
            Finding::new(FindingKind::Index, Severity::Medium, "orders.customer_id", "add an index"),
            Finding::new(FindingKind::IsolatedTable, Severity::Medium, "logs", "isolated"),
        ];
        let text = render_findings(&findings);

        assert_eq!(
            text,
            "High priority (1)\n  [primary_key] logs\n      no key\n\nMedium priority (2)\n  [index] orders.customer_id\n      add an index\n  [isolated_table] logs\n      isolated\n"
        );
        assert!(!text.contains("Low priority"));
    }

    #[test]
    fn test_metrics_precision() {
        let metrics = SchemaMetrics {
            table_count: 3,
            avg_in_degree: 2.0 / 3.0,
            avg_out_degree: 2.0 / 3.0,
            density: 1.0 / 3.0,
            connected_components: 1,
            ..SchemaMetrics::default()
        };
        let text = render_metrics(&metrics);

        let line = |label: &str, value: &str| format!("{:<20}  {}\n", label, value);
        assert!(text.starts_with(&line("Tables", "3")));
        assert!(text.contains(&line("Average in-degree", "0.67")));
        assert!(text.contains(&line("Density", "0.3333")));
        assert!(text.contains("Connected components  1\n"));
    }
}
