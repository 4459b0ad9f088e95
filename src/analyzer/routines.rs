//! Definition-text checks for procedures, functions and views.
//!
//! All matching is case-sensitive against the raw definition, so `select *`
//! or `begin transaction` written in lower case go unnoticed. Objects with an
//! empty definition are skipped.

use super::{AnalysisContext, Finding, FindingKind, Severity, isolate};
use std::collections::BTreeMap;

const DYNAMIC_SQL: [&str; 3] = ["EXEC(", "EXECUTE(", "sp_executesql"];
const CURSORS: [&str; 2] = ["DECLARE CURSOR", "CURSOR FOR"];
const MUTATIONS: [&str; 3] = ["INSERT", "UPDATE", "DELETE"];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Run `check` over every non-empty definition, isolating each object.
fn each_definition(
    definitions: &BTreeMap<String, String>,
    check: fn(&str, &str) -> Vec<Finding>,
) -> Vec<Finding> {
    definitions
        .iter()
        .filter(|(_, definition)| !definition.is_empty())
        .flat_map(|(name, definition)| isolate(name, || check(name, definition)))
        .collect()
}

pub(super) fn check_procedures(ctx: &AnalysisContext<'_>) -> Vec<Finding> {
    each_definition(&ctx.schema.stored_procedures, check_procedure)
}

pub(super) fn check_functions(ctx: &AnalysisContext<'_>) -> Vec<Finding> {
    each_definition(&ctx.schema.functions, check_function)
}

pub(super) fn check_views(ctx: &AnalysisContext<'_>) -> Vec<Finding> {
    each_definition(&ctx.schema.views, check_view)
}

fn select_star(object: &str, name: &str) -> Finding {
    Finding::new(
        FindingKind::Performance,
        Severity::Medium,
        name,
        format!(
            "{} '{}' uses 'SELECT *', which may retrieve unnecessary columns. Consider listing only the needed columns.",
            object, name
        ),
    )
}

fn cursor(object: &str, name: &str) -> Finding {
    Finding::new(
        FindingKind::Performance,
        Severity::Medium,
        name,
        format!(
            "{} '{}' uses cursors, which can be inefficient. Consider set-based operations instead.",
            object, name
        ),
    )
}

fn check_procedure(name: &str, definition: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    if contains_any(definition, &DYNAMIC_SQL) {
        findings.push(Finding::new(
            FindingKind::Security,
            Severity::High,
            name,
            format!(
                "Stored procedure '{}' uses dynamic SQL execution, which could be vulnerable to SQL injection. Consider parameterized queries.",
                name
            ),
        ));
    }

    if definition.contains("SELECT *") {
        findings.push(select_star("Stored procedure", name));
    }

    if contains_any(definition, &CURSORS) {
        findings.push(cursor("Stored procedure", name));
    }

    if definition.contains("BEGIN TRANSACTION")
        && !(definition.contains("COMMIT") && definition.contains("ROLLBACK"))
    {
        findings.push(Finding::new(
            FindingKind::Reliability,
            Severity::High,
            name,
            format!(
                "Stored procedure '{}' begins a transaction but may not commit or roll back on every path. This could leave open transactions or cause deadlocks.",
                name
            ),
        ));
    }

    findings
}

fn check_function(name: &str, definition: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    if definition.contains("SELECT *") {
        findings.push(select_star("Function", name));
    }

    if contains_any(definition, &CURSORS) {
        findings.push(cursor("Function", name));
    }

    if contains_any(definition, &MUTATIONS) {
        findings.push(Finding::new(
            FindingKind::Design,
            Severity::High,
            name,
            format!(
                "Function '{}' appears to modify data, which is generally an anti-pattern. Consider a stored procedure instead.",
                name
            ),
        ));
    }

    findings
}

fn check_view(name: &str, definition: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    if definition.contains("SELECT *") {
        findings.push(select_star("View", name));
    }

    let projection = definition
        .split_once("FROM")
        .map_or(definition, |(before, _)| before);
    if projection.contains("SELECT") && projection.contains('(') {
        findings.push(Finding::new(
            FindingKind::Performance,
            Severity::Low,
            name,
            format!(
                "View '{}' may contain subqueries in the SELECT clause, which can hurt performance. Consider restructuring if possible.",
                name
            ),
        ));
    }

    findings
}
