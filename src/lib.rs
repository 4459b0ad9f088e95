pub mod analyzer;
pub mod codegen;
pub mod config;
pub mod diagram;
pub mod dot;
pub mod graph;
pub mod layout;
pub mod measure;
pub mod metrics;
pub mod naming;
pub mod provider;
pub mod report;
pub mod schema;
pub mod svg;
pub mod types;

use wasm_bindgen::prelude::*;

pub use analyzer::{Finding, FindingKind, Severity, analyze};
pub use codegen::{FileBundle, GeneratedFile, GeneratorConfig, generate};
pub use config::Config;
pub use diagram::{Diagram, DiagramFlags, render_diagram};
pub use graph::DependencyGraph;
pub use metrics::{SchemaMetrics, compute_metrics};
pub use provider::{SchemaExtractionError, SchemaProvider};
pub use schema::{ColumnInfo, ForeignKey, Relationship, Schema, TableInfo};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_schema(schema_json: &str) -> Result<Schema, String> {
    provider::schema_from_json(schema_json).map_err(|e| e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

/// Analyze a schema document; returns the findings as JSON.
#[wasm_bindgen(js_name = "analyzeSchema")]
pub fn analyze_schema(schema_json: &str) -> Result<String, String> {
    let schema = parse_schema(schema_json)?;
    to_json(&analyze(&schema))
}

#[wasm_bindgen(js_name = "schemaMetrics")]
pub fn schema_metrics(schema_json: &str) -> Result<String, String> {
    let schema = parse_schema(schema_json)?;
    to_json(&compute_metrics(&schema))
}

/// Generate the data-access layer; returns a JSON object of path to file.
#[wasm_bindgen(js_name = "generateCode")]
pub fn generate_code(
    schema_json: &str,
    namespace: Option<String>,
    context_name: Option<String>,
) -> Result<String, String> {
    let mut config = Config::default();
    config.apply(&config::Overrides {
        namespace,
        context_name,
        ..config::Overrides::default()
    });
    config.validate().map_err(|e| e.to_string())?;

    let schema = parse_schema(schema_json)?;
    to_json(&generate(&schema, &config.codegen))
}

/// Render a dependency diagram as `svg` (default), `dot` or `json`.
#[wasm_bindgen(js_name = "renderDiagram")]
pub fn render_diagram_document(
    schema_json: &str,
    format: Option<String>,
    include_procedures: Option<bool>,
    include_functions: Option<bool>,
) -> Result<String, String> {
    let schema = parse_schema(schema_json)?;
    let defaults = DiagramFlags::default();
    let flags = DiagramFlags {
        procedures: include_procedures.unwrap_or(defaults.procedures),
        functions: include_functions.unwrap_or(defaults.functions),
        ..defaults
    };
    let diagram = render_diagram(&schema, flags);

    match format.as_deref().unwrap_or("svg") {
        "svg" => Ok(svg::render_svg(&diagram)),
        "dot" => Ok(dot::to_dot(&diagram)),
        "json" => to_json(&diagram),
        other => Err(format!("unknown diagram format `{}`", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "tables": {
            "customers": { "columns": [ { "name": "id", "type": "int", "nullable": false } ], "primary_keys": ["id"] },
            "orders": {
                "columns": [
                    { "name": "id", "type": "int", "nullable": false },
                    { "name": "customer_id", "type": "int" }
                ],
                "primary_keys": ["id"],
                "foreign_keys": [ { "constrained_columns": ["customer_id"], "referred_table": "customers", "referred_columns": ["id"] } ]
            }
        }
    }"#;

    #[test]
    fn test_analyze_schema_returns_findings_json() {
        let json = analyze_schema(SCHEMA).unwrap();
        let findings: Vec<Finding> = serde_json::from_str(&json).unwrap();
        assert!(findings.iter().any(|f| f.kind == FindingKind::Index));
    }

    #[test]
    fn test_generate_code_uses_names() {
        let json = generate_code(SCHEMA, Some("Shop".to_string()), None).unwrap();
        let bundle: FileBundle = serde_json::from_str(&json).unwrap();

        assert!(bundle.contains_key("Models/Orders.cs"));
        assert!(bundle["Data/AppDbContext.cs"].content.contains("namespace Shop.Data"));
    }

    #[test]
    fn test_generate_code_rejects_invalid_names() {
        let err = generate_code(SCHEMA, Some("a b".to_string()), None).unwrap_err();
        assert!(err.starts_with("invalid value for codegen.namespace"));

        let err = generate_code(SCHEMA, None, Some("2Context".to_string())).unwrap_err();
        assert!(err.starts_with("invalid value for codegen.context_name"));
    }

    #[test]
    fn test_render_diagram_formats() {
        assert!(render_diagram_document(SCHEMA, None, None, None).unwrap().starts_with("<svg"));
        assert!(render_diagram_document(SCHEMA, Some("dot".to_string()), None, None)
            .unwrap()
            .starts_with("digraph schema {"));
        assert!(render_diagram_document(SCHEMA, Some("png".to_string()), None, None).is_err());
    }

    #[test]
    fn test_invalid_document_is_an_error_string() {
        let err = schema_metrics("[]").unwrap_err();
        assert!(err.starts_with("invalid schema document"));
    }
}
