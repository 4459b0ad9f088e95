use proptest::prelude::*;
use schemalens::naming::{to_lower_camel, to_upper_camel};
use schemalens::types::sql_type_to_host_type;
use schemalens::{ColumnInfo, ForeignKey, GeneratorConfig, Schema, TableInfo, generate};
use std::collections::BTreeMap;

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}"
}

fn column_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("int".to_string()),
        Just("bigint".to_string()),
        Just("bit".to_string()),
        Just("datetime2".to_string()),
        Just("uniqueidentifier".to_string()),
        (1u32..500).prop_map(|n| format!("nvarchar({})", n)),
        Just("decimal(18,2)".to_string()),
        Just("geography".to_string()),
        Just("mystery_type".to_string()),
    ]
}

fn table_info() -> impl Strategy<Value = TableInfo> {
    prop::collection::vec((identifier(), column_type(), any::<bool>()), 1..6).prop_map(|columns| {
        let mut seen = Vec::new();
        let columns: Vec<ColumnInfo> = columns
            .into_iter()
            .filter(|(name, _, _)| {
                let fresh = !seen.contains(name);
                seen.push(name.clone());
                fresh
            })
            .map(|(name, ty, nullable)| ColumnInfo {
                nullable,
                ..ColumnInfo::new(name, ty)
            })
            .collect();
        let primary_keys = vec![columns[0].name.clone()];
        TableInfo {
            columns,
            primary_keys,
            foreign_keys: vec![],
        }
    })
}

fn schema() -> impl Strategy<Value = Schema> {
    prop::collection::btree_map(identifier(), table_info(), 0..5).prop_map(|mut tables| {
        // Chain each table to the previous one.
        let names: Vec<String> = tables.keys().cloned().collect();
        for pair in names.windows(2) {
            if let Some(table) = tables.get_mut(&pair[1]) {
                let column = table.columns[0].name.clone();
                table.foreign_keys.push(ForeignKey {
                    constrained_columns: vec![column],
                    referred_table: pair[0].clone(),
                    referred_columns: vec!["id".to_string()],
                    name: None,
                });
            }
        }
        Schema::from_tables(tables)
    })
}

proptest! {
    #[test]
    fn test_upper_camel_starts_uppercase(name in "\\PC{0,24}") {
        let upper = to_upper_camel(&name);
        if let Some(first) = upper.chars().next() {
            prop_assert!(first.is_uppercase());
        }
        let lower = to_lower_camel(&name);
        if let Some(first) = lower.chars().next() {
            prop_assert!(first.is_lowercase());
        }
    }

    #[test]
    fn test_camel_ignores_separators(words in prop::collection::vec("[a-z]{1,8}", 1..5)) {
        let snake = words.join("_");
        let kebab = words.join("-");
        prop_assert_eq!(to_upper_camel(&snake), to_upper_camel(&kebab));
    }

    #[test]
    fn test_type_mapper_is_pure(sql_type in "[A-Za-z ]{0,16}(\\([0-9, ]{0,6}\\))?") {
        prop_assert_eq!(sql_type_to_host_type(&sql_type), sql_type_to_host_type(&sql_type));
    }

    #[test]
    fn test_generate_is_deterministic(schema in schema(), namespace in "[A-Z][a-z]{1,8}") {
        let config = GeneratorConfig { namespace, ..GeneratorConfig::default() };
        let first = generate(&schema, &config);
        let second = generate(&schema, &config);
        prop_assert_eq!(&first, &second);

        let tables: BTreeMap<_, _> = schema.tables.keys().map(|t| (to_upper_camel(t), ())).collect();
        let models = first.keys().filter(|p| p.starts_with("Models/")).count();
        prop_assert_eq!(models, tables.len());
    }
}

#[test]
fn test_documented_examples() {
    assert_eq!(to_upper_camel("order_items"), "OrderItems");
    assert_eq!(to_lower_camel("Order-Items"), "orderItems");
}
