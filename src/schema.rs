//! In-memory model of an introspected relational database.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Root aggregate handed out by a schema provider.
///
/// Read-only once built: every analysis and generation pass borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub tables: BTreeMap<String, TableInfo>,
    #[serde(deserialize_with = "definitions")]
    pub views: BTreeMap<String, String>,
    #[serde(deserialize_with = "definitions")]
    pub stored_procedures: BTreeMap<String, String>,
    #[serde(deserialize_with = "definitions")]
    pub functions: BTreeMap<String, String>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableInfo {
    /// Declaration order.
    pub columns: Vec<ColumnInfo>,
    /// Order defines the composite-key ordinal.
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Raw source type, e.g. `varchar(50)`.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "nullable_by_default")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKey {
    pub constrained_columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    pub source_table: String,
    pub source_columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn nullable_by_default() -> bool {
    true
}

/// Definition maps may carry `null` for objects whose text could not be read.
fn definitions<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<String>> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, text)| (name, text.unwrap_or_default()))
        .collect())
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk == column)
    }

    pub fn has_composite_key(&self) -> bool {
        self.primary_keys.len() > 1
    }

    /// Ordinal of `column` inside the primary key.
    pub fn key_ordinal(&self, column: &str) -> Option<usize> {
        self.primary_keys.iter().position(|pk| pk == column)
    }

    /// Foreign keys whose constrained columns include `column`.
    pub fn foreign_keys_on<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.constrained_columns.iter().any(|c| c == column))
    }
}

impl Relationship {
    pub fn from_foreign_key(source_table: &str, fk: &ForeignKey) -> Self {
        Self {
            source_table: source_table.to_string(),
            source_columns: fk.constrained_columns.clone(),
            target_table: fk.referred_table.clone(),
            target_columns: fk.referred_columns.clone(),
            name: fk.name.clone(),
        }
    }

    /// Both column lists carry at least one column.
    pub fn has_columns(&self) -> bool {
        !self.source_columns.is_empty() && !self.target_columns.is_empty()
    }
}

impl Schema {
    /// One relationship per foreign key, sourced at the owning table.
    pub fn derive_relationships(tables: &BTreeMap<String, TableInfo>) -> Vec<Relationship> {
        tables
            .iter()
            .flat_map(|(name, table)| {
                table
                    .foreign_keys
                    .iter()
                    .map(move |fk| Relationship::from_foreign_key(name, fk))
            })
            .collect()
    }

    /// Build a schema from tables only, deriving its relationships.
    pub fn from_tables(tables: BTreeMap<String, TableInfo>) -> Self {
        let relationships = Self::derive_relationships(&tables);
        Self {
            tables,
            relationships,
            ..Self::default()
        }
    }

    /// Fill `relationships` from the foreign keys when none were supplied.
    pub fn with_derived_relationships(mut self) -> Self {
        if self.relationships.is_empty() {
            self.relationships = Self::derive_relationships(&self.tables);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.views.is_empty()
            && self.stored_procedures.is_empty()
            && self.functions.is_empty()
            && self.relationships.is_empty()
    }

    pub fn has_relationship(&self, table: &str) -> bool {
        self.relationships
            .iter()
            .any(|r| r.source_table == table || r.target_table == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_and_customers() -> BTreeMap<String, TableInfo> {
        let mut tables = BTreeMap::new();
        tables.insert(
            "customers".to_string(),
            TableInfo {
                columns: vec![ColumnInfo::new("id", "int").not_null()],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![],
            },
        );
        tables.insert(
            "orders".to_string(),
            TableInfo {
                columns: vec![
                    ColumnInfo::new("id", "int").not_null(),
                    ColumnInfo::new("customer_id", "int"),
                ],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![ForeignKey {
                    constrained_columns: vec!["customer_id".to_string()],
                    referred_table: "customers".to_string(),
                    referred_columns: vec!["id".to_string()],
                    name: Some("FK_orders_customers".to_string()),
                }],
            },
        );
        tables
    }

    #[test]
    fn test_derive_relationships_one_per_foreign_key() {
        let schema = Schema::from_tables(orders_and_customers());

        assert_eq!(schema.relationships.len(), 1);
        let rel = &schema.relationships[0];
        assert_eq!(rel.source_table, "orders");
        assert_eq!(rel.target_table, "customers");
        assert_eq!(rel.source_columns, vec!["customer_id"]);
        assert_eq!(rel.name.as_deref(), Some("FK_orders_customers"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "tables": {
                "t": { "columns": [ { "name": "a", "type": "int" } ] }
            },
            "views": { "v": null }
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();

        let column = &schema.tables["t"].columns[0];
        assert!(column.nullable);
        assert!(column.default.is_none());
        assert_eq!(schema.views["v"], "");
        assert!(schema.stored_procedures.is_empty());
        assert!(schema.relationships.is_empty());
    }

    #[test]
    fn test_with_derived_relationships_keeps_supplied_ones() {
        let mut schema = Schema::from_tables(orders_and_customers());
        schema.relationships[0].name = Some("explicit".to_string());

        let schema = schema.with_derived_relationships();
        assert_eq!(schema.relationships[0].name.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_key_ordinal() {
        let table = TableInfo {
            columns: vec![],
            primary_keys: vec!["a".to_string(), "b".to_string()],
            foreign_keys: vec![],
        };
        assert!(table.has_composite_key());
        assert_eq!(table.key_ordinal("b"), Some(1));
        assert_eq!(table.key_ordinal("c"), None);
    }
}
