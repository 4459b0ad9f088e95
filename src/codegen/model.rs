//! Names and types derived once per table and shared by every artifact.

use crate::naming::{to_lower_camel, to_upper_camel};
use crate::schema::{ColumnInfo, ForeignKey, Relationship, Schema, TableInfo};
use crate::types::{is_value_type, sql_type_to_host_type, string_length};

#[derive(Debug, Clone)]
pub struct EntityModel<'a> {
    pub table: &'a str,
    pub info: &'a TableInfo,
    pub class_name: String,
    pub properties: Vec<PropertyModel<'a>>,
    pub navigations: Vec<NavigationModel<'a>>,
}

#[derive(Debug, Clone)]
pub struct PropertyModel<'a> {
    pub column: &'a ColumnInfo,
    pub name: String,
    /// Host type without the nullable marker.
    pub host_type: &'static str,
    pub key_ordinal: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct NavigationModel<'a> {
    pub foreign_key: &'a ForeignKey,
    /// Class of the referenced table; also the property name.
    pub class_name: String,
    pub key_properties: Vec<String>,
}

impl<'a> EntityModel<'a> {
    pub fn new(table: &'a str, info: &'a TableInfo) -> Self {
        let properties = info
            .columns
            .iter()
            .map(|column| PropertyModel {
                column,
                name: to_upper_camel(&column.name),
                host_type: sql_type_to_host_type(&column.data_type),
                key_ordinal: info.key_ordinal(&column.name),
            })
            .collect();

        let navigations = info
            .foreign_keys
            .iter()
            .map(|fk| NavigationModel {
                foreign_key: fk,
                class_name: to_upper_camel(&fk.referred_table),
                key_properties: fk.constrained_columns.iter().map(|c| to_upper_camel(c)).collect(),
            })
            .collect();

        Self {
            table,
            info,
            class_name: to_upper_camel(table),
            properties,
            navigations,
        }
    }

    /// Every table of the schema, in table-name order.
    pub fn all(schema: &'a Schema) -> Vec<Self> {
        schema
            .tables
            .iter()
            .map(|(name, info)| Self::new(name, info))
            .collect()
    }

    pub fn configuration_name(&self) -> String {
        format!("{}Configuration", self.class_name)
    }

    pub fn db_set_name(&self) -> String {
        format!("{}s", self.class_name)
    }

    pub fn repository_property(&self) -> String {
        format!("{}Repository", self.class_name)
    }

    pub fn repository_field(&self) -> String {
        format!("_{}Repository", to_lower_camel(self.table))
    }

    pub fn service_interface(&self) -> String {
        format!("I{}Service", self.class_name)
    }

    pub fn service_class(&self) -> String {
        format!("{}Service", self.class_name)
    }

    /// Key property names in `primary_keys` order.
    pub fn key_properties(&self) -> Vec<String> {
        self.info.primary_keys.iter().map(|pk| to_upper_camel(pk)).collect()
    }
}

impl PropertyModel<'_> {
    /// Declared type, with `?` for nullable value types.
    pub fn declared_type(&self) -> String {
        if self.column.nullable && is_value_type(self.host_type) {
            format!("{}?", self.host_type)
        } else {
            self.host_type.to_string()
        }
    }

    /// Whether the raw column name needs an explicit `[Column("..")]` mapping.
    pub fn needs_column_name(&self) -> bool {
        self.column.name != self.name && self.column.name != to_lower_camel(&self.name)
    }

    pub fn is_required(&self) -> bool {
        !self.column.nullable && !matches!(self.host_type, "byte[]" | "object")
    }

    pub fn string_length(&self) -> Option<u32> {
        string_length(&self.column.data_type)
    }
}

/// Render a lambda key selector: `s.A` or `new { s.A, s.B }`.
pub fn key_selector(param: &str, properties: &[String]) -> String {
    match properties {
        [single] => format!("{}.{}", param, single),
        many => {
            let parts: Vec<String> = many.iter().map(|p| format!("{}.{}", param, p)).collect();
            format!("new {{ {} }}", parts.join(", "))
        }
    }
}

/// Source-side key properties of a relationship.
pub fn relationship_keys(rel: &Relationship) -> Vec<String> {
    rel.source_columns.iter().map(|c| to_upper_camel(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableInfo {
        TableInfo {
            columns: vec![
                ColumnInfo::new("order_id", "int").not_null(),
                ColumnInfo::new("line_no", "smallint").not_null(),
                ColumnInfo::new("sku", "nvarchar(32)"),
                ColumnInfo::new("qty", "int"),
            ],
            primary_keys: vec!["order_id".to_string(), "line_no".to_string()],
            foreign_keys: vec![ForeignKey {
                constrained_columns: vec!["order_id".to_string()],
                referred_table: "orders".to_string(),
                referred_columns: vec!["id".to_string()],
                name: None,
            }],
        }
    }

    #[test]
    fn test_entity_names() {
        let info = table();
        let model = EntityModel::new("order_lines", &info);

        assert_eq!(model.class_name, "OrderLines");
        assert_eq!(model.configuration_name(), "OrderLinesConfiguration");
        assert_eq!(model.db_set_name(), "OrderLiness");
        assert_eq!(model.repository_field(), "_orderLinesRepository");
        assert_eq!(model.key_properties(), vec!["OrderId", "LineNo"]);
        assert_eq!(model.navigations[0].class_name, "Orders");
    }

    #[test]
    fn test_property_types() {
        let info = table();
        let model = EntityModel::new("order_lines", &info);

        assert_eq!(model.properties[0].declared_type(), "int");
        assert_eq!(model.properties[0].key_ordinal, Some(0));
        assert_eq!(model.properties[1].key_ordinal, Some(1));
        assert_eq!(model.properties[2].declared_type(), "string");
        assert_eq!(model.properties[2].string_length(), Some(32));
        assert_eq!(model.properties[3].declared_type(), "int?");
        assert!(model.properties[0].needs_column_name());
        assert!(!model.properties[2].needs_column_name());
    }

    #[test]
    fn test_key_selector() {
        assert_eq!(key_selector("e", &["Id".to_string()]), "e.Id");
        assert_eq!(
            key_selector("e", &["A".to_string(), "B".to_string()]),
            "new { e.A, e.B }"
        );
    }
}
