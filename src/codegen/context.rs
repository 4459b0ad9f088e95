use super::model::{EntityModel, key_selector, relationship_keys};
use super::{ArtifactGenerator, GeneratedFile, GeneratorConfig, SourceWriter};
use crate::naming::to_upper_camel;
use crate::schema::Schema;

/// The database context: one collection per table plus relationship wiring.
pub struct ContextGenerator;

impl ArtifactGenerator for ContextGenerator {
    fn name(&self) -> &'static str {
        "context"
    }

    fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile> {
        vec![GeneratedFile::new(
            format!("Data/{}.cs", config.context_name),
            context_class(schema, config),
        )]
    }
}

fn context_class(schema: &Schema, config: &GeneratorConfig) -> String {
    let ns = &config.namespace;
    let ctx = &config.context_name;
    let models = EntityModel::all(schema);

    let mut w = SourceWriter::default();
    let configurations = format!("{}.Data.Configurations", ns);
    let entities = format!("{}.Models", ns);
    if models.is_empty() {
        w.usings(&["Microsoft.EntityFrameworkCore"]);
    } else {
        w.usings(&["Microsoft.EntityFrameworkCore", &configurations, &entities]);
    }

    w.open(0, &format!("namespace {}.Data", ns));
    w.open(1, &format!("public class {} : DbContext", ctx));
    w.line(2, &format!("public {0}(DbContextOptions<{0}> options)", ctx));
    w.line(3, ": base(options)");
    w.line(2, "{").line(2, "}").blank();

    for model in &models {
        w.line(
            2,
            &format!("public DbSet<{}> {} {{ get; set; }}", model.class_name, model.db_set_name()),
        );
    }
    if !models.is_empty() {
        w.blank();
    }

    w.open(2, "protected override void OnModelCreating(ModelBuilder modelBuilder)");
    let mut blocks: Vec<Vec<String>> = Vec::new();

    if !models.is_empty() {
        blocks.push(
            models
                .iter()
                .map(|m| format!("modelBuilder.ApplyConfiguration(new {}());", m.configuration_name()))
                .collect(),
        );
    }

    for rel in schema.relationships.iter().filter(|r| r.has_columns()) {
        blocks.push(vec![
            format!("modelBuilder.Entity<{}>()", to_upper_camel(&rel.source_table)),
            format!("    .HasOne(s => s.{})", to_upper_camel(&rel.target_table)),
            "    .WithMany()".to_string(),
            format!(
                "    .HasForeignKey(s => {});",
                key_selector("s", &relationship_keys(rel))
            ),
        ]);
    }

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        for line in block {
            w.line(3, line);
        }
    }

    w.close(2).close(1).close(0);
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnInfo, ForeignKey, Relationship, TableInfo};
    use std::collections::BTreeMap;

    fn shop() -> Schema {
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
                    name: Some("fk_orders_customers".to_string()),
                }],
            },
        );
        Schema::from_tables(tables)
    }

    #[test]
    fn test_context_collections_and_wiring() {
        let code = context_class(&shop(), &GeneratorConfig::default());

        assert!(code.contains("public class AppDbContext : DbContext"));
        assert!(code.contains("public AppDbContext(DbContextOptions<AppDbContext> options)"));
        assert!(code.contains("public DbSet<Customers> Customerss { get; set; }"));
        assert!(code.contains("public DbSet<Orders> Orderss { get; set; }"));
        assert!(code.contains("modelBuilder.ApplyConfiguration(new OrdersConfiguration());"));
        assert!(code.contains(
            "            modelBuilder.Entity<Orders>()\n                .HasOne(s => s.Customers)\n                .WithMany()\n                .HasForeignKey(s => s.CustomerId);\n"
        ));
    }

    #[test]
    fn test_multi_column_relationship() {
        let mut schema = Schema::default();
        schema.relationships.push(Relationship {
            source_table: "shipments".to_string(),
            source_columns: vec!["order_id".to_string(), "line_no".to_string()],
            target_table: "order_lines".to_string(),
            target_columns: vec!["order_id".to_string(), "line_no".to_string()],
            name: None,
        });
        let code = context_class(&schema, &GeneratorConfig::default());

        assert!(code.contains(".HasForeignKey(s => new { s.OrderId, s.LineNo });"));
    }

    #[test]
    fn test_relationship_without_columns_is_skipped() {
        let mut schema = Schema::default();
        schema.relationships.push(Relationship {
            source_table: "a".to_string(),
            source_columns: vec![],
            target_table: "b".to_string(),
            target_columns: vec!["id".to_string()],
            name: None,
        });
        let code = context_class(&schema, &GeneratorConfig::default());

        assert!(!code.contains("modelBuilder.Entity"));
    }

    #[test]
    fn test_empty_context() {
        let config = GeneratorConfig {
            namespace: "Acme".to_string(),
            context_name: "ShopContext".to_string(),
        };
        let code = context_class(&Schema::default(), &config);

        let expected = "\
using Microsoft.EntityFrameworkCore;

namespace Acme.Data
{
    public class ShopContext : DbContext
    {
        public ShopContext(DbContextOptions<ShopContext> options)
            : base(options)
        {
        }

        protected override void OnModelCreating(ModelBuilder modelBuilder)
        {
        }
    }
}
";
        assert_eq!(code, expected);
    }
}
