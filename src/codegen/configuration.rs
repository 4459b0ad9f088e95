use super::model::{EntityModel, key_selector};
use super::{ArtifactGenerator, GeneratedFile, GeneratorConfig, SourceWriter};
use crate::naming::escape_string_literal;
use crate::schema::Schema;

/// Fluent mapping configuration, one class per table.
pub struct ConfigurationGenerator;

impl ArtifactGenerator for ConfigurationGenerator {
    fn name(&self) -> &'static str {
        "configurations"
    }

    fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile> {
        EntityModel::all(schema)
            .iter()
            .map(|model| {
                GeneratedFile::new(
                    format!("Data/Configurations/{}.cs", model.configuration_name()),
                    configuration_class(model, &config.namespace),
                )
            })
            .collect()
    }
}

/// Statements of `Configure`, each as its lines without the body indent.
fn statements(model: &EntityModel<'_>) -> Vec<Vec<String>> {
    let mut out = vec![vec![format!(
        "builder.ToTable(\"{}\");",
        escape_string_literal(model.table)
    )]];

    let keys = model.key_properties();
    if !keys.is_empty() {
        out.push(vec![format!("builder.HasKey({});", lambda(&keys))]);
    }

    for property in &model.properties {
        let column = property.column;
        let mut lines = vec![
            format!("builder.Property(e => e.{})", property.name),
            format!("    .HasColumnName(\"{}\")", escape_string_literal(&column.name)),
        ];
        if !column.data_type.is_empty() {
            lines.push(format!(
                "    .HasColumnType(\"{}\")",
                escape_string_literal(&column.data_type)
            ));
        }
        if !column.nullable {
            lines.push("    .IsRequired()".to_string());
        }
        if let Some(default) = &column.default {
            lines.push(format!(
                "    .HasDefaultValueSql(\"{}\")",
                escape_string_literal(default)
            ));
        }
        terminate(&mut lines);
        out.push(lines);
    }

    for navigation in &model.navigations {
        let fk = navigation.foreign_key;
        if fk.constrained_columns.is_empty() || fk.referred_columns.is_empty() {
            continue;
        }
        let mut lines = vec![
            format!("builder.HasOne(e => e.{})", navigation.class_name),
            "    .WithMany()".to_string(),
            format!("    .HasForeignKey({})", lambda(&navigation.key_properties)),
        ];
        terminate(&mut lines);
        out.push(lines);
    }

    out
}

fn lambda(properties: &[String]) -> String {
    format!("e => {}", key_selector("e", properties))
}

fn terminate(lines: &mut [String]) {
    if let Some(last) = lines.last_mut() {
        last.push(';');
    }
}

pub(super) fn configuration_class(model: &EntityModel<'_>, namespace: &str) -> String {
    let entities = format!("{}.Models", namespace);
    let mut w = SourceWriter::default();
    w.usings(&[
        "Microsoft.EntityFrameworkCore",
        "Microsoft.EntityFrameworkCore.Metadata.Builders",
        &entities,
    ]);
    w.open(0, &format!("namespace {}.Data.Configurations", namespace));
    w.open(
        1,
        &format!(
            "public class {} : IEntityTypeConfiguration<{}>",
            model.configuration_name(),
            model.class_name
        ),
    );
    w.open(
        2,
        &format!("public void Configure(EntityTypeBuilder<{}> builder)", model.class_name),
    );

    for (i, statement) in statements(model).iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        for line in statement {
            w.line(3, line);
        }
    }

    w.close(2).close(1).close(0);
    w.finish()
}
