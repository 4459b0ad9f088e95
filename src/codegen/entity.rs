use super::model::{EntityModel, PropertyModel};
use super::{ArtifactGenerator, GeneratedFile, GeneratorConfig, SourceWriter};
use crate::naming::escape_string_literal;
use crate::schema::Schema;

/// One annotated entity class per table under `Models/`.
pub struct EntityGenerator;

impl ArtifactGenerator for EntityGenerator {
    fn name(&self) -> &'static str {
        "entities"
    }

    fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile> {
        EntityModel::all(schema)
            .iter()
            .map(|model| {
                GeneratedFile::new(
                    format!("Models/{}.cs", model.class_name),
                    entity_class(model, &config.namespace),
                )
            })
            .collect()
    }
}

fn column_attribute(model: &EntityModel<'_>, property: &PropertyModel<'_>) -> Option<String> {
    let order = property
        .key_ordinal
        .filter(|_| model.info.has_composite_key())
        .map(|ordinal| format!("Order = {}", ordinal));
    let name = property
        .needs_column_name()
        .then(|| format!("\"{}\"", escape_string_literal(&property.column.name)));

    match (name, order) {
        (Some(name), Some(order)) => Some(format!("[Column({}, {})]", name, order)),
        (Some(name), None) => Some(format!("[Column({})]", name)),
        (None, Some(order)) => Some(format!("[Column({})]", order)),
        (None, None) => None,
    }
}

fn attributes(model: &EntityModel<'_>, property: &PropertyModel<'_>) -> Vec<String> {
    let mut attrs = Vec::new();

    if property.key_ordinal.is_some() {
        attrs.push("[Key]".to_string());
    }
    if let Some(column) = column_attribute(model, property) {
        attrs.push(column);
    }
    if property.is_required() {
        attrs.push("[Required]".to_string());
    }
    if let Some(length) = property.string_length() {
        attrs.push(format!("[StringLength({})]", length));
    }

    attrs
}

pub(super) fn entity_class(model: &EntityModel<'_>, namespace: &str) -> String {
    let mut w = SourceWriter::default();
    w.usings(&[
        "System",
        "System.Collections.Generic",
        "System.ComponentModel.DataAnnotations",
        "System.ComponentModel.DataAnnotations.Schema",
    ]);
    w.open(0, &format!("namespace {}.Models", namespace));
    w.line(1, &format!("[Table(\"{}\")]", escape_string_literal(model.table)));
    w.open(1, &format!("public class {}", model.class_name));

    let mut first = true;
    for property in &model.properties {
        if !first {
            w.blank();
        }
        first = false;

        for attr in attributes(model, property) {
            w.line(2, &attr);
        }
        w.line(
            2,
            &format!("public {} {} {{ get; set; }}", property.declared_type(), property.name),
        );
    }

    for navigation in &model.navigations {
        if !first {
            w.blank();
        }
        first = false;

        w.line(
            2,
            &format!(
                "public virtual {0} {0} {{ get; set; }}",
                navigation.class_name
            ),
        );
    }

    w.close(1).close(0);
    w.finish()
}
