//! Object-relational mapping code synthesis.
//!
//! Each artifact kind (entities, context, mapping configuration, repositories,
//! services, support files) is an [`ArtifactGenerator`]. [`CodeGenerator`]
//! runs an ordered list of them and merges their files into one bundle keyed
//! by path. Output is a pure function of the schema and the configuration.
//!
//! Two tables whose names transform to the same identifier produce colliding
//! artifacts; nothing here deduplicates them.

mod configuration;
mod context;
mod entity;
pub mod model;
mod repository;
mod service;
mod support;

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub use configuration::ConfigurationGenerator;
pub use context::ContextGenerator;
pub use entity::EntityGenerator;
pub use repository::RepositoryGenerator;
pub use service::ServiceGenerator;
pub use support::SupportGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Root namespace of the generated code.
    pub namespace: String,
    /// Class name of the database context.
    pub context_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: "YourNamespace".to_string(),
            context_name: "AppDbContext".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Generated files keyed by path.
pub type FileBundle = BTreeMap<String, GeneratedFile>;

/// One kind of generated artifact.
pub trait ArtifactGenerator {
    fn name(&self) -> &'static str;
    fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> Vec<GeneratedFile>;
}

pub struct CodeGenerator {
    generators: Vec<Box<dyn ArtifactGenerator>>,
}

impl Default for CodeGenerator {
    /// Entity Framework Core stack.
    fn default() -> Self {
        Self::new()
            .with(EntityGenerator)
            .with(ContextGenerator)
            .with(ConfigurationGenerator)
            .with(RepositoryGenerator)
            .with(ServiceGenerator)
            .with(SupportGenerator)
    }
}

impl CodeGenerator {
    /// A generator with no artifacts registered.
    pub fn new() -> Self {
        Self { generators: vec![] }
    }

    pub fn with(mut self, generator: impl ArtifactGenerator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn generate(&self, schema: &Schema, config: &GeneratorConfig) -> FileBundle {
        let mut bundle = FileBundle::new();

        for generator in &self.generators {
            let files = generator.generate(schema, config);
            debug!(artifact = generator.name(), files = files.len(), "artifacts generated");

            for file in files {
                if bundle.contains_key(&file.path) {
                    warn!(path = %file.path, artifact = generator.name(), "generated path collides, overwriting");
                }
                bundle.insert(file.path.clone(), file);
            }
        }

        bundle
    }
}

/// Generate the default bundle for `schema`.
pub fn generate(schema: &Schema, config: &GeneratorConfig) -> FileBundle {
    CodeGenerator::default().generate(schema, config)
}

/// Substitute `$NAMESPACE` and `$CONTEXT` in a fixed template.
pub(crate) fn fill(template: &str, config: &GeneratorConfig) -> String {
    template
        .replace("$NAMESPACE", &config.namespace)
        .replace("$CONTEXT", &config.context_name)
}

/// Lines of C# text with the indentation the templates use.
#[derive(Default)]
pub(crate) struct SourceWriter {
    out: String,
}

impl SourceWriter {
    pub fn line(&mut self, indent: usize, text: &str) -> &mut Self {
        if !text.is_empty() {
            for _ in 0..indent {
                self.out.push_str("    ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn usings(&mut self, namespaces: &[&str]) -> &mut Self {
        for ns in namespaces {
            self.line(0, &format!("using {};", ns));
        }
        self.blank()
    }

    pub fn open(&mut self, indent: usize, header: &str) -> &mut Self {
        self.line(indent, header).line(indent, "{")
    }

    pub fn close(&mut self, indent: usize) -> &mut Self {
        self.line(indent, "}")
    }

    pub fn finish(self) -> String {
        self.out
    }
}
