//! Schema providers: where a [`Schema`] comes from.

mod lexer;
mod parser;

pub use parser::{SqlParseError, parse_ddl};

use crate::schema::Schema;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SchemaExtractionError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid DDL script: {0}")]
    Sql(#[from] SqlParseError),
    #[error("unsupported schema source {} (expected .json, .sql or .ddl)", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub trait SchemaProvider {
    fn fetch_schema(&self) -> Result<Schema, SchemaExtractionError>;
}

/// Where a provider reads its text from.
#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Text(String),
}

impl Source {
    fn read(&self) -> Result<String, SchemaExtractionError> {
        match self {
            Source::File(path) => fs::read_to_string(path).map_err(|source| SchemaExtractionError::Io {
                path: path.clone(),
                source,
            }),
            Source::Text(text) => Ok(text.clone()),
        }
    }
}

/// Parse a schema JSON document, deriving relationships from foreign keys
/// when the document supplies none.
pub fn schema_from_json(text: &str) -> Result<Schema, SchemaExtractionError> {
    let schema: Schema = serde_json::from_str(text)?;
    Ok(schema.with_derived_relationships())
}

#[derive(Debug, Clone)]
pub struct JsonSchemaProvider {
    source: Source,
}

impl JsonSchemaProvider {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: Source::Text(text.into()),
        }
    }
}

impl SchemaProvider for JsonSchemaProvider {
    fn fetch_schema(&self) -> Result<Schema, SchemaExtractionError> {
        schema_from_json(&self.source.read()?)
    }
}

/// Reads `CREATE`/`ALTER` statements out of a DDL script.
#[derive(Debug, Clone)]
pub struct SqlDumpProvider {
    source: Source,
}

impl SqlDumpProvider {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: Source::Text(text.into()),
        }
    }
}

impl SchemaProvider for SqlDumpProvider {
    fn fetch_schema(&self) -> Result<Schema, SchemaExtractionError> {
        Ok(parse_ddl(&self.source.read()?)?)
    }
}

/// Provider for `path`, chosen by file extension.
pub fn provider_for(path: &Path) -> Result<Box<dyn SchemaProvider>, SchemaExtractionError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => Ok(Box::new(JsonSchemaProvider::open(path))),
        Some("sql" | "ddl") => Ok(Box::new(SqlDumpProvider::open(path))),
        _ => Err(SchemaExtractionError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn load(path: &Path) -> Result<Schema, SchemaExtractionError> {
    let schema = provider_for(path)?.fetch_schema()?;
    debug!(
        path = %path.display(),
        tables = schema.tables.len(),
        relationships = schema.relationships.len(),
        "schema loaded"
    );
    Ok(schema)
}
