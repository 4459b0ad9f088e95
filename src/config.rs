//! Run configuration: code generation names and diagram filters.
//!
//! Resolution order, highest priority first:
//! 1. CLI flags (`Overrides`)
//! 2. The file given with `--config`, or `schemalens.toml` in the working directory
//! 3. Compiled defaults

use crate::codegen::GeneratorConfig;
use crate::diagram::DiagramFlags;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE: &str = "schemalens.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codegen: GeneratorConfig,
    pub diagram: DiagramFlags,
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub namespace: Option<String>,
    pub context_name: Option<String>,
    pub tables: Option<bool>,
    pub views: Option<bool>,
    pub procedures: Option<bool>,
    pub functions: Option<bool>,
}

impl Config {
    /// Resolve the configuration for a run started in `root`.
    pub fn load(explicit: Option<&Path>, root: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = root.join(CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(namespace) = &overrides.namespace {
            self.codegen.namespace = namespace.clone();
        }
        if let Some(context_name) = &overrides.context_name {
            self.codegen.context_name = context_name.clone();
        }

        let flags = &mut self.diagram;
        for (flag, value) in [
            (&mut flags.tables, overrides.tables),
            (&mut flags.views, overrides.views),
            (&mut flags.procedures, overrides.procedures),
            (&mut flags.functions, overrides.functions),
        ] {
            if let Some(value) = value {
                *flag = value;
            }
        }
    }

    /// Generated names end up as C# identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.codegen.namespace;
        if namespace.is_empty() || !namespace.split('.').all(is_identifier) {
            return Err(ConfigError::Invalid {
                field: "codegen.namespace",
                message: format!("`{}` is not a dotted identifier", namespace),
            });
        }
        if !is_identifier(&self.codegen.context_name) {
            return Err(ConfigError::Invalid {
                field: "codegen.context_name",
                message: format!("`{}` is not an identifier", self.codegen.context_name),
            });
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(None, dir.path(), &Overrides::default()).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.codegen.namespace, "YourNamespace");
        assert!(config.diagram.tables && config.diagram.views);
        assert!(!config.diagram.procedures && !config.diagram.functions);
    }

    #[test]
    fn test_project_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[codegen]\nnamespace = \"Contoso.Data\"\n\n[diagram]\nprocedures = true\n",
        )
        .unwrap();

        let config = Config::load(None, dir.path(), &Overrides::default()).unwrap();
        assert_eq!(config.codegen.namespace, "Contoso.Data");
        assert_eq!(config.codegen.context_name, "AppDbContext");
        assert!(config.diagram.procedures);
        assert!(config.diagram.views);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[codegen]\ncontext_name = \"FileContext\"\n").unwrap();

        let overrides = Overrides {
            context_name: Some("CliContext".to_string()),
            views: Some(false),
            ..Overrides::default()
        };
        let config = Config::load(Some(&path), dir.path(), &overrides).unwrap();

        assert_eq!(config.codegen.context_name, "CliContext");
        assert!(!config.diagram.views);
    }

    #[test]
    fn test_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing), dir.path(), &Overrides::default()),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[codegen\n").unwrap();
        assert!(matches!(
            Config::load(Some(&broken), dir.path(), &Overrides::default()),
            Err(ConfigError::Toml { .. })
        ));

        let overrides = Overrides {
            namespace: Some("My..Space".to_string()),
            ..Overrides::default()
        };
        assert!(matches!(
            Config::load(None, dir.path(), &overrides),
            Err(ConfigError::Invalid { field: "codegen.namespace", .. })
        ));
    }
}
