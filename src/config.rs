//! Aligner configuration, loadable from TOML.

use crate::errors::{AlignError, AlignResult};
use crate::labels::{sanitize_label, LabelSet};
use crate::projection::ProjectionMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for projection and marker encoding.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// namespace = "PonkApp3"
/// sentence_separator = "\n"
/// projection = "auto"
/// max_lookahead = 32
///
/// [[labels]]
/// id = "01_Situace"
/// name = "Situation"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// First segment of every marker key
    pub namespace: String,
    /// Inserted between sentences in the raw text
    pub sentence_separator: String,
    pub projection: ProjectionMode,
    /// Characters a form may be displaced within `# text`
    pub max_lookahead: usize,
    /// Known labels; others are accepted with a warning
    pub labels: LabelSet,
}

impl AlignConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "PonkApp3";
    pub const DEFAULT_MAX_LOOKAHEAD: usize = 32;

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> AlignResult<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AlignError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            AlignError::Config { message, .. } => AlignError::Config {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> AlignResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| AlignError::Config {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AlignResult<()> {
        if self.namespace.is_empty() || sanitize_label(&self.namespace).is_some() {
            return Err(AlignError::Config {
                path: "<inline>".to_string(),
                message: format!(
                    "namespace '{}' must be non-empty and free of '|', '=', ':' and whitespace",
                    self.namespace
                ),
            });
        }
        Ok(())
    }
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            sentence_separator: "\n".to_string(),
            projection: ProjectionMode::Auto,
            max_lookahead: Self::DEFAULT_MAX_LOOKAHEAD,
            labels: LabelSet::speech_acts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AlignConfig::default();
        assert_eq!(config.namespace, "PonkApp3");
        assert_eq!(config.sentence_separator, "\n");
        assert_eq!(config.labels.len(), 9);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AlignConfig::from_toml_str("projection = \"tokens\"\n").unwrap();
        assert_eq!(config.projection, ProjectionMode::Tokens);
        assert_eq!(config.namespace, "PonkApp3");
        assert_eq!(config.max_lookahead, 32);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
namespace = "Acts"
sentence_separator = " "
max_lookahead = 8

[[labels]]
id = "A"
name = "Alpha"

[[labels]]
id = "B"
"#
        )
        .unwrap();

        let config = AlignConfig::load(file.path()).unwrap();
        assert_eq!(config.namespace, "Acts");
        assert_eq!(config.sentence_separator, " ");
        assert_eq!(config.max_lookahead, 8);
        assert_eq!(config.labels.len(), 2);
        assert_eq!(config.labels.display_name("A"), "Alpha");
        assert_eq!(config.labels.display_name("B"), "B");
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let config = AlignConfig::load(Path::new("/nonexistent/align.toml")).unwrap();
        assert_eq!(config, AlignConfig::default());
    }

    #[test]
    fn test_rejects_bad_namespace() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "namespace = \"a:b\"").unwrap();
        let err = AlignConfig::load(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a:b"));
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_rejects_invalid_toml() {
        assert!(AlignConfig::from_toml_str("max_lookahead = \"many\"").is_err());
    }
}
