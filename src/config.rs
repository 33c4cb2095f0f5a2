//! Engine configuration and props loading
//!
//! Options can be built in code (`Options::new().with_auto_escape(false)`)
//! or loaded from a TOML engine file:
//!
//! ```toml
//! auto_escape = true
//! max_depth = 64
//!
//! [global_props]
//! site = "Example"
//!
//! [templates]
//! my-card = "components/my-card.html"
//! ```
//!
//! Template paths are resolved relative to the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::value::{Props, Value};

/// Default bound on nested component expansion
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that can occur when loading configuration or props
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("props must be an object, found {found}")]
    NotAnObject { found: String },
    #[error("unsupported props format: {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },
    #[error("error reading template file {path}: {message}")]
    TemplateRead { path: PathBuf, message: String },
}

/// Engine options
///
/// Unset fields leave the engine's current value untouched when applied
/// through `Engine::set_options`.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Escape expression output in text (default true)
    pub auto_escape: Option<bool>,
    /// Props visible to every render
    pub global_props: Option<Props>,
    /// Bound on nested component expansion
    pub max_depth: Option<usize>,
    /// Templates to register, name -> markup
    pub templates: Vec<(String, String)>,
}

impl Options {
    /// Create options that change nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether text interpolation is HTML-escaped
    pub fn with_auto_escape(mut self, auto_escape: bool) -> Self {
        self.auto_escape = Some(auto_escape);
        self
    }

    /// Set the global props
    pub fn with_global_props(mut self, props: Props) -> Self {
        self.global_props = Some(props);
        self
    }

    /// Set the component expansion depth bound
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Add a template to register
    pub fn with_template(mut self, name: impl Into<String>, markup: impl Into<String>) -> Self {
        self.templates.push((name.into(), markup.into()));
        self
    }
}

/// TOML engine file
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub auto_escape: Option<bool>,
    pub max_depth: Option<usize>,
    pub global_props: Props,
    /// Template name -> path (relative paths resolve against `base_dir`)
    pub templates: BTreeMap<String, PathBuf>,
    pub base_dir: Option<PathBuf>,
}

/// TOML structure for deserializing engine files
#[derive(Deserialize)]
struct TomlEngineConfig {
    auto_escape: Option<bool>,
    max_depth: Option<usize>,
    #[serde(default)]
    global_props: toml::Table,
    #[serde(default)]
    templates: BTreeMap<String, PathBuf>,
}

impl EngineConfig {
    /// Load engine config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load engine config from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlEngineConfig = toml::from_str(content)?;
        Ok(EngineConfig {
            auto_escape: parsed.auto_escape,
            max_depth: parsed.max_depth,
            global_props: parsed
                .global_props
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
            templates: parsed.templates,
            base_dir: None,
        })
    }

    /// Read template files and build engine options
    pub fn into_options(self) -> Result<Options, ConfigError> {
        let mut options = Options::new();
        options.auto_escape = self.auto_escape;
        options.max_depth = self.max_depth;
        if !self.global_props.is_empty() {
            options.global_props = Some(self.global_props);
        }
        for (name, path) in self.templates {
            let full_path = match &self.base_dir {
                Some(base) if path.is_relative() => base.join(&path),
                _ => path,
            };
            let markup =
                std::fs::read_to_string(&full_path).map_err(|e| ConfigError::TemplateRead {
                    path: full_path.clone(),
                    message: e.to_string(),
                })?;
            options.templates.push((name, markup));
        }
        Ok(options)
    }
}

/// Parse a JSON object into props
pub fn props_from_json(content: &str) -> Result<Props, ConfigError> {
    let json: serde_json::Value = serde_json::from_str(content)?;
    into_props(Value::from(json))
}

/// Parse a TOML table into props
pub fn props_from_toml(content: &str) -> Result<Props, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(table
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect())
}

/// Load props from a `.json` or `.toml` file
pub fn load_props(path: &Path) -> Result<Props, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => props_from_json(&content),
        Some("toml") => props_from_toml(&content),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn into_props(value: Value) -> Result<Props, ConfigError> {
    match value {
        Value::Object(map) => Ok(std::sync::Arc::unwrap_or_clone(map)),
        other => Err(ConfigError::NotAnObject {
            found: other.type_of().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_from_str() {
        let config = EngineConfig::from_str(
            r#"
            auto_escape = false
            max_depth = 8

            [global_props]
            site = "Example"
            year = 2024

            [templates]
            my-card = "components/my-card.html"
            "#,
        )
        .expect("Should parse");
        assert_eq!(config.auto_escape, Some(false));
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.global_props.get("site"), Some(&Value::from("Example")));
        assert_eq!(config.global_props.get("year"), Some(&Value::from(2024)));
        assert_eq!(
            config.templates.get("my-card"),
            Some(&PathBuf::from("components/my-card.html"))
        );
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::from_str("").expect("Should parse");
        assert_eq!(config.auto_escape, None);
        assert!(config.global_props.is_empty());
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_engine_config_rejects_bad_toml() {
        assert!(matches!(
            EngineConfig::from_str("auto_escape = "),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_props_from_json() {
        let props = props_from_json(r#"{"title": "Hi", "items": [1, 2]}"#).expect("Should parse");
        assert_eq!(props.get("title"), Some(&Value::from("Hi")));
        assert_eq!(
            props.get("items"),
            Some(&Value::array(vec![Value::from(1), Value::from(2)]))
        );
    }

    #[test]
    fn test_props_from_json_requires_object() {
        assert!(matches!(
            props_from_json("[1, 2]"),
            Err(ConfigError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_props_from_toml() {
        let props = props_from_toml("title = \"Hi\"\ncount = 3").expect("Should parse");
        assert_eq!(props.get("count"), Some(&Value::from(3)));
    }

    #[test]
    fn test_options_builder() {
        let options = Options::new()
            .with_auto_escape(false)
            .with_max_depth(4)
            .with_template("my-card", "<div/>");
        assert_eq!(options.auto_escape, Some(false));
        assert_eq!(options.max_depth, Some(4));
        assert_eq!(options.templates.len(), 1);
        assert!(options.global_props.is_none());
    }
}
