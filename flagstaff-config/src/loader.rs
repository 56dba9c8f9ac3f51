// Flag file loaders

use crate::{ConfigError, Result};
use flagstaff_features::FlagRule;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Flags by name
pub type FlagSet = BTreeMap<String, FlagRule>;

/// Supported flag file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Flag file loader
///
/// A flag document maps each flag name to its configuration. A string value
/// is a raw configuration (`"on"`, or a JSON rule in a string); any other
/// value is an inline rule. Entries that do not describe a valid rule load
/// as the default rule rather than failing the whole document.
pub struct FlagLoader {
    format: FileFormat,
}

impl FlagLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: &str) -> Result<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::UnknownFormat(format!("{} has no extension", path)))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::UnknownFormat(ext.to_string()))?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load flags from file
    pub fn load_file(&self, path: &str) -> Result<FlagSet> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("Failed to read {}: {}", path, e)))?;

        self.parse(&content)
    }

    /// Parse flags from a document
    pub fn parse(&self, content: &str) -> Result<FlagSet> {
        let document = match self.format {
            FileFormat::Json => self.parse_json(content)?,
            FileFormat::Toml => self.parse_toml(content)?,
            FileFormat::Env => self.parse_env(content)?,
        };

        let Value::Object(entries) = document else {
            return Err(ConfigError::ParseError(
                "flag document must be a table of flag names".to_string(),
            ));
        };

        Ok(entries
            .into_iter()
            .map(|(name, value)| {
                let rule = rule_from_value(&name, &value);
                (name, rule)
            })
            .collect())
    }

    fn parse_json(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
    }

    fn parse_toml(&self, content: &str) -> Result<Value> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        serde_json::to_value(table)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))
    }

    // Same dialect as `.env` files loaded into the process environment
    fn parse_env(&self, content: &str) -> Result<Value> {
        let mut map = serde_json::Map::new();

        for item in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) =
                item.map_err(|e| ConfigError::ParseError(format!("env parse error: {}", e)))?;
            map.insert(key, Value::String(value));
        }

        Ok(Value::Object(map))
    }
}

fn rule_from_value(name: &str, value: &Value) -> FlagRule {
    let raw = match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };

    FlagRule::try_parse(&raw).unwrap_or_else(|err| {
        debug!(flag = %name, error = %err, "Flag loaded as default rule");
        FlagRule::default()
    })
}
