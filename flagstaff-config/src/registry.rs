// FlagRegistry - named flags, looked up per request

use crate::{ConfigError, EnvLoader, FileFormat, FlagLoader, FlagSet, Result};
use flagstaff_features::{EvaluationContext, FlagRule, NO_VARIANT};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable set of named flag rules
///
/// Flag names are case-insensitive. Lookups of unknown flags evaluate as
/// disabled with no variant.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    flags: Arc<BTreeMap<String, FlagRule>>,
}

impl FlagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from already-materialized rules
    pub fn from_rules(rules: impl IntoIterator<Item = (String, FlagRule)>) -> Self {
        let flags = rules
            .into_iter()
            .map(|(name, rule)| (normalize_name(&name), rule))
            .collect();

        Self {
            flags: Arc::new(flags),
        }
    }

    /// Builder for loading a registry from configuration sources
    pub fn builder() -> FlagRegistryBuilder {
        FlagRegistryBuilder::new()
    }

    /// Get a flag rule
    pub fn get(&self, name: &str) -> Option<&FlagRule> {
        self.flags.get(&normalize_name(name))
    }

    /// Check if a flag is defined
    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(&normalize_name(name))
    }

    /// Flag names, sorted
    pub fn names(&self) -> Vec<String> {
        self.flags.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Check whether a flag is on for a request
    pub fn is_enabled(&self, name: &str, context: &EvaluationContext) -> bool {
        match self.get(name) {
            Some(rule) => rule.is_enabled(context),
            None => {
                debug!(flag = %name, "Unknown flag evaluated as disabled");
                false
            }
        }
    }

    /// Select the experiment variant for a request.
    ///
    /// Only requests the flag is enabled for take part in the experiment;
    /// everyone else gets [`NO_VARIANT`].
    pub fn variant_for(&self, name: &str, context: &EvaluationContext) -> String {
        match self.get(name) {
            Some(rule) if rule.is_enabled(context) => rule.variant_for(context.user()),
            Some(_) => NO_VARIANT.to_string(),
            None => {
                debug!(flag = %name, "Unknown flag has no variant");
                NO_VARIANT.to_string()
            }
        }
    }

    /// Serialize every flag, each in its compact form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self.flags.as_ref())
            .map_err(|e| ConfigError::SerializationError(e.to_string()))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Builder for FlagRegistry
///
/// Sources are applied in order, later ones overriding earlier ones:
/// `.env` file, environment variables, flag files, explicit flags.
pub struct FlagRegistryBuilder {
    env_loader: EnvLoader,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<String>,
    flag_files: Vec<(String, FileFormat)>,
    explicit: Vec<(String, FlagRule)>,
}

impl FlagRegistryBuilder {
    pub fn new() -> Self {
        Self {
            env_loader: EnvLoader::default(),
            load_env: false,
            load_dotenv: false,
            dotenv_path: None,
            flag_files: Vec::new(),
            explicit: Vec::new(),
        }
    }

    /// Set environment variable prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_loader = EnvLoader::new(prefix);
        self
    }

    /// Enable loading flags from environment variables
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Enable loading a .env file before reading the environment
    pub fn load_dotenv(mut self, path: Option<String>) -> Self {
        self.load_dotenv = true;
        self.load_env = true;
        self.dotenv_path = path;
        self
    }

    /// Add a flag file to load
    pub fn add_file(mut self, path: impl Into<String>, format: FileFormat) -> Self {
        self.flag_files.push((path.into(), format));
        self
    }

    /// Add a flag rule directly
    pub fn with_flag(mut self, name: impl Into<String>, rule: FlagRule) -> Self {
        self.explicit.push((name.into(), rule));
        self
    }

    /// Add a flag from its raw configuration string
    pub fn with_raw_flag(self, name: impl Into<String>, raw: &str) -> Self {
        self.with_flag(name, FlagRule::parse(raw))
    }

    /// Build the registry
    pub fn build(self) -> Result<FlagRegistry> {
        let mut flags = FlagSet::new();

        if self.load_dotenv {
            match self.dotenv_path.as_deref() {
                Some(path) => {
                    dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
                }
                None => {
                    // A missing .env file is not an error
                    dotenvy::dotenv().ok();
                }
            }
        }

        if self.load_env {
            for (name, raw) in self.env_loader.load() {
                flags.insert(normalize_name(&name), FlagRule::parse(&raw));
            }
        }

        for (path, format) in &self.flag_files {
            for (name, rule) in FlagLoader::new(*format).load_file(path)? {
                flags.insert(normalize_name(&name), rule);
            }
        }

        for (name, rule) in self.explicit {
            flags.insert(normalize_name(&name), rule);
        }

        let registry = FlagRegistry::from_rules(flags);
        info!(flags = registry.len(), "Flag registry built");
        Ok(registry)
    }
}

impl Default for FlagRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
