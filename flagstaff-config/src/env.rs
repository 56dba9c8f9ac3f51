// Environment variable flag loading

use crate::{ConfigError, Result};
use std::collections::BTreeMap;
use std::env;

/// Default environment variable prefix for flags
pub const DEFAULT_PREFIX: &str = "FLAGSTAFF_FLAG";

/// Environment variable loader
///
/// `FLAGSTAFF_FLAG_NEW_CHECKOUT=on` yields flag `new_checkout` with raw
/// configuration `on`.
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Load the raw configuration of every prefixed variable
    pub fn load(&self) -> BTreeMap<String, String> {
        self.collect(
            env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Load the raw configuration for a single flag
    pub fn load_flag(&self, name: &str) -> Result<String> {
        env::var(self.var_name(name)).map_err(ConfigError::EnvError)
    }

    /// Load a single flag's raw configuration, or a default
    pub fn load_flag_or(&self, name: &str, default: &str) -> String {
        self.load_flag(name).unwrap_or_else(|_| default.to_string())
    }

    /// Environment variable holding a flag
    pub fn var_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name.to_uppercase())
    }

    fn collect(&self, vars: impl Iterator<Item = (String, String)>) -> BTreeMap<String, String> {
        let prefix = format!("{}_", self.prefix);
        let mut flags = BTreeMap::new();

        for (key, value) in vars {
            let Some(name) = key.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            flags.insert(name.to_lowercase(), value);
        }

        flags
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
