//! Flag configuration parsing and serialization
//!
//! A raw configuration string is either a shorthand that switches the flag on
//! for everyone (`"on"`, `"true"`, `"{enabled}"`, ...) or a JSON rule
//! document. Parsing never fails visibly: anything that is neither yields the
//! default rule.

use std::str::FromStr;

use tracing::debug;

use crate::error::{FlagError, FlagResult};
use crate::flag::FlagRule;

const ENABLING_STRINGS: [&str; 4] = ["enabled", "enable", "on", "true"];

/// Check whether a raw configuration string is shorthand for "enabled".
///
/// Every character outside `[A-Za-z0-9]` is dropped before a case-sensitive
/// comparison, so `{"true"}` counts while `TRUE` does not.
///
/// # Examples
///
/// ```
/// use flagstaff_features::parse::is_enabling_string;
///
/// assert!(is_enabling_string("on"));
/// assert!(is_enabling_string("{enabled}"));
/// assert!(!is_enabling_string("off"));
/// ```
pub fn is_enabling_string(raw: &str) -> bool {
    let cleaned: String = raw.chars().filter(char::is_ascii_alphanumeric).collect();
    ENABLING_STRINGS.contains(&cleaned.as_str())
}

impl FlagRule {
    /// Parse a raw configuration string, falling back to the default rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use flagstaff_features::FlagRule;
    ///
    /// assert_eq!(FlagRule::parse("on"), FlagRule::enabled(true));
    /// assert_eq!(FlagRule::parse("{\"percent_loggedin\": 5}").percent_logged_in, 5);
    /// assert_eq!(FlagRule::parse("not a rule"), FlagRule::default());
    /// ```
    pub fn parse(raw: &str) -> Self {
        match Self::try_parse(raw) {
            Ok(rule) => rule,
            Err(err) => {
                debug!(error = %err, "Using default flag rule");
                Self::default()
            }
        }
    }

    /// Parse a configuration value that may be absent
    pub fn parse_optional(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    /// Parse a raw configuration string, reporting malformed input.
    ///
    /// Blank input is not an error and yields the default rule.
    pub fn try_parse(raw: &str) -> FlagResult<Self> {
        if is_enabling_string(raw) {
            return Ok(Self::enabled(true));
        }

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize to JSON, omitting every field left at its default
    pub fn to_json(&self) -> FlagResult<String> {
        serde_json::to_string(self).map_err(|e| FlagError::serialize(e.to_string()))
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> FlagResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FlagError::serialize(e.to_string()))
    }
}

impl FromStr for FlagRule {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}
