//! Feature Flag Core
//!
//! Defines the flag rule, its experiment variants, and the request context
//! a rule is evaluated against.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::evaluate;
use crate::variant;

/// Feature flag rule
///
/// A materialized rule never holds null collections: every field has a
/// concrete default, and JSON `null` for any field decodes to that default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagRule {
    /// Hard override for everyone. `None` defers to the detailed rules below.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Percentage of identified users the flag is rolled out to (0 = no rollout)
    #[serde(
        rename = "percent_loggedin",
        default,
        deserialize_with = "saturating_percent",
        skip_serializing_if = "is_zero"
    )]
    pub percent_logged_in: i64,

    /// The winning variant name
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub variant_name: String,

    /// Enabled for admin callers
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub admin: bool,

    /// Enabled for internal callers
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub internal: bool,

    /// Enabled when the caller's URL context matches exactly (after trimming)
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub url: String,

    /// Users the flag is enabled for (case-insensitive)
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub users: Vec<String>,

    /// Groups the flag is enabled for (case-insensitive)
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub groups: Vec<String>,

    /// Multivariant experiment layered on top of the enabled decision
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub variants: Vec<FlagVariant>,
}

impl FlagRule {
    /// Create a rule with every field at its default.
    ///
    /// The default rule has no override and no matching criteria, so it
    /// evaluates to disabled for every context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule hard-enabled for everyone
    ///
    /// # Examples
    ///
    /// ```
    /// use flagstaff_features::{EvaluationContext, FlagRule};
    ///
    /// let rule = FlagRule::enabled(true);
    /// assert!(rule.is_enabled(&EvaluationContext::new()));
    /// ```
    pub fn enabled(value: bool) -> Self {
        Self {
            enabled: Some(value),
            ..Self::default()
        }
    }

    /// Create a rule hard-disabled for everyone (kill switch)
    pub fn disabled() -> Self {
        Self::enabled(false)
    }

    /// Add users the flag is enabled for
    pub fn with_users(mut self, users: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.users.extend(users.into_iter().map(Into::into));
        self
    }

    /// Add groups the flag is enabled for
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Set the URL the flag is enabled at
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the percentage rollout threshold
    pub fn with_percent_logged_in(mut self, percent: i64) -> Self {
        self.percent_logged_in = percent;
        self
    }

    /// Enable for admin callers
    pub fn for_admins(mut self) -> Self {
        self.admin = true;
        self
    }

    /// Enable for internal callers
    pub fn for_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Append an experiment variant
    pub fn with_variant(mut self, name: impl Into<String>, percentage: f64) -> Self {
        self.variants.push(FlagVariant::new(name, percentage));
        self
    }

    /// Set the winning variant name
    pub fn with_variant_name(mut self, name: impl Into<String>) -> Self {
        self.variant_name = name.into();
        self
    }

    /// Whether the rule defines an experiment
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Evaluate the rule for a request context
    pub fn is_enabled(&self, context: &EvaluationContext) -> bool {
        evaluate::evaluate(self, context)
    }

    /// Select the experiment variant for a user, or [`variant::NO_VARIANT`]
    pub fn variant_for(&self, user: &str) -> String {
        variant::select_variant(self, user)
    }
}

/// Named branch of a multivariant experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagVariant {
    /// Variant name, unique within a rule
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Target share of traffic as a percent value (0-100, not a fraction)
    #[serde(default, deserialize_with = "null_as_default")]
    pub percentage: f64,
}

impl FlagVariant {
    /// Create a variant with a share given as a percent value
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

/// Evaluation context (who is asking, and from where)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    user: String,
    group: String,
    url: String,
    internal: bool,
    admin: bool,
}

impl EvaluationContext {
    /// Create an anonymous context with no group, URL, or privileges
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user identity (also the bucketing key)
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the caller's group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the URL context of the request
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Mark the request as internal
    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Mark the caller as an admin
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// User identity, empty for anonymous callers
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Caller's group
    pub fn group(&self) -> &str {
        &self.group
    }

    /// URL context
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the request is internal
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Whether the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Integers beyond i64 clamp and fractions truncate toward zero, so an
// oversized threshold never costs the rule its other fields.
fn saturating_percent<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(0);
    };

    Ok(number
        .as_i64()
        .or_else(|| number.as_u64().map(|_| i64::MAX))
        .or_else(|| number.as_f64().map(|f| f as i64))
        .unwrap_or_default())
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule() {
        let rule = FlagRule::new();
        assert_eq!(rule.enabled, None);
        assert_eq!(rule.percent_logged_in, 0);
        assert!(rule.variant_name.is_empty());
        assert!(rule.url.is_empty());
        assert!(rule.users.is_empty());
        assert!(rule.groups.is_empty());
        assert!(rule.variants.is_empty());
        assert!(!rule.admin);
        assert!(!rule.internal);
    }

    #[test]
    fn test_builder() {
        let rule = FlagRule::new()
            .with_users(["iserra", "MReynolds"])
            .with_groups(vec!["browncoats".to_string()])
            .with_url("lassiter")
            .with_percent_logged_in(15)
            .for_admins()
            .for_internal()
            .with_variant("One", 15.0)
            .with_variant_name("testing");

        assert_eq!(rule.users, vec!["iserra", "MReynolds"]);
        assert_eq!(rule.groups, vec!["browncoats"]);
        assert_eq!(rule.url, "lassiter");
        assert_eq!(rule.percent_logged_in, 15);
        assert!(rule.admin);
        assert!(rule.internal);
        assert_eq!(rule.variants, vec![FlagVariant::new("One", 15.0)]);
        assert_eq!(rule.variant_name, "testing");
        assert!(rule.has_variants());
    }

    #[test]
    fn test_null_fields_materialize_as_defaults() {
        let rule: FlagRule = serde_json::from_str(
            r#"{"enabled": null, "percent_loggedin": null, "users": null, "groups": null,
                "variants": null, "url": null, "variant_name": null, "admin": null}"#,
        )
        .unwrap();

        assert_eq!(rule, FlagRule::default());
    }

    #[test]
    fn test_deserialize_full_rule() {
        let rule: FlagRule = serde_json::from_str(
            r#"{"enabled": false, "percent_loggedin": 25, "variant_name": "blue",
                "admin": true, "internal": true, "url": " /beta ",
                "users": ["a"], "groups": ["g"],
                "variants": [{"name": "One", "percentage": 12.5}]}"#,
        )
        .unwrap();

        assert_eq!(rule.enabled, Some(false));
        assert_eq!(rule.percent_logged_in, 25);
        assert_eq!(rule.variant_name, "blue");
        assert!(rule.admin && rule.internal);
        assert_eq!(rule.url, " /beta ");
        assert_eq!(rule.variants[0].percentage, 12.5);
    }

    #[test]
    fn test_serialize_omits_defaults() {
        let json = serde_json::to_string(&FlagRule::default()).unwrap();
        assert_eq!(json, "{}");

        let json = serde_json::to_string(&FlagRule::disabled()).unwrap();
        assert_eq!(json, r#"{"enabled":false}"#);

        let json = serde_json::to_string(&FlagRule::new().with_percent_logged_in(5)).unwrap();
        assert_eq!(json, r#"{"percent_loggedin":5}"#);
    }

    #[test]
    fn test_oversized_percent_keeps_other_fields() {
        let rule: FlagRule = serde_json::from_str(
            r#"{"percent_loggedin": 3000000000, "users": ["iserra"], "admin": true}"#,
        )
        .unwrap();
        assert_eq!(rule.percent_logged_in, 3_000_000_000);
        assert_eq!(rule.users, vec!["iserra"]);
        assert!(rule.admin);

        let rule: FlagRule =
            serde_json::from_str(r#"{"percent_loggedin": 99999999999999999999, "internal": true}"#)
                .unwrap();
        assert_eq!(rule.percent_logged_in, i64::MAX);
        assert!(rule.internal);

        let rule: FlagRule = serde_json::from_str(r#"{"percent_loggedin": -1e30}"#).unwrap();
        assert_eq!(rule.percent_logged_in, i64::MIN);

        let rule: FlagRule = serde_json::from_str(r#"{"percent_loggedin": 12.9}"#).unwrap();
        assert_eq!(rule.percent_logged_in, 12);
    }

    #[test]
    fn test_context_builder() {
        let context = EvaluationContext::new()
            .with_user("iserra")
            .with_group("Browncoats")
            .with_url("lassiter")
            .internal(true)
            .admin(true);

        assert_eq!(context.user(), "iserra");
        assert_eq!(context.group(), "Browncoats");
        assert_eq!(context.url(), "lassiter");
        assert!(context.is_internal());
        assert!(context.is_admin());

        let empty = EvaluationContext::new();
        assert_eq!(empty.user(), "");
        assert!(!empty.is_admin());
    }
}
