//! Variant Selection
//!
//! Splits the bucket space round-robin between the named variants of a rule
//! plus two reserved control groups, then admits the user into their
//! candidate variant only when their bucket is under a threshold scaled from
//! the variant's percentage.
//!
//! The variant table always starts with `control_1` and `control_2` at 10%
//! each. Rule variants are applied in order; a variant reusing an existing
//! name (including a control name) replaces its percentage but keeps its
//! position in the table.

use indexmap::IndexMap;
use tracing::warn;

use crate::bucket::{DEFAULT_BUCKETS, bucket_for};
use crate::flag::FlagRule;

/// Returned when no variant is assigned
pub const NO_VARIANT: &str = "None";

/// First reserved control group
pub const CONTROL_1: &str = "control_1";

/// Second reserved control group
pub const CONTROL_2: &str = "control_2";

/// Default share of each control group, in percent
pub const CONTROL_PERCENTAGE: f64 = 10.0;

/// Outcome of variant selection for one user
#[derive(Debug, Clone, PartialEq)]
pub struct VariantAssignment {
    /// Variant the user's bucket maps to
    pub candidate: String,

    /// Configured percentage of the candidate
    pub percentage: f64,

    /// The user's bucket (out of [`DEFAULT_BUCKETS`])
    pub bucket: u32,

    /// Number of entries in the variant table, controls included
    pub variant_count: usize,

    /// Buckets below this value are admitted into the candidate
    pub threshold: f64,

    /// Whether the user was admitted into the candidate
    pub included: bool,

    /// The candidate asks for more traffic than its round-robin share
    pub over_allocated: bool,
}

impl VariantAssignment {
    /// Assigned variant name, or [`NO_VARIANT`]
    pub fn name(&self) -> &str {
        if self.included {
            &self.candidate
        } else {
            NO_VARIANT
        }
    }

    /// Assigned variant name, if any
    pub fn variant(&self) -> Option<&str> {
        self.included.then_some(self.candidate.as_str())
    }
}

/// Build the ordered variant table for a rule, controls first.
pub fn variant_table(rule: &FlagRule) -> IndexMap<&str, f64> {
    let mut table = IndexMap::with_capacity(rule.variants.len() + 2);
    table.insert(CONTROL_1, CONTROL_PERCENTAGE);
    table.insert(CONTROL_2, CONTROL_PERCENTAGE);

    for variant in &rule.variants {
        table.insert(variant.name.as_str(), variant.percentage);
    }

    table
}

/// Run variant selection and keep the intermediate values.
///
/// Returns `None` when the rule defines no variants.
pub fn assign_variant(rule: &FlagRule, user: &str) -> Option<VariantAssignment> {
    if rule.variants.is_empty() {
        return None;
    }

    let table = variant_table(rule);
    let variant_count = table.len();
    let bucket = bucket_for(user);

    let (candidate, percentage) = table
        .get_index(bucket as usize % variant_count)
        .map(|(name, percentage)| (name.to_string(), *percentage))?;

    let variant_fraction = percentage / 100.0;
    let variant_cap = 1.0 / variant_count as f64;
    let over_allocated = variant_fraction > variant_cap;
    if over_allocated {
        warn!(
            variant = %candidate,
            percentage,
            variants = variant_count,
            "Variant percentage exceeds its round-robin share and cannot be honored exactly"
        );
    }

    let bucket_multiplier = f64::from(DEFAULT_BUCKETS / 100);
    let threshold = percentage * variant_count as f64 * bucket_multiplier;
    let included = f64::from(bucket) < threshold;

    Some(VariantAssignment {
        candidate,
        percentage,
        bucket,
        variant_count,
        threshold,
        included,
        over_allocated,
    })
}

/// Select the variant for a user, or [`NO_VARIANT`].
///
/// # Examples
///
/// ```
/// use flagstaff_features::{FlagRule, variant::select_variant};
///
/// let rule = FlagRule::new()
///     .with_variant("One", 15.0)
///     .with_variant("Two", 15.0)
///     .with_variant("Three", 15.0);
///
/// assert_eq!(select_variant(&rule, "dbook"), "Two");
/// assert_eq!(select_variant(&FlagRule::new(), "dbook"), "None");
/// ```
pub fn select_variant(rule: &FlagRule, user: &str) -> String {
    assign_variant(rule, user)
        .map(|assignment| assignment.name().to_string())
        .unwrap_or_else(|| NO_VARIANT.to_string())
}
