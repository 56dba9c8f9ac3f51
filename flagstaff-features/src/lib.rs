//! Feature Flags for Flagstaff
//!
//! Deterministic feature flag evaluation: hard overrides, user and group
//! targeting, URL switches, internal/admin audiences, percentage rollout, and
//! multivariant experiments with reserved control groups.
//!
//! Every operation here is a pure function of its inputs. Nothing is cached
//! and nothing fails visibly: malformed configuration becomes the default
//! (disabled) rule, and bucketing falls back to bucket `0`.
//!
//! # Features
//!
//! - 🚦 **Hard overrides** - `enabled: true|false` short-circuits every other check
//! - 🎯 **Targeting** - Case-insensitive user and group lists, URL and audience switches
//! - 🎲 **Gradual Rollout** - Stable FNV-1a bucketing into 1000 buckets
//! - 📊 **Experiments** - Round-robin variant assignment with `control_1` / `control_2`
//!
//! # Quick Start
//!
//! ```
//! use flagstaff_features::*;
//!
//! let rule = FlagRule::parse(r#"{"users": ["MReynolds"], "groups": ["browncoats"]}"#);
//!
//! let context = EvaluationContext::new()
//!     .with_user("mreynolds")
//!     .with_group("federation");
//!
//! assert!(rule.is_enabled(&context));
//! ```
//!
//! # Shorthand Configuration
//!
//! ```
//! use flagstaff_features::*;
//!
//! assert_eq!(FlagRule::parse("on"), FlagRule::enabled(true));
//! assert_eq!(FlagRule::parse("off"), FlagRule::default());
//! ```
//!
//! # Gradual Rollout
//!
//! ```
//! use flagstaff_features::*;
//!
//! // rtam lands in bucket 97 of 1000, i.e. the 9% mark
//! let context = EvaluationContext::new().with_user("rtam");
//!
//! assert!(FlagRule::new().with_percent_logged_in(15).is_enabled(&context));
//! assert!(!FlagRule::new().with_percent_logged_in(5).is_enabled(&context));
//! ```
//!
//! # A/B Testing
//!
//! ```
//! use flagstaff_features::*;
//!
//! let rule = FlagRule::enabled(true)
//!     .with_variant("One", 15.0)
//!     .with_variant("Two", 15.0)
//!     .with_variant("Three", 15.0);
//!
//! assert_eq!(rule.variant_for("rtam"), "One");
//! assert_eq!(rule.variant_for("testuser"), "control_2");
//! assert_eq!(rule.variant_for("mreynolds"), NO_VARIANT);
//! ```

pub mod bucket;
pub mod error;
pub mod evaluate;
pub mod flag;
pub mod parse;
pub mod variant;

pub use bucket::{DEFAULT_BUCKETS, bucket_for, get_bucket};
pub use error::{FlagError, FlagResult};
pub use evaluate::{MatchReason, evaluate, matched_clauses};
pub use flag::{EvaluationContext, FlagRule, FlagVariant};
pub use parse::is_enabling_string;
pub use variant::{
    CONTROL_1, CONTROL_2, NO_VARIANT, VariantAssignment, assign_variant, select_variant,
};
