//! Rule Evaluation
//!
//! A non-null `enabled` override decides the outcome on its own. Otherwise
//! every matching criterion is checked independently and any single match
//! enables the flag.

use tracing::trace;

use crate::bucket::{DEFAULT_BUCKETS, bucket_for, scaled_percentage};
use crate::flag::{EvaluationContext, FlagRule};

/// Why a rule evaluated the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// `enabled` was set and short-circuited everything else
    HardOverride(bool),
    /// The user is listed in `users`
    User,
    /// The group is listed in `groups`
    Group,
    /// The URL context matches `url`
    Url,
    /// Internal caller and the rule is on for internal callers
    Internal,
    /// Admin caller and the rule is on for admins
    Admin,
    /// The user's bucket falls inside the percentage rollout
    PercentLoggedIn,
}

/// Evaluate a rule for a request context.
///
/// # Examples
///
/// ```
/// use flagstaff_features::{EvaluationContext, FlagRule, evaluate::evaluate};
///
/// let rule = FlagRule::new().with_users(["MReynolds"]);
/// let context = EvaluationContext::new().with_user("mreynolds");
/// assert!(evaluate(&rule, &context));
/// ```
pub fn evaluate(rule: &FlagRule, context: &EvaluationContext) -> bool {
    if let Some(enabled) = rule.enabled {
        trace!(enabled, "Flag decided by hard override");
        return enabled;
    }

    let enabled = !matched_clauses(rule, context).is_empty();
    trace!(user = %context.user(), enabled, "Flag evaluated");
    enabled
}

/// Collect every criterion that matched.
///
/// With a hard override the result is exactly `[HardOverride(value)]`.
pub fn matched_clauses(rule: &FlagRule, context: &EvaluationContext) -> Vec<MatchReason> {
    if let Some(enabled) = rule.enabled {
        return vec![MatchReason::HardOverride(enabled)];
    }

    let mut reasons = Vec::new();

    if contains_ignore_case(&rule.users, context.user()) {
        reasons.push(MatchReason::User);
    }

    if contains_ignore_case(&rule.groups, context.group()) {
        reasons.push(MatchReason::Group);
    }

    if url_matches(&rule.url, context.url()) {
        reasons.push(MatchReason::Url);
    }

    if context.is_internal() && rule.internal {
        reasons.push(MatchReason::Internal);
    }

    if context.is_admin() && rule.admin {
        reasons.push(MatchReason::Admin);
    }

    if in_rollout(rule.percent_logged_in, context.user()) {
        reasons.push(MatchReason::PercentLoggedIn);
    }

    reasons
}

fn contains_ignore_case(values: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    values.iter().any(|v| v.to_lowercase() == needle)
}

// Only an empty `rule_url` disables the clause; a whitespace-only one matches
// a blank caller URL.
fn url_matches(rule_url: &str, url: &str) -> bool {
    !rule_url.is_empty() && rule_url.trim() == url.trim()
}

// Thresholds above 100 always pass.
fn in_rollout(percent_logged_in: i64, user: &str) -> bool {
    if percent_logged_in <= 0 {
        return false;
    }

    let scaled = scaled_percentage(bucket_for(user), DEFAULT_BUCKETS);
    i64::from(scaled) < percent_logged_in
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serenity_context() -> EvaluationContext {
        // rtam is in bucket 97 of 1000, a scaled percentage of 9
        EvaluationContext::new()
            .with_user("rtam")
            .with_group("Browncoats")
            .with_url("lassiter")
            .internal(true)
            .admin(true)
    }

    #[test]
    fn test_rule_table() {
        let context = serenity_context();

        let cases = vec![
            (FlagRule::enabled(true), true),
            (FlagRule::disabled(), false),
            (FlagRule::new().for_admins(), true),
            (FlagRule::new().for_internal(), true),
            (FlagRule::new().with_users(["rtam", "MReynolds"]), true),
            (
                FlagRule::new().with_users(["sometestguy", "someothertestguy"]),
                false,
            ),
            (
                FlagRule::new().with_groups(["federation", "someothergroup"]),
                false,
            ),
            (
                FlagRule::new().with_groups(["travelswithjayne", "browncoats"]),
                true,
            ),
            (FlagRule::new().with_percent_logged_in(15), true),
            (FlagRule::new().with_percent_logged_in(5), false),
            (
                FlagRule::new()
                    .with_users(["rtam", "MReynolds"])
                    .with_groups(["federation", "someothergroup"]),
                true,
            ),
            (
                FlagRule::enabled(true)
                    .with_users(["sometestguy", "someothertestguy"])
                    .with_groups(["federation", "someothergroup"]),
                true,
            ),
            (
                FlagRule::disabled()
                    .with_users(["rtam"])
                    .with_groups(["Browncoats"]),
                false,
            ),
            (
                FlagRule::new()
                    .with_url("lassiter")
                    .with_users(["someothertestguy"])
                    .with_groups(["Federation"]),
                true,
            ),
            (
                FlagRule::new()
                    .with_url("jaynestown")
                    .with_users(["someothertestguy"])
                    .with_groups(["Federation"]),
                false,
            ),
        ];

        for (rule, expected) in cases {
            assert_eq!(evaluate(&rule, &context), expected, "rule {:?}", rule);
        }
    }

    #[test]
    fn test_no_matching_criteria() {
        let context = EvaluationContext::new()
            .with_user("testuser")
            .with_group("testgroup");

        let rule = FlagRule::new()
            .with_users(["someotheruser", "anotheruser"])
            .with_groups(["someothergroup"])
            .for_admins()
            .for_internal();

        assert!(!evaluate(&rule, &context));
    }

    #[test]
    fn test_default_rule_is_disabled() {
        assert!(!evaluate(&FlagRule::new(), &EvaluationContext::new()));
        assert!(!evaluate(&FlagRule::new(), &serenity_context()));
    }

    #[test]
    fn test_case_insensitive_membership() {
        let rule = FlagRule::new().with_users(["MReynolds"]);
        let context = EvaluationContext::new().with_user("mreynolds");
        assert!(evaluate(&rule, &context));

        let rule = FlagRule::new().with_groups(["browncoats"]);
        let context = EvaluationContext::new().with_group("BROWNCOATS");
        assert!(evaluate(&rule, &context));
    }

    #[test]
    fn test_url_requires_exact_trimmed_match() {
        let rule = FlagRule::new().with_url("  /beta/checkout ");

        let context = EvaluationContext::new().with_url("/beta/checkout");
        assert!(evaluate(&rule, &context));

        let context = EvaluationContext::new().with_url("/beta/checkout/step-2");
        assert!(!evaluate(&rule, &context));

        let context = EvaluationContext::new().with_url("/BETA/checkout");
        assert!(!evaluate(&rule, &context));
    }

    #[test]
    fn test_empty_url_never_matches() {
        let rule = FlagRule::new();
        let context = EvaluationContext::new().with_url("");
        assert!(!evaluate(&rule, &context));

        let rule = FlagRule::new().with_url("");
        let context = EvaluationContext::new().with_url("   ");
        assert!(!evaluate(&rule, &context));
    }

    #[test]
    fn test_whitespace_url_matches_blank_caller_url() {
        let rule = FlagRule::new().with_url("   ");

        assert!(evaluate(&rule, &EvaluationContext::new()));
        assert!(evaluate(&rule, &EvaluationContext::new().with_url(" ")));
        assert!(!evaluate(&rule, &EvaluationContext::new().with_url("/beta")));
        assert_eq!(
            matched_clauses(&rule, &EvaluationContext::new()),
            vec![MatchReason::Url]
        );
    }

    #[test]
    fn test_internal_and_admin_need_both_sides() {
        let rule = FlagRule::new().for_internal().for_admins();
        assert!(!evaluate(&rule, &EvaluationContext::new()));

        let rule = FlagRule::new();
        let context = EvaluationContext::new().internal(true).admin(true);
        assert!(!evaluate(&rule, &context));
    }

    #[test]
    fn test_percentage_thresholds() {
        // zwashburne is in bucket 990, a scaled percentage of 99
        let context = EvaluationContext::new().with_user("zwashburne");

        assert!(!evaluate(&FlagRule::new().with_percent_logged_in(99), &context));
        assert!(evaluate(&FlagRule::new().with_percent_logged_in(100), &context));
        assert!(evaluate(&FlagRule::new().with_percent_logged_in(150), &context));
        assert!(!evaluate(&FlagRule::new().with_percent_logged_in(-5), &context));
    }

    #[test]
    fn test_anonymous_user_in_first_bucket() {
        let context = EvaluationContext::new();
        assert!(evaluate(&FlagRule::new().with_percent_logged_in(1), &context));
    }

    #[test]
    fn test_hard_override_wins() {
        let context = serenity_context();
        let rule = FlagRule::disabled()
            .with_users(["rtam"])
            .with_url("lassiter")
            .for_admins()
            .for_internal()
            .with_percent_logged_in(100);

        assert!(!evaluate(&rule, &context));
        assert_eq!(
            matched_clauses(&rule, &context),
            vec![MatchReason::HardOverride(false)]
        );
    }

    #[test]
    fn test_matched_clauses_reports_every_match() {
        let context = serenity_context();
        let rule = FlagRule::new()
            .with_users(["RTAM"])
            .with_groups(["browncoats"])
            .with_url("lassiter")
            .for_internal()
            .for_admins()
            .with_percent_logged_in(15);

        assert_eq!(
            matched_clauses(&rule, &context),
            vec![
                MatchReason::User,
                MatchReason::Group,
                MatchReason::Url,
                MatchReason::Internal,
                MatchReason::Admin,
                MatchReason::PercentLoggedIn,
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let context = serenity_context();
        let rule = FlagRule::new().with_percent_logged_in(15);
        let first = evaluate(&rule, &context);
        for _ in 0..5 {
            assert_eq!(evaluate(&rule, &context), first);
        }
    }
}
