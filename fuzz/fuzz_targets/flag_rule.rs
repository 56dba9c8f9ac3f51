//! Fuzz target for flag rule parsing and evaluation.
//!
//! Arbitrary configuration strings and request contexts must never panic,
//! and every result must stay inside its documented range.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flagstaff_features::{
    EvaluationContext, FlagRule, NO_VARIANT, evaluate, get_bucket, select_variant,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    raw_rule: String,
    user: String,
    group: String,
    url: String,
    internal: bool,
    admin: bool,
    buckets: u32,
}

fuzz_target!(|data: FuzzInput| {
    let rule = FlagRule::parse(&data.raw_rule);

    let context = EvaluationContext::new()
        .with_user(data.user.as_str())
        .with_group(data.group.as_str())
        .with_url(data.url.as_str())
        .internal(data.internal)
        .admin(data.admin);

    let enabled = evaluate(&rule, &context);
    assert_eq!(enabled, evaluate(&rule, &context));
    if let Some(forced) = rule.enabled {
        assert_eq!(enabled, forced);
    }

    let variant = select_variant(&rule, &data.user);
    if rule.variants.is_empty() {
        assert_eq!(variant, NO_VARIANT);
    }

    if data.buckets > 0 {
        assert!(get_bucket(&data.user, data.buckets) < data.buckets);
    }

    // Serialized rules parse back to themselves
    if let Ok(json) = rule.to_json() {
        assert_eq!(FlagRule::parse(&json), rule);
    }
});
