//! Property-based tests for decision and matching invariants
//!
//! Uses proptest to check the combining algorithm and pattern laws across
//! random policy sets and inputs

use proptest::prelude::*;
use std::sync::Arc;
use warden_rs::core::matcher::wildcard;
use warden_rs::{
    Decision, Engine, Matcher, MemoryPolicyStore, NoopAuditor, Policy, RegexMatcher, Request,
    Subject, WildcardMatcher,
};

fn engine_with(effects: &[bool]) -> Engine {
    let engine = Engine::builder(Arc::new(MemoryPolicyStore::new()))
        .auditor(Arc::new(NoopAuditor))
        .build();
    for (i, deny) in effects.iter().enumerate() {
        let builder = Policy::builder(format!("p{:02}", i)).subject(Subject::new("svc-*"));
        let builder = if *deny { builder.deny() } else { builder.allow() };
        engine.grant(builder.build().unwrap()).unwrap();
    }
    engine
}

fn request(subject: &str) -> Request {
    Request::builder()
        .action("read")
        .resource("db")
        .scope("prod")
        .subject(subject)
        .build()
}

proptest! {
    #[test]
    fn prop_any_matching_deny_wins(effects in prop::collection::vec(any::<bool>(), 1..12)) {
        let engine = engine_with(&effects);
        let decision = engine.decide(&request("svc-a")).unwrap();

        match effects.iter().position(|deny| *deny) {
            // Policies are visited in id order, so the first deny is reported
            Some(i) => {
                prop_assert_eq!(
                    decision,
                    Decision::DeniedExplicit { policy_id: format!("p{:02}", i) }
                );
            }
            None => {
                prop_assert_eq!(decision, Decision::Allowed);
            }
        }
    }

    #[test]
    fn prop_unmatched_subject_is_implicit(effects in prop::collection::vec(any::<bool>(), 0..8)) {
        let engine = engine_with(&effects);
        let decision = engine.decide(&request("user-a")).unwrap();
        prop_assert_eq!(decision, Decision::DeniedImplicit);
    }

    #[test]
    fn prop_absent_list_matches_everything(value in "[a-zA-Z0-9:_./-]{0,24}") {
        for matcher in [&WildcardMatcher as &dyn Matcher, &RegexMatcher::new()] {
            prop_assert!(matcher.matches(None, &value).unwrap());
            prop_assert!(!matcher.matches(Some(&[][..]), &value).unwrap());
        }
    }

    #[test]
    fn prop_star_matches_everything(value in "\\PC{0,24}") {
        prop_assert!(wildcard("*", &value));
    }

    #[test]
    fn prop_literal_matches_only_itself(
        a in "[a-z:._-]{0,16}",
        b in "[a-z:._-]{0,16}",
    ) {
        prop_assert!(wildcard(&a, &a));
        prop_assert_eq!(wildcard(&a, &b), a == b);
    }

    #[test]
    fn prop_prefix_star(prefix in "[a-z:]{0,8}", rest in "[a-z:]{0,8}") {
        let pattern = format!("{}*", prefix);
        let candidate = format!("{}{}", prefix, rest);
        prop_assert!(wildcard(&pattern, &candidate));
    }

    #[test]
    fn prop_question_mark_is_one_char(value in "[a-z]{0,12}") {
        let pattern = "?".repeat(value.chars().count());
        prop_assert!(wildcard(&pattern, &value));
        let longer = format!("{}?", pattern);
        prop_assert!(!wildcard(&longer, &value));
    }

    #[test]
    fn prop_regex_literal_parts_are_escaped(
        literal in "[a-z.+()|^$\\[\\]{}]{0,10}",
        digits in "[0-9]{1,6}",
    ) {
        let matcher = RegexMatcher::new();
        let pattern = [format!("{}<[0-9]+>", literal)];
        let hit = format!("{}{}", literal, digits);
        prop_assert!(matcher.matches(Some(&pattern[..]), &hit).unwrap());

        // A request carrying the raw fragment never matches it
        let raw = format!("{}[0-9]+", literal);
        prop_assert!(!matcher.matches(Some(&pattern[..]), &raw).unwrap());
    }
}
