//! Property-based tests using proptest
//!
//! Random rule trees over a small alphabet are matched against random
//! inputs, and the results are checked against properties that must hold
//! for every rule and every window.

use nfagram::prelude::*;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn leaf() -> impl Strategy<Value = Rule> {
    prop_oneof![
        "[ab]{0,3}".prop_map(|s| lit(&s)),
        Just(one_of("ab")),
        Just(unit('a')),
        Just(any()),
    ]
}

fn rule_tree() -> impl Strategy<Value = Rule> {
    leaf().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| seq(v)),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|v| choice(v).unwrap()),
            inner.clone().prop_map(opt),
            (inner.clone(), 0usize..3, 0usize..3)
                .prop_map(|(r, a, b)| rep(r, a.min(b), Some(a.max(b))).unwrap()),
            inner.clone().prop_map(|r| r.many()),
            ("[xyz]", inner).prop_map(|(n, r)| named(&n, r).unwrap()),
        ]
    })
}

fn input() -> impl Strategy<Value = Vec<char>> {
    prop::collection::vec(prop_oneof![Just('a'), Just('b'), Just('c')], 0..12)
}

// =============================================================================
// Result Properties
// =============================================================================

proptest! {
    /// Consumed prefix followed by the remainder is exactly the input
    #[test]
    fn test_matched_and_remain_reconstruct_input(rule in rule_tree(), buf in input()) {
        let window = StringWindow::new(&buf);
        let result = rule.at_start_of(window);

        if !result.fail {
            let matched = result.matched.unwrap();
            let remain = result.remain.unwrap();
            prop_assert_eq!(matched.start(), window.start());
            prop_assert_eq!(matched.end(), remain.start());
            prop_assert_eq!(remain.end(), window.end());

            let mut rebuilt: Vec<char> = matched.iter().collect();
            rebuilt.extend(remain.iter());
            prop_assert_eq!(rebuilt, buf.clone());
        } else {
            prop_assert!(result.remain.is_none());
            prop_assert!(result.result.is_none());
        }
    }

    /// A successful match length always lies within the rule's bounds
    #[test]
    fn test_consumed_within_bounds(rule in rule_tree(), buf in input()) {
        let result = rule.at_start_of(StringWindow::new(&buf));
        if !result.fail {
            prop_assert!(rule.bounds().contains(result.consumed()));
        }
    }

    /// Capture values are sub-windows of the match, in input order
    #[test]
    fn test_captures_nest_inside_match(rule in rule_tree(), buf in input()) {
        let result = rule.at_start_of(StringWindow::new(&buf));
        if let (Some(matched), Some(detail)) = (result.matched, result.result.as_ref()) {
            let mut stack = vec![detail];
            while let Some(node) = stack.pop() {
                prop_assert!(node.value.start() >= matched.start());
                prop_assert!(node.value.end() <= matched.end());
                for pair in node.components.windows(2) {
                    prop_assert!(pair[0].value.end() <= pair[1].value.start());
                }
                stack.extend(node.components.iter());
            }
        }
    }

    /// First-match never succeeds where leftmost-longest fails, nor runs longer
    #[test]
    fn test_first_match_is_never_longer(rule in rule_tree(), buf in input()) {
        let window = StringWindow::new(&buf);
        let longest = rule.at_start_of(window);
        let config = MatchConfig::new().with_policy(MatchPolicy::FirstMatch);
        let first = rule.at_start_of_with(window, &config).unwrap();

        prop_assert_eq!(longest.fail, first.fail);
        prop_assert!(first.consumed() <= longest.consumed());
    }

    /// A whole-window match is a successful prefix match of the full length
    #[test]
    fn test_matches_whole_agrees_with_prefix(rule in rule_tree(), buf in input()) {
        let window = StringWindow::new(&buf);
        if rule.matches_whole(window) {
            prop_assert!(rule.is_match(window));
        }
        let result = rule.at_start_of(window);
        if !result.fail && result.consumed() == buf.len() {
            prop_assert!(rule.matches_whole(window));
        }
    }
}

// =============================================================================
// Literal Properties
// =============================================================================

proptest! {
    /// A literal matches itself as a prefix of any input
    #[test]
    fn test_literal_prefix(prefix in "[a-z0-9 ]{0,16}", rest in "[a-z0-9 ]{0,16}") {
        let text = format!("{}{}", prefix, rest);
        let buf: Vec<char> = text.chars().collect();
        let result = lit(&prefix).at_start_of(StringWindow::new(&buf));

        prop_assert!(!result.fail);
        prop_assert_eq!(result.consumed(), prefix.chars().count());
        prop_assert_eq!(result.remain.unwrap().to_string(), rest);
    }

    /// Case-insensitive literals ignore ASCII case
    #[test]
    fn test_literal_nocase(word in "[a-z]{1,12}") {
        let upper: Vec<char> = word.to_uppercase().chars().collect();
        prop_assert!(lit_nocase(&word).matches_whole(StringWindow::new(&upper)));
    }
}

// =============================================================================
// Description Properties
// =============================================================================

proptest! {
    /// Descriptions are deterministic and unaffected by matching
    #[test]
    fn test_descr_is_stable(rule in rule_tree(), buf in input()) {
        let before = rule.descr(false);
        let hex = rule.descr(true);
        let _ = rule.at_start_of(StringWindow::new(&buf));

        prop_assert_eq!(rule.descr(false), before);
        prop_assert_eq!(rule.descr(true), hex);
    }

    /// JSON round trip keeps both the description and the behavior
    #[test]
    fn test_json_roundtrip(rule in rule_tree(), buf in input()) {
        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();
        let window = StringWindow::new(&buf);

        prop_assert_eq!(back.descr(false), rule.descr(false));
        prop_assert_eq!(back.at_start_of(window), rule.at_start_of(window));
    }
}
