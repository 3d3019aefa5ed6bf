//! Grammar DSL
//!
//! Free functions for the leaves and n-ary combinators, plus chaining
//! methods and operators on [`Rule`]:
//!
//! - `a >> b` or `a.then(b)` is a sequence
//! - `a | b` or `a.or(b)` is a choice, `a` first
//!
//! Chaining flattens anonymous sequences and choices, so `a >> b >> c` is a
//! single three-item sequence rather than a nested pair.
//!
//! # Example
//!
//! ```rust
//! use nfagram::engine::dsl::*;
//! use nfagram::StringWindow;
//!
//! let sign = one_of("+-").maybe();
//! let digits = range('0', '9').unwrap().many1();
//! let number = named("number", sign >> digits).unwrap();
//!
//! let buf: Vec<char> = "-42 rest".chars().collect();
//! let result = number.at_start_of(StringWindow::new(&buf));
//! assert_eq!(result.matched.unwrap().to_string(), "-42");
//! ```

use super::error::GrammarError;
use super::matcher::{CharClass, Matcher};
use super::rule::{Rule, RuleKind};
use std::ops::{BitOr, Shr};

// ============================================================================
// Leaves
// ============================================================================

/// Match a literal string
pub fn lit(text: &str) -> Rule {
    Rule::literal(text)
}

/// Match a literal string ignoring simple case differences
pub fn lit_nocase(text: &str) -> Rule {
    Rule::literal_nocase(text)
}

/// Match a single character
pub fn unit(c: char) -> Rule {
    Rule::matcher(Matcher::unit(c))
}

/// Match one character in `low..=high`
pub fn range(low: char, high: char) -> Result<Rule, GrammarError> {
    Matcher::char_range(low, high).map(Rule::matcher)
}

/// Match one of the characters in `chars`
pub fn one_of(chars: &str) -> Rule {
    Rule::matcher(Matcher::one_of(chars))
}

/// Match one character of a named class
pub fn class(class: CharClass) -> Rule {
    Rule::matcher(Matcher::class(class))
}

/// Match any single unit
pub fn any() -> Rule {
    Rule::matcher(Matcher::Any)
}

// ============================================================================
// Combinators
// ============================================================================

/// Match every rule in order
pub fn seq<I>(rules: I) -> Rule
where
    I: IntoIterator<Item = Rule>,
{
    Rule::sequence(rules.into_iter().collect())
}

/// Match the first rule that leads to a match, in declaration order
pub fn choice<I>(rules: I) -> Result<Rule, GrammarError>
where
    I: IntoIterator<Item = Rule>,
{
    Rule::choice(rules.into_iter().collect())
}

/// Match `rule` or nothing
pub fn opt(rule: Rule) -> Rule {
    Rule::optional(rule)
}

/// Match `rule` between `min` and `max` times (`None` = unbounded)
pub fn rep(rule: Rule, min: usize, max: Option<usize>) -> Result<Rule, GrammarError> {
    Rule::repeat(rule, min, max)
}

/// Capture `rule` under `name`
pub fn named(name: &str, rule: Rule) -> Result<Rule, GrammarError> {
    Rule::named(name, rule)
}

// ============================================================================
// Chaining
// ============================================================================

impl Rule {
    /// Sequence: this rule, then `other`
    pub fn then(self, other: Rule) -> Rule {
        let mut items = match self.kind() {
            RuleKind::Sequence(rules) => rules.clone(),
            _ => vec![self],
        };
        match other.kind() {
            RuleKind::Sequence(rules) => items.extend(rules.iter().cloned()),
            _ => items.push(other),
        }
        Rule::sequence(items)
    }

    /// Choice: this rule, else `other`
    pub fn or(self, other: Rule) -> Rule {
        let mut items = match self.kind() {
            RuleKind::Choice(rules) => rules.clone(),
            _ => vec![self],
        };
        match other.kind() {
            RuleKind::Choice(rules) => items.extend(rules.iter().cloned()),
            _ => items.push(other),
        }
        // never empty: at least `self` or its non-empty branches
        Rule::from_parts(RuleKind::Choice(items))
    }

    /// Zero or one time
    pub fn maybe(self) -> Rule {
        Rule::optional(self)
    }

    /// Zero or more times
    pub fn many(self) -> Rule {
        Rule::from_parts(RuleKind::Repeat {
            rule: self,
            min: 0,
            max: None,
        })
    }

    /// One or more times
    pub fn many1(self) -> Rule {
        Rule::from_parts(RuleKind::Repeat {
            rule: self,
            min: 1,
            max: None,
        })
    }

    /// Exactly `n` times
    pub fn times(self, n: usize) -> Rule {
        Rule::from_parts(RuleKind::Repeat {
            rule: self,
            min: n,
            max: Some(n),
        })
    }

    /// Capture this rule under `name`
    pub fn label(self, name: &str) -> Result<Rule, GrammarError> {
        Rule::named(name, self)
    }
}

impl Shr for Rule {
    type Output = Rule;

    fn shr(self, rhs: Rule) -> Rule {
        self.then(rhs)
    }
}

impl BitOr for Rule {
    type Output = Rule;

    fn bitor(self, rhs: Rule) -> Rule {
        self.or(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::window::StringWindow;

    fn matched(rule: &Rule, input: &str) -> Option<String> {
        let buf: Vec<char> = input.chars().collect();
        rule.at_start_of(StringWindow::new(&buf))
            .matched
            .map(|w| w.to_string())
    }

    #[test]
    fn test_then_flattens() {
        let r = lit("a") >> lit("b") >> lit("c");
        match r.kind() {
            RuleKind::Sequence(items) => assert_eq!(items.len(), 3),
            other => panic!("expected sequence, got {:?}", other),
        }
        assert_eq!(r.descr(false), "\"a\" \"b\" \"c\"");
    }

    #[test]
    fn test_or_flattens_and_keeps_order() {
        let r = lit("x") | lit("y") | lit("z");
        match r.kind() {
            RuleKind::Choice(items) => assert_eq!(items.len(), 3),
            other => panic!("expected choice, got {:?}", other),
        }
        assert_eq!(r.descr(false), "\"x\" / \"y\" / \"z\"");
    }

    #[test]
    fn test_named_rules_are_not_flattened() {
        let inner = named("pair", lit("a") >> lit("b")).unwrap();
        let r = inner.then(lit("c"));
        match r.kind() {
            RuleKind::Sequence(items) => assert_eq!(items.len(), 2),
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_leaves() {
        assert_eq!(matched(&unit('x'), "xy"), Some("x".into()));
        assert_eq!(matched(&one_of("+-"), "-1"), Some("-".into()));
        assert_eq!(matched(&any(), "é"), Some("é".into()));
        assert_eq!(matched(&lit_nocase("get"), "GeT /"), Some("GeT".into()));
        assert_eq!(matched(&class(CharClass::Space), "x"), None);
        assert!(range('z', 'a').is_err());
    }

    #[test]
    fn test_repetition_helpers() {
        let d = class(CharClass::Digit);
        assert_eq!(matched(&d.clone().many(), "x"), Some("".into()));
        assert_eq!(matched(&d.clone().many1(), "x"), None);
        assert_eq!(matched(&d.clone().times(2), "1234"), Some("12".into()));
        assert_eq!(matched(&d.clone().maybe(), "1"), Some("1".into()));
        assert_eq!(
            matched(&d.repeat(2, Some(3)).unwrap(), "12345"),
            Some("123".into())
        );
    }

    #[test]
    fn test_label() {
        assert!(lit("a").label("").is_err());
        let r = lit("a").label("letter").unwrap();
        assert_eq!(r.name(), Some("letter"));
    }
}
