//! Grammar rules
//!
//! A [`Rule`] is an immutable, cheaply clonable handle to a rule tree. The
//! tree is a closed sum type ([`RuleKind`]) that lowers to an automaton with
//! one exhaustive match. Each rule compiles its automaton on first use and
//! keeps it, so a rule shared across threads is compiled once.
//!
//! # Example
//!
//! ```rust
//! use nfagram::engine::dsl::{class, named, lit};
//! use nfagram::engine::matcher::CharClass;
//! use nfagram::StringWindow;
//!
//! let key = named("key", class(CharClass::Lower).many1()).unwrap();
//! let value = named("value", class(CharClass::Digit).many1()).unwrap();
//! let pair = key.then(lit("=")).then(value);
//!
//! let buf: Vec<char> = "port=8080;".chars().collect();
//! let result = pair.at_start_of(StringWindow::new(&buf));
//!
//! assert!(!result.fail);
//! let detail = result.result.unwrap();
//! assert_eq!(detail.get("value").unwrap().value.to_string(), "8080");
//! assert_eq!(result.remain.unwrap().to_string(), ";");
//! ```

use super::automaton::Automaton;
use super::error::{GrammarError, MatchError};
use super::matcher::{is_printable, Matcher};
use super::result::{MatchDetail, MatchResult};
use super::simulator::{MatchConfig, Simulator};
use super::window::{CodeUnit, StringWindow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Rule variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Exact sequence of code units
    Literal {
        /// Units to match
        text: Vec<u32>,
        /// Ignore simple case differences
        case_insensitive: bool,
    },

    /// One unit accepted by a matcher
    Matcher(Matcher),

    /// Every rule in order
    Sequence(Vec<Rule>),

    /// One of the rules; earlier rules win ties
    Choice(Vec<Rule>),

    /// `min..=max` repetitions (`max = None` is unbounded)
    Repeat {
        /// Repeated rule
        rule: Rule,
        /// Minimum count
        min: usize,
        /// Maximum count
        max: Option<usize>,
    },

    /// The rule or nothing
    Optional(Rule),

    /// Capture the rule's span under a name
    Named {
        /// Capture name
        name: String,
        /// Captured rule
        rule: Rule,
    },
}

/// Bounds on the number of units a rule can match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthBounds {
    /// Fewest units
    pub min: usize,
    /// Most units (`None` = unbounded)
    pub max: Option<usize>,
}

impl LengthBounds {
    /// Exactly `n` units
    #[inline]
    pub fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Whether a match of `len` units is possible
    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && self.max.map_or(true, |max| len <= max)
    }

    /// Bounds of `self` followed by `other`
    fn then(self, other: Self) -> Self {
        Self {
            min: self.min.saturating_add(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => a.checked_add(b),
                _ => None,
            },
        }
    }

    /// Bounds of `self` or `other`
    fn either(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }

    /// Bounds of `min..=max` repetitions of `self`
    fn repeat(self, min: usize, max: Option<usize>) -> Self {
        Self {
            min: self.min.saturating_mul(min),
            max: match (self.max, max) {
                (Some(0), _) | (_, Some(0)) => Some(0),
                (Some(a), Some(b)) => a.checked_mul(b),
                _ => None,
            },
        }
    }
}

struct RuleNode {
    kind: RuleKind,
    bounds: LengthBounds,
    automaton: OnceLock<Automaton>,
}

/// Shared handle to an immutable rule tree
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RuleKind", into = "RuleKind")]
pub struct Rule(Arc<RuleNode>);

impl Rule {
    /// Wrap an already validated kind
    pub(crate) fn from_parts(kind: RuleKind) -> Self {
        let bounds = match &kind {
            RuleKind::Literal { text, .. } => LengthBounds::exact(text.len()),
            RuleKind::Matcher(_) => LengthBounds::exact(1),
            RuleKind::Sequence(rules) => rules
                .iter()
                .fold(LengthBounds::exact(0), |acc, r| acc.then(r.bounds())),
            RuleKind::Choice(rules) => rules
                .iter()
                .map(Rule::bounds)
                .reduce(LengthBounds::either)
                .unwrap_or(LengthBounds::exact(0)),
            RuleKind::Repeat { rule, min, max } => rule.bounds().repeat(*min, *max),
            RuleKind::Optional(rule) => LengthBounds {
                min: 0,
                max: rule.bounds().max,
            },
            RuleKind::Named { rule, .. } => rule.bounds(),
        };
        Rule(Arc::new(RuleNode {
            kind,
            bounds,
            automaton: OnceLock::new(),
        }))
    }

    /// Build a rule from a kind, checking its construction constraints
    pub fn from_kind(kind: RuleKind) -> Result<Self, GrammarError> {
        match &kind {
            RuleKind::Choice(rules) if rules.is_empty() => return Err(GrammarError::EmptyChoice),
            RuleKind::Repeat {
                min,
                max: Some(max),
                ..
            } if min > max => {
                return Err(GrammarError::InvalidRepeat {
                    min: *min,
                    max: *max,
                })
            }
            RuleKind::Named { name, .. } if name.is_empty() => return Err(GrammarError::EmptyName),
            _ => {}
        }
        Ok(Self::from_parts(kind))
    }

    /// Match `text` exactly
    pub fn literal(text: &str) -> Self {
        Self::from_parts(RuleKind::Literal {
            text: text.chars().map(|c| c as u32).collect(),
            case_insensitive: false,
        })
    }

    /// Match `text` ignoring simple case differences
    pub fn literal_nocase(text: &str) -> Self {
        Self::from_parts(RuleKind::Literal {
            text: text.chars().map(|c| c as u32).collect(),
            case_insensitive: true,
        })
    }

    /// Match an exact sequence of raw units
    pub fn literal_units<I>(units: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self::from_parts(RuleKind::Literal {
            text: units.into_iter().collect(),
            case_insensitive: false,
        })
    }

    /// Match one unit accepted by `matcher`
    pub fn matcher(matcher: Matcher) -> Self {
        Self::from_parts(RuleKind::Matcher(matcher))
    }

    /// Match every rule in order (an empty sequence matches nothing, successfully)
    pub fn sequence(rules: Vec<Rule>) -> Self {
        Self::from_parts(RuleKind::Sequence(rules))
    }

    /// Match one of `rules`
    pub fn choice(rules: Vec<Rule>) -> Result<Self, GrammarError> {
        Self::from_kind(RuleKind::Choice(rules))
    }

    /// Match this rule between `min` and `max` times (`None` = unbounded)
    pub fn repeat(self, min: usize, max: Option<usize>) -> Result<Self, GrammarError> {
        Self::from_kind(RuleKind::Repeat {
            rule: self,
            min,
            max,
        })
    }

    /// Match `rule` or nothing
    pub fn optional(rule: Rule) -> Self {
        Self::from_parts(RuleKind::Optional(rule))
    }

    /// Capture `rule` under `name`
    pub fn named(name: impl Into<String>, rule: Rule) -> Result<Self, GrammarError> {
        Self::from_kind(RuleKind::Named {
            name: name.into(),
            rule,
        })
    }

    /// The rule's variant
    #[inline]
    pub fn kind(&self) -> &RuleKind {
        &self.0.kind
    }

    /// Bounds on the matched length
    #[inline]
    pub fn bounds(&self) -> LengthBounds {
        self.0.bounds
    }

    /// Name, if this is a named rule
    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            RuleKind::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether both handles refer to the same rule object
    #[inline]
    pub fn ptr_eq(&self, other: &Rule) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The compiled automaton, built on first use
    pub fn automaton(&self) -> &Automaton {
        self.0.automaton.get_or_init(|| Automaton::compile(self))
    }

    /// Whether a successful match carries a detail tree
    pub fn produces_detail(&self) -> bool {
        self.automaton().group_count() > 0
    }

    /// Match anchored at the start of `window`
    ///
    /// Never fails with an error: "no match" is reported through
    /// [`MatchResult::fail`].
    pub fn at_start_of<'a, U: CodeUnit>(&self, window: StringWindow<'a, U>) -> MatchResult<'a, U> {
        self.run(window, MatchConfig::new().with_max_input_size(0))
    }

    /// Match anchored at the start of `window` under `config`
    pub fn at_start_of_with<'a, U: CodeUnit>(
        &self,
        window: StringWindow<'a, U>,
        config: &MatchConfig,
    ) -> Result<MatchResult<'a, U>, MatchError> {
        if config.max_input_size > 0 && window.len() > config.max_input_size {
            return Err(MatchError::InputTooLarge {
                input_size: window.len(),
                max_size: config.max_input_size,
            });
        }
        Ok(self.run(window, *config))
    }

    /// Whether the rule matches some prefix of `window`
    pub fn is_match<U: CodeUnit>(&self, window: StringWindow<'_, U>) -> bool {
        !self.at_start_of(window).fail
    }

    /// Whether the rule matches all of `window`
    pub fn matches_whole<U: CodeUnit>(&self, window: StringWindow<'_, U>) -> bool {
        let config = MatchConfig::new()
            .with_max_input_size(0)
            .with_anchored_end(true);
        !self.run(window, config).fail
    }

    fn run<'a, U: CodeUnit>(&self, window: StringWindow<'a, U>, config: MatchConfig) -> MatchResult<'a, U> {
        let automaton = self.automaton();
        let outcome = Simulator::new(automaton, config).run(window);

        let Some(end) = outcome.end else {
            return MatchResult::failure();
        };

        let matched = window.span(0, end);
        let remain = window.span(end, window.len() - end);

        let result = if automaton.group_count() == 0 {
            None
        } else {
            let mut components = MatchDetail::assemble(automaton, window, &outcome.captures);
            match self.kind() {
                RuleKind::Named { .. } if components.len() == 1 => components.pop(),
                _ => Some(MatchDetail::anonymous(matched, components)),
            }
        };

        MatchResult::success(matched, remain, result)
    }

    /// Render the rule in ABNF-like notation
    ///
    /// Literals print as quoted text, or as `%x` escapes when `as_hex` is set
    /// or any unit is not printable ASCII. Named sub-rules print as their
    /// name; a named rule at the top prints its body.
    pub fn descr(&self, as_hex: bool) -> String {
        match self.kind() {
            RuleKind::Named { rule, .. } => rule.describe(as_hex),
            _ => self.describe(as_hex),
        }
    }

    fn describe(&self, as_hex: bool) -> String {
        match self.kind() {
            RuleKind::Literal {
                text,
                case_insensitive,
            } => describe_literal(text, *case_insensitive, as_hex),
            RuleKind::Matcher(matcher) => matcher.describe(as_hex),
            RuleKind::Sequence(rules) => match rules.len() {
                0 => "\"\"".to_string(),
                _ => rules
                    .iter()
                    .map(|r| match r.unwrapped().kind() {
                        RuleKind::Choice(alts) if alts.len() > 1 => {
                            format!("({})", r.describe(as_hex))
                        }
                        _ => r.describe(as_hex),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            },
            RuleKind::Choice(rules) => rules
                .iter()
                .map(|r| r.describe(as_hex))
                .collect::<Vec<_>>()
                .join(" / "),
            RuleKind::Repeat { rule, min, max } => {
                let prefix = match (*min, *max) {
                    (0, None) => "*".to_string(),
                    (n, None) => format!("{}*", n),
                    (n, Some(m)) if n == m => n.to_string(),
                    (0, Some(m)) => format!("*{}", m),
                    (n, Some(m)) => format!("{}*{}", n, m),
                };
                format!("{}{}", prefix, rule.describe_atom(as_hex))
            }
            RuleKind::Optional(rule) => format!("[{}]", rule.describe(as_hex)),
            RuleKind::Named { name, .. } => name.clone(),
        }
    }

    /// Description usable as the operand of a repetition
    fn describe_atom(&self, as_hex: bool) -> String {
        let grouped = match self.unwrapped().kind() {
            RuleKind::Sequence(rules) | RuleKind::Choice(rules) => rules.len() > 1,
            RuleKind::Repeat { .. } => true,
            _ => false,
        };
        if grouped {
            format!("({})", self.describe(as_hex))
        } else {
            self.describe(as_hex)
        }
    }

    /// Skip single-item sequences and choices, which render as their item
    fn unwrapped(&self) -> &Rule {
        match self.kind() {
            RuleKind::Sequence(rules) | RuleKind::Choice(rules) if rules.len() == 1 => {
                rules[0].unwrapped()
            }
            _ => self,
        }
    }
}

fn describe_literal(text: &[u32], case_insensitive: bool, as_hex: bool) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }
    if as_hex || !text.iter().all(|&u| is_printable(u)) {
        let units: Vec<String> = text.iter().map(|u| format!("{:02X}", u)).collect();
        let hex = format!("%x{}", units.join("."));
        return if case_insensitive {
            format!("%i({})", hex)
        } else {
            hex
        };
    }
    let quoted: String = text.iter().filter_map(|&u| char::from_u32(u)).collect();
    if case_insensitive {
        format!("%i\"{}\"", quoted)
    } else {
        format!("\"{}\"", quoted)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.kind() == other.kind()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.kind(), f)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descr(false))
    }
}

impl TryFrom<RuleKind> for Rule {
    type Error = GrammarError;

    fn try_from(kind: RuleKind) -> Result<Self, Self::Error> {
        Rule::from_kind(kind)
    }
}

impl From<Rule> for RuleKind {
    fn from(rule: Rule) -> Self {
        rule.kind().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{choice, class, lit, named, opt, range, rep, seq};
    use crate::engine::matcher::CharClass;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_bounds() {
        let r = seq(vec![lit("ab"), opt(lit("cde"))]);
        assert_eq!(
            r.bounds(),
            LengthBounds {
                min: 2,
                max: Some(5)
            }
        );

        let r = choice(vec![lit("a"), lit("abc")]).unwrap();
        assert_eq!(
            r.bounds(),
            LengthBounds {
                min: 1,
                max: Some(3)
            }
        );

        let r = rep(lit("ab"), 2, Some(4)).unwrap();
        assert_eq!(
            r.bounds(),
            LengthBounds {
                min: 4,
                max: Some(8)
            }
        );

        let r = rep(lit("ab"), 1, None).unwrap();
        assert_eq!(r.bounds(), LengthBounds { min: 2, max: None });

        let r = rep(lit(""), 1, None).unwrap();
        assert_eq!(r.bounds(), LengthBounds::exact(0));
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            Rule::repeat(lit("a"), 3, Some(1)),
            Err(GrammarError::InvalidRepeat { min: 3, max: 1 })
        );
        assert_eq!(Rule::choice(vec![]), Err(GrammarError::EmptyChoice));
        assert_eq!(Rule::named("", lit("a")), Err(GrammarError::EmptyName));
    }

    #[test]
    fn test_automaton_is_memoized() {
        let r = lit("abc");
        let first = r.automaton() as *const Automaton;
        let clone = r.clone();
        let second = clone.automaton() as *const Automaton;
        assert_eq!(first, second);
    }

    #[test]
    fn test_at_start_of_literal() {
        let buf = chars("hello world");
        let w = StringWindow::new(&buf);
        let result = lit("hello").at_start_of(w);

        assert!(!result.fail);
        assert_eq!(result.matched.unwrap().to_string(), "hello");
        assert_eq!(result.remain.unwrap().to_string(), " world");
        assert!(result.result.is_none());
    }

    #[test]
    fn test_failure_has_no_remain() {
        let buf = chars("world");
        let result = lit("hello").at_start_of(StringWindow::new(&buf));
        assert!(result.fail);
        assert!(result.remain.is_none());
        assert!(result.result.is_none());
    }

    #[test]
    fn test_named_top_level() {
        let buf = chars("42!");
        let rule = named("num", class(CharClass::Digit).many1()).unwrap();
        let result = rule.at_start_of(StringWindow::new(&buf));

        let detail = result.result.unwrap();
        assert_eq!(detail.name(), Some("num"));
        assert_eq!(detail.value.to_string(), "42");
        assert!(detail.components.is_empty());
    }

    #[test]
    fn test_anonymous_structure_is_flattened() {
        let digit = named("d", class(CharClass::Digit)).unwrap();
        let rule = seq(vec![lit("["), rep(digit, 1, None).unwrap(), lit("]")]);
        let buf = chars("[123]");
        let result = rule.at_start_of(StringWindow::new(&buf));

        let detail = result.result.unwrap();
        assert_eq!(detail.name(), None);
        assert_eq!(detail.value.to_string(), "[123]");
        let digits: Vec<String> = detail.components.iter().map(|d| d.value.to_string()).collect();
        assert_eq!(digits, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_matches_whole() {
        let rule = rep(range('a', 'z').unwrap(), 1, None).unwrap();
        let ok = chars("abc");
        let bad = chars("abc1");
        assert!(rule.matches_whole(StringWindow::new(&ok)));
        assert!(!rule.matches_whole(StringWindow::new(&bad)));
        assert!(rule.is_match(StringWindow::new(&bad)));
    }

    #[test]
    fn test_input_limit() {
        let buf = chars("aaaa");
        let config = MatchConfig::new().with_max_input_size(3);
        let err = lit("a")
            .at_start_of_with(StringWindow::new(&buf), &config)
            .unwrap_err();
        assert_eq!(
            err,
            MatchError::InputTooLarge {
                input_size: 4,
                max_size: 3
            }
        );
    }

    #[test]
    fn test_descr() {
        let digit = named("digit", class(CharClass::Digit)).unwrap();
        let rule = seq(vec![
            lit("v"),
            rep(digit, 1, Some(3)).unwrap(),
            opt(choice(vec![lit("-beta"), lit("-rc")]).unwrap()),
            rep(seq(vec![lit("."), lit("x")]), 0, None).unwrap(),
        ]);
        assert_eq!(
            rule.descr(false),
            "\"v\" 1*3digit [\"-beta\" / \"-rc\"] *(\".\" \"x\")"
        );
        assert_eq!(rule.descr(false), rule.descr(false));
    }

    #[test]
    fn test_descr_groups_through_single_item_wrappers() {
        let pair = seq(vec![lit("a"), lit("b")]);
        let wrapped = choice(vec![pair.clone()]).unwrap();
        assert_eq!(rep(wrapped, 0, None).unwrap().descr(false), "*(\"a\" \"b\")");

        let wrapped = seq(vec![seq(vec![pair])]);
        assert_eq!(rep(wrapped, 2, None).unwrap().descr(false), "2*(\"a\" \"b\")");

        let alts = choice(vec![choice(vec![lit("a"), lit("b")]).unwrap()]).unwrap();
        assert_eq!(seq(vec![alts, lit("c")]).descr(false), "(\"a\" / \"b\") \"c\"");

        let single = choice(vec![lit("a")]).unwrap();
        assert_eq!(rep(single, 0, None).unwrap().descr(false), "*\"a\"");
    }

    #[test]
    fn test_descr_hex() {
        assert_eq!(lit("ab").descr(true), "%x61.62");
        assert_eq!(lit("a\tb").descr(false), "%x61.09.62");
        assert_eq!(lit("say \"hi\"").descr(false), "%x73.61.79.20.22.68.69.22");
        assert_eq!(Rule::literal_nocase("GET").descr(false), "%i\"GET\"");
        assert_eq!(
            rep(lit("ab"), 2, Some(2)).unwrap().descr(false),
            "2\"ab\""
        );
    }

    #[test]
    fn test_serde_roundtrip_revalidates() {
        let rule = seq(vec![
            named("k", class(CharClass::Alpha)).unwrap(),
            rep(lit("="), 0, Some(1)).unwrap(),
        ]);
        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);

        let bad = r#"{"Repeat":{"rule":{"Literal":{"text":[97],"case_insensitive":false}},"min":3,"max":1}}"#;
        assert!(serde_json::from_str::<Rule>(bad).is_err());
    }

    #[test]
    fn test_rule_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Rule>();
    }
}
