//! Named rule registry
//!
//! A [`Grammar`] is a set of named rule definitions with one root. Later
//! rules refer to earlier ones through [`GrammarBuilder::reference`], which
//! hands out the defined rule itself, so the grammar is assembled bottom-up
//! and never recursive.
//!
//! # Example
//!
//! ```rust
//! use nfagram::engine::dsl::*;
//! use nfagram::engine::grammar::GrammarBuilder;
//! use nfagram::engine::matcher::CharClass;
//! use nfagram::StringWindow;
//!
//! let mut builder = GrammarBuilder::new();
//! builder = builder.rule("digit", class(CharClass::Digit));
//! let digit = builder.reference("digit").unwrap();
//! let grammar = builder
//!     .rule("number", digit.many1())
//!     .root("number")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(grammar.describe(false), "digit = DIGIT\nnumber = 1*digit");
//!
//! let buf: Vec<char> = "2024-01".chars().collect();
//! let result = grammar.at_start_of(StringWindow::new(&buf));
//! assert_eq!(result.matched.unwrap().to_string(), "2024");
//! ```

use super::error::GrammarError;
use super::result::MatchResult;
use super::rule::{Rule, RuleKind};
use super::window::{CodeUnit, StringWindow};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Builder for [`Grammar`]
///
/// Errors are collected and reported by [`build`](Self::build), so
/// definitions can be chained.
#[derive(Default)]
pub struct GrammarBuilder {
    /// Named rules in definition order
    rules: Vec<Rule>,

    /// Rule name -> position in `rules`
    index: HashMap<String, usize>,

    /// Entry rule; defaults to the first definition
    root: Option<String>,

    /// First error seen while defining rules
    error: Option<GrammarError>,
}

impl GrammarBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Define rule `name` as `body`
    pub fn rule(mut self, name: &str, body: Rule) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.index.contains_key(name) {
            self.error = Some(GrammarError::DuplicateRule {
                name: name.to_string(),
            });
            return self;
        }
        match Rule::named(name, body) {
            Ok(rule) => {
                self.index.insert(name.to_string(), self.rules.len());
                self.rules.push(rule);
            }
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// The named rule defined as `name`, for use in later definitions
    pub fn reference(&self, name: &str) -> Result<Rule, GrammarError> {
        self.index
            .get(name)
            .map(|&i| self.rules[i].clone())
            .ok_or_else(|| GrammarError::UnknownRule {
                name: name.to_string(),
            })
    }

    /// Select the entry rule
    pub fn root(mut self, name: &str) -> Self {
        self.root = Some(name.to_string());
        self
    }

    /// Number of rules defined so far
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Validate and build the grammar
    pub fn build(self) -> Result<Grammar, GrammarError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }
        let root = match &self.root {
            Some(name) => *self
                .index
                .get(name.as_str())
                .ok_or_else(|| GrammarError::UnknownRule { name: name.clone() })?,
            None => 0,
        };

        log_debug!(
            "built grammar with {} rules, root '{}'",
            self.rules.len(),
            self.rules[root].name().unwrap_or_default()
        );

        Ok(Grammar {
            rules: self.rules,
            index: self.index,
            root,
        })
    }
}

/// A validated set of named rules with one root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GrammarDef", into = "GrammarDef")]
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
    root: usize,
}

impl Grammar {
    /// The named rule `name`
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&i| &self.rules[i])
    }

    /// The entry rule
    pub fn root_rule(&self) -> &Rule {
        &self.rules[self.root]
    }

    /// Name of the entry rule
    pub fn root_name(&self) -> &str {
        self.root_rule().name().unwrap_or_default()
    }

    /// Rule names in definition order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(Rule::name)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false for a built grammar
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match the root rule at the start of `window`
    pub fn at_start_of<'a, U: CodeUnit>(&self, window: StringWindow<'a, U>) -> MatchResult<'a, U> {
        self.root_rule().at_start_of(window)
    }

    /// ABNF-like listing, one `name = body` line per rule
    pub fn describe(&self, as_hex: bool) -> String {
        self.rules
            .iter()
            .map(|r| format!("{} = {}", r.name().unwrap_or_default(), r.descr(as_hex)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, GrammarError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, GrammarError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, validating every rule
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Serialized form of one rule definition
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleDef {
    name: String,
    body: Rule,
}

/// Serialized form of a grammar
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GrammarDef {
    rules: Vec<RuleDef>,
    root: String,
}

impl TryFrom<GrammarDef> for Grammar {
    type Error = GrammarError;

    fn try_from(def: GrammarDef) -> Result<Self, Self::Error> {
        def.rules
            .into_iter()
            .fold(GrammarBuilder::new(), |b, r| b.rule(&r.name, r.body))
            .root(&def.root)
            .build()
    }
}

impl From<Grammar> for GrammarDef {
    fn from(grammar: Grammar) -> Self {
        let root = grammar.root_name().to_string();
        let rules = grammar
            .rules
            .iter()
            .filter_map(|r| match r.kind() {
                RuleKind::Named { name, rule } => Some(RuleDef {
                    name: name.clone(),
                    body: rule.clone(),
                }),
                _ => None,
            })
            .collect();
        GrammarDef { rules, root }
    }
}
