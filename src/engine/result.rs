//! Match results
//!
//! A successful match splits the input window into the consumed prefix and
//! the remainder. When the rule contains named sub-rules, the captures form a
//! [`MatchDetail`] tree: each `Named` rule on the winning path becomes a node,
//! and anonymous structure (sequences, choices, repetitions) is flattened into
//! the parent's `components`.

use super::automaton::{Automaton, Tag};
use super::window::{CodeUnit, StringWindow};
use std::sync::Arc;

/// One node of the capture tree
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDetail<'a, U: CodeUnit = char> {
    /// Capture name, `None` for the anonymous top node
    pub name: Option<Arc<str>>,
    /// Exact span matched by this node
    pub value: StringWindow<'a, U>,
    /// Named sub-matches, in input order
    pub components: Vec<MatchDetail<'a, U>>,
}

impl<'a, U: CodeUnit> MatchDetail<'a, U> {
    pub(crate) fn anonymous(value: StringWindow<'a, U>, components: Vec<Self>) -> Self {
        Self {
            name: None,
            value,
            components,
        }
    }

    /// Capture name
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the node has no named sub-matches
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.components.is_empty()
    }

    /// First direct component named `name`
    pub fn get(&self, name: &str) -> Option<&MatchDetail<'a, U>> {
        self.components.iter().find(|c| c.name() == Some(name))
    }

    /// First descendant named `name`, depth first
    pub fn find(&self, name: &str) -> Option<&MatchDetail<'a, U>> {
        self.components.iter().find_map(|c| {
            if c.name() == Some(name) {
                Some(c)
            } else {
                c.find(name)
            }
        })
    }

    /// Every descendant named `name`, in input order
    pub fn find_all(&self, name: &str) -> Vec<&MatchDetail<'a, U>> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'s>(&'s self, name: &str, out: &mut Vec<&'s MatchDetail<'a, U>>) {
        for c in &self.components {
            if c.name() == Some(name) {
                out.push(c);
            }
            c.collect_named(name, out);
        }
    }

    /// Build the capture forest from the winning path's tag events
    ///
    /// Positions in `events` are relative to `window`. Events on one path are
    /// properly nested, so a stack of open groups is enough.
    pub(crate) fn assemble(
        automaton: &Automaton,
        window: StringWindow<'a, U>,
        events: &[(Tag, usize)],
    ) -> Vec<Self> {
        let mut roots = Vec::new();
        let mut open: Vec<(usize, Vec<Self>)> = Vec::new();

        for &(tag, pos) in events {
            match tag {
                Tag::Open(_) => open.push((pos, Vec::new())),
                Tag::Close(group) => {
                    let Some((start, components)) = open.pop() else {
                        continue;
                    };
                    let detail = Self {
                        name: Some(automaton.group_name(group).clone()),
                        value: window.span(start, pos - start),
                        components,
                    };
                    match open.last_mut() {
                        Some((_, siblings)) => siblings.push(detail),
                        None => roots.push(detail),
                    }
                }
            }
        }

        roots
    }
}

/// Outcome of matching a rule at the start of a window
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a, U: CodeUnit = char> {
    /// Whether the match failed
    pub fail: bool,
    /// Consumed prefix (success only)
    pub matched: Option<StringWindow<'a, U>>,
    /// Unconsumed remainder (success only)
    pub remain: Option<StringWindow<'a, U>>,
    /// Capture tree (success only, and only for rules with named parts)
    pub result: Option<MatchDetail<'a, U>>,
}

impl<'a, U: CodeUnit> MatchResult<'a, U> {
    /// A failed match
    pub fn failure() -> Self {
        Self {
            fail: true,
            matched: None,
            remain: None,
            result: None,
        }
    }

    /// A successful match
    pub fn success(
        matched: StringWindow<'a, U>,
        remain: StringWindow<'a, U>,
        result: Option<MatchDetail<'a, U>>,
    ) -> Self {
        Self {
            fail: false,
            matched: Some(matched),
            remain: Some(remain),
            result,
        }
    }

    /// Whether the match succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        !self.fail
    }

    /// Number of units consumed (0 on failure)
    pub fn consumed(&self) -> usize {
        self.matched.map_or(0, |m| m.len())
    }

    /// The capture tree, if any
    pub fn detail(&self) -> Option<&MatchDetail<'a, U>> {
        self.result.as_ref()
    }
}
