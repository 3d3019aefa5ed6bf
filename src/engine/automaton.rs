//! Thompson-constructed NFA
//!
//! Every rule lowers to a [`Fragment`]: a `(start, accept)` pair of nodes in
//! the automaton's arena. Fragments compose by adding epsilon edges between
//! existing nodes; node bodies are never copied. Each combinator adds O(1)
//! nodes and edges (per copy, for bounded repetition), so the automaton is
//! linear in the size of the rule tree.
//!
//! | Rule | Fragment |
//! |------|----------|
//! | matcher | `start --m--> accept` |
//! | literal | chain of unit transitions |
//! | sequence | `A.accept -ε-> B.start` |
//! | choice | new start, ordered ε to each branch, shared accept |
//! | optional | ε to the body first, then ε straight to accept |
//! | repeat | `min` copies, then nested optional copies or a loop hub |
//! | named | open-tag node, body, close-tag node |
//!
//! Epsilon edges are ordered. The simulator explores them in order, which
//! makes earlier choice branches and "take one more repetition" the higher
//! priority paths.

use super::matcher::Matcher;
use super::rule::{Rule, RuleKind};
use hashbrown::HashMap;
use std::sync::Arc;

/// Handle of a node in an [`Automaton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of an interned [`Matcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatcherId(u32);

/// Handle of a named capture group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(u32);

impl GroupId {
    /// Position of the group in the automaton's name table
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Capture marker carried by a node
///
/// Passing through a tagged node records the tag and the current position
/// in the thread's capture log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// A named group starts here
    Open(GroupId),
    /// A named group ends here
    Close(GroupId),
}

/// Consuming edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Predicate the next unit must satisfy
    pub matcher: MatcherId,
    /// Node reached after consuming the unit
    pub target: NodeId,
}

/// Automaton node
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    transitions: Vec<Transition>,
    epsilons: Vec<NodeId>,
    tag: Option<Tag>,
    is_end: bool,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            transitions: Vec::new(),
            epsilons: Vec::new(),
            tag: None,
            is_end: false,
        }
    }

    /// This node's handle
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Consuming edges, in insertion order
    #[inline]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Epsilon targets, in priority order
    #[inline]
    pub fn epsilons(&self) -> &[NodeId] {
        &self.epsilons
    }

    /// Capture marker, if any
    #[inline]
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// Whether this is the automaton's accept node
    #[inline]
    pub fn is_end(&self) -> bool {
        self.is_end
    }
}

/// A partially built automaton with one entry and one exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    /// Entry node
    pub start: NodeId,
    /// Exit node
    pub accept: NodeId,
}

/// Compiled NFA for one rule
///
/// The automaton owns all of its nodes; everything else refers to them by
/// [`NodeId`]. Once built it is never mutated, so it can be shared between
/// threads freely.
#[derive(Debug, Clone)]
pub struct Automaton {
    nodes: Vec<Node>,
    matchers: Vec<Matcher>,
    groups: Vec<Arc<str>>,
    start: NodeId,
    accept: NodeId,
}

impl Automaton {
    /// Lower a rule tree with Thompson's construction
    pub fn compile(rule: &Rule) -> Self {
        let mut builder = Builder::default();
        let fragment = builder.lower(rule);
        let automaton = builder.finish(fragment);
        log_debug!(
            "compiled automaton: {} nodes, {} transitions, {} epsilons, {} matchers",
            automaton.node_count(),
            automaton.transition_count(),
            automaton.epsilon_count(),
            automaton.matchers.len()
        );
        automaton
    }

    /// Entry node
    #[inline]
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The single accepting node
    #[inline]
    pub fn accept(&self) -> NodeId {
        self.accept
    }

    /// Node by handle
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// All nodes, indexed by [`NodeId::index`]
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of consuming edges
    pub fn transition_count(&self) -> usize {
        self.nodes.iter().map(|n| n.transitions.len()).sum()
    }

    /// Number of epsilon edges
    pub fn epsilon_count(&self) -> usize {
        self.nodes.iter().map(|n| n.epsilons.len()).sum()
    }

    /// Interned matcher by handle
    #[inline]
    pub fn matcher(&self, id: MatcherId) -> &Matcher {
        &self.matchers[id.0 as usize]
    }

    /// All distinct matchers used on edges
    #[inline]
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Name of a capture group
    #[inline]
    pub fn group_name(&self, id: GroupId) -> &Arc<str> {
        &self.groups[id.index()]
    }

    /// Number of distinct group names
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Arena under construction
#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    matchers: Vec<Matcher>,
    matcher_ids: HashMap<Matcher, MatcherId>,
    groups: Vec<Arc<str>>,
    group_ids: HashMap<Arc<str>, GroupId>,
}

impl Builder {
    fn node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id));
        id
    }

    fn tagged(&mut self, tag: Tag) -> NodeId {
        let id = self.node();
        self.nodes[id.index()].tag = Some(tag);
        id
    }

    fn epsilon(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.index()].epsilons.push(to);
    }

    fn transition(&mut self, from: NodeId, matcher: &Matcher, to: NodeId) {
        let matcher = self.intern(matcher);
        self.nodes[from.index()].transitions.push(Transition {
            matcher,
            target: to,
        });
    }

    fn intern(&mut self, matcher: &Matcher) -> MatcherId {
        if let Some(&id) = self.matcher_ids.get(matcher) {
            return id;
        }
        let id = MatcherId(self.matchers.len() as u32);
        self.matchers.push(matcher.clone());
        self.matcher_ids.insert(matcher.clone(), id);
        id
    }

    fn group(&mut self, name: &str) -> GroupId {
        if let Some(&id) = self.group_ids.get(name) {
            return id;
        }
        let id = GroupId(self.groups.len() as u32);
        let name: Arc<str> = Arc::from(name);
        self.groups.push(name.clone());
        self.group_ids.insert(name, id);
        id
    }

    /// Zero-width fragment
    fn empty(&mut self) -> Fragment {
        let n = self.node();
        Fragment {
            start: n,
            accept: n,
        }
    }

    /// Append `next` after `prev`
    fn chain(&mut self, prev: Option<Fragment>, next: Fragment) -> Fragment {
        match prev {
            Some(prev) => {
                self.epsilon(prev.accept, next.start);
                Fragment {
                    start: prev.start,
                    accept: next.accept,
                }
            }
            None => next,
        }
    }

    fn lower(&mut self, rule: &Rule) -> Fragment {
        match rule.kind() {
            RuleKind::Literal {
                text,
                case_insensitive,
            } => {
                let start = self.node();
                let mut current = start;
                for &unit in text {
                    let matcher = if *case_insensitive {
                        Matcher::Unit(unit).case_insensitive()
                    } else {
                        Matcher::Unit(unit)
                    };
                    let next = self.node();
                    self.transition(current, &matcher, next);
                    current = next;
                }
                Fragment {
                    start,
                    accept: current,
                }
            }

            RuleKind::Matcher(matcher) => {
                let start = self.node();
                let accept = self.node();
                self.transition(start, matcher, accept);
                Fragment { start, accept }
            }

            RuleKind::Sequence(rules) => {
                let mut fragment = None;
                for child in rules {
                    let next = self.lower(child);
                    fragment = Some(self.chain(fragment, next));
                }
                match fragment {
                    Some(fragment) => fragment,
                    None => self.empty(),
                }
            }

            RuleKind::Choice(rules) => {
                let start = self.node();
                let accept = self.node();
                for child in rules {
                    let branch = self.lower(child);
                    self.epsilon(start, branch.start);
                    self.epsilon(branch.accept, accept);
                }
                Fragment { start, accept }
            }

            RuleKind::Optional(inner) => {
                let start = self.node();
                let accept = self.node();
                let body = self.lower(inner);
                self.epsilon(start, body.start);
                self.epsilon(start, accept);
                self.epsilon(body.accept, accept);
                Fragment { start, accept }
            }

            RuleKind::Repeat { rule, min, max } => self.lower_repeat(rule, *min, *max),

            RuleKind::Named { name, rule } => {
                let group = self.group(name);
                let open = self.tagged(Tag::Open(group));
                let close = self.tagged(Tag::Close(group));
                let body = self.lower(rule);
                self.epsilon(open, body.start);
                self.epsilon(body.accept, close);
                Fragment {
                    start: open,
                    accept: close,
                }
            }
        }
    }

    fn lower_repeat(&mut self, body: &Rule, min: usize, max: Option<usize>) -> Fragment {
        let mut fragment = None;
        for _ in 0..min {
            let copy = self.lower(body);
            fragment = Some(self.chain(fragment, copy));
        }

        match max {
            None => {
                // Loop hub: another iteration first, leaving second
                let hub = self.node();
                let exit = self.node();
                let copy = self.lower(body);
                self.epsilon(hub, copy.start);
                self.epsilon(hub, exit);
                self.epsilon(copy.accept, hub);
                fragment = Some(self.chain(
                    fragment,
                    Fragment {
                        start: hub,
                        accept: exit,
                    },
                ));
            }
            Some(max) if max > min => {
                // Nested optionals: (A (A (A)?)?)?
                let exit = self.node();
                let first = self.node();
                let mut hub = first;
                let optional = max - min;
                for i in 0..optional {
                    let copy = self.lower(body);
                    self.epsilon(hub, copy.start);
                    self.epsilon(hub, exit);
                    if i + 1 < optional {
                        let next = self.node();
                        self.epsilon(copy.accept, next);
                        hub = next;
                    } else {
                        self.epsilon(copy.accept, exit);
                    }
                }
                fragment = Some(self.chain(
                    fragment,
                    Fragment {
                        start: first,
                        accept: exit,
                    },
                ));
            }
            Some(_) => {}
        }

        match fragment {
            Some(fragment) => fragment,
            None => self.empty(),
        }
    }

    fn finish(mut self, fragment: Fragment) -> Automaton {
        self.nodes[fragment.accept.index()].is_end = true;
        Automaton {
            nodes: self.nodes,
            matchers: self.matchers,
            groups: self.groups,
            start: fragment.start,
            accept: fragment.accept,
        }
    }
}
