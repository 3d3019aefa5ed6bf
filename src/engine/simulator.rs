//! Epsilon-closure simulation of an [`Automaton`]
//!
//! The simulator keeps an ordered list of threads, one per active node.
//! Before looking at an input unit it expands the list to its
//! epsilon-closure; then every thread whose transition accepts the unit moves
//! to the target node, and the others die. No state is ever revisited within
//! one step, so a window of `n` units over an automaton of `m` nodes costs
//! O(n·m) no matter how the grammar nests.
//!
//! Threads are ordered by priority. The closure is a depth-first walk that
//! follows epsilon edges in declaration order, and the first thread to reach
//! a node owns it for that step. Earlier choice branches and extra
//! repetitions therefore win ties.
//!
//! # Match policy
//!
//! - [`MatchPolicy::LeftmostLongest`] (default): the longest accepted prefix
//!   wins. Among paths accepting at that length the highest-priority one
//!   supplies the captures.
//! - [`MatchPolicy::FirstMatch`]: once a thread accepts, all lower-priority
//!   threads are dropped, giving backtracking-engine results without
//!   backtracking.

use super::automaton::{Automaton, NodeId, Tag};
use super::window::{CodeUnit, StringWindow};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Default maximum input size: 100 Mi code units
pub const DEFAULT_MAX_INPUT_SIZE: usize = 100 * 1024 * 1024;

/// How to choose among several accepting paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Longest prefix, ties broken by declaration order
    #[default]
    LeftmostLongest,
    /// Highest-priority path, Perl style
    FirstMatch,
}

/// Match configuration
///
/// # Example
///
/// ```rust
/// use nfagram::engine::simulator::{MatchConfig, MatchPolicy};
///
/// let config = MatchConfig::new()
///     .with_policy(MatchPolicy::FirstMatch)
///     .with_max_input_size(64 * 1024)
///     .with_anchored_end(true);
/// assert_eq!(config.max_input_size, 64 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Tie-break policy among accepting paths
    pub policy: MatchPolicy,

    /// Maximum window length in code units (0 = no limit)
    pub max_input_size: usize,

    /// Only accept a match that consumes the whole window
    pub anchored_end: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            anchored_end: false,
        }
    }
}

impl MatchConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tie-break policy
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the maximum window length (0 = no limit)
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Require the match to consume the whole window
    pub fn with_anchored_end(mut self, anchored: bool) -> Self {
        self.anchored_end = anchored;
        self
    }
}

/// Persistent capture log shared between threads
struct CaptureLink {
    tag: Tag,
    pos: usize,
    prev: CaptureLog,
}

type CaptureLog = Option<Rc<CaptureLink>>;

fn flatten(mut log: &CaptureLog) -> Vec<(Tag, usize)> {
    let mut events = Vec::new();
    while let Some(link) = log {
        events.push((link.tag, link.pos));
        log = &link.prev;
    }
    events.reverse();
    events
}

struct Thread {
    node: NodeId,
    caps: CaptureLog,
}

/// Result of one simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Units consumed by the winning path, `None` when nothing accepted
    pub end: Option<usize>,
    /// Capture events along the winning path, in order
    pub captures: Vec<(Tag, usize)>,
    /// Input units consumed by the simulation
    pub steps: usize,
    /// Largest number of simultaneously active threads
    pub peak_active: usize,
}

/// Reusable simulation state for one automaton
///
/// The simulator is cheap to create and owns all mutable matching state, so
/// any number of them can run against the same automaton concurrently.
pub struct Simulator<'r> {
    automaton: &'r Automaton,
    config: MatchConfig,
    /// Generation stamp per node; equal to `generation` when visited this step
    marks: Vec<u32>,
    generation: u32,
    stack: Vec<(NodeId, CaptureLog)>,
}

impl<'r> Simulator<'r> {
    /// Create a simulator for `automaton`
    pub fn new(automaton: &'r Automaton, config: MatchConfig) -> Self {
        Self {
            automaton,
            config,
            marks: vec![0; automaton.node_count()],
            generation: 0,
            stack: Vec::new(),
        }
    }

    /// Run the automaton anchored at the start of `window`
    pub fn run<U: CodeUnit>(&mut self, window: StringWindow<'_, U>) -> Outcome {
        let automaton = self.automaton;
        let accept = automaton.accept();
        let len = window.len();

        let mut current: Vec<Thread> = Vec::new();
        let mut next: Vec<Thread> = Vec::new();
        let mut best: Option<(usize, CaptureLog)> = None;

        self.next_generation();
        self.add_closure(&mut current, automaton.start(), None, 0);

        let mut pos = 0;
        let mut peak_active = current.len();

        loop {
            if let Some(i) = current.iter().position(|t| t.node == accept) {
                if !self.config.anchored_end || pos == len {
                    best = Some((pos, current[i].caps.clone()));
                    if self.config.policy == MatchPolicy::FirstMatch {
                        current.truncate(i);
                    }
                }
            }

            let Some(unit) = window.get(pos) else {
                break;
            };
            if current.is_empty() {
                break;
            }
            let code = unit.code();

            self.next_generation();
            next.clear();
            for thread in &current {
                for transition in automaton.node(thread.node).transitions() {
                    if automaton.matcher(transition.matcher).test(code) {
                        self.add_closure(&mut next, transition.target, thread.caps.clone(), pos + 1);
                    }
                }
            }

            std::mem::swap(&mut current, &mut next);
            pos += 1;
            peak_active = peak_active.max(current.len());
        }

        log_debug!(
            "simulation stopped after {} units, peak {} threads, match end {:?}",
            pos,
            peak_active,
            best.as_ref().map(|(end, _)| *end)
        );

        match best {
            Some((end, caps)) => Outcome {
                end: Some(end),
                captures: flatten(&caps),
                steps: pos,
                peak_active,
            },
            None => Outcome {
                end: None,
                captures: Vec::new(),
                steps: pos,
                peak_active,
            },
        }
    }

    fn next_generation(&mut self) {
        if self.generation == u32::MAX {
            self.marks.iter_mut().for_each(|m| *m = 0);
            self.generation = 0;
        }
        self.generation += 1;
    }

    /// Add `seed` and everything epsilon-reachable from it to `list`
    ///
    /// Iterative depth-first walk in edge order; a node already marked in
    /// this generation is skipped, which also breaks epsilon cycles.
    fn add_closure(&mut self, list: &mut Vec<Thread>, seed: NodeId, caps: CaptureLog, pos: usize) {
        let automaton = self.automaton;
        self.stack.push((seed, caps));

        while let Some((id, caps)) = self.stack.pop() {
            let mark = &mut self.marks[id.index()];
            if *mark == self.generation {
                continue;
            }
            *mark = self.generation;

            let node = automaton.node(id);
            let caps = match node.tag() {
                Some(tag) => Some(Rc::new(CaptureLink {
                    tag,
                    pos,
                    prev: caps,
                })),
                None => caps,
            };

            if node.is_end() || !node.transitions().is_empty() {
                list.push(Thread {
                    node: id,
                    caps: caps.clone(),
                });
            }

            for &target in node.epsilons().iter().rev() {
                self.stack.push((target, caps.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{choice, lit, named, opt, rep, seq};
    use crate::engine::rule::Rule;

    fn run(rule: &Rule, input: &str, config: MatchConfig) -> Outcome {
        let buf: Vec<char> = input.chars().collect();
        Simulator::new(rule.automaton(), config).run(StringWindow::new(&buf))
    }

    #[test]
    fn test_literal() {
        let rule = lit("abc");
        assert_eq!(run(&rule, "abcd", MatchConfig::new()).end, Some(3));
        assert_eq!(run(&rule, "abx", MatchConfig::new()).end, None);
        assert_eq!(run(&rule, "ab", MatchConfig::new()).end, None);
    }

    #[test]
    fn test_longest_vs_first_match() {
        let rule = choice(vec![lit("a"), lit("ab")]).unwrap();

        let longest = run(&rule, "ab", MatchConfig::new());
        assert_eq!(longest.end, Some(2));

        let first = run(
            &rule,
            "ab",
            MatchConfig::new().with_policy(MatchPolicy::FirstMatch),
        );
        assert_eq!(first.end, Some(1));
    }

    #[test]
    fn test_anchored_end() {
        let rule = rep(lit("a"), 0, None).unwrap();
        let config = MatchConfig::new().with_anchored_end(true);

        assert_eq!(run(&rule, "aaa", config).end, Some(3));
        assert_eq!(run(&rule, "aab", config).end, None);
    }

    #[test]
    fn test_empty_loop_body_terminates() {
        let rule = rep(opt(lit("a")), 0, None).unwrap();
        assert_eq!(run(&rule, "aab", MatchConfig::new()).end, Some(2));
        assert_eq!(run(&rule, "", MatchConfig::new()).end, Some(0));
    }

    #[test]
    fn test_captures_are_ordered() {
        let rule = seq(vec![
            named("x", lit("a")).unwrap(),
            named("y", lit("b")).unwrap(),
        ]);
        let outcome = run(&rule, "ab", MatchConfig::new());
        let positions: Vec<usize> = outcome.captures.iter().map(|(_, p)| *p).collect();
        assert_eq!(positions, vec![0, 1, 1, 2]);
        assert!(matches!(outcome.captures[0].0, Tag::Open(_)));
        assert!(matches!(outcome.captures[3].0, Tag::Close(_)));
    }

    #[test]
    fn test_pathological_pattern_is_linear() {
        // (a?){n} a{n} against a^n: exponential for backtracking engines
        let n = 64;
        let rule = seq(vec![
            rep(opt(lit("a")), n, Some(n)).unwrap(),
            rep(lit("a"), n, Some(n)).unwrap(),
        ]);
        let input = "a".repeat(n);
        let outcome = run(&rule, &input, MatchConfig::new());

        assert_eq!(outcome.end, Some(n));
        assert_eq!(outcome.steps, n);
        assert!(outcome.peak_active <= rule.automaton().node_count());
    }

    #[test]
    fn test_generation_wraparound() {
        let rule = lit("ab");
        let automaton = rule.automaton();
        let mut sim = Simulator::new(automaton, MatchConfig::new());
        sim.generation = u32::MAX - 1;

        let buf: Vec<char> = "ab".chars().collect();
        assert_eq!(sim.run(StringWindow::new(&buf)).end, Some(2));
        assert_eq!(sim.run(StringWindow::new(&buf)).end, Some(2));
    }
}
