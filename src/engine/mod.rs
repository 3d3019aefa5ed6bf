//! Matching engine
//!
//! # Module Organization
//!
//! ## Input
//! - [`window`] - zero-copy [`StringWindow`] over decoded code units
//!
//! ## Grammar
//! - [`matcher`] - single-unit predicates
//! - [`rule`] - the rule tree and its matching entry points
//! - [`dsl`] - builder functions and combinator operators
//! - [`grammar`] - named rule registry with ABNF listing and JSON I/O
//!
//! ## Execution
//! - [`automaton`] - Thompson construction
//! - [`simulator`] - epsilon-closure simulation
//! - [`result`] - match results and capture trees
//! - [`parallel`] - batch matching
//!
//! ## Tooling
//! - [`debug`] - tree printer and automaton diagrams
//! - [`error`] - error types

// ============================================================================
// Module Declarations
// ============================================================================

pub mod automaton;
pub mod debug;
pub mod dsl;
pub mod error;
pub mod grammar;
pub mod matcher;
pub mod result;
pub mod rule;
pub mod simulator;
pub mod window;

// Batch matching (always available, uses rayon when feature is enabled)
pub mod parallel;

// ============================================================================
// Core Types
// ============================================================================

pub use result::{MatchDetail, MatchResult};
pub use rule::{LengthBounds, Rule, RuleKind};
pub use window::{CodeUnit, StringWindow};

// ============================================================================
// Matchers
// ============================================================================

pub use matcher::{CharClass, CharSet, Matcher};

// ============================================================================
// Automaton & Simulation
// ============================================================================

pub use automaton::{Automaton, GroupId, MatcherId, Node, NodeId, Tag, Transition};
pub use simulator::{MatchConfig, MatchPolicy, Outcome, Simulator, DEFAULT_MAX_INPUT_SIZE};

// ============================================================================
// Grammar Registry
// ============================================================================

pub use grammar::{Grammar, GrammarBuilder};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{GrammarError, MatchError, RangeError};

// ============================================================================
// Developer Tools
// ============================================================================

pub use debug::{AutomatonVisualizer, TreePrinter};

// ============================================================================
// Batch Matching
// ============================================================================

pub use parallel::{match_batch_bytes, match_batch_parallel, match_batch_with_config, ParallelConfig};
