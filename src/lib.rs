//! nfagram - Non-backtracking Grammar Matching
//!
//! Grammars are built from a small algebra of combinators (literal,
//! sequence, choice, repeat, optional, named), lowered once to a Thompson
//! NFA, and matched by simulating every live state in parallel. Matching
//! never backtracks: a window of `n` units against a rule whose automaton has
//! `m` nodes costs O(n·m), whatever the nesting.
//!
//! It provides:
//! - Zero-copy [`StringWindow`]s over bytes, UTF-16 units or code points
//! - Rule combinators with memoized automata, shareable across threads
//! - Leftmost-longest and first-match policies
//! - Hierarchical capture trees from named rules
//! - Named grammars with ABNF-style listings and JSON interchange
//! - Developer tools (match tree printer, DOT/Mermaid automaton diagrams)
//!
//! ## Quick Start
//!
//! ```rust
//! use nfagram::prelude::*;
//!
//! let hex = named("hex", class(CharClass::HexDigit).times(2)).unwrap();
//! let color = lit("#") >> hex.clone() >> hex.clone() >> hex;
//!
//! let buf: Vec<char> = "#ff8800;".chars().collect();
//! let result = color.at_start_of(StringWindow::new(&buf));
//!
//! assert!(!result.fail);
//! let channels: Vec<String> = result
//!     .result
//!     .unwrap()
//!     .components
//!     .iter()
//!     .map(|c| c.value.to_string())
//!     .collect();
//! assert_eq!(channels, vec!["ff", "88", "00"]);
//! assert_eq!(result.remain.unwrap().to_string(), ";");
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Batch matching on rayon's thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

/// Logging macros - no-ops when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

// Matching engine
pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    // Debug tools
    debug::{AutomatonVisualizer, TreePrinter},
    // DSL
    dsl::{any, choice, class, lit, lit_nocase, named, one_of, opt, range, rep, seq, unit},
    // Errors
    error::{GrammarError, MatchError, RangeError},
    // Grammar registry
    grammar::{Grammar, GrammarBuilder},
    // Matchers
    matcher::{CharClass, CharSet, Matcher},
    // Batch matching
    parallel::match_batch_parallel,
    // Simulation
    simulator::{MatchConfig, MatchPolicy},
    Automaton,
    CodeUnit,
    MatchDetail,
    MatchResult,
    Rule,
    RuleKind,
    StringWindow,
};
