//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from
//! nfagram. Importing it with a wildcard brings the core types into scope:
//!
//! ```
//! use nfagram::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`StringWindow`] - Zero-copy view into a buffer of code units
//! - [`Rule`] - Shared handle to an immutable rule tree
//! - [`MatchResult`] - Outcome of a match
//! - [`MatchDetail`] - Node of the capture tree
//! - [`Grammar`] / [`GrammarBuilder`] - Named rule registry
//!
//! ## DSL
//! - [`lit()`], [`lit_nocase()`], [`unit()`], [`range()`], [`one_of()`],
//!   [`class()`], [`any()`] - Leaves
//! - [`seq()`], [`choice()`], [`opt()`], [`rep()`], [`named()`] - Combinators
//!
//! ## Configuration
//! - [`MatchConfig`] / [`MatchPolicy`] - Match settings
//!
//! ## Error Handling
//! - [`GrammarError`], [`MatchError`], [`RangeError`]

// ============================================================================
// Core Types
// ============================================================================

pub use crate::engine::{
    CodeUnit, Grammar, GrammarBuilder, MatchDetail, MatchResult, Rule, StringWindow,
};

// ============================================================================
// DSL
// ============================================================================

pub use crate::engine::dsl::{
    any, choice, class, lit, lit_nocase, named, one_of, opt, range, rep, seq, unit,
};
pub use crate::engine::matcher::{CharClass, Matcher};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::engine::simulator::{MatchConfig, MatchPolicy};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::error::{GrammarError, MatchError, RangeError};
