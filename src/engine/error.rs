//! Error types for nfagram
//!
//! Three kinds of failure are kept apart:
//!
//! - [`GrammarError`] - a rule or grammar could not be built. Raised by
//!   constructors only; a malformed grammar never exists as a value.
//! - [`RangeError`] - a window was sliced or indexed out of bounds. This is
//!   caller misuse, not a data error.
//! - [`MatchError`] - a configured match refused to run (input over the
//!   configured limit).
//!
//! "No match" is none of these. It is reported through
//! [`MatchResult::fail`](super::result::MatchResult::fail).

use std::fmt;

/// Error raised while constructing rules, matchers or grammars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Repetition with `min > max`
    InvalidRepeat {
        /// Requested minimum count
        min: usize,
        /// Requested maximum count
        max: usize,
    },

    /// Code-unit range with `low > high`
    EmptyRange {
        /// Lower bound
        low: u32,
        /// Upper bound
        high: u32,
    },

    /// Choice without any alternative
    EmptyChoice,

    /// Named rule with an empty name
    EmptyName,

    /// The same rule name was registered twice
    DuplicateRule {
        /// The offending name
        name: String,
    },

    /// A rule name was referenced but never defined
    UnknownRule {
        /// The missing name
        name: String,
    },

    /// Grammar without any rule
    EmptyGrammar,

    /// Grammar (de)serialization failed
    Serialization {
        /// Message from serde_json
        message: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::InvalidRepeat { min, max } => {
                write!(f, "Invalid repetition: min {} exceeds max {}", min, max)
            }
            GrammarError::EmptyRange { low, high } => {
                write!(
                    f,
                    "Empty range: low %x{:X} exceeds high %x{:X}",
                    low, high
                )
            }
            GrammarError::EmptyChoice => write!(f, "Choice requires at least one alternative"),
            GrammarError::EmptyName => write!(f, "Rule name must not be empty"),
            GrammarError::DuplicateRule { name } => {
                write!(f, "Rule '{}' is already defined", name)
            }
            GrammarError::UnknownRule { name } => write!(f, "Rule '{}' is not defined", name),
            GrammarError::EmptyGrammar => write!(f, "Grammar defines no rules"),
            GrammarError::Serialization { message } => {
                write!(f, "Grammar serialization failed: {}", message)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

impl From<serde_json::Error> for GrammarError {
    fn from(err: serde_json::Error) -> Self {
        GrammarError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Out-of-bounds access on a [`StringWindow`](super::window::StringWindow)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeError {
    /// Requested offset, relative to the window start
    pub offset: usize,
    /// Requested length (1 for single-unit access)
    pub length: usize,
    /// Length of the window that was accessed
    pub bound: usize,
}

impl RangeError {
    #[inline]
    pub(crate) fn new(offset: usize, length: usize, bound: usize) -> Self {
        Self {
            offset,
            length,
            bound,
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range {}..{} out of bounds for window of length {}",
            self.offset,
            self.offset.saturating_add(self.length),
            self.bound
        )
    }
}

impl std::error::Error for RangeError {}

/// Error from a configured match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Window exceeds the configured maximum input size
    InputTooLarge {
        /// Length of the window in code units
        input_size: usize,
        /// Configured limit
        max_size: usize,
    },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InputTooLarge {
                input_size,
                max_size,
            } => write!(
                f,
                "Input too large: {} code units exceeds limit of {}",
                input_size, max_size
            ),
        }
    }
}

impl std::error::Error for MatchError {}
