//! Single-unit predicates used on automaton edges
//!
//! A [`Matcher`] classifies one code unit. It is the alphabet of the
//! automaton: every consuming transition carries exactly one matcher.
//!
//! Sets are kept as sorted, disjoint, non-adjacent ranges so membership is a
//! binary search, which keeps big classes such as [`CharClass::Letter`]
//! cheap to test.
//!
//! # Example
//!
//! ```rust
//! use nfagram::engine::matcher::{CharClass, Matcher};
//!
//! let hex = Matcher::class(CharClass::HexDigit);
//! assert!(hex.test('F' as u32));
//! assert!(!hex.test('g' as u32));
//!
//! let vowel = Matcher::one_of("aeiou").case_insensitive();
//! assert!(vowel.test('E' as u32));
//! ```

use super::error::GrammarError;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Static lookup table for class name -> CharClass
static CLASS_NAMES: OnceLock<HashMap<&'static str, CharClass>> = OnceLock::new();

/// Lazily computed ranges of all Unicode alphabetic code points
static LETTER_RANGES: OnceLock<Vec<(u32, u32)>> = OnceLock::new();

/// Lazily computed ranges of all Unicode whitespace code points
static WHITESPACE_RANGES: OnceLock<Vec<(u32, u32)>> = OnceLock::new();

/// Predicate over a single code unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MatcherDef")]
pub enum Matcher {
    /// Exactly this unit
    Unit(u32),

    /// Any unit in `low..=high`
    Range {
        /// Inclusive lower bound
        low: u32,
        /// Inclusive upper bound
        high: u32,
    },

    /// Any unit in the set
    Set(CharSet),

    /// Any unit of a named class
    Class(CharClass),

    /// Any unit the inner matcher rejects
    Not(Box<Matcher>),

    /// The inner matcher, ignoring simple case differences
    CaseFold(Box<Matcher>),

    /// Every unit
    Any,
}

impl Matcher {
    /// Match exactly `c`
    #[inline]
    pub fn unit(c: char) -> Self {
        Matcher::Unit(c as u32)
    }

    /// Match any unit in `low..=high`
    pub fn range(low: u32, high: u32) -> Result<Self, GrammarError> {
        if low > high {
            return Err(GrammarError::EmptyRange { low, high });
        }
        Ok(Matcher::Range { low, high })
    }

    /// Match any unit in `low..=high`, with `char` bounds
    pub fn char_range(low: char, high: char) -> Result<Self, GrammarError> {
        Self::range(low as u32, high as u32)
    }

    /// Match any of the given ranges
    pub fn set<I>(ranges: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        CharSet::new(ranges).map(Matcher::Set)
    }

    /// Match any character of `chars`
    pub fn one_of(chars: &str) -> Self {
        Matcher::Set(CharSet::from_units(chars.chars().map(|c| c as u32)))
    }

    /// Match any unit of a named class
    #[inline]
    pub fn class(class: CharClass) -> Self {
        Matcher::Class(class)
    }

    /// Invert this matcher
    pub fn negate(self) -> Self {
        match self {
            Matcher::Not(inner) => *inner,
            other => Matcher::Not(Box::new(other)),
        }
    }

    /// Ignore simple case differences
    ///
    /// Folding applies beneath a negation, so a case-insensitive `!"a"`
    /// rejects both `a` and `A`.
    pub fn case_insensitive(self) -> Self {
        match self {
            Matcher::CaseFold(_) | Matcher::Any => self,
            Matcher::Not(inner) => Matcher::Not(Box::new(inner.case_insensitive())),
            other => Matcher::CaseFold(Box::new(other)),
        }
    }

    /// Whether `c` is accepted
    pub fn test(&self, c: u32) -> bool {
        match self {
            Matcher::Unit(u) => *u == c,
            Matcher::Range { low, high } => *low <= c && c <= *high,
            Matcher::Set(set) => set.contains(c),
            Matcher::Class(class) => class.contains(c),
            Matcher::Not(inner) => !inner.test(c),
            Matcher::CaseFold(inner) => inner.test_folded(c),
            Matcher::Any => true,
        }
    }

    /// Whether `c` or one of its case variants is accepted
    fn test_folded(&self, c: u32) -> bool {
        match self {
            Matcher::Not(inner) => !inner.test_folded(c),
            Matcher::CaseFold(inner) => inner.test_folded(c),
            other => {
                other.test(c) || case_variants(c).into_iter().flatten().any(|v| other.test(v))
            }
        }
    }

    /// ABNF-style rendering; `as_hex` forces numeric notation
    pub fn describe(&self, as_hex: bool) -> String {
        match self {
            Matcher::Unit(c) => describe_unit(*c, as_hex),
            Matcher::Range { low, high } => format!("%x{:02X}-{:02X}", low, high),
            Matcher::Set(set) => set.describe(),
            Matcher::Class(class) => class.name().to_string(),
            Matcher::Not(inner) => format!("!{}", inner.describe(as_hex)),
            Matcher::CaseFold(inner) => match inner.as_ref() {
                Matcher::Unit(c) if !as_hex && is_printable(*c) => {
                    format!("%i{}", describe_unit(*c, false))
                }
                other => format!("%i({})", other.describe(as_hex)),
            },
            Matcher::Any => "ANY".to_string(),
        }
    }
}

/// Unvalidated shape of [`Matcher`] as read from JSON
#[derive(Deserialize)]
enum MatcherDef {
    Unit(u32),
    Range { low: u32, high: u32 },
    Set(CharSet),
    Class(CharClass),
    Not(Box<Matcher>),
    CaseFold(Box<Matcher>),
    Any,
}

impl TryFrom<MatcherDef> for Matcher {
    type Error = GrammarError;

    fn try_from(def: MatcherDef) -> Result<Self, Self::Error> {
        Ok(match def {
            MatcherDef::Unit(c) => Matcher::Unit(c),
            MatcherDef::Range { low, high } => Matcher::range(low, high)?,
            MatcherDef::Set(set) => Matcher::Set(set),
            MatcherDef::Class(class) => Matcher::Class(class),
            MatcherDef::Not(inner) => Matcher::Not(inner),
            MatcherDef::CaseFold(inner) => Matcher::CaseFold(inner),
            MatcherDef::Any => Matcher::Any,
        })
    }
}

/// Printable ASCII that can appear inside an ABNF quoted string
#[inline]
pub(crate) fn is_printable(c: u32) -> bool {
    (0x20..=0x7E).contains(&c) && c != '"' as u32
}

fn describe_unit(c: u32, as_hex: bool) -> String {
    if !as_hex && is_printable(c) {
        // Printable ASCII always maps to a char
        format!("\"{}\"", char::from_u32(c).unwrap_or('?'))
    } else {
        format!("%x{:02X}", c)
    }
}

/// Single-character lower/upper variants of `c`
fn case_variants(c: u32) -> [Option<u32>; 2] {
    let Some(ch) = char::from_u32(c) else {
        return [None, None];
    };
    [single(ch.to_lowercase()), single(ch.to_uppercase())]
}

fn single(mut it: impl Iterator<Item = char>) -> Option<u32> {
    let first = it.next()?;
    match it.next() {
        Some(_) => None,
        None => Some(first as u32),
    }
}

fn ranges_contain(ranges: &[(u32, u32)], c: u32) -> bool {
    ranges
        .binary_search_by(|&(low, high)| {
            if high < c {
                Ordering::Less
            } else if low > c {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

/// Sort and merge overlapping or adjacent ranges
fn normalize(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (low, high) in ranges {
        match merged.last_mut() {
            Some(last) if low <= last.1.saturating_add(1) => last.1 = last.1.max(high),
            _ => merged.push((low, high)),
        }
    }
    merged
}

/// Compress every code point satisfying `pred` into ranges
fn scan_ranges(pred: fn(char) -> bool) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for cp in 0..=char::MAX as u32 {
        let hit = char::from_u32(cp).is_some_and(pred);
        if !hit {
            continue;
        }
        match ranges.last_mut() {
            Some(last) if last.1 + 1 == cp => last.1 = cp,
            _ => ranges.push((cp, cp)),
        }
    }
    ranges
}

/// Sorted, disjoint set of inclusive code-unit ranges
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<(u32, u32)>", into = "Vec<(u32, u32)>")]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    /// Build from possibly overlapping ranges
    pub fn new<I>(ranges: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let ranges: Vec<(u32, u32)> = ranges.into_iter().collect();
        if let Some(&(low, high)) = ranges.iter().find(|(low, high)| low > high) {
            return Err(GrammarError::EmptyRange { low, high });
        }
        Ok(Self {
            ranges: normalize(ranges),
        })
    }

    /// Build from individual units
    pub fn from_units<I>(units: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            ranges: normalize(units.into_iter().map(|u| (u, u)).collect()),
        }
    }

    /// The normalized ranges
    #[inline]
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    /// Membership test, O(log k) in the number of ranges
    #[inline]
    pub fn contains(&self, c: u32) -> bool {
        ranges_contain(&self.ranges, c)
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self
            .ranges
            .iter()
            .map(|&(low, high)| {
                if low == high {
                    format!("%x{:02X}", low)
                } else {
                    format!("%x{:02X}-{:02X}", low, high)
                }
            })
            .collect();
        match parts.len() {
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", parts.join(" / ")),
        }
    }
}

impl TryFrom<Vec<(u32, u32)>> for CharSet {
    type Error = GrammarError;

    fn try_from(ranges: Vec<(u32, u32)>) -> Result<Self, Self::Error> {
        CharSet::new(ranges)
    }
}

impl From<CharSet> for Vec<(u32, u32)> {
    fn from(set: CharSet) -> Self {
        set.ranges
    }
}

/// Named character classes
///
/// The ASCII classes follow the ABNF core rules; `Letter` and `Whitespace`
/// cover all of Unicode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharClass {
    /// `0-9`
    Digit,
    /// `0-9a-fA-F`
    HexDigit,
    /// `a-z`
    Lower,
    /// `A-Z`
    Upper,
    /// `a-zA-Z`
    Alpha,
    /// `a-zA-Z0-9`
    Alnum,
    /// `a-zA-Z0-9_`
    Word,
    /// ASCII whitespace: space, `\t`, `\n`, `\v`, `\f`, `\r`
    Space,
    /// Space and tab
    Blank,
    /// ASCII control characters
    Cntrl,
    /// ASCII punctuation
    Punct,
    /// Visible ASCII (`!` through `~`)
    Graph,
    /// Visible ASCII and space
    Print,
    /// Any Unicode alphabetic code point
    Letter,
    /// Any Unicode whitespace code point
    Whitespace,
}

impl CharClass {
    /// Look up a class by its ABNF-style name or regex shorthand
    ///
    /// | Name | Class |
    /// |------|-------|
    /// | `DIGIT`, `\d` | Digit |
    /// | `HEXDIG` | HexDigit |
    /// | `LOWER` | Lower |
    /// | `UPPER` | Upper |
    /// | `ALPHA` | Alpha |
    /// | `ALNUM` | Alnum |
    /// | `WORD`, `\w` | Word |
    /// | `SPACE`, `\s` | Space |
    /// | `WSP`, `\h` | Blank |
    /// | `CTL` | Cntrl |
    /// | `PUNCT` | Punct |
    /// | `VCHAR` | Graph |
    /// | `PRINT` | Print |
    /// | `LETTER`, `\p{L}` | Letter |
    /// | `WHITESPACE` | Whitespace |
    pub fn from_name(name: &str) -> Option<Self> {
        CLASS_NAMES
            .get_or_init(|| {
                HashMap::from([
                    ("DIGIT", Self::Digit),
                    ("\\d", Self::Digit),
                    ("HEXDIG", Self::HexDigit),
                    ("LOWER", Self::Lower),
                    ("UPPER", Self::Upper),
                    ("ALPHA", Self::Alpha),
                    ("ALNUM", Self::Alnum),
                    ("WORD", Self::Word),
                    ("\\w", Self::Word),
                    ("SPACE", Self::Space),
                    ("\\s", Self::Space),
                    ("WSP", Self::Blank),
                    ("\\h", Self::Blank),
                    ("CTL", Self::Cntrl),
                    ("PUNCT", Self::Punct),
                    ("VCHAR", Self::Graph),
                    ("PRINT", Self::Print),
                    ("LETTER", Self::Letter),
                    ("\\p{L}", Self::Letter),
                    ("WHITESPACE", Self::Whitespace),
                ])
            })
            .get(name)
            .copied()
    }

    /// Canonical name, as used in rule descriptions
    pub fn name(&self) -> &'static str {
        match self {
            Self::Digit => "DIGIT",
            Self::HexDigit => "HEXDIG",
            Self::Lower => "LOWER",
            Self::Upper => "UPPER",
            Self::Alpha => "ALPHA",
            Self::Alnum => "ALNUM",
            Self::Word => "WORD",
            Self::Space => "SPACE",
            Self::Blank => "WSP",
            Self::Cntrl => "CTL",
            Self::Punct => "PUNCT",
            Self::Graph => "VCHAR",
            Self::Print => "PRINT",
            Self::Letter => "LETTER",
            Self::Whitespace => "WHITESPACE",
        }
    }

    /// Sorted ranges making up this class
    pub fn ranges(&self) -> &'static [(u32, u32)] {
        match self {
            Self::Digit => &[(0x30, 0x39)],
            Self::HexDigit => &[(0x30, 0x39), (0x41, 0x46), (0x61, 0x66)],
            Self::Lower => &[(0x61, 0x7A)],
            Self::Upper => &[(0x41, 0x5A)],
            Self::Alpha => &[(0x41, 0x5A), (0x61, 0x7A)],
            Self::Alnum => &[(0x30, 0x39), (0x41, 0x5A), (0x61, 0x7A)],
            Self::Word => &[(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)],
            Self::Space => &[(0x09, 0x0D), (0x20, 0x20)],
            Self::Blank => &[(0x09, 0x09), (0x20, 0x20)],
            Self::Cntrl => &[(0x00, 0x1F), (0x7F, 0x7F)],
            Self::Punct => &[(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)],
            Self::Graph => &[(0x21, 0x7E)],
            Self::Print => &[(0x20, 0x7E)],
            Self::Letter => LETTER_RANGES
                .get_or_init(|| scan_ranges(char::is_alphabetic))
                .as_slice(),
            Self::Whitespace => {
                WHITESPACE_RANGES
                    .get_or_init(|| scan_ranges(char::is_whitespace))
                    .as_slice()
            }
        }
    }

    /// Membership test
    #[inline]
    pub fn contains(&self, c: u32) -> bool {
        ranges_contain(self.ranges(), c)
    }
}
