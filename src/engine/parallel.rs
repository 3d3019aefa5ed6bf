//! Batch matching
//!
//! Rules are read-only after construction and their automata are shared
//! through `OnceLock`, so one rule can be matched against many windows from
//! many threads. With the `parallel` feature the batch functions use rayon's
//! work-stealing pool; without it they run sequentially with the same
//! signatures.
//!
//! ```toml
//! [dependencies]
//! nfagram = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use nfagram::engine::dsl::lit;
//! use nfagram::engine::parallel::match_batch_parallel;
//! use nfagram::StringWindow;
//!
//! let rule = lit("GET ");
//! let lines = ["GET /", "PUT /", "GET /x"];
//! let buffers: Vec<Vec<char>> = lines.iter().map(|l| l.chars().collect()).collect();
//! let windows: Vec<StringWindow<'_>> = buffers.iter().map(|b| StringWindow::new(b)).collect();
//!
//! let results = match_batch_parallel(&rule, &windows);
//! let hits: Vec<bool> = results.iter().map(|r| !r.fail).collect();
//! assert_eq!(hits, vec![true, false, true]);
//! ```

use super::result::MatchResult;
use super::rule::Rule;
use super::window::{CodeUnit, StringWindow};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Match `rule` at the start of every window
///
/// Results are in the same order as `windows`.
#[cfg(feature = "parallel")]
pub fn match_batch_parallel<'a, U: CodeUnit>(
    rule: &Rule,
    windows: &[StringWindow<'a, U>],
) -> Vec<MatchResult<'a, U>> {
    // compile before fanning out
    rule.automaton();
    windows.par_iter().map(|w| rule.at_start_of(*w)).collect()
}

/// Match `rule` at the start of every window (sequential fallback)
#[cfg(not(feature = "parallel"))]
pub fn match_batch_parallel<'a, U: CodeUnit>(
    rule: &Rule,
    windows: &[StringWindow<'a, U>],
) -> Vec<MatchResult<'a, U>> {
    windows.iter().map(|w| rule.at_start_of(*w)).collect()
}

/// Match `rule` against the UTF-8 bytes of every input
pub fn match_batch_bytes<'a>(rule: &Rule, inputs: &[&'a str]) -> Vec<MatchResult<'a, u8>> {
    let windows: Vec<StringWindow<'a, u8>> = inputs
        .iter()
        .map(|s| StringWindow::from_utf8_bytes(s))
        .collect();
    match_batch_parallel(rule, &windows)
}

/// Configuration for batch matching
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use (None = rayon's global pool)
    pub num_threads: Option<usize>,
    /// Minimum number of windows handed to one task
    pub min_chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_chunk_size: 1,
        }
    }
}

impl ParallelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads to use
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set the minimum chunk size
    pub fn with_min_chunk_size(mut self, size: usize) -> Self {
        self.min_chunk_size = size;
        self
    }
}

/// [`match_batch_parallel`] with explicit pool settings
#[cfg(feature = "parallel")]
pub fn match_batch_with_config<'a, U: CodeUnit>(
    rule: &Rule,
    windows: &[StringWindow<'a, U>],
    config: &ParallelConfig,
) -> Vec<MatchResult<'a, U>> {
    rule.automaton();
    let run = || {
        windows
            .par_iter()
            .with_min_len(config.min_chunk_size.max(1))
            .map(|w| rule.at_start_of(*w))
            .collect::<Vec<_>>()
    };

    match config.num_threads {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(run),
            Err(_err) => {
                log_debug!("falling back to the global pool: {}", _err);
                run()
            }
        },
        None => run(),
    }
}

/// [`match_batch_parallel`] with explicit pool settings (sequential fallback)
#[cfg(not(feature = "parallel"))]
pub fn match_batch_with_config<'a, U: CodeUnit>(
    rule: &Rule,
    windows: &[StringWindow<'a, U>],
    _config: &ParallelConfig,
) -> Vec<MatchResult<'a, U>> {
    match_batch_parallel(rule, windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{class, lit, named};
    use crate::engine::matcher::CharClass;

    #[test]
    fn test_batch_keeps_order() {
        let rule = named("n", class(CharClass::Digit).many1()).unwrap();
        let buffers: Vec<Vec<char>> = ["12a", "x", "345", ""]
            .iter()
            .map(|s| s.chars().collect())
            .collect();
        let windows: Vec<StringWindow<'_>> = buffers.iter().map(|b| StringWindow::new(b)).collect();

        let results = match_batch_parallel(&rule, &windows);
        assert_eq!(results.len(), 4);

        let matched: Vec<Option<String>> = results
            .iter()
            .map(|r| r.matched.map(|m| m.to_string()))
            .collect();
        assert_eq!(
            matched,
            vec![Some("12".into()), None, Some("345".into()), None]
        );
    }

    #[test]
    fn test_batch_bytes() {
        let rule = lit("hello");
        let results = match_batch_bytes(&rule, &["hello, wörld", "héllo"]);

        assert!(!results[0].fail);
        assert_eq!(results[0].consumed(), 5);
        assert_eq!(results[0].remain.unwrap().as_utf8(), Some(", wörld"));
        assert!(results[1].fail);
    }

    #[test]
    fn test_batch_with_config() {
        let rule = lit("a");
        let buf: Vec<char> = "a".chars().collect();
        let windows = vec![StringWindow::new(&buf); 16];
        let config = ParallelConfig::new()
            .with_num_threads(2)
            .with_min_chunk_size(4);

        let results = match_batch_with_config(&rule, &windows, &config);
        assert_eq!(results.len(), 16);
        assert!(results.iter().all(|r| !r.fail));
    }

    #[test]
    fn test_parallel_config_builder() {
        let config = ParallelConfig::default();
        assert!(config.num_threads.is_none());
        assert_eq!(config.min_chunk_size, 1);

        let config = ParallelConfig::new()
            .with_num_threads(4)
            .with_min_chunk_size(10);
        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.min_chunk_size, 10);
    }
}
