//! Zero-copy windows over decoded input
//!
//! A [`StringWindow`] is an `(offset, length)` view into a borrowed buffer of
//! code units. Slicing a window produces another window over the same buffer;
//! nothing is ever copied. The borrow on the buffer guarantees it outlives
//! every window derived from it.
//!
//! Charset decoding is the caller's business: the engine only classifies
//! code units that are already decoded. Byte windows (`u8`), UTF-16 windows
//! (`u16`) and code-point windows (`char`, `u32`) all work the same way.

use super::error::RangeError;
use std::fmt;

/// A decoded unit of input
///
/// Matchers see every unit as its numeric value.
pub trait CodeUnit: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Numeric value of this unit (byte value, UTF-16 unit or code point)
    fn code(self) -> u32;
}

impl CodeUnit for u8 {
    #[inline(always)]
    fn code(self) -> u32 {
        self as u32
    }
}

impl CodeUnit for u16 {
    #[inline(always)]
    fn code(self) -> u32 {
        self as u32
    }
}

impl CodeUnit for u32 {
    #[inline(always)]
    fn code(self) -> u32 {
        self
    }
}

impl CodeUnit for char {
    #[inline(always)]
    fn code(self) -> u32 {
        self as u32
    }
}

/// An immutable view into a buffer of code units
///
/// # Example
///
/// ```rust
/// use nfagram::StringWindow;
///
/// let buf: Vec<char> = "key=value".chars().collect();
/// let window = StringWindow::new(&buf);
///
/// let key = window.slice(0, 3).unwrap();
/// assert_eq!(key.to_string(), "key");
/// assert!(key.same_buffer(&window));
/// ```
#[derive(Clone, Copy)]
pub struct StringWindow<'a, U: CodeUnit = char> {
    buffer: &'a [U],
    start: usize,
    len: usize,
}

impl<'a, U: CodeUnit> StringWindow<'a, U> {
    /// Window covering the whole buffer
    #[inline]
    pub fn new(buffer: &'a [U]) -> Self {
        Self {
            buffer,
            start: 0,
            len: buffer.len(),
        }
    }

    /// Window covering `start..start + len` of `buffer`
    pub fn with_bounds(buffer: &'a [U], start: usize, len: usize) -> Result<Self, RangeError> {
        match start.checked_add(len) {
            Some(end) if end <= buffer.len() => Ok(Self { buffer, start, len }),
            _ => Err(RangeError::new(start, len, buffer.len())),
        }
    }

    /// Offset of the window within its buffer
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last unit of the window
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Number of units in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window holds no units
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole backing buffer
    #[inline]
    pub fn buffer(&self) -> &'a [U] {
        self.buffer
    }

    /// The units covered by this window
    #[inline]
    pub fn as_slice(&self) -> &'a [U] {
        &self.buffer[self.start..self.start + self.len]
    }

    /// The `i`-th unit of the window
    pub fn at(&self, i: usize) -> Result<U, RangeError> {
        self.get(i).ok_or(RangeError::new(i, 1, self.len))
    }

    /// The `i`-th unit of the window, or `None` past the end
    #[inline]
    pub fn get(&self, i: usize) -> Option<U> {
        if i < self.len {
            Some(self.buffer[self.start + i])
        } else {
            None
        }
    }

    /// Sub-window of `length` units starting at `offset` (relative to this window)
    pub fn slice(&self, offset: usize, length: usize) -> Result<Self, RangeError> {
        match offset.checked_add(length) {
            Some(end) if end <= self.len => Ok(self.span(offset, length)),
            _ => Err(RangeError::new(offset, length, self.len)),
        }
    }

    /// Unchecked sub-window for offsets already known to be in bounds
    #[inline]
    pub(crate) fn span(&self, offset: usize, length: usize) -> Self {
        debug_assert!(offset + length <= self.len);
        Self {
            buffer: self.buffer,
            start: self.start + offset,
            len: length,
        }
    }

    /// Split into `[0, mid)` and `[mid, len)`
    pub fn split_at(&self, mid: usize) -> Result<(Self, Self), RangeError> {
        if mid > self.len {
            return Err(RangeError::new(mid, 0, self.len));
        }
        Ok((self.span(0, mid), self.span(mid, self.len - mid)))
    }

    /// Window without its first `n` units
    pub fn skip(&self, n: usize) -> Result<Self, RangeError> {
        self.split_at(n).map(|(_, rest)| rest)
    }

    /// Window of the first `n` units
    pub fn take(&self, n: usize) -> Result<Self, RangeError> {
        self.split_at(n).map(|(head, _)| head)
    }

    /// Drop leading units while `pred` holds
    pub fn trim_start_matches<F: Fn(U) -> bool>(&self, pred: F) -> Self {
        let skipped = self.iter().take_while(|&u| pred(u)).count();
        self.span(skipped, self.len - skipped)
    }

    /// Drop trailing units while `pred` holds
    pub fn trim_end_matches<F: Fn(U) -> bool>(&self, pred: F) -> Self {
        let kept = self.len - self.as_slice().iter().rev().take_while(|&&u| pred(u)).count();
        self.span(0, kept)
    }

    /// Drop leading and trailing whitespace
    pub fn trim(&self) -> Self {
        let is_ws = |u: U| char::from_u32(u.code()).is_some_and(char::is_whitespace);
        self.trim_start_matches(is_ws).trim_end_matches(is_ws)
    }

    /// Whether both windows view the same buffer
    #[inline]
    pub fn same_buffer(&self, other: &StringWindow<'_, U>) -> bool {
        std::ptr::eq(self.buffer.as_ptr(), other.buffer.as_ptr())
            && self.buffer.len() == other.buffer.len()
    }

    /// Iterate over the units of the window
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = U> + 'a {
        self.as_slice().iter().copied()
    }

    /// Render the window as text, replacing units that are not code points
    pub fn to_string_lossy(&self) -> String {
        self.iter()
            .map(|u| char::from_u32(u.code()).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

impl<'a> StringWindow<'a, u8> {
    /// Byte window over the UTF-8 encoding of `s`
    #[inline]
    pub fn from_utf8_bytes(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }

    /// Interpret the window as UTF-8, if it is valid
    pub fn as_utf8(&self) -> Option<&'a str> {
        std::str::from_utf8(self.as_slice()).ok()
    }
}

impl<'a, U: CodeUnit> From<&'a [U]> for StringWindow<'a, U> {
    fn from(buffer: &'a [U]) -> Self {
        Self::new(buffer)
    }
}

impl<U: CodeUnit> PartialEq for StringWindow<'_, U> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<U: CodeUnit> Eq for StringWindow<'_, U> {}

impl<U: CodeUnit> fmt::Debug for StringWindow<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StringWindow({:?} @ {}..{})",
            self.to_string_lossy(),
            self.start,
            self.end()
        )
    }
}

impl<U: CodeUnit> fmt::Display for StringWindow<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
