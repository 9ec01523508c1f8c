//! Token stream contract: the bridge between character and token coordinates.
//!
//! # The Two Coordinate Systems
//!
//! An annotation lives in two addressing schemes at once, and every bug in
//! span handling comes from letting them drift apart:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ Section "body": "Hello the test"                                     │
//! │                                                                      │
//! │ CHAR OFFSET (portable form; survives re-tokenization)                │
//! │                                                                      │
//! │   H   e   l   l   o       t   h   e       t   e   s   t              │
//! │   0   1   2   3   4   5   6   7   8   9  10  11  12  13              │
//! │                                                                      │
//! │ TOKEN POSITION (runtime form; what the renderer iterates)            │
//! │                                                                      │
//! │   [Hello]      [the]       [test]                                    │
//! │      0           1            2                                      │
//! │   off=0,len=5  off=6,len=3  off=10,len=4                             │
//! │                                                                      │
//! │ A record {offset: 0, length: 9} covers chars 0..=8 ("Hello the")     │
//! │ and therefore tokens 0..=1. Char 5 and char 9 are glue: no token     │
//! │ covers them; each belongs to the glue of exactly one neighbor.       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Character offsets are private to a *section* (a named text field such as
//! "title" or "body"); each section numbers its characters from zero.
//! Token positions are global to the document stream and stay meaningful
//! when only a window of the stream is materialized.
//!
//! # Parse, Don't Validate
//!
//! The engine performs no tokenization. It consumes tokens from an external
//! segmenter and relies on ordering guarantees that segmenter must provide
//! (sections contiguous, offsets strictly increasing per section, counters
//! monotone, positions strictly increasing, glue within the offset gaps).
//! [`TokenStream::new`] checks
//! those guarantees exactly once; everything downstream trusts the witness
//! and never re-checks.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Range, RangeInclusive};

// =============================================================================
// Token
// =============================================================================

/// One token of a document stream, as produced by the external tokenizer.
///
/// Tokens are immutable for the lifetime of a viewing session. The engine
/// reads them; it never creates, splits, or reorders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the full per-document stream. Stable under windowing:
    /// a sub-stream keeps the original values.
    pub index: usize,
    /// Name of the text section this token belongs to.
    pub section: String,
    /// Character offset of the first covered character within its section.
    pub offset: usize,
    /// Number of characters covered. Always at least 1.
    pub length: usize,
    /// Paragraph counter, non-decreasing across the stream.
    pub paragraph: u32,
    /// Sentence counter, non-decreasing across the stream.
    pub sentence: u32,
    /// Leading glue (whitespace/punctuation before the token text).
    pub pre: String,
    /// Trailing glue (whitespace/punctuation after the token text).
    pub post: String,
    /// Surface form.
    pub text: String,
}

impl Token {
    /// Create a token with `length` computed from the text's character
    /// count, empty glue, and zeroed counters.
    ///
    /// Hosts with richer tokenizer output should fill the struct directly
    /// or use the `with_*` builders.
    #[must_use]
    pub fn new(
        index: usize,
        section: impl Into<String>,
        offset: usize,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            index,
            section: section.into(),
            offset,
            length,
            paragraph: 0,
            sentence: 0,
            pre: String::new(),
            post: String::new(),
            text,
        }
    }

    /// Set leading and trailing glue.
    #[must_use]
    pub fn with_glue(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.pre = pre.into();
        self.post = post.into();
        self
    }

    /// Set paragraph and sentence counters.
    #[must_use]
    pub fn with_counters(mut self, paragraph: u32, sentence: u32) -> Self {
        self.paragraph = paragraph;
        self.sentence = sentence;
        self
    }

    /// Character offset of the last covered character (inclusive).
    ///
    /// Tokens always cover at least one character, so this never underflows
    /// on a stream that passed validation.
    #[must_use]
    pub fn last_char(&self) -> usize {
        self.offset + self.length.saturating_sub(1)
    }

    /// Whether this token covers the given character offset of its section.
    #[must_use]
    pub fn covers(&self, char_offset: usize) -> bool {
        char_offset >= self.offset && char_offset <= self.last_char()
    }
}

// =============================================================================
// TokenSpan
// =============================================================================

/// An inclusive range of token positions covered by one annotation.
///
/// Both bounds are inclusive: `TokenSpan::new(2, 4)` covers tokens 2, 3
/// and 4. A single-token annotation has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpan {
    /// First covered token position (inclusive).
    pub start: usize,
    /// Last covered token position (inclusive).
    pub end: usize,
}

impl TokenSpan {
    /// Create a span. Callers must pass `start <= end`; use
    /// [`TokenSpan::ordered`] when the bounds come from a UI selection
    /// that may be reversed.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span from two positions in either order.
    #[must_use]
    pub fn ordered(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Span covering a single token.
    #[must_use]
    pub const fn single(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Number of covered token positions.
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Whether the span covers no positions (only possible for a
    /// manually constructed reversed span).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Whether the span covers the given token position.
    #[must_use]
    pub const fn contains(&self, position: usize) -> bool {
        position >= self.start && position <= self.end
    }

    /// Whether two spans share at least one token position.
    #[must_use]
    pub const fn overlaps(&self, other: &TokenSpan) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// Iterate the covered token positions in order.
    #[must_use]
    pub const fn positions(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl std::fmt::Display for TokenSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// =============================================================================
// TokenStream
// =============================================================================

/// A validated, ordered token stream.
///
/// Construction is the single place the tokenizer contract is checked:
///
/// - sections are contiguous (a section never reappears once left);
/// - character offsets are strictly increasing within each section and
///   token coverage never overlaps;
/// - glue fits the gaps: a leading `pre` never extends before its section
///   start, and between adjacent tokens `post` plus `pre` never claim more
///   characters than the offsets leave;
/// - `paragraph` and `sentence` counters are non-decreasing stream-wide;
/// - token positions (`index`) are strictly increasing;
/// - every token covers at least one character.
///
/// The stream may be the whole document or a window of it (see
/// [`TokenStream::window`]); in a window, token positions keep their
/// document-global values so spans built against the full stream remain
/// addressable.
///
/// # Example
///
/// ```
/// use spanmark::{Token, TokenStream};
///
/// let stream = TokenStream::new(vec![
///     Token::new(0, "body", 0, "Hello"),
///     Token::new(1, "body", 6, "the"),
///     Token::new(2, "body", 10, "test"),
/// ]).unwrap();
///
/// assert_eq!(stream.len(), 3);
/// assert_eq!(stream.get(1).unwrap().text, "the");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Validate a token vector against the tokenizer contract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokens`] naming the first offending token when any
    /// contract clause is violated.
    pub fn new(tokens: Vec<Token>) -> Result<Self> {
        let mut closed_sections: Vec<&str> = Vec::new();
        for (slot, token) in tokens.iter().enumerate() {
            if token.length == 0 {
                return Err(Error::tokens(format!(
                    "token {} (slot {}) covers no characters",
                    token.index, slot
                )));
            }
            let Some(prev) = slot.checked_sub(1).map(|p| &tokens[p]) else {
                if token.pre.chars().count() > token.offset {
                    return Err(Error::tokens(format!(
                        "leading glue of token {} extends before its section start",
                        token.index
                    )));
                }
                continue;
            };
            if token.index <= prev.index {
                return Err(Error::tokens(format!(
                    "token position not strictly increasing at slot {} ({} after {})",
                    slot, token.index, prev.index
                )));
            }
            if token.paragraph < prev.paragraph || token.sentence < prev.sentence {
                return Err(Error::tokens(format!(
                    "paragraph/sentence counter decreased at token {}",
                    token.index
                )));
            }
            if token.section == prev.section {
                if token.offset <= prev.offset {
                    return Err(Error::tokens(format!(
                        "offset not strictly increasing in section {:?} at token {}",
                        token.section, token.index
                    )));
                }
                if token.offset < prev.offset + prev.length {
                    return Err(Error::tokens(format!(
                        "token {} overlaps the characters of token {} in section {:?}",
                        token.index, prev.index, token.section
                    )));
                }
                // Every glue character between two tokens belongs to exactly
                // one of them; claiming more than the gap holds would make
                // text reconstruction duplicate characters.
                let gap = token.offset - (prev.offset + prev.length);
                let claimed = prev.post.chars().count() + token.pre.chars().count();
                if claimed > gap {
                    return Err(Error::tokens(format!(
                        "glue between tokens {} and {} claims {claimed} character(s) \
                         but the offsets leave {gap}",
                        prev.index, token.index
                    )));
                }
            } else {
                if closed_sections.iter().any(|s| *s == token.section) {
                    return Err(Error::tokens(format!(
                        "section {:?} reappears at token {}",
                        token.section, token.index
                    )));
                }
                closed_sections.push(prev.section.as_str());
                if token.pre.chars().count() > token.offset {
                    return Err(Error::tokens(format!(
                        "leading glue of token {} extends before its section start",
                        token.index
                    )));
                }
            }
        }
        Ok(Self { tokens })
    }

    /// Number of tokens in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the stream holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The tokens in stream order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Iterate tokens in stream order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Look up a token by its document-global position.
    ///
    /// Binary search over the (sorted by construction) stream; `None` when
    /// the position is outside the materialized window.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Token> {
        let slot = self.position_of(index)?;
        Some(&self.tokens[slot])
    }

    /// Slice position of the token with the given document-global position.
    #[must_use]
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.tokens
            .binary_search_by_key(&index, |t| t.index)
            .ok()
    }

    /// First token of the stream.
    #[must_use]
    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// Last token of the stream.
    #[must_use]
    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Materialize a window of the stream by document-global position.
    ///
    /// The window keeps global positions, so an index built against the
    /// full document remains addressable from it. Spans that extend past
    /// the window edge are simply truncated from the matcher's point of
    /// view and fall under the unterminated-span drop policy. An inverted
    /// range (start past end) yields an empty window.
    #[must_use]
    pub fn window(&self, range: Range<usize>) -> TokenStream {
        let from = self.tokens.partition_point(|t| t.index < range.start);
        let to = self.tokens.partition_point(|t| t.index < range.end).max(from);
        TokenStream {
            tokens: self.tokens[from..to].to_vec(),
        }
    }

    /// Reconstruct the text covered by a token span.
    ///
    /// Concatenates `pre + text + post` across the covered tokens, trimming
    /// the first token's `pre` and the last token's `post` so that only
    /// interior glue is captured. Positions missing from a windowed stream
    /// contribute nothing.
    #[must_use]
    pub fn text_of(&self, span: TokenSpan) -> String {
        let from = self.tokens.partition_point(|t| t.index < span.start);
        let covered: Vec<&Token> = self.tokens[from..]
            .iter()
            .take_while(|t| t.index <= span.end)
            .collect();
        let mut out = String::new();
        let last = covered.len().saturating_sub(1);
        for (i, token) in covered.iter().enumerate() {
            if i > 0 {
                out.push_str(&token.pre);
            }
            out.push_str(&token.text);
            if i < last {
                out.push_str(&token.post);
            }
        }
        out
    }

    /// Consume the stream, returning the token vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<Token> {
        self.tokens
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
