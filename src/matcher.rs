//! Import: anchor portable records onto a token stream.
//!
//! # Algorithm
//!
//! Records address characters; the index addresses tokens. The matcher
//! bridges the two in one pass over the stream:
//!
//! 1. Group records by section and build two marker maps per section:
//!    `starts[offset]` holds the records starting there, `ends[last_char]`
//!    the keys ending there. The end marker sits on the last *covered*
//!    character (`offset + length - 1`), the one convention under which a
//!    token-aligned record ends on a character some token actually covers
//!    (see [`SpanRecord::last_char`]).
//! 2. Walk tokens in stream order, consulting each token's two boundary
//!    characters: a start marker at `token.offset` opens a tracking entry
//!    for that key; an end marker at `token.last_char()` with an open
//!    entry closes it and writes the matched span into the index.
//! 3. Markers that never coincide with a token boundary simply never
//!    fire. A start inside a token, an end inside a token, an offset in
//!    glue: the record matches nothing. No error.
//!
//! # Tolerance policy
//!
//! | Input | Outcome |
//! |-------|---------|
//! | end never aligns (or lies past the window) | tracking entry dropped at section end, silently |
//! | start never aligns | never opens; its end marker finds nothing |
//! | zero-length record | skipped during marker build |
//! | two same-key records open at once | last write wins; the earlier tracker is dropped |
//!
//! Dropping instead of erroring is deliberate: a context window that
//! truncates a span mid-way must not poison the rest of the unit. Drops
//! are counted at debug level only.

use crate::index::{CodeSpan, SpanIndex};
use crate::record::{CodeKey, SpanRecord};
use crate::token::{TokenSpan, TokenStream};
use std::collections::HashMap;

/// Per-section character markers built from the record list.
#[derive(Default)]
struct Markers<'a> {
    starts: HashMap<usize, Vec<&'a SpanRecord>>,
    ends: HashMap<usize, Vec<&'a CodeKey>>,
}

/// Anchor `records` onto `stream`, producing the runtime index.
///
/// Records whose boundaries do not coincide with token boundaries are
/// dropped silently (see the module docs); everything that matches is
/// written to the index with its content duplicated across the covered
/// positions. The records themselves are never mutated.
///
/// # Example
///
/// ```
/// use spanmark::{import, SpanRecord, Token, TokenStream};
///
/// let stream = TokenStream::new(vec![
///     Token::new(0, "body", 0, "Hello"),
///     Token::new(1, "body", 6, "the"),
///     Token::new(2, "body", 10, "test"),
/// ]).unwrap();
///
/// // "Hello the" = chars 0..=8
/// let records = vec![SpanRecord::new("A", "body", 0, 9, "A")];
/// let index = import(&stream, &records);
///
/// assert!(index.contains(0, &"A".into()));
/// assert!(index.contains(1, &"A".into()));
/// assert!(!index.contains(2, &"A".into()));
/// ```
#[must_use]
pub fn import(stream: &TokenStream, records: &[SpanRecord]) -> SpanIndex {
    let mut by_section: HashMap<&str, Markers<'_>> = HashMap::new();
    let mut skipped = 0usize;
    for record in records {
        let Some(last_char) = record.last_char() else {
            skipped += 1;
            continue;
        };
        let markers = by_section.entry(record.section.as_str()).or_default();
        markers.starts.entry(record.offset).or_default().push(record);
        markers.ends.entry(last_char).or_default().push(&record.key);
    }
    if skipped > 0 {
        log::debug!("import: skipped {skipped} zero-length record(s)");
    }

    let mut index = SpanIndex::new();
    let mut open: HashMap<&CodeKey, (usize, &SpanRecord)> = HashMap::new();
    let mut current_section: Option<&str> = None;
    let mut dropped = 0usize;

    for token in stream {
        // Sections are contiguous (stream witness), so entries still open
        // when the section changes can never close.
        if current_section != Some(token.section.as_str()) {
            dropped += open.len();
            open.clear();
            current_section = Some(token.section.as_str());
        }
        let Some(markers) = by_section.get(token.section.as_str()) else {
            continue;
        };
        if let Some(starters) = markers.starts.get(&token.offset) {
            for &record in starters {
                open.insert(&record.key, (token.index, record));
            }
        }
        if let Some(enders) = markers.ends.get(&token.last_char()) {
            for &key in enders {
                if let Some((span_start, record)) = open.remove(key) {
                    let span = TokenSpan::new(span_start, token.index);
                    index.write_span(&CodeSpan::new(span, record.clone()));
                }
            }
        }
    }

    dropped += open.len();
    if dropped > 0 {
        log::debug!("import: dropped {dropped} unterminated span(s)");
    }
    index
}

// =============================================================================
// Tests
// =============================================================================
