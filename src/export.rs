//! Export: indexed spans back to portable records.
//!
//! The index stores one copy of a span's content per covered position;
//! export walks canonical entries only (see [`SpanIndex::spans`]), so a
//! three-token span comes out exactly once. Records leave with whatever
//! character coordinates they carried in. Token positions stay behind;
//! they mean nothing outside this stream.
//!
//! With `include_text` set, each record's `text` is recaptured from the
//! stream over the span's tokens, interior glue included. A span that no
//! longer resolves against the stream captures the empty string. With
//! `include_text` unset, stored text passes through untouched, which
//! keeps byte-for-byte round trips possible on records that arrived with
//! text already attached.
//!
//! Output order is deterministic: section, then offset, then key, with
//! length and value breaking remaining ties.

use crate::codebook::Codebook;
use crate::index::SpanIndex;
use crate::record::{CodeKey, SpanRecord};
use crate::token::TokenStream;

/// Export every span in the index as portable records.
///
/// # Example
///
/// ```
/// use spanmark::{export, import, SpanRecord, Token, TokenStream};
///
/// let stream = TokenStream::new(vec![
///     Token::new(0, "body", 0, "Hello").with_glue("", " "),
///     Token::new(1, "body", 6, "the").with_glue("", " "),
///     Token::new(2, "body", 10, "test").with_glue("", ""),
/// ]).unwrap();
///
/// let records = vec![SpanRecord::new("A", "body", 0, 9, "A")];
/// let index = import(&stream, &records);
///
/// let out = export(&index, &stream, true);
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].text.as_deref(), Some("Hello the"));
/// ```
#[must_use]
pub fn export(index: &SpanIndex, stream: &TokenStream, include_text: bool) -> Vec<SpanRecord> {
    export_where(index, stream, include_text, |_| true)
}

/// Export only spans whose key is active in `codebook`.
///
/// Filtering is a view: the index is not touched, and reactivating a
/// code later makes its spans exportable again.
#[must_use]
pub fn export_visible(
    index: &SpanIndex,
    stream: &TokenStream,
    include_text: bool,
    codebook: &Codebook,
) -> Vec<SpanRecord> {
    export_where(index, stream, include_text, |key| codebook.is_active(key))
}

fn export_where(
    index: &SpanIndex,
    stream: &TokenStream,
    include_text: bool,
    keep: impl Fn(&CodeKey) -> bool,
) -> Vec<SpanRecord> {
    let mut records: Vec<SpanRecord> = index
        .spans()
        .filter(|cs| keep(cs.key()))
        .map(|cs| {
            let mut record = cs.record.clone();
            if include_text {
                record.text = Some(stream.text_of(cs.span));
            }
            record
        })
        .collect();
    records.sort_by(|a, b| {
        (a.section.as_str(), a.offset, &a.key, a.length, &a.value)
            .cmp(&(b.section.as_str(), b.offset, &b.key, b.length, &b.value))
    });
    records
}

// =============================================================================
// Tests
// =============================================================================
