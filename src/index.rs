//! The runtime form: a token-position-keyed span index.
//!
//! # Why Duplicate
//!
//! The renderer asks one question for every visible token on every frame:
//! "does token T carry key K?". The index answers in O(1) by storing the
//! *same* [`CodeSpan`] content at every position its span covers:
//!
//! ```text
//! token position:   0         1         2         3
//!                 ┌─────────┬─────────┬─────────┬─────────┐
//! slots:          │ {A, B}  │ {A}     │ {A}     │ (none)  │
//!                 └─────────┴─────────┴─────────┴─────────┘
//!
//! A: span [0, 2]; the same CodeSpan stored at positions 0, 1 and 2
//! B: span [0, 0]
//!
//! slots[2]["A"]          → O(1) hit, carries the full span [0, 2]
//! slots[2]["A"].span     → enough to clear the whole span from any hit
//! ```
//!
//! The price is that every mutation is a synchronized multi-position
//! write. Those writes are encapsulated in exactly two crate-internal
//! primitives (`write_span` and `clear_span`); nothing else touches the
//! slot maps, so the invariants below cannot be violated piecemeal.
//!
//! # Invariants
//!
//! 1. Key K present at position p implies `span.start <= p <= span.end`.
//! 2. K at p with span s implies K present at *every* position of s with
//!    identical content.
//! 3. At most one [`CodeSpan`] per `(position, key)`. Distinct keys stack
//!    freely on one token; one key never occupies overlapping spans.
//! 4. `position == span.start` is the canonical slot; deduplicating
//!    iteration (export, [`SpanIndex::spans`]) keeps only canonical hits.
//!
//! An index is exclusively owned by one editing session and discarded on
//! unit switch; persistence goes through the portable form (see the
//! export module), never by serializing this structure.

use crate::record::{CodeKey, SpanRecord};
use crate::token::TokenSpan;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// CodeSpan
// =============================================================================

/// The per-position payload: a portable record anchored to a token span.
///
/// This is what gets duplicated across covered positions. Cloning it is
/// cheap relative to document scale (a few strings plus the optional
/// metadata payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSpan {
    /// Inclusive token range this annotation covers.
    pub span: TokenSpan,
    /// The anchored portable record, carried verbatim for round-trip
    /// fidelity (including `text` and `metadata`).
    pub record: SpanRecord,
}

impl CodeSpan {
    /// Anchor a record to a token span.
    #[must_use]
    pub fn new(span: TokenSpan, record: SpanRecord) -> Self {
        Self { span, record }
    }

    /// The identity key this annotation occupies tokens under.
    #[must_use]
    pub fn key(&self) -> &CodeKey {
        &self.record.key
    }

    /// Whether `position` is this span's canonical (first) slot.
    #[must_use]
    pub fn is_canonical_at(&self, position: usize) -> bool {
        position == self.span.start
    }
}

// =============================================================================
// SpanIndex
// =============================================================================

/// Token-position-keyed annotation index for one document unit.
///
/// Built by the matcher from portable records, mutated in place by the
/// toggle operations, flushed back to portable records by the exporter.
/// All reads are O(1) in the number of indexed positions.
///
/// # Example
///
/// ```
/// use spanmark::{CodeSpan, SpanIndex, SpanRecord, TokenSpan};
///
/// let mut index = SpanIndex::new();
/// let record = SpanRecord::new("greeting", "body", 0, 9, "greeting");
/// index.add(&CodeSpan::new(TokenSpan::new(0, 1), record));
///
/// assert!(index.contains(0, &"greeting".into()));
/// assert!(index.contains(1, &"greeting".into()));
/// assert!(!index.contains(2, &"greeting".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanIndex {
    slots: HashMap<usize, HashMap<CodeKey, CodeSpan>>,
}

impl SpanIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no annotation is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of distinct logical spans (canonical entries).
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.spans().count()
    }

    /// Number of token positions carrying at least one annotation.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.slots.len()
    }

    /// The annotation under `key` covering `position`, if any.
    #[must_use]
    pub fn get(&self, position: usize, key: &CodeKey) -> Option<&CodeSpan> {
        self.slots.get(&position)?.get(key)
    }

    /// Whether `position` carries an annotation under `key`.
    #[must_use]
    pub fn contains(&self, position: usize, key: &CodeKey) -> bool {
        self.get(position, key).is_some()
    }

    /// All annotations covering `position`, in no particular order.
    pub fn at(&self, position: usize) -> impl Iterator<Item = &CodeSpan> {
        self.slots.get(&position).into_iter().flat_map(|m| m.values())
    }

    /// The identity keys present at `position`, in no particular order.
    pub fn keys_at(&self, position: usize) -> impl Iterator<Item = &CodeKey> {
        self.slots.get(&position).into_iter().flat_map(|m| m.keys())
    }

    /// Iterate every logical span exactly once (canonical slots only),
    /// in no particular order. The exporter sorts; renderers that need
    /// order should sort by `span.start`.
    pub fn spans(&self) -> impl Iterator<Item = &CodeSpan> {
        self.slots.iter().flat_map(|(position, by_key)| {
            by_key
                .values()
                .filter(move |cs| cs.is_canonical_at(*position))
        })
    }

    /// All logical spans under one key, sorted by start position.
    #[must_use]
    pub fn spans_of(&self, key: &CodeKey) -> Vec<&CodeSpan> {
        let mut found: Vec<&CodeSpan> = self
            .slots
            .iter()
            .filter_map(|(position, by_key)| {
                by_key
                    .get(key)
                    .filter(|cs| cs.is_canonical_at(*position))
            })
            .collect();
        found.sort_by_key(|cs| cs.span.start);
        found
    }

    /// Summary counts for host UI (sidebars, unit headers).
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let mut keys: Vec<&CodeKey> = Vec::new();
        let mut spans = 0usize;
        for (position, by_key) in &self.slots {
            for cs in by_key.values() {
                if cs.is_canonical_at(*position) {
                    spans += 1;
                    if !keys.contains(&cs.key()) {
                        keys.push(cs.key());
                    }
                }
            }
        }
        IndexStats {
            spans,
            positions: self.slots.len(),
            keys: keys.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Mutation primitives. The ONLY code that writes the slot maps.
    // -------------------------------------------------------------------------

    /// Write `cs` at every position of its span.
    ///
    /// Callers must have cleared conflicting same-key spans first (the
    /// toggle operations do); writing blindly over an overlapping same-key
    /// span would strand its out-of-range duplicates.
    pub(crate) fn write_span(&mut self, cs: &CodeSpan) {
        for position in cs.span.positions() {
            self.slots
                .entry(position)
                .or_default()
                .insert(cs.record.key.clone(), cs.clone());
        }
    }

    /// Remove `key` from every position of `span`, dropping slot maps
    /// that become empty (the outer map never accumulates empty sub-maps).
    pub(crate) fn clear_span(&mut self, span: TokenSpan, key: &CodeKey) {
        for position in span.positions() {
            let now_empty = match self.slots.get_mut(&position) {
                Some(by_key) => {
                    by_key.remove(key);
                    by_key.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.slots.remove(&position);
            }
        }
    }

    /// Walk the whole structure and report every invariant violation.
    ///
    /// Test/diagnostic support; never called on interactive paths.
    #[doc(hidden)]
    #[must_use]
    pub fn verify(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for (&position, by_key) in &self.slots {
            if by_key.is_empty() {
                violations.push(format!("empty slot map left at position {position}"));
            }
            for (key, cs) in by_key {
                if cs.record.key != *key {
                    violations.push(format!(
                        "key mismatch at position {position}: slot {key}, record {}",
                        cs.record.key
                    ));
                }
                if !cs.span.contains(position) {
                    violations.push(format!(
                        "span {} of {key} does not cover its position {position}",
                        cs.span
                    ));
                    continue;
                }
                for covered in cs.span.positions() {
                    match self.get(covered, key) {
                        Some(other) if other == cs => {}
                        Some(_) => violations.push(format!(
                            "content of {key} differs across its span {} at {covered}",
                            cs.span
                        )),
                        None => violations.push(format!(
                            "{key} missing at {covered} inside its span {}",
                            cs.span
                        )),
                    }
                }
            }
        }
        violations
    }
}

/// Summary counts over a [`SpanIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Distinct logical spans.
    pub spans: usize,
    /// Token positions carrying at least one annotation.
    pub positions: usize,
    /// Distinct identity keys present.
    pub keys: usize,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn span(key: &str, start: usize, end: usize) -> CodeSpan {
        CodeSpan::new(
            TokenSpan::new(start, end),
            SpanRecord::new(key, "body", start * 10, (end - start + 1) * 10, key),
        )
    }

    #[test]
    fn write_duplicates_at_every_position() {
        let mut index = SpanIndex::new();
        index.write_span(&span("A", 1, 3));

        let key = CodeKey::new("A");
        for position in 1..=3 {
            let cs = index.get(position, &key).unwrap();
            assert_eq!(cs.span, TokenSpan::new(1, 3));
        }
        assert!(!index.contains(0, &key));
        assert!(!index.contains(4, &key));
        assert_eq!(index.span_count(), 1);
        assert_eq!(index.position_count(), 3);
        assert!(index.verify().is_empty());
    }

    #[test]
    fn clear_removes_empty_slot_maps() {
        let mut index = SpanIndex::new();
        index.write_span(&span("A", 1, 3));
        index.write_span(&span("B", 2, 2));

        index.clear_span(TokenSpan::new(1, 3), &CodeKey::new("A"));
        assert_eq!(index.position_count(), 1); // only B's slot remains
        assert!(index.contains(2, &CodeKey::new("B")));

        index.clear_span(TokenSpan::new(2, 2), &CodeKey::new("B"));
        assert!(index.is_empty());
        assert!(index.verify().is_empty());
    }

    #[test]
    fn distinct_keys_stack_on_one_token() {
        let mut index = SpanIndex::new();
        index.write_span(&span("A", 0, 2));
        index.write_span(&span("B", 2, 4));

        let at_2: Vec<&CodeKey> = index.keys_at(2).collect();
        assert_eq!(at_2.len(), 2);
        assert_eq!(index.at(2).count(), 2);
        assert_eq!(index.span_count(), 2);
        assert!(index.verify().is_empty());
    }

    #[test]
    fn spans_iterates_each_logical_span_once() {
        let mut index = SpanIndex::new();
        index.write_span(&span("A", 0, 4));
        index.write_span(&span("B", 1, 1));

        assert_eq!(index.spans().count(), 2);
        let of_a = index.spans_of(&CodeKey::new("A"));
        assert_eq!(of_a.len(), 1);
        assert_eq!(of_a[0].span, TokenSpan::new(0, 4));
    }

    #[test]
    fn stats_counts_spans_positions_keys() {
        let mut index = SpanIndex::new();
        index.write_span(&span("A", 0, 2));
        index.write_span(&span("A", 5, 6));
        index.write_span(&span("B", 1, 1));

        let stats = index.stats();
        assert_eq!(
            stats,
            IndexStats {
                spans: 3,
                positions: 5,
                keys: 2
            }
        );
    }

    #[test]
    fn verify_reports_torn_span() {
        let mut index = SpanIndex::new();
        index.write_span(&span("A", 1, 3));
        // Violate invariant 2 through the primitive: clear only part of
        // the span, leaving duplicates stranded at 2 and 3.
        index.clear_span(TokenSpan::new(1, 1), &CodeKey::new("A"));

        let violations = index.verify();
        assert!(!violations.is_empty());
        assert!(violations.iter().any(|v| v.contains("missing")));
    }
}
