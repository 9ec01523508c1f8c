//! Interactive mutation: add, remove, and toggle spans in place.
//!
//! The index guarantees one span per key per position (see [`SpanIndex`]).
//! Every mutation here enforces that rule the same way: before a candidate
//! is written, any same-key span touching *any* of the candidate's
//! positions is cleared in full, including the parts that lie outside the
//! candidate. Partial truncation never happens; a span is present
//! everywhere or nowhere.
//!
//! | Mode | Effect |
//! |------|--------|
//! | [`ToggleMode::Add`] | clear same-key overlaps, write the candidate |
//! | [`ToggleMode::Remove`] | clear same-key overlaps, write nothing |
//! | [`ToggleMode::Toggle`] | remove if an identical span is present, otherwise add |
//!
//! "Identical" for toggling means same key, same token span, same value.
//! Metadata and captured text do not participate: re-applying the same
//! code to the same selection deselects it even if ancillary fields
//! drifted in between.
//!
//! All three modes take the index by exclusive borrow and return only
//! once every affected position agrees, so intermediate states are
//! unobservable to other readers.

use crate::index::{CodeSpan, SpanIndex};
use crate::token::TokenSpan;

/// How [`SpanIndex::apply`] treats the candidate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleMode {
    /// Write the candidate, clearing same-key overlaps first.
    Add,
    /// Clear same-key overlaps; write nothing.
    Remove,
    /// [`Remove`](ToggleMode::Remove) if an identical span is already
    /// present, [`Add`](ToggleMode::Add) otherwise.
    Toggle,
}

/// Whether the candidate is present after an [`SpanIndex::apply`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The candidate is now in the index.
    Added,
    /// The candidate (and any same-key overlap) is now absent.
    Removed,
}

impl SpanIndex {
    /// Apply `candidate` under `mode`. See the [module docs](self) for
    /// the per-mode semantics.
    pub fn apply(&mut self, candidate: &CodeSpan, mode: ToggleMode) -> ToggleOutcome {
        match mode {
            ToggleMode::Add => {
                self.clear_overlapping(candidate);
                self.write_span(candidate);
                ToggleOutcome::Added
            }
            ToggleMode::Remove => {
                self.clear_overlapping(candidate);
                ToggleOutcome::Removed
            }
            ToggleMode::Toggle => {
                if self.has_identical(candidate) {
                    // An identical span covers every candidate position,
                    // so by disjointness it is the only overlap.
                    self.clear_span(candidate.span, candidate.key());
                    ToggleOutcome::Removed
                } else {
                    self.clear_overlapping(candidate);
                    self.write_span(candidate);
                    ToggleOutcome::Added
                }
            }
        }
    }

    /// Shorthand for [`apply`](Self::apply) with [`ToggleMode::Add`].
    pub fn add(&mut self, candidate: &CodeSpan) -> ToggleOutcome {
        self.apply(candidate, ToggleMode::Add)
    }

    /// Shorthand for [`apply`](Self::apply) with [`ToggleMode::Remove`].
    pub fn remove(&mut self, candidate: &CodeSpan) -> ToggleOutcome {
        self.apply(candidate, ToggleMode::Remove)
    }

    /// Shorthand for [`apply`](Self::apply) with [`ToggleMode::Toggle`].
    pub fn toggle(&mut self, candidate: &CodeSpan) -> ToggleOutcome {
        self.apply(candidate, ToggleMode::Toggle)
    }

    /// True if the exact candidate (key, span, value) sits at the
    /// candidate's canonical position.
    fn has_identical(&self, candidate: &CodeSpan) -> bool {
        self.get(candidate.span.start, candidate.key())
            .is_some_and(|existing| {
                existing.span == candidate.span
                    && existing.record.value == candidate.record.value
            })
    }

    /// Clear every same-key span that covers at least one candidate
    /// position, in full.
    fn clear_overlapping(&mut self, candidate: &CodeSpan) {
        let key = candidate.key();
        let mut stale: Vec<TokenSpan> = Vec::new();
        for position in candidate.span.positions() {
            if let Some(existing) = self.get(position, key) {
                if !stale.contains(&existing.span) {
                    stale.push(existing.span);
                }
            }
        }
        for span in stale {
            self.clear_span(span, key);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
