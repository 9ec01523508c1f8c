//! # spanmark
//!
//! Span-annotation indexing for interactive text coding.
//!
//! - **Import**: anchor portable character-offset records onto a token stream
//! - **Index**: O(1) lookup of every code covering a token position
//! - **Toggle**: add, remove, and toggle spans with whole-span replacement
//! - **Export**: deduplicated portable records, optionally with recaptured text
//!
//! ## Quick Start
//!
//! ```rust
//! use spanmark::{export, import, CodeSpan, SpanRecord, Token, TokenSpan, TokenStream};
//!
//! let stream = TokenStream::new(vec![
//!     Token::new(0, "body", 0, "Hello").with_glue("", " "),
//!     Token::new(1, "body", 6, "the").with_glue("", " "),
//!     Token::new(2, "body", 10, "test").with_glue("", ""),
//! ])?;
//!
//! // Records address characters; import anchors them to tokens.
//! let mut index = import(&stream, &[SpanRecord::new("greeting", "body", 0, 9, "greeting")]);
//! assert!(index.contains(1, &"greeting".into()));
//!
//! // Interactive coding: toggle a second code over "the test".
//! index.toggle(&CodeSpan::new(
//!     TokenSpan::new(1, 2),
//!     SpanRecord::new("emphasis", "body", 6, 8, "emphasis"),
//! ));
//!
//! // Back to portable form, with the covered text recaptured.
//! let records = export(&index, &stream, true);
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].text.as_deref(), Some("the test"));
//! # Ok::<(), spanmark::Error>(())
//! ```
//!
//! ## Two Coordinate Systems
//!
//! | | Portable ([`SpanRecord`]) | Runtime ([`SpanIndex`]) |
//! |---|---|---|
//! | Unit | characters | token positions |
//! | Addressing | section + offset + length | document-global position |
//! | Lifetime | survives retokenization | valid for one stream |
//! | Role | storage and interchange | interactive lookup and mutation |
//!
//! [`import`] carries records from the left column to the right;
//! [`export`] carries them back, deduplicated. The index never becomes
//! the source of truth: it is a projection, rebuilt from records whenever
//! the stream changes.
//!
//! ## Design Philosophy
//!
//! - **Records are truth**: the index is derived state and is always rebuildable
//! - **Tolerant at the boundary**: misaligned or truncated records drop
//!   silently on import instead of failing the whole unit
//! - **Strict inside**: the index holds four structural invariants, and
//!   every mutation path preserves them by construction
//! - **Exclusive borrows are the lock**: mutation funnels through `&mut`
//!   methods, so torn intermediate states are unobservable

#![warn(missing_docs)]

pub mod codebook;
pub mod error;
pub mod export;
pub mod index;
pub mod matcher;
pub mod record;
pub mod toggle;
pub mod token;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use spanmark::prelude::*;
    //!
    //! let stream = TokenStream::new(vec![Token::new(0, "body", 0, "word")]).unwrap();
    //! let index = import(&stream, &[SpanRecord::new("K", "body", 0, 4, "K")]);
    //! assert_eq!(index.span_count(), 1);
    //! ```
    pub use crate::codebook::{CodeDef, Codebook};
    pub use crate::error::{Error, Result};
    pub use crate::export::{export, export_visible};
    pub use crate::index::{CodeSpan, IndexStats, SpanIndex};
    pub use crate::matcher::import;
    pub use crate::record::{CodeKey, SpanRecord};
    pub use crate::toggle::{ToggleMode, ToggleOutcome};
    pub use crate::token::{Token, TokenSpan, TokenStream};
}

// Re-exports
pub use codebook::{CodeDef, Codebook};
pub use error::{Error, Result};
pub use export::{export, export_visible};
pub use index::{CodeSpan, IndexStats, SpanIndex};
pub use matcher::import;
pub use record::{CodeKey, SpanRecord};
pub use toggle::{ToggleMode, ToggleOutcome};
pub use token::{Token, TokenSpan, TokenStream};
