//! Portable annotation records: the storage, export, and transfer form.
//!
//! A [`SpanRecord`] addresses text by character offset within a named
//! section, independent of tokenization. That independence is the whole
//! point of the form: records survive re-tokenization, travel through
//! persistence and file export untouched, and are re-anchored onto
//! whatever token stream is materialized next (see the matcher module).
//!
//! # Identity keys
//!
//! A [`CodeKey`] decides which annotations mutually exclude each other on
//! a token. The engine never interprets key contents; callers choose the
//! granularity:
//!
//! | Keying | Effect |
//! |--------|--------|
//! | bare label (`CodeKey::new("greeting")`) | re-applying the label replaces the old span |
//! | `variable\|value` (`CodeKey::compound("tone", "formal")`) | values of one variable coexist; each value excludes only itself |
//! | variable only | one value per variable: picking a new value replaces the old one |
//!
//! Unrelated keys always stack freely on the same token.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// CodeKey
// =============================================================================

/// Identity key of an annotation.
///
/// Compared and hashed as an opaque string. See the module docs for the
/// keying patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeKey(String);

impl CodeKey {
    /// Create a key from a bare label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Create a compound `variable|value` key.
    ///
    /// ```
    /// use spanmark::CodeKey;
    ///
    /// let key = CodeKey::compound("tone", "formal");
    /// assert_eq!(key.as_str(), "tone|formal");
    /// ```
    #[must_use]
    pub fn compound(variable: &str, value: &str) -> Self {
        Self(format!("{variable}|{value}"))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is the empty string (never valid in a record).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodeKey {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for CodeKey {
    fn from(label: String) -> Self {
        Self(label)
    }
}

// =============================================================================
// SpanRecord
// =============================================================================

/// One portable annotation: a value attached to a character range of a
/// section under an identity key.
///
/// `offset`/`length` are character positions within `section`. `text` is
/// an optional reconstruction of the covered text (filled by the exporter
/// on request, ignored on import). `metadata` is an opaque caller payload
/// that rides through import and export untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    /// Identity key; determines mutual exclusion.
    pub key: CodeKey,
    /// Section the character offsets refer to.
    pub section: String,
    /// Offset of the first covered character.
    pub offset: usize,
    /// Number of covered characters. Must be positive to ever match.
    pub length: usize,
    /// The annotation value (a code label, an answer, free text).
    pub value: String,
    /// Optional covered text, reconstructed at export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Opaque caller payload, preserved verbatim across round trips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl SpanRecord {
    /// Create a record with no text and no metadata.
    #[must_use]
    pub fn new(
        key: impl Into<CodeKey>,
        section: impl Into<String>,
        offset: usize,
        length: usize,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            section: section.into(),
            offset,
            length,
            value: value.into(),
            text: None,
            metadata: None,
        }
    }

    /// Attach reconstructed covered text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach an opaque metadata payload.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Offset of the last covered character (inclusive), or `None` for a
    /// zero-length record.
    ///
    /// This is the end-marker convention used uniformly by the matcher: a
    /// record ends *on* its last covered character, never one past it.
    /// A token-aligned record's `last_char` therefore coincides with some
    /// token's `last_char`, which is what lets the scan close the span on
    /// that token. The round-trip tests pin this convention.
    #[must_use]
    pub fn last_char(&self) -> Option<usize> {
        self.length.checked_sub(1).map(|l| self.offset + l)
    }

    /// Check the record's shape.
    ///
    /// Validation is the caller's obligation before import; the matcher
    /// itself skips malformed records silently (tolerance policy).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Record`] for an empty key, an empty section name,
    /// or a zero length.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::record("empty identity key"));
        }
        if self.section.is_empty() {
            return Err(Error::record("empty section name"));
        }
        if self.length == 0 {
            return Err(Error::record(format!(
                "zero-length span at {}:{}",
                self.section, self.offset
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
