//! Import/export round trips and matcher alignment.
//!
//! Covers:
//! - The canonical three-token scenario end to end
//! - Token-boundary alignment (only aligned records match)
//! - Multi-label stacking on shared tokens
//! - Windowed streams and the truncation drop policy
//! - JSON shape of portable records
//! - Property: aligned records survive import -> export unchanged

use proptest::prelude::*;
use spanmark::{export, import, CodeKey, SpanRecord, Token, TokenSpan, TokenStream};

/// "Hello the test": tokens covering chars 0..=4, 6..=8, 10..=13.
fn hello_stream() -> TokenStream {
    TokenStream::new(vec![
        Token::new(0, "body", 0, "Hello").with_glue("", " "),
        Token::new(1, "body", 6, "the").with_glue("", " "),
        Token::new(2, "body", 10, "test").with_glue("", ""),
    ])
    .unwrap()
}

/// Single-section stream with one space of glue between words, each space
/// carried by the `post` of the token before it.
fn stream_of(words: &[String]) -> TokenStream {
    let mut tokens = Vec::with_capacity(words.len());
    let mut offset = 0usize;
    for (i, word) in words.iter().enumerate() {
        let post = if i + 1 == words.len() { "" } else { " " };
        tokens.push(Token::new(i, "body", offset, word.as_str()).with_glue("", post));
        offset += word.chars().count() + 1;
    }
    TokenStream::new(tokens).unwrap()
}

// =============================================================================
// Canonical Scenario
// =============================================================================

mod scenario {
    use super::*;

    #[test]
    fn test_hello_the_test_end_to_end() {
        let stream = hello_stream();
        let records = vec![SpanRecord::new("greeting", "body", 0, 9, "greeting")];
        let index = import(&stream, &records);

        // Chars 0..=8 cover "Hello" and "the" exactly.
        let key = CodeKey::new("greeting");
        let cs = index.get(0, &key).expect("span at position 0");
        assert_eq!(cs.span, TokenSpan::new(0, 1));
        assert_eq!(index.get(1, &key), Some(cs));
        assert_eq!(index.get(2, &key), None);
        assert!(index.verify().is_empty());

        let out = export(&index, &stream, true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, key);
        assert_eq!(out[0].offset, 0);
        assert_eq!(out[0].length, 9);
        assert_eq!(out[0].text.as_deref(), Some("Hello the"));
    }

    #[test]
    fn test_multiple_codes_stack_on_shared_tokens() {
        let stream = hello_stream();
        let records = vec![
            SpanRecord::new("greeting", "body", 0, 9, "greeting"),
            SpanRecord::new("topic", "body", 6, 8, "topic"),
        ];
        let index = import(&stream, &records);

        // "the" carries both codes; the neighbors carry one each.
        let mut at_middle: Vec<&str> = index.keys_at(1).map(CodeKey::as_str).collect();
        at_middle.sort_unstable();
        assert_eq!(at_middle, vec!["greeting", "topic"]);
        assert_eq!(index.keys_at(0).count(), 1);
        assert_eq!(index.keys_at(2).count(), 1);
        assert_eq!(export(&index, &stream, false).len(), 2);
    }
}

// =============================================================================
// Boundary Alignment
// =============================================================================

mod alignment {
    use super::*;

    #[test]
    fn test_only_token_aligned_lengths_match() {
        // From offset 0, the last covered char must land on a token's
        // final char: 4 ("Hello"), 8 ("the"), or 13 ("test").
        let stream = hello_stream();
        for length in 1..=14usize {
            let index = import(&stream, &[SpanRecord::new("A", "body", 0, length, "A")]);
            let should_match = matches!(length, 5 | 9 | 14);
            assert_eq!(
                !index.is_empty(),
                should_match,
                "length {length} misbehaved"
            );
        }
    }

    #[test]
    fn test_only_token_aligned_offsets_match() {
        // Ending at char 8 ("the"), the start must land on a token's
        // first char at or before it: 0 or 6.
        let stream = hello_stream();
        for offset in 0..=8usize {
            let length = 9 - offset;
            let index = import(&stream, &[SpanRecord::new("A", "body", offset, length, "A")]);
            let should_match = matches!(offset, 0 | 6);
            assert_eq!(
                !index.is_empty(),
                should_match,
                "offset {offset} misbehaved"
            );
        }
    }

    #[test]
    fn test_whole_document_span() {
        let stream = hello_stream();
        let index = import(&stream, &[SpanRecord::new("all", "body", 0, 14, "all")]);
        let cs = index.get(1, &CodeKey::new("all")).expect("covers middle");
        assert_eq!(cs.span, TokenSpan::new(0, 2));
        assert_eq!(export(&index, &stream, true)[0].text.as_deref(), Some("Hello the test"));
    }
}

// =============================================================================
// Windowed Streams
// =============================================================================

mod windows {
    use super::*;

    fn six_words() -> TokenStream {
        let words: Vec<String> = ["aa", "bb", "cc", "dd", "ee", "ff"]
            .iter()
            .map(|w| (*w).to_string())
            .collect();
        stream_of(&words)
    }

    #[test]
    fn test_window_preserves_global_positions() {
        // Record over tokens 2..=4: chars 6..=13.
        let record = SpanRecord::new("K", "body", 6, 8, "K");
        let window = six_words().window(2..5);
        let index = import(&window, &[record.clone()]);

        let key = CodeKey::new("K");
        let cs = index.get(3, &key).expect("global position 3 inside window");
        assert_eq!(cs.span, TokenSpan::new(2, 4));
        assert_eq!(export(&index, &window, true)[0].text.as_deref(), Some("cc dd ee"));
    }

    #[test]
    fn test_window_truncation_drops_crossing_span() {
        // The same record's end token (4) falls outside window 0..4,
        // so the span never closes and is dropped.
        let record = SpanRecord::new("K", "body", 6, 8, "K");
        let window = six_words().window(0..4);
        let index = import(&window, &[record]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_full_stream_still_matches() {
        let record = SpanRecord::new("K", "body", 6, 8, "K");
        let index = import(&six_words(), &[record.clone()]);
        assert_eq!(export(&index, &six_words(), false), vec![record]);
    }
}

// =============================================================================
// Portable JSON Shape
// =============================================================================

mod serialization {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = SpanRecord::new("tone|warm", "body", 4, 2, "warm");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "key": "tone|warm",
                "section": "body",
                "offset": 4,
                "length": 2,
                "value": "warm",
            })
        );
    }

    #[test]
    fn test_optional_fields_round_trip() {
        let record = SpanRecord::new("K", "body", 0, 5, "K")
            .with_text("Hello")
            .with_metadata(serde_json::json!({"coder": "p1", "pass": 2}));
        let json = serde_json::to_string(&record).unwrap();
        let back: SpanRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_imported_metadata_survives_export() {
        let stream = hello_stream();
        let record = SpanRecord::new("K", "body", 0, 5, "K")
            .with_metadata(serde_json::json!({"coder": "p1"}));
        let index = import(&stream, &[record.clone()]);
        assert_eq!(export(&index, &stream, false), vec![record]);
    }
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use super::*;

    proptest! {
        #[test]
        fn test_aligned_records_round_trip(
            words in prop::collection::vec("[a-z]{1,8}", 1..12),
            picks in prop::collection::vec((0usize..12, 0usize..12), 0..6),
        ) {
            let stream = stream_of(&words);
            let n = words.len();

            // One record per distinct key; spans may overlap across keys.
            let mut records = Vec::new();
            for (i, (a, b)) in picks.iter().enumerate() {
                let (s, e) = ((a % n).min(b % n), (a % n).max(b % n));
                let start = stream.get(s).unwrap();
                let end = stream.get(e).unwrap();
                let offset = start.offset;
                let length = end.last_char() - offset + 1;
                records.push(SpanRecord::new(
                    format!("K{i}"),
                    "body",
                    offset,
                    length,
                    format!("v{i}"),
                ));
            }

            let index = import(&stream, &records);
            prop_assert!(index.verify().is_empty());
            prop_assert_eq!(index.span_count(), records.len());

            let mut expected = records;
            expected.sort_by(|a, b| {
                (a.offset, a.key.as_str()).cmp(&(b.offset, b.key.as_str()))
            });
            prop_assert_eq!(export(&index, &stream, false), expected);
        }

        #[test]
        fn test_text_capture_matches_record_length(
            words in prop::collection::vec("[a-z]{1,8}", 1..12),
            a in 0usize..12,
            b in 0usize..12,
        ) {
            let stream = stream_of(&words);
            let n = words.len();
            let (s, e) = ((a % n).min(b % n), (a % n).max(b % n));
            let offset = stream.get(s).unwrap().offset;
            let length = stream.get(e).unwrap().last_char() - offset + 1;

            let index = import(&stream, &[SpanRecord::new("K", "body", offset, length, "K")]);
            let out = export(&index, &stream, true);

            // Single-space glue means captured text length equals the
            // record's character length.
            prop_assert_eq!(out.len(), 1);
            prop_assert_eq!(out[0].text.as_deref().unwrap().chars().count(), length);
        }

        #[test]
        fn test_unaligned_records_never_panic(
            words in prop::collection::vec("[a-z]{1,8}", 1..12),
            offset in 0usize..200,
            length in 0usize..200,
        ) {
            let stream = stream_of(&words);
            let index = import(&stream, &[SpanRecord::new("K", "body", offset, length, "K")]);
            prop_assert!(index.verify().is_empty());
            prop_assert!(export(&index, &stream, true).len() <= 1);
        }
    }
}
