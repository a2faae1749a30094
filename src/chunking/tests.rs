use super::*;
use crate::document::Document;

fn config(chunk_size: usize, chunk_overlap: usize) -> SplitConfig {
    SplitConfig {
        chunk_size,
        chunk_overlap,
        ..SplitConfig::default()
    }
}

#[test]
fn short_text_is_a_single_chunk() {
    let chunks = split_text("hello world", &SplitConfig::default());
    assert_eq!(chunks, vec!["hello world".to_string()]);
}

#[test]
fn empty_text_produces_no_chunks() {
    assert!(split_text("", &SplitConfig::default()).is_empty());
    assert!(split_text("   \n\n  ", &SplitConfig::default()).is_empty());
}

#[test]
fn paragraphs_split_before_lines() {
    let text = "first paragraph here\n\nsecond paragraph here\n\nthird paragraph here";
    let chunks = split_text(text, &config(25, 0));

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], "first paragraph here");
    assert_eq!(chunks[1], "second paragraph here");
    assert_eq!(chunks[2], "third paragraph here");
}

#[test]
fn every_chunk_respects_the_size_budget() {
    let word = "lorem ";
    let text = word.repeat(500);
    for (size, overlap) in [(50, 0), (50, 10), (120, 30), (1000, 150)] {
        let chunks = split_text(&text, &config(size, overlap));
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= size,
                "chunk of {} chars exceeds budget {}",
                chunk.chars().count(),
                size
            );
        }
    }
}

#[test]
fn indivisible_token_run_is_hard_split_at_character_level() {
    // With the default separators the empty-string fallback applies,
    // so even an unbroken token is divided rather than overflowing
    let text = "x".repeat(250);
    let chunks = split_text(&text, &config(100, 0));
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    let rejoined: String = chunks.concat();
    assert_eq!(rejoined, text);
}

#[test]
fn oversized_unit_is_emitted_as_is_without_character_fallback() {
    let cfg = SplitConfig {
        chunk_size: 10,
        chunk_overlap: 0,
        separators: vec![" ".to_string()],
    };
    let chunks = split_text("short reallyreallylongtoken end", &cfg);
    assert!(chunks.contains(&"reallyreallylongtoken".to_string()));
}

#[test]
fn rejoining_without_overlap_is_lossless_modulo_separators() {
    let text = "alpha beta gamma\ndelta epsilon zeta\n\neta theta iota kappa";
    let chunks = split_text(text, &config(20, 0));

    let rejoined = chunks.join(" ");
    let original_words: Vec<&str> = text.split_whitespace().collect();
    let rejoined_words: Vec<&str> = rejoined.split_whitespace().collect();
    assert_eq!(original_words, rejoined_words);
}

#[test]
fn adjacent_chunks_overlap() {
    let text = "one two three four five six seven eight nine ten";
    let chunks = split_text(text, &config(20, 10));
    assert!(chunks.len() > 1);

    // The tail of each chunk reappears at the head of the next
    for pair in chunks.windows(2) {
        let tail_word = pair[0]
            .split_whitespace()
            .last()
            .expect("chunks are non-empty");
        assert!(
            pair[1].contains(tail_word),
            "chunk '{}' does not carry overlap from '{}'",
            pair[1],
            pair[0]
        );
    }
}

#[test]
fn chunks_inherit_document_metadata() {
    let mut document = Document::new("a ".repeat(200), "manual.pdf");
    document
        .metadata
        .insert("department".to_string(), "support".to_string());

    let chunks = split_documents(std::slice::from_ref(&document), &config(50, 10));
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert_eq!(chunk.metadata, document.metadata);
        assert_eq!(chunk.source(), Some("manual.pdf"));
    }
}

#[test]
fn multiple_documents_chunk_independently() {
    let documents = vec![
        Document::new("first document body", "a.pdf"),
        Document::new("second document body", "b.pdf"),
    ];
    let chunks = split_documents(&documents, &SplitConfig::default());
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].source(), Some("a.pdf"));
    assert_eq!(chunks[1].source(), Some("b.pdf"));
}

#[test]
fn multibyte_text_splits_on_char_boundaries() {
    let text = "héllo wörld ünïcode ".repeat(20);
    let chunks = split_text(&text, &config(30, 5));
    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 30);
    }
}
