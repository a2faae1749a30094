#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Chunk, Document};

/// Configuration for recursive character splitting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SplitConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap in characters carried between adjacent chunks
    pub chunk_overlap: usize,
    /// Preferred split separators, coarsest to finest. The empty string
    /// means a hard character-level split.
    pub separators: Vec<String>,
}

impl Default for SplitConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// Split a batch of documents into chunks, each inheriting its parent
/// document's metadata unchanged.
#[inline]
pub fn split_documents(documents: &[Document], config: &SplitConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for document in documents {
        let pieces = split_text(&document.content, config);
        debug!(
            "Split document '{}' into {} chunks",
            document.source().unwrap_or("unknown"),
            pieces.len()
        );
        for content in pieces {
            chunks.push(Chunk {
                content,
                metadata: document.metadata.clone(),
            });
        }
    }

    chunks
}

/// Split text recursively, attempting the coarsest separator first and
/// descending to finer separators for any piece that still exceeds the
/// chunk size. Every returned chunk is at most `chunk_size` characters,
/// except where a single indivisible unit exceeds it.
#[inline]
pub fn split_text(text: &str, config: &SplitConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    split_recursive(text, &config.separators, config)
}

fn split_recursive(text: &str, separators: &[String], config: &SplitConfig) -> Vec<String> {
    let (separator, remaining) = pick_separator(text, separators);
    let splits = split_on(text, separator);

    let mut final_chunks = Vec::new();
    let mut good_splits: Vec<String> = Vec::new();

    for piece in splits {
        if char_len(&piece) < config.chunk_size {
            good_splits.push(piece);
        } else {
            if !good_splits.is_empty() {
                final_chunks.extend(merge_splits(&good_splits, separator, config));
                good_splits.clear();
            }
            if remaining.is_empty() {
                // Indivisible at the finest level, emitted as-is
                final_chunks.push(piece);
            } else {
                final_chunks.extend(split_recursive(&piece, remaining, config));
            }
        }
    }

    if !good_splits.is_empty() {
        final_chunks.extend(merge_splits(&good_splits, separator, config));
    }

    final_chunks
}

/// Choose the first separator that occurs in the text. The empty string
/// always matches, so the list effectively terminates there.
fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator.as_str()) {
            return (separator, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn split_on(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Greedily rejoin small pieces into chunks no larger than the chunk size,
/// carrying `chunk_overlap` characters of trailing context into the next
/// chunk so nothing is lost at a boundary.
fn merge_splits(splits: &[String], separator: &str, config: &SplitConfig) -> Vec<String> {
    let separator_len = char_len(separator);

    let mut chunks = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for piece in splits {
        let piece_len = char_len(piece);

        if total + piece_len + joined_separator_len(separator_len, &window) > config.chunk_size
            && !window.is_empty()
        {
            if let Some(chunk) = join_window(&window, separator) {
                chunks.push(chunk);
            }
            // Slide the window forward until what remains fits in the
            // overlap budget alongside the incoming piece
            while total > config.chunk_overlap
                || (total + piece_len + joined_separator_len(separator_len, &window)
                    > config.chunk_size
                    && total > 0)
            {
                let dropped = char_len(window.remove(0));
                total -= dropped + if window.is_empty() { 0 } else { separator_len };
            }
        }

        window.push(piece);
        total += piece_len + if window.len() > 1 { separator_len } else { 0 };
    }

    if let Some(chunk) = join_window(&window, separator) {
        chunks.push(chunk);
    }

    chunks
}

fn joined_separator_len(separator_len: usize, window: &[&str]) -> usize {
    if window.is_empty() { 0 } else { separator_len }
}

fn join_window(window: &[&str], separator: &str) -> Option<String> {
    let joined = window.join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
