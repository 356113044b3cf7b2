//! PDF text extraction and chunking.
//!
//! Extraction delegates to pdf-extract on a blocking thread; chunking is a
//! recursive splitter that prefers paragraph, then line, then sentence, then
//! word boundaries before falling back to raw character windows. Consecutive
//! chunks share an overlapping tail so retrieval keeps cross-boundary context.

use std::path::{Path, PathBuf};

use crate::core::errors::ApiError;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone)]
pub struct PdfProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl PdfProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size / 2),
        }
    }

    /// Extracts the text of every page in reading order. Pages without
    /// extractable text contribute nothing; an unreadable file fails.
    pub async fn extract_text(&self, path: &Path) -> Result<String, ApiError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&path)
                .map_err(|e| ApiError::DocumentProcessing(format!("failed to read PDF: {}", e)))
        })
        .await
        .map_err(ApiError::internal)?
    }

    /// Splits text into overlapping chunks, preserving document order.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let pieces = split_recursive(text, &SEPARATORS, self.chunk_size);
        merge_with_overlap(pieces, self.chunk_size, self.chunk_overlap)
    }
}

/// Breaks `text` into pieces no longer than `max_len` characters, trying each
/// separator in turn and keeping the separator attached to the piece before it.
fn split_recursive(text: &str, separators: &[&str], max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let Some((sep, rest)) = separators.split_first() else {
        // No boundary left to respect: raw character windows.
        let chars: Vec<char> = text.chars().collect();
        return chars
            .chunks(max_len)
            .map(|window| window.iter().collect())
            .collect();
    };

    let mut pieces = Vec::new();
    for part in text.split_inclusive(sep) {
        if part.chars().count() <= max_len {
            pieces.push(part.to_string());
        } else {
            pieces.extend(split_recursive(part, rest, max_len));
        }
    }
    pieces
}

/// Greedily packs pieces into chunks of at most `chunk_size` characters,
/// seeding each new chunk with the last `overlap` characters of the previous
/// one.
fn merge_with_overlap(pieces: Vec<String>, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in pieces {
        let piece_len = piece.chars().count();

        if current_len > 0 && current_len + piece_len > chunk_size {
            push_chunk(&mut chunks, &current);
            current = char_tail(&current, overlap);
            current_len = current.chars().count();
        }

        current.push_str(&piece);
        current_len += piece_len;
    }

    push_chunk(&mut chunks, &current);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_tail(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}
