//! Whitespace-bounded chunking for speech requests.
//!
//! Chunks partition the input exactly: joining them gives back the original
//! text. A split happens at the last whitespace character inside the size
//! window, and that whitespace becomes the first character of the next chunk.

use super::TextChunk;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHARS: usize = 4000;

/// Split text into chunks of at most `max_chars` characters.
///
/// Sizes are counted in chars, not bytes. When no whitespace is found after
/// the first character of the window, the chunk is cut at exactly
/// `max_chars` characters. Empty input yields a single empty chunk.
pub fn split_text_into_chunks(text: &str, max_chars: usize) -> Vec<TextChunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    // Byte offset of the first char past the window; None when `rest` fits.
    while let Some((boundary, _)) = rest.char_indices().nth(max_chars) {
        let window = &rest[..boundary];
        let split = window
            .char_indices()
            .rev()
            .find(|(offset, c)| *offset > 0 && c.is_whitespace())
            .map(|(offset, _)| offset)
            .unwrap_or(boundary);

        chunks.push(TextChunk::new(chunks.len() + 1, rest[..split].to_string()));
        rest = &rest[split..];
    }

    chunks.push(TextChunk::new(chunks.len() + 1, rest.to_string()));
    chunks
}

/// Drop whitespace-only chunks and renumber the rest from 1.
pub fn speakable_chunks(chunks: Vec<TextChunk>) -> Vec<TextChunk> {
    chunks
        .into_iter()
        .filter(|chunk| !chunk.speech_text().is_empty())
        .enumerate()
        .map(|(i, chunk)| TextChunk::new(i + 1, chunk.text))
        .collect()
}
