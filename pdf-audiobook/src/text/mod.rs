//! Text processing for TTS: splitting extracted text into request-sized chunks.

pub mod chunker;

pub use chunker::{DEFAULT_MAX_CHARS, speakable_chunks, split_text_into_chunks};

/// A chunk of text ready for TTS processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position in the chunk sequence, starting at 1
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Text sent to the speech provider.
    pub fn speech_text(&self) -> &str {
        self.text.trim()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
