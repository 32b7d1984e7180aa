//! Error types for each pipeline stage.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tts_client::TtsError;

/// Errors raised while reading a PDF.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open document")]
    Open(#[source] lopdf::Error),

    #[error("failed to read text of page {page}: {message}")]
    Page { page: usize, message: String },
}

/// Errors raised while decoding or encoding audio.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{tool} could not be started: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    CommandFailed { tool: String, stderr: String },

    #[error("cannot concatenate .{artifact} segments into a .{output} file without ffmpeg")]
    IncompatibleFormats { artifact: String, output: String },

    #[error("decoded audio is empty")]
    EmptyBuffer,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Extraction,
    Synthesis,
    Merge,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Extraction => "extraction",
            Stage::Synthesis => "synthesis",
            Stage::Merge => "merge",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed conversion run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input: {0}")]
    InvalidInput(String),

    #[error("extraction: failed to read {}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("extraction: no text found in {}", path.display())]
    NoText { path: PathBuf },

    #[error("synthesis: chunk {index} failed after {attempts} attempt(s)")]
    ChunkSynthesis {
        index: usize,
        attempts: u32,
        #[source]
        source: TtsError,
    },

    #[error("synthesis: failed to write {}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("merge: audio for chunk {expected} is missing (found chunk {found})")]
    MissingArtifact { expected: usize, found: usize },

    #[error("merge: failed on {}", path.display())]
    Merge {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidInput(_) => Stage::Input,
            PipelineError::Extraction { .. } | PipelineError::NoText { .. } => Stage::Extraction,
            PipelineError::ChunkSynthesis { .. } | PipelineError::ArtifactWrite { .. } => {
                Stage::Synthesis
            }
            PipelineError::MissingArtifact { .. } | PipelineError::Merge { .. } => Stage::Merge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_stage_tags() {
        let err = PipelineError::NoText {
            path: PathBuf::from("book.pdf"),
        };
        assert_eq!(err.stage(), Stage::Extraction);
        assert_eq!(err.to_string(), "extraction: no text found in book.pdf");

        let err = PipelineError::MissingArtifact {
            expected: 2,
            found: 3,
        };
        assert_eq!(err.stage(), Stage::Merge);
    }

    #[test]
    fn test_chunk_failure_keeps_cause() {
        let err = PipelineError::ChunkSynthesis {
            index: 2,
            attempts: 3,
            source: TtsError::Timeout(60),
        };
        assert_eq!(err.stage(), Stage::Synthesis);
        assert_eq!(err.to_string(), "synthesis: chunk 2 failed after 3 attempt(s)");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Request timed out after 60 seconds".to_string())
        );
    }
}
