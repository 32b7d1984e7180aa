//! The PDF to audiobook pipeline: extract, split, synthesize, merge, notify.

use crate::audio::{self, AudioCodec, SynthesisOptions};
use crate::config::AudiobookConfig;
use crate::error::PipelineError;
use crate::notify::Notifier;
use crate::pdf::{self, DocumentOpener};
use crate::text::{self, DEFAULT_MAX_CHARS};
use std::path::{Path, PathBuf};
use tts_client::SpeechProvider;

/// External services the pipeline talks to.
pub struct Collaborators<'a> {
    pub opener: &'a dyn DocumentOpener,
    pub provider: &'a dyn SpeechProvider,
    pub codec: &'a dyn AudioCodec,
    pub notifier: &'a dyn Notifier,
}

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Maximum characters per chunk
    pub max_chars: usize,
    pub synthesis: SynthesisOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            synthesis: SynthesisOptions::default(),
        }
    }
}

impl ConvertOptions {
    pub fn from_config(config: &AudiobookConfig) -> Self {
        Self {
            max_chars: config.chunk_size,
            synthesis: SynthesisOptions {
                language: config.language.clone(),
                request_delay: config.request_delay(),
                request_timeout: config.tts.timeout(),
                max_attempts: config.max_attempts,
            },
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub pages: usize,
    pub chunks: usize,
    pub bytes_written: u64,
}

/// Convert the PDF at `input` into a single audio file at `output`.
///
/// Stages run strictly in order and the first failure ends the run. On
/// failure no output file is written and no per-chunk audio is left behind.
pub async fn convert(
    input: &Path,
    output: &Path,
    collaborators: &Collaborators<'_>,
    options: &ConvertOptions,
) -> Result<ConversionReport, PipelineError> {
    validate_paths(input, output)?;

    eprintln!("Extracting text from PDF: {}", input.display());
    let extracted = pdf::extract_text(collaborators.opener, input)?;
    eprintln!(
        "Text extracted successfully: {} page(s), {} characters",
        extracted.pages,
        extracted.text.chars().count()
    );

    let chunks = text::speakable_chunks(text::split_text_into_chunks(
        &extracted.text,
        options.max_chars,
    ));
    if chunks.is_empty() {
        return Err(PipelineError::NoText {
            path: input.to_path_buf(),
        });
    }

    eprintln!(
        "Converting text to audio with {} ({} chunk(s))...",
        collaborators.provider.name(),
        chunks.len()
    );
    let artifacts =
        audio::synthesize_chunks(collaborators.provider, &chunks, output, &options.synthesis)
            .await?;

    eprintln!("Merging audio chunks with {}...", collaborators.codec.name());
    let bytes_written = audio::merge_artifacts(collaborators.codec, &artifacts, output)?;
    eprintln!("Final audiobook saved as: {}", output.display());

    collaborators.notifier.notify(output);

    Ok(ConversionReport {
        output_path: output.to_path_buf(),
        pages: extracted.pages,
        chunks: chunks.len(),
        bytes_written,
    })
}

fn validate_paths(input: &Path, output: &Path) -> Result<(), PipelineError> {
    if !input.is_file() {
        return Err(PipelineError::InvalidInput(format!(
            "PDF file not found: {}",
            input.display()
        )));
    }

    if output.extension().is_none() {
        return Err(PipelineError::InvalidInput(format!(
            "output path needs an audio file extension: {}",
            output.display()
        )));
    }

    if output == input {
        return Err(PipelineError::InvalidInput(
            "output path must differ from the input path".to_string(),
        ));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(PipelineError::InvalidInput(format!(
                "output directory does not exist: {}",
                parent.display()
            )));
        }
    }

    Ok(())
}
