//! Merging chunk audio into the final audiobook file.

use super::codec::{AudioBuffer, AudioCodec};
use super::{AudioArtifact, remove_artifacts};
use crate::error::{CodecError, PipelineError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Append every artifact in index order and write the result to `output`.
///
/// Artifacts must be numbered 1..N without gaps. Each one is deleted as soon
/// as it has been appended. The output only appears once it has been fully
/// written; on failure every remaining artifact is removed and no output is
/// left behind. Returns the size of the written file.
pub fn merge_artifacts(
    codec: &dyn AudioCodec,
    artifacts: &[AudioArtifact],
    output: &Path,
) -> Result<u64, PipelineError> {
    if let Some((position, artifact)) = artifacts
        .iter()
        .enumerate()
        .find(|(position, artifact)| artifact.index != position + 1)
    {
        remove_artifacts(artifacts);
        return Err(PipelineError::MissingArtifact {
            expected: position + 1,
            found: artifact.index,
        });
    }

    let output_error = |source| PipelineError::Merge {
        path: output.to_path_buf(),
        source,
    };

    if artifacts.is_empty() {
        return Err(output_error(CodecError::EmptyBuffer));
    }

    let pb = ProgressBar::new(artifacts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Merging audio chunks");

    let mut merged = AudioBuffer::empty();
    for (position, artifact) in artifacts.iter().enumerate() {
        let appended = codec.decode(&artifact.path).and_then(|segment| {
            merged.append(segment);
            std::fs::remove_file(&artifact.path).map_err(CodecError::from)
        });

        if let Err(source) = appended {
            pb.abandon();
            remove_artifacts(&artifacts[position..]);
            return Err(PipelineError::Merge {
                path: artifact.path.clone(),
                source,
            });
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_output(codec, &merged, output).map_err(output_error)?;

    let bytes = std::fs::metadata(output)
        .map_err(|e| output_error(CodecError::Io(e)))?
        .len();
    log::debug!("Wrote {} ({} bytes) with {}", output.display(), bytes, codec.name());
    Ok(bytes)
}

/// Encode into a temporary file beside `output`, then move it into place.
fn write_output(codec: &dyn AudioCodec, buffer: &AudioBuffer, output: &Path) -> Result<(), CodecError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let suffix = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let staged = tempfile::Builder::new()
        .prefix(".pdf-audio-")
        .suffix(&suffix)
        .tempfile_in(dir)?;

    codec.encode(buffer, staged.path())?;
    staged.persist(output).map_err(|e| CodecError::Io(e.error))?;
    Ok(())
}
