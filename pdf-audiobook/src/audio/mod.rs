//! Per-chunk speech synthesis and merging into the final audiobook file.

pub mod codec;
pub mod merger;
pub mod synthesizer;

pub use codec::{AudioCodec, select_codec};
pub use merger::merge_artifacts;
pub use synthesizer::{SynthesisOptions, synthesize_chunks};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Audio for one chunk, stored next to the output file until merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Index of the chunk this audio was synthesized from
    pub index: usize,
    pub path: PathBuf,
}

/// Path of the artifact for chunk `index`: `{dir}/{stem}_part{index}.{extension}`.
pub fn artifact_path(output: &Path, index: usize, extension: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audiobook".to_string());
    output.with_file_name(format!("{}_part{}.{}", stem, index, extension))
}

/// Best-effort removal of intermediate files.
pub fn remove_artifacts(artifacts: &[AudioArtifact]) {
    for artifact in artifacts {
        match std::fs::remove_file(&artifact.path) {
            Ok(()) => log::debug!("Removed {}", artifact.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {}", artifact.path.display(), e),
        }
    }
}
