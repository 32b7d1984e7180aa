//! Audio decoding and encoding.
//!
//! [`FfmpegCodec`] decodes every segment to raw PCM so segments of any
//! format can be joined and re-encoded into whatever the output extension
//! names. [`ByteConcatCodec`] joins encoded MP3 streams without decoding,
//! which is what the speech providers return anyway.

use crate::config::MergeStrategy;
use crate::error::CodecError;
use std::path::{Path, PathBuf};
use std::process::Command;

const SAMPLE_RATE: u32 = 24000;
const CHANNELS: u32 = 1;

/// Formats whose streams stay playable when concatenated byte for byte.
const CONCATENABLE_EXTENSIONS: &[&str] = &["mp3"];

/// Accumulated audio in the representation of the codec that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
}

impl AudioBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Append `other` after the audio already in the buffer.
    pub fn append(&mut self, other: AudioBuffer) {
        self.bytes.extend(other.bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reads audio files into buffers and writes buffers out as files.
pub trait AudioCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn decode(&self, path: &Path) -> Result<AudioBuffer, CodecError>;

    /// Write `buffer` to `output` in the format implied by its extension.
    fn encode(&self, buffer: &AudioBuffer, output: &Path) -> Result<(), CodecError>;
}

/// Codec that shells out to ffmpeg, buffering signed 16-bit mono PCM.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    binary: PathBuf,
}

impl FfmpegCodec {
    /// Use `binary`, or `ffmpeg` from PATH when none is given.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| PathBuf::from("ffmpeg")),
        }
    }

    /// Check if the ffmpeg binary runs.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(&self, command: &mut Command) -> Result<Vec<u8>, CodecError> {
        let output = command.output().map_err(|source| CodecError::Spawn {
            tool: self.binary.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CodecError::CommandFailed {
                tool: "ffmpeg".to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    fn pcm_args() -> [String; 6] {
        [
            "-f".to_string(),
            "s16le".to_string(),
            "-ar".to_string(),
            SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            CHANNELS.to_string(),
        ]
    }
}

impl AudioCodec for FfmpegCodec {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn decode(&self, path: &Path) -> Result<AudioBuffer, CodecError> {
        let mut command = Command::new(&self.binary);
        command
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(Self::pcm_args())
            .arg("-");

        let buffer = AudioBuffer::from_bytes(self.run(&mut command)?);
        log::debug!("Decoded {} ({} PCM bytes)", path.display(), buffer.len());
        Ok(buffer)
    }

    fn encode(&self, buffer: &AudioBuffer, output: &Path) -> Result<(), CodecError> {
        if buffer.is_empty() {
            return Err(CodecError::EmptyBuffer);
        }

        // Raw PCM goes through a file so ffmpeg's stdin and stderr never block each other.
        let mut raw = tempfile::Builder::new()
            .prefix(".pdf-audio-")
            .suffix(".pcm")
            .tempfile()?;
        std::io::Write::write_all(&mut raw, buffer.as_bytes())?;

        let mut command = Command::new(&self.binary);
        command
            .args(["-y", "-v", "error"])
            .args(Self::pcm_args())
            .arg("-i")
            .arg(raw.path())
            .arg(output);

        self.run(&mut command)?;
        Ok(())
    }
}

/// Codec that concatenates encoded streams as-is.
#[derive(Debug, Clone, Default)]
pub struct ByteConcatCodec;

impl AudioCodec for ByteConcatCodec {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn decode(&self, path: &Path) -> Result<AudioBuffer, CodecError> {
        Ok(AudioBuffer::from_bytes(std::fs::read(path)?))
    }

    fn encode(&self, buffer: &AudioBuffer, output: &Path) -> Result<(), CodecError> {
        if buffer.is_empty() {
            return Err(CodecError::EmptyBuffer);
        }
        std::fs::write(output, buffer.as_bytes())?;
        Ok(())
    }
}

/// Lowercased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn can_concat(artifact_extension: &str, output_extension: &str) -> bool {
    artifact_extension.eq_ignore_ascii_case(output_extension)
        && CONCATENABLE_EXTENSIONS.contains(&output_extension)
}

/// Pick the codec for merging `artifact_extension` segments into `output`.
pub fn select_codec(
    strategy: MergeStrategy,
    ffmpeg_path: Option<PathBuf>,
    artifact_extension: &str,
    output: &Path,
) -> Result<Box<dyn AudioCodec>, CodecError> {
    let output_extension = extension_of(output);
    let incompatible = || CodecError::IncompatibleFormats {
        artifact: artifact_extension.to_string(),
        output: output_extension.clone(),
    };

    match strategy {
        MergeStrategy::Ffmpeg => Ok(Box::new(FfmpegCodec::new(ffmpeg_path))),
        MergeStrategy::Concat => {
            if can_concat(artifact_extension, &output_extension) {
                Ok(Box::new(ByteConcatCodec))
            } else {
                Err(incompatible())
            }
        }
        MergeStrategy::Auto => {
            let ffmpeg = FfmpegCodec::new(ffmpeg_path);
            if ffmpeg.is_available() {
                Ok(Box::new(ffmpeg))
            } else if can_concat(artifact_extension, &output_extension) {
                log::info!("ffmpeg not found, concatenating {} streams directly", artifact_extension);
                Ok(Box::new(ByteConcatCodec))
            } else {
                Err(incompatible())
            }
        }
    }
}
