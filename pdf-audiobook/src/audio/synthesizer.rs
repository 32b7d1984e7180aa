//! Sequential, rate-limited synthesis of text chunks.

use super::{AudioArtifact, artifact_path, remove_artifacts};
use crate::error::PipelineError;
use crate::text::TextChunk;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tts_client::{SpeechProvider, SpeechRequest, TtsError};

/// Options for the synthesis stage.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Language code sent with every request
    pub language: String,
    /// Pause between successive requests (and before a retry)
    pub request_delay: Duration,
    /// Upper bound on a single provider HTTP request
    pub request_timeout: Duration,
    /// Attempts per chunk before the run is aborted
    pub max_attempts: u32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            request_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

/// Synthesize every chunk in order, writing one artifact per chunk next to
/// `output`.
///
/// The first chunk that cannot be synthesized aborts the run; artifacts
/// written before it are removed.
pub async fn synthesize_chunks(
    provider: &dyn SpeechProvider,
    chunks: &[TextChunk],
    output: &Path,
    options: &SynthesisOptions,
) -> Result<Vec<AudioArtifact>, PipelineError> {
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Audio chunks processed");

    let mut artifacts: Vec<AudioArtifact> = Vec::with_capacity(chunks.len());

    for (position, chunk) in chunks.iter().enumerate() {
        if position > 0 && !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }

        let path = artifact_path(output, chunk.index, provider.audio_extension());
        let result = match synthesize_with_retry(provider, chunk, options).await {
            Ok(audio) => tokio::fs::write(&path, &audio)
                .await
                .map_err(|source| PipelineError::ArtifactWrite {
                    path: path.clone(),
                    source,
                }),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            pb.abandon();
            artifacts.push(AudioArtifact {
                index: chunk.index,
                path,
            });
            remove_artifacts(&artifacts);
            return Err(e);
        }

        log::info!("Chunk {} saved as: {}", chunk.index, path.display());
        artifacts.push(AudioArtifact {
            index: chunk.index,
            path,
        });
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(artifacts)
}

/// Synthesize one chunk, retrying transient failures.
async fn synthesize_with_retry(
    provider: &dyn SpeechProvider,
    chunk: &TextChunk,
    options: &SynthesisOptions,
) -> Result<Vec<u8>, PipelineError> {
    let request = SpeechRequest::new(chunk.speech_text(), options.language.as_str());
    let limit = chunk_timeout(options.request_timeout, provider.requests_for(&request.text));
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = match tokio::time::timeout(limit, provider.synthesize(&request)).await {
            Ok(Ok(audio)) if audio.is_empty() => Err(TtsError::EmptyAudio(provider.name().to_string())),
            Ok(result) => result,
            Err(_) => Err(TtsError::Timeout(limit.as_secs())),
        };

        match result {
            Ok(audio) => return Ok(audio),
            Err(e) if attempt < max_attempts && e.is_transient() => {
                let delay = retry_delay(&e, options.request_delay);
                log::warn!(
                    "Chunk {} failed (attempt {}/{}): {}. Retrying in {:?}",
                    chunk.index,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(PipelineError::ChunkSynthesis {
                    index: chunk.index,
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

/// Time allowed for one chunk: the per-request timeout for every request
/// the provider makes for it.
fn chunk_timeout(request_timeout: Duration, requests: usize) -> Duration {
    let requests = u32::try_from(requests.max(1)).unwrap_or(u32::MAX);
    request_timeout.saturating_mul(requests)
}

/// Wait before retrying: the server's `Retry-After` when given, otherwise
/// the regular request delay.
fn retry_delay(error: &TtsError, request_delay: Duration) -> Duration {
    match error {
        TtsError::RateLimited {
            retry_after: Some(secs),
        } => Duration::from_secs(*secs).max(request_delay),
        _ => request_delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::split_text_into_chunks;
    use tempfile::TempDir;
    use tts_client::MockProvider;

    fn fast_options() -> SynthesisOptions {
        SynthesisOptions {
            request_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
            ..SynthesisOptions::default()
        }
    }

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(i + 1, t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_one_artifact_per_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        let provider = MockProvider::always_succeeds();

        let artifacts = synthesize_chunks(&provider, &chunks(&["one", " two"]), &output, &fast_options())
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, temp_dir.path().join("book_part1.mp3"));
        assert_eq!(artifacts[1].path, temp_dir.path().join("book_part2.mp3"));
        assert_eq!(std::fs::read(&artifacts[0].path).unwrap(), MockProvider::audio_for("one"));
        // Leading separator is not spoken.
        assert_eq!(std::fs::read(&artifacts[1].path).unwrap(), MockProvider::audio_for("two"));

        let languages: Vec<String> = provider.requests().into_iter().map(|r| r.language).collect();
        assert_eq!(languages, vec!["en", "en"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_and_removes_earlier_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        let provider = MockProvider::fails_on_calls(&[2], 400);

        let err = synthesize_chunks(&provider, &chunks(&["a", "b", "c"]), &output, &fast_options())
            .await
            .unwrap_err();

        match err {
            PipelineError::ChunkSynthesis { index, attempts, .. } => {
                assert_eq!(index, 2);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Chunk 3 is never requested.
        assert_eq!(provider.call_count(), 2);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        let provider = MockProvider::fails_on_calls(&[2], 503);

        let artifacts = synthesize_chunks(&provider, &chunks(&["a", "b"]), &output, &fast_options())
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(std::fs::read(&artifacts[1].path).unwrap(), MockProvider::audio_for("b"));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        let provider = MockProvider::always_fails(503);

        let err = synthesize_chunks(&provider, &chunks(&["a"]), &output, &fast_options())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ChunkSynthesis { attempts: 3, .. }));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_hung_request_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        let provider = MockProvider::always_succeeds().with_latency(Duration::from_secs(5));
        let options = SynthesisOptions {
            request_timeout: Duration::from_millis(20),
            max_attempts: 1,
            ..fast_options()
        };

        let err = synthesize_chunks(&provider, &chunks(&["slow"]), &output, &options)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::ChunkSynthesis {
                source: TtsError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_multi_request_chunk_is_not_cut_off() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        // Three requests of 800ms each: the chunk takes 2.4s with a 1s
        // per-request limit.
        let provider = MockProvider::always_succeeds()
            .with_latency(Duration::from_millis(800))
            .with_pieces(3);
        let options = SynthesisOptions {
            request_timeout: Duration::from_secs(1),
            max_attempts: 1,
            ..fast_options()
        };

        let artifacts = synthesize_chunks(&provider, &chunks(&["long chunk"]), &output, &options)
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_artifact_aborts_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        // A directory where the second artifact should go makes the write fail.
        let blocked = artifact_path(&output, 2, "mp3");
        std::fs::create_dir(&blocked).unwrap();
        let provider = MockProvider::always_succeeds();

        let err = synthesize_chunks(&provider, &chunks(&["a", "b", "c"]), &output, &fast_options())
            .await
            .unwrap_err();

        match err {
            PipelineError::ArtifactWrite { path, .. } => assert_eq!(path, blocked),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.call_count(), 2);
        assert!(!artifact_path(&output, 1, "mp3").exists());
        assert!(!artifact_path(&output, 3, "mp3").exists());
    }

    #[test]
    fn test_chunk_timeout_scales_with_requests() {
        let per_request = Duration::from_secs(60);
        assert_eq!(chunk_timeout(per_request, 0), per_request);
        assert_eq!(chunk_timeout(per_request, 1), per_request);
        assert_eq!(chunk_timeout(per_request, 40), Duration::from_secs(2400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_requests() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("book.mp3");
        let provider = MockProvider::always_succeeds();
        let options = SynthesisOptions {
            request_delay: Duration::from_secs(2),
            ..fast_options()
        };

        let started = tokio::time::Instant::now();
        let chunks = split_text_into_chunks("one two six", 4);
        assert_eq!(chunks.len(), 3);
        synthesize_chunks(&provider, &chunks, &output, &options)
            .await
            .unwrap();

        // Three chunks, two pauses.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(6), "elapsed {elapsed:?}");
    }

    #[test]
    fn test_retry_delay_honours_retry_after() {
        let delay = retry_delay(
            &TtsError::RateLimited {
                retry_after: Some(10),
            },
            Duration::from_secs(2),
        );
        assert_eq!(delay, Duration::from_secs(10));
        assert_eq!(
            retry_delay(&TtsError::Timeout(60), Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }
}
