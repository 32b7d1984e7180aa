//! Mock speech provider for testing
//!
//! Provides a configurable mock provider that can simulate failures on
//! chosen calls, slow responses, and successful synthesis. Audio returned on
//! success is the request text wrapped in a marker, so tests can check the
//! order in which segments were merged.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

/// A mock provider for testing retry and abort behavior
pub struct MockProvider {
    /// 1-based call numbers that fail
    failing_calls: Vec<usize>,
    /// Fail every call regardless of `failing_calls`
    always_fail: bool,
    /// Status code reported by failures
    status_code: u16,
    /// Artificial latency per simulated HTTP request
    latency: Option<Duration>,
    /// HTTP requests each synthesize() call pretends to make
    pieces: usize,
    /// Current call count
    call_count: AtomicUsize,
    /// Every request received, in order
    requests: Mutex<Vec<SpeechRequest>>,
}

impl MockProvider {
    /// Create a provider that always succeeds
    pub fn always_succeeds() -> Self {
        Self {
            failing_calls: Vec::new(),
            always_fail: false,
            status_code: 500,
            latency: None,
            pieces: 1,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the given HTTP status
    pub fn always_fails(status_code: u16) -> Self {
        Self {
            always_fail: true,
            status_code,
            ..Self::always_succeeds()
        }
    }

    /// Create a provider that fails on the given 1-based call numbers
    pub fn fails_on_calls(calls: &[usize], status_code: u16) -> Self {
        Self {
            failing_calls: calls.to_vec(),
            status_code,
            ..Self::always_succeeds()
        }
    }

    /// Delay every simulated request by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Behave like a provider that needs `pieces` requests per call
    pub fn with_pieces(mut self, pieces: usize) -> Self {
        self.pieces = pieces.max(1);
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// The audio bytes this provider produces for `text`
    pub fn audio_for(text: &str) -> Vec<u8> {
        format!("<audio:{}>", text).into_bytes()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(latency) = self.latency {
            for _ in 0..self.pieces {
                tokio::time::sleep(latency).await;
            }
        }

        if self.always_fail || self.failing_calls.contains(&call_num) {
            return Err(TtsError::ApiError {
                message: format!("mock failure on call {}", call_num),
                status_code: Some(self.status_code),
            });
        }

        if request.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        Ok(Self::audio_for(&request.text))
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn audio_extension(&self) -> &'static str {
        "mp3"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }

    fn requests_for(&self, _text: &str) -> usize {
        self.pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds();
        let audio = provider
            .synthesize(&SpeechRequest::new("hello", "en"))
            .await
            .unwrap();
        assert_eq!(audio, b"<audio:hello>");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(503);
        for _ in 0..3 {
            let result = provider.synthesize(&SpeechRequest::new("x", "en")).await;
            assert!(matches!(
                result,
                Err(TtsError::ApiError {
                    status_code: Some(503),
                    ..
                })
            ));
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_on_chosen_calls() {
        let provider = MockProvider::fails_on_calls(&[2], 500);
        assert!(provider.synthesize(&SpeechRequest::new("a", "en")).await.is_ok());
        assert!(provider.synthesize(&SpeechRequest::new("b", "en")).await.is_err());
        assert!(provider.synthesize(&SpeechRequest::new("c", "en")).await.is_ok());

        let texts: Vec<String> = provider.requests().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applies_per_piece() {
        let provider = MockProvider::always_succeeds()
            .with_latency(Duration::from_secs(1))
            .with_pieces(3);
        assert_eq!(provider.requests_for("anything"), 3);

        let started = tokio::time::Instant::now();
        provider
            .synthesize(&SpeechRequest::new("slow", "en"))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
