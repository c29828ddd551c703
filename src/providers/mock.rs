/*!
 * Mock speech provider for testing.
 *
 * This module provides a provider that simulates different behaviors:
 * - `MockSpeechProvider::working()` - Always succeeds with fake audio
 * - `MockSpeechProvider::intermittent(n)` - Fails every nth request
 * - `MockSpeechProvider::failing()` - Always fails with a transient error
 * - `MockSpeechProvider::rejecting()` - Always fails with a permanent error
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::SpeechProvider;
use crate::voice::VoiceId;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request) with a 503
    Intermittent { fail_every: usize },
    /// Always fails with a 500
    Failing,
    /// Always fails with an authentication error
    Rejecting,
    /// Succeeds with zero bytes of audio
    Empty,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock provider recording every synthesized text
#[derive(Debug)]
pub struct MockSpeechProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Texts received, in arrival order
    received: Arc<Mutex<Vec<String>>>,
    /// Requests whose text matches fail regardless of behavior
    fail_when: Option<fn(&str) -> bool>,
}

impl MockSpeechProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
            fail_when: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Fail every request whose text satisfies `predicate`
    pub fn fail_when(mut self, predicate: fn(&str) -> bool) -> Self {
        self.fail_when = Some(predicate);
        self
    }

    /// Number of synthesize calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received so far
    pub fn received_texts(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Fake audio payload: an ID3 tag header followed by the text
    pub fn fake_audio(text: &str) -> Bytes {
        let mut audio = b"ID3".to_vec();
        audio.extend_from_slice(text.as_bytes());
        Bytes::from(audio)
    }
}

impl Clone for MockSpeechProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            received: Arc::clone(&self.received),
            fail_when: self.fail_when,
        }
    }
}

#[async_trait]
impl SpeechProvider for MockSpeechProvider {
    async fn synthesize(&self, text: &str, _voice: &VoiceId) -> Result<Bytes, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(text.to_string());

        if let Some(predicate) = self.fail_when {
            if predicate(text) {
                return Err(ProviderError::ApiError {
                    status_code: 400,
                    message: "Simulated rejection of this text".to_string(),
                });
            }
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::fake_audio(text)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(Self::fake_audio(text))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),

            MockBehavior::Rejecting => Err(ProviderError::AuthenticationError(
                "Simulated invalid subscription key".to_string(),
            )),

            MockBehavior::Empty => Ok(Bytes::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::fake_audio(text))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
