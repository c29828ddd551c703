/*!
 * Speech synthesis providers.
 *
 * This module contains client implementations for text-to-speech services:
 * - Azure: Microsoft Cognitive Services speech REST API (neural voices)
 * - Mock: scripted provider for tests and offline runs
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::voice::VoiceId;

/// Common trait for all speech providers
///
/// Implementations turn one plain-text narration into encoded audio. They
/// must be safe to call from several tasks at once; the controller may run
/// variants concurrently.
#[async_trait]
pub trait SpeechProvider: Send + Sync + Debug {
    /// Synthesize `text` with `voice`
    ///
    /// # Returns
    /// * `Result<Bytes, ProviderError>` - Encoded audio, or an error
    async fn synthesize(&self, text: &str, voice: &VoiceId) -> Result<Bytes, ProviderError>;

    /// Short provider name for log lines
    fn name(&self) -> &str;
}

pub mod azure;
pub mod mock;
