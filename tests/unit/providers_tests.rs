/*!
 * Tests for speech provider implementations
 */

use anyhow::Result;
use narrator::errors::ProviderError;
use narrator::providers::SpeechProvider;
use narrator::providers::azure::AzureSpeech;
use narrator::providers::mock::MockSpeechProvider;
use narrator::voice::VoiceId;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use crate::common;

const FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

async fn server_answering(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::SPEECH_PATH))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

/// Successful synthesis sends SSML with the expected headers
#[tokio::test]
async fn test_azure_synthesize_withAudioResponse_shouldReturnBytesAndSendSsml() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::SPEECH_PATH))
        .and(header("Ocp-Apim-Subscription-Key", "secret-key"))
        .and(header("Content-Type", "application/ssml+xml"))
        .and(header("X-Microsoft-OutputFormat", FORMAT))
        .and(body_string(
            "<speak version='1.0' xml:lang='en-GB'><voice name='en-GB-SoniaNeural'>Fish &amp; chips, ħabib.</voice></speak>",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "audio/mpeg")
                .set_body_bytes(b"ID3fake-mp3".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let azure = AzureSpeech::new("secret-key", common::speech_endpoint(&server), FORMAT, 5);
    let audio = azure.synthesize("Fish & chips, ħabib.", &VoiceId::default()).await?;
    assert_eq!(&audio[..], b"ID3fake-mp3");

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let user_agent = requests[0]
        .headers
        .get("User-Agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(user_agent.starts_with("narrator/"), "unexpected user agent: {}", user_agent);
    Ok(())
}

/// 401 maps to an authentication error
#[tokio::test]
async fn test_azure_synthesize_withUnauthorized_shouldReturnAuthenticationError() -> Result<()> {
    let server = server_answering(ResponseTemplate::new(401).set_body_string("Access denied")).await;
    let azure = AzureSpeech::new("bad-key", common::speech_endpoint(&server), FORMAT, 5);

    match azure.synthesize("Hello", &VoiceId::default()).await {
        Err(ProviderError::AuthenticationError(message)) => assert!(message.contains("Access denied")),
        other => panic!("expected authentication error, got {:?}", other),
    }
    Ok(())
}

/// 429 carries the Retry-After hint
#[tokio::test]
async fn test_azure_synthesize_withTooManyRequests_shouldReturnRateLimit() -> Result<()> {
    let response = ResponseTemplate::new(429)
        .insert_header("Retry-After", "7")
        .set_body_string("Too many requests");
    let server = server_answering(response).await;
    let azure = AzureSpeech::new("key", common::speech_endpoint(&server), FORMAT, 5);

    match azure.synthesize("Hello", &VoiceId::default()).await {
        Err(ProviderError::RateLimitExceeded { retry_after_secs, .. }) => assert_eq!(retry_after_secs, Some(7)),
        other => panic!("expected rate limit error, got {:?}", other),
    }
    Ok(())
}

/// Server errors are transient API errors
#[tokio::test]
async fn test_azure_synthesize_withServerError_shouldReturnTransientApiError() -> Result<()> {
    let server = server_answering(ResponseTemplate::new(503)).await;
    let azure = AzureSpeech::new("key", common::speech_endpoint(&server), FORMAT, 5);

    let error = azure.synthesize("Hello", &VoiceId::default()).await.unwrap_err();
    assert!(matches!(error, ProviderError::ApiError { status_code: 503, .. }));
    assert!(error.is_transient());
    Ok(())
}

/// A 200 without audio is a failure
#[tokio::test]
async fn test_azure_synthesize_withEmptyBody_shouldReturnEmptyAudio() -> Result<()> {
    let server = server_answering(ResponseTemplate::new(200)).await;
    let azure = AzureSpeech::new("key", common::speech_endpoint(&server), FORMAT, 5);

    let error = azure.synthesize("Hello", &VoiceId::default()).await.unwrap_err();
    assert!(matches!(error, ProviderError::EmptyAudio));
    Ok(())
}

/// Nothing listening is a transient transport failure
#[tokio::test]
async fn test_azure_synthesize_withUnreachableEndpoint_shouldReturnTransientError() -> Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?;
    drop(listener);

    let azure = AzureSpeech::new("key", format!("http://{}/tts", address), FORMAT, 2);
    let error = azure.synthesize("Hello", &VoiceId::default()).await.unwrap_err();
    assert!(error.is_transient(), "unexpected error: {:?}", error);
    Ok(())
}

/// Mock provider records texts in order
#[tokio::test]
async fn test_mock_provider_withSeveralCalls_shouldRecordTexts() -> Result<()> {
    let provider = MockSpeechProvider::working();
    let voice = VoiceId::default();
    provider.synthesize("one", &voice).await?;
    provider.synthesize("two", &voice).await?;
    assert_eq!(provider.request_count(), 2);
    assert_eq!(provider.received_texts(), vec!["one".to_string(), "two".to_string()]);
    assert_eq!(provider.name(), "mock");
    Ok(())
}

/// Script subtags reach the SSML locale unchanged
#[test]
fn test_build_ssml_withScriptSubtagVoice_shouldKeepLocaleCase() -> Result<()> {
    let voice: VoiceId = "sr-Latn-RS-NicholasNeural".parse()?;
    let ssml = AzureSpeech::build_ssml("Dobar dan", &voice);
    assert_eq!(
        ssml,
        "<speak version='1.0' xml:lang='sr-Latn'><voice name='sr-Latn-RS-NicholasNeural'>Dobar dan</voice></speak>"
    );
    Ok(())
}
