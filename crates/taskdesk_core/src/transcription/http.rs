//! Blocking HTTP adapter for a Google-style `speech:recognize` endpoint.
//!
//! Sends `{"config": {...}, "audio": {"content": <base64>}}` and joins the top
//! alternative of every result into one transcript. Encoding and sample rate
//! are left for the service to detect from the WAV/FLAC header.

use crate::config::SpeechConfig;
use crate::transcription::{Transcriber, TranscriptionError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{error, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Speech client bound to one endpoint, key and language.
pub struct HttpTranscriber {
    client: Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl HttpTranscriber {
    /// Builds a client from configuration. Requires an API key.
    pub fn new(config: &SpeechConfig) -> Result<Self, TranscriptionError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(TranscriptionError::NotConfigured("TASKDESK_SPEECH_API_KEY"))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| TranscriptionError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            language: config.language.clone(),
        })
    }
}

impl Transcriber for HttpTranscriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let started_at = Instant::now();
        let body = RecognizeRequest {
            config: RecognitionConfig {
                language_code: &self.language,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(audio),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|err| {
                error!(
                    "event=speech_request module=transcription status=error duration_ms={} error_code=transport",
                    started_at.elapsed().as_millis()
                );
                TranscriptionError::Transport(err.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|err| TranscriptionError::Transport(err.to_string()))?;
        info!(
            "event=speech_request module=transcription status={} http_status={} duration_ms={} audio_bytes={}",
            if status.is_success() { "ok" } else { "error" },
            status.as_u16(),
            started_at.elapsed().as_millis(),
            audio.len()
        );

        if !status.is_success() {
            return Err(TranscriptionError::Status {
                code: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_recognize_response(&text)
    }
}

fn parse_recognize_response(body: &str) -> Result<String, TranscriptionError> {
    let parsed: RecognizeResponse = serde_json::from_str(body)
        .map_err(|err| TranscriptionError::MalformedResponse(err.to_string()))?;

    let transcript = parsed
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if transcript.is_empty() {
        return Err(TranscriptionError::NoSpeechRecognized);
    }
    Ok(transcript)
}

fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let mut message = body
        .trim()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect::<String>();
    if body.trim().chars().count() > MAX_ERROR_BODY_CHARS {
        message.push_str("...");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::{error_message, parse_recognize_response, HttpTranscriber};
    use crate::config::SpeechConfig;
    use crate::transcription::{Transcriber, TranscriptionError};

    #[test]
    fn joins_top_alternatives_of_all_results() {
        let body = r#"{
            "results": [
                {"alternatives": [{"transcript": "buy milk", "confidence": 0.93},
                                  {"transcript": "by milk"}]},
                {"alternatives": [{"transcript": " and bread "}]}
            ]
        }"#;
        assert_eq!(
            parse_recognize_response(body).expect("well-formed response"),
            "buy milk and bread"
        );
    }

    #[test]
    fn empty_result_set_means_no_speech() {
        assert_eq!(
            parse_recognize_response("{}").expect_err("empty response has no speech"),
            TranscriptionError::NoSpeechRecognized
        );
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            parse_recognize_response("<html>"),
            Err(TranscriptionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn error_message_prefers_api_envelope() {
        let body = r#"{"error": {"code": 400, "message": "Invalid audio", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Invalid audio");
        assert_eq!(error_message("  plain failure "), "plain failure");
    }

    #[test]
    fn missing_api_key_is_not_configured() {
        let result = HttpTranscriber::new(&SpeechConfig::default());
        assert!(matches!(
            result,
            Err(TranscriptionError::NotConfigured(_))
        ));
    }

    #[test]
    fn empty_audio_is_rejected_before_any_request() {
        let config = SpeechConfig {
            api_key: Some("test-key".to_string()),
            endpoint: "http://127.0.0.1:9/unreachable".to_string(),
            ..SpeechConfig::default()
        };
        let transcriber = HttpTranscriber::new(&config).expect("configured transcriber");
        assert_eq!(
            transcriber.transcribe(&[]).expect_err("empty audio should fail"),
            TranscriptionError::EmptyAudio
        );
    }
}
