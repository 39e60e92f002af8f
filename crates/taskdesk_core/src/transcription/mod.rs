//! Speech-to-text gateway contract.
//!
//! The task domain only ever sees a `Transcriber`; the HTTP adapter in
//! [`http`] is one implementation.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod http;

pub use http::HttpTranscriber;

/// Speech recognition failure. Upstream messages pass through as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    EmptyAudio,
    NotConfigured(&'static str),
    Transport(String),
    Status { code: u16, message: String },
    MalformedResponse(String),
    NoSpeechRecognized,
}

impl Display for TranscriptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAudio => write!(f, "audio payload is empty"),
            Self::NotConfigured(setting) => {
                write!(f, "speech recognition is not configured: missing {setting}")
            }
            Self::Transport(message) => write!(f, "speech request failed: {message}"),
            Self::Status { code, message } => {
                write!(f, "speech service returned {code}: {message}")
            }
            Self::MalformedResponse(message) => {
                write!(f, "speech service response is malformed: {message}")
            }
            Self::NoSpeechRecognized => write!(f, "no speech could be recognized in the audio"),
        }
    }
}

impl Error for TranscriptionError {}

/// Converts recorded audio into text.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError>;
}
