//! Audio-to-title input assist.
//!
//! Wraps a `Transcriber` behind the authenticated-owner boundary. The result
//! is plain text for the caller to feed into task create/edit; nothing is
//! persisted and failures are returned as-is, without retry.

use crate::model::user::Owner;
use crate::transcription::{Transcriber, TranscriptionError};
use log::{info, warn};

/// Owner-scoped transcription entry point.
pub struct TranscriptionService<T: Transcriber> {
    transcriber: T,
}

impl<T: Transcriber> TranscriptionService<T> {
    pub fn new(transcriber: T) -> Self {
        Self { transcriber }
    }

    /// Transcribes `audio` for `owner`. Empty payloads fail without reaching
    /// the transcriber.
    pub fn transcribe(&self, owner: &Owner, audio: &[u8]) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        match self.transcriber.transcribe(audio) {
            Ok(text) => {
                info!(
                    "event=audio_transcribe module=service status=ok user_id={} audio_bytes={} text_chars={}",
                    owner.user_id(),
                    audio.len(),
                    text.chars().count()
                );
                Ok(text)
            }
            Err(err) => {
                warn!(
                    "event=audio_transcribe module=service status=error user_id={} audio_bytes={} error={}",
                    owner.user_id(),
                    audio.len(),
                    err
                );
                Err(err)
            }
        }
    }
}
