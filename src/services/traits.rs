use crate::audio::AudioSegment;
use crate::scheduling::{ScheduleRequest, ScheduledEvent};
use crate::session::Turn;

use super::error::ServiceResult;

/// Speech-to-text
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one finalized segment. May return empty text.
    async fn transcribe(&self, segment: &AudioSegment) -> ServiceResult<String>;
}

/// Conversational reply generation
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Produce the next assistant reply for `history`.
    ///
    /// `history` starts with the system turn; `system_prompt` is passed
    /// separately so implementations can place it as they need.
    async fn reply(&self, history: &[Turn], system_prompt: &str) -> ServiceResult<String>;
}

/// Structured meeting-field extraction
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, history: &[Turn]) -> ServiceResult<serde_json::Value>;
}

/// Text-to-speech
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Returns audio bytes to stream to the client, or `None` when the
    /// client synthesizes the `speak` text itself.
    async fn synthesize(&self, text: &str) -> ServiceResult<Option<Vec<u8>>>;
}

/// Calendar-style scheduling backend
#[async_trait::async_trait]
pub trait Scheduler: Send + Sync {
    async fn create_event(&self, request: &ScheduleRequest) -> ServiceResult<ScheduledEvent>;
}
