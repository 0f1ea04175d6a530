use std::time::Duration;

use crate::audio::SegmenterConfig;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a voice assistant that helps schedule meetings.\n\
- Ask for the attendee's name if not provided.\n\
- Ask for the desired meeting time if not provided.\n\
- Ask for the meeting summary/title if not provided.\n\
- Once you have the name, time, and title, ask for confirmation. If confirmed, say 'creating event'.\n\
- Output strictly text that should be spoken. Keep responses concise.";

pub const DEFAULT_TRIGGER_PHRASE: &str = "creating event";
pub const DEFAULT_FALLBACK_REPLY: &str = "I'm sorry, I'm having trouble processing that right now.";
pub const DEFAULT_SCHEDULED_REPLY: &str = "I have successfully scheduled the meeting.";
pub const DEFAULT_SCHEDULE_FAILED_REPLY: &str =
    "Sorry, I couldn't schedule the meeting. Please try again.";

/// Configuration for one voice session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Endpointing settings, including the client's sample rate
    pub segmenter: SegmenterConfig,

    /// First turn of every conversation
    pub system_prompt: String,

    /// Reply substring that triggers scheduling
    pub trigger_phrase: String,

    /// How long a speak cycle waits for the client's `unmute`
    /// Default: 30 seconds
    pub ack_timeout: Duration,

    /// Invitee for scheduled events
    pub attendee: String,

    /// Offset for extracted start times without a zone (minutes east of UTC)
    pub default_utc_offset_minutes: i32,

    /// Spoken when reply generation fails
    pub fallback_reply: String,

    pub scheduled_reply: String,
    pub schedule_failed_reply: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            segmenter: SegmenterConfig::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
            ack_timeout: Duration::from_secs(30),
            attendee: String::new(),
            default_utc_offset_minutes: 330, // IST
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            scheduled_reply: DEFAULT_SCHEDULED_REPLY.to_string(),
            schedule_failed_reply: DEFAULT_SCHEDULE_FAILED_REPLY.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn sample_rate(&self) -> u32 {
        self.segmenter.sample_rate
    }
}
