//! Voice session management
//!
//! This module provides the `VoiceSession` abstraction that manages:
//! - Half-duplex gating of inbound audio (`DuplexController`)
//! - Segment transcription off the reader's path
//! - The ordered conversation loop (`TurnSequencer`)
//! - Conversation history and session statistics

mod config;
mod conversation;
mod duplex;
mod sequencer;
mod session;
mod stats;
mod transcription;

pub use config::{
    SessionConfig, DEFAULT_FALLBACK_REPLY, DEFAULT_SCHEDULED_REPLY, DEFAULT_SCHEDULE_FAILED_REPLY,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TRIGGER_PHRASE,
};
pub use conversation::{Conversation, Role, Turn};
pub use duplex::{DuplexController, DuplexState, PlaybackOutcome};
pub use sequencer::TurnSequencer;
pub use session::{SessionHandle, SessionReport, VoiceSession};
pub use stats::{SessionCounters, SessionStats};
pub use transcription::run_transcription;
